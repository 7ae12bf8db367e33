// crates/pv_physics/src/diagnostics.rs

//! 诊断量
//!
//! 模块声明 [`DiagnosticSpec`]，每个工作线程持有一份
//! [`DiagnosticSet`] 逐 pencil 累加，扫描结束后归约并生成
//! 只读的 [`Diagnostics`]。

use serde::Serialize;
use std::collections::BTreeMap;

/// 归约方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// 全场平均
    Mean,
    /// 全场最大值
    Max,
    /// 全场求和
    Sum,
}

/// 诊断量声明
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticSpec {
    /// 名称（如 `trpm`）
    pub name: &'static str,
    /// 归约方式
    pub kind: DiagnosticKind,
    /// 说明
    pub description: &'static str,
}

/// 单个诊断量的累加器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticAccumulator {
    kind: DiagnosticKind,
    value: f64,
    count: u64,
}

impl DiagnosticAccumulator {
    /// 空累加器
    pub fn new(kind: DiagnosticKind) -> Self {
        let value = match kind {
            DiagnosticKind::Max => f64::NEG_INFINITY,
            DiagnosticKind::Mean | DiagnosticKind::Sum => 0.0,
        };
        Self { kind, value, count: 0 }
    }

    /// 加入一个样本
    #[inline]
    pub fn push(&mut self, v: f64) {
        match self.kind {
            DiagnosticKind::Max => self.value = self.value.max(v),
            DiagnosticKind::Mean | DiagnosticKind::Sum => self.value += v,
        }
        self.count += 1;
    }

    /// 合并另一累加器
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        match self.kind {
            DiagnosticKind::Max => self.value = self.value.max(other.value),
            DiagnosticKind::Mean | DiagnosticKind::Sum => self.value += other.value,
        }
        self.count += other.count;
    }

    /// 样本数
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 最终值，无样本时为 `None`
    pub fn finalize(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(match self.kind {
            DiagnosticKind::Mean => self.value / self.count as f64,
            DiagnosticKind::Max | DiagnosticKind::Sum => self.value,
        })
    }
}

/// 一组诊断量的累加器（每个工作线程一份）
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSet {
    entries: Vec<(&'static str, DiagnosticAccumulator)>,
}

impl DiagnosticSet {
    /// 按声明创建
    pub fn new(specs: &[DiagnosticSpec]) -> Self {
        Self {
            entries: specs
                .iter()
                .map(|s| (s.name, DiagnosticAccumulator::new(s.kind)))
                .collect(),
        }
    }

    /// 是否采样该诊断量
    #[inline]
    pub fn wants(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    /// 是否没有任何诊断量
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 加入一组样本（未声明的名称忽略）
    pub fn push_slice(&mut self, name: &str, values: &[f64]) {
        if let Some((_, acc)) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            for &v in values {
                acc.push(v);
            }
        }
    }

    /// 按位置合并（两侧须由同一组声明创建）
    pub fn merge(&mut self, other: &Self) {
        for ((name, acc), (other_name, other_acc)) in self.entries.iter_mut().zip(&other.entries) {
            debug_assert_eq!(*name, *other_name);
            acc.merge(other_acc);
        }
    }

    /// 清空全部累加器
    pub fn reset(&mut self) {
        for (_, acc) in self.entries.iter_mut() {
            *acc = DiagnosticAccumulator::new(acc.kind);
        }
    }

    /// 生成最终结果
    pub fn finalize(&self) -> Diagnostics {
        let mut out = Diagnostics::default();
        for (name, acc) in &self.entries {
            if let Some(v) = acc.finalize() {
                out.insert(name, v);
            }
        }
        out
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    values: BTreeMap<String, f64>,
}

impl Diagnostics {
    /// 按名称取值
    #[inline]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// 写入
    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// 按名称顺序迭代
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
