// crates/pv_physics/src/pencil/case.rs

//! PencilCase - 单条 pencil 的派生量缓存
//!
//! 一个扁平 `Vec<f64>` 竞技场，按解析计划一次性布局，跨 pencil 复用：
//!
//! ```text
//! data: [ q0: c0[0..nx] c1[0..nx] ... | q1: ... | ... ]
//! ```
//!
//! 量内按分量主序（`component * nx + l`）。每条 pencil 开始时清空
//! `written` 位集，量在同一 pencil 内只写一次。提供者通过
//! [`PencilCase::provide`] 写入：拿到目标量的可变切片，同时通过
//! [`PencilView`] 只读访问其余已写入的量。

use std::ops::Range;

use super::criteria::PencilCriteria;
use super::error::{PencilError, PencilResult};
use super::quantity::PencilQuantity;
use super::resolver::PencilPlan;
use crate::grid::Pencil;

/// 缓存布局：量 → 竞技场中的区间
#[derive(Debug, Clone, PartialEq)]
pub struct PencilLayout {
    ranges: [Option<Range<usize>>; PencilQuantity::COUNT],
    total: usize,
    nx: usize,
}

impl PencilLayout {
    /// 为计划中的量布局
    pub fn new(planned: PencilCriteria, nx: usize) -> Self {
        let mut ranges: [Option<Range<usize>>; PencilQuantity::COUNT] = Default::default();
        let mut offset = 0;
        for q in planned.iter() {
            let len = q.components() * nx;
            ranges[q.index()] = Some(offset..offset + len);
            offset += len;
        }
        Self { ranges, total: offset, nx }
    }

    /// 量的区间
    #[inline]
    pub fn range(&self, q: PencilQuantity) -> Option<Range<usize>> {
        self.ranges[q.index()].clone()
    }

    /// 竞技场总长度
    #[inline]
    pub fn total_len(&self) -> usize {
        self.total
    }

    /// pencil 长度
    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }
}

/// pencil 缓存
#[derive(Debug, Clone)]
pub struct PencilCase {
    layout: PencilLayout,
    planned: PencilCriteria,
    written: PencilCriteria,
    data: Vec<f64>,
    pencil: Option<Pencil>,
}

impl PencilCase {
    /// 按计划创建缓存（唯一一次分配）
    pub fn new(plan: &PencilPlan, nx: usize) -> Self {
        Self::with_criteria(plan.needed(), nx)
    }

    /// 按量集合创建缓存
    pub fn with_criteria(planned: PencilCriteria, nx: usize) -> Self {
        let layout = PencilLayout::new(planned, nx);
        let data = vec![0.0; layout.total_len()];
        Self { layout, planned, written: PencilCriteria::EMPTY, data, pencil: None }
    }

    /// 开始新 pencil：之前写入的量全部失效
    #[inline]
    pub fn begin(&mut self, pencil: Pencil) {
        self.written = PencilCriteria::EMPTY;
        self.pencil = Some(pencil);
    }

    /// 当前 pencil
    #[inline]
    pub fn pencil(&self) -> Option<Pencil> {
        self.pencil
    }

    /// pencil 长度
    #[inline]
    pub fn nx(&self) -> usize {
        self.layout.nx
    }

    /// 计划中的量
    #[inline]
    pub fn planned(&self) -> PencilCriteria {
        self.planned
    }

    /// 当前 pencil 已写入的量
    #[inline]
    pub fn written(&self) -> PencilCriteria {
        self.written
    }

    /// 计划中且尚未写入
    #[inline]
    pub fn wants(&self, q: PencilQuantity) -> bool {
        self.planned.contains(q) && !self.written.contains(q)
    }

    /// 读取已写入的量（全部分量）
    pub fn get(&self, q: PencilQuantity) -> PencilResult<&[f64]> {
        if !self.written.contains(q) {
            return Err(PencilError::MissingPencil { quantity: q });
        }
        let range = self.layout.range(q).ok_or(PencilError::MissingPencil { quantity: q })?;
        Ok(&self.data[range])
    }

    /// 读取已写入量的一个分量
    pub fn component(&self, q: PencilQuantity, c: usize) -> PencilResult<&[f64]> {
        let nx = self.layout.nx;
        Ok(&self.get(q)?[c * nx..(c + 1) * nx])
    }

    /// 写入一个量
    ///
    /// 闭包收到其余已写入量的只读视图与目标量的输出切片。
    pub fn provide<F>(&mut self, q: PencilQuantity, fill: F) -> PencilResult<()>
    where
        F: FnOnce(&PencilView<'_>, &mut [f64]) -> PencilResult<()>,
    {
        if self.written.contains(q) {
            return Err(PencilError::AlreadyWritten { quantity: q });
        }
        let range = self.layout.range(q).ok_or(PencilError::MissingPencil { quantity: q })?;

        let (head, rest) = self.data.split_at_mut(range.start);
        let (out, tail) = rest.split_at_mut(range.end - range.start);
        let view = PencilView {
            head,
            tail,
            tail_start: range.end,
            layout: &self.layout,
            written: self.written,
        };
        fill(&view, out)?;
        self.written.insert(q);
        Ok(())
    }
}

/// 缓存只读视图（不含正在写入的量）
pub struct PencilView<'a> {
    head: &'a [f64],
    tail: &'a [f64],
    tail_start: usize,
    layout: &'a PencilLayout,
    written: PencilCriteria,
}

impl<'a> PencilView<'a> {
    /// 读取已写入的量
    pub fn get(&self, q: PencilQuantity) -> PencilResult<&'a [f64]> {
        let missing = PencilError::MissingPencil { quantity: q };
        if !self.written.contains(q) {
            return Err(missing);
        }
        let range = self.layout.range(q).ok_or(missing.clone())?;
        if range.end <= self.head.len() {
            Ok(&self.head[range])
        } else if range.start >= self.tail_start {
            Ok(&self.tail[range.start - self.tail_start..range.end - self.tail_start])
        } else {
            Err(missing)
        }
    }

    /// 读取一个分量
    pub fn component(&self, q: PencilQuantity, c: usize) -> PencilResult<&'a [f64]> {
        let nx = self.layout.nx;
        Ok(&self.get(q)?[c * nx..(c + 1) * nx])
    }

    /// pencil 长度
    #[inline]
    pub fn nx(&self) -> usize {
        self.layout.nx
    }
}
