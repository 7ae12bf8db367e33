// crates/pv_physics/src/fields.rs

//! 字段注册与槽位分配
//!
//! 每个物理模块在启动期注册自己演化的字段，注册表按注册顺序
//! 在点序状态数组中分配连续的变量槽位，并记录只用于输出的
//! 辅助切片名称。启动期之后注册表只读。
//!
//! # 示例
//!
//! ```rust
//! use pv_physics::fields::{FieldMeta, FieldRegistry};
//!
//! let mut registry = FieldRegistry::new();
//! let uu = registry.register(FieldMeta::vector3d("uu").with_desc("速度")).unwrap();
//! let poly = registry.register(FieldMeta::sym_tensor3d("poly")).unwrap();
//! assert_eq!((uu.offset, poly.offset, registry.nvar()), (0, 3, 9));
//! ```

use pv_foundation::PvError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// 标量场
    Scalar,
    /// 三维向量场
    Vector3D,
    /// 对称 3×3 张量场（6 个独立分量）
    SymTensor3D,
}

impl FieldType {
    /// 每点分量数
    pub fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector3D => 3,
            Self::SymTensor3D => 6,
        }
    }
}

/// 注册错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// 无效字段名（非 snake_case 或包含非法字符）
    #[error("字段名 '{0}' 无效：必须为 snake_case (a-z, 0-9, _)")]
    InvalidName(String),

    /// 字段已存在
    #[error("字段 '{0}' 已注册")]
    DuplicateField(String),

    /// 辅助切片已存在
    #[error("切片 '{0}' 已注册")]
    DuplicateSlice(String),
}

impl From<FieldError> for PvError {
    fn from(err: FieldError) -> Self {
        PvError::config(err.to_string())
    }
}

/// 验证字段名是否符合 snake_case 规范
///
/// 仅允许小写字母、数字与单个下划线，且不能以下划线开头或结尾。
fn is_valid_field_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('_') || name.ends_with('_') {
        return false;
    }
    let mut prev = ' ';
    for ch in name.chars() {
        match ch {
            'a'..='z' | '0'..='9' => {}
            '_' if prev != '_' => {}
            _ => return false,
        }
        prev = ch;
    }
    true
}

/// 字段元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMeta {
    /// 字段名称（唯一标识符）
    pub name: String,
    /// 数据类型
    pub field_type: FieldType,
    /// 描述文本
    #[serde(default)]
    pub description: String,
}

impl FieldMeta {
    /// 标量场
    #[inline]
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Scalar)
    }

    /// 向量场
    #[inline]
    pub fn vector3d(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Vector3D)
    }

    /// 对称张量场
    #[inline]
    pub fn sym_tensor3d(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::SymTensor3D)
    }

    fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type, description: String::new() }
    }

    /// 添加描述文本
    #[inline]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }
}

/// 状态数组中的槽位区间 `[offset, offset + len)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSlot {
    /// 首个变量序号
    pub offset: usize,
    /// 变量个数
    pub len: usize,
}

impl FieldSlot {
    /// 第 `c` 个分量的变量序号
    #[inline]
    pub fn var(&self, c: usize) -> usize {
        debug_assert!(c < self.len);
        self.offset + c
    }
}

/// 字段注册表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldRegistry {
    fields: HashMap<String, (FieldMeta, FieldSlot)>,
    /// 注册顺序（保证迭代一致性）
    order: Vec<String>,
    /// 输出切片名称（不占状态槽位）
    slices: Vec<String>,
    nvar: usize,
}

impl FieldRegistry {
    /// 创建空注册表
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册演化字段并分配槽位
    pub fn register(&mut self, meta: FieldMeta) -> Result<FieldSlot, FieldError> {
        if !is_valid_field_name(&meta.name) {
            return Err(FieldError::InvalidName(meta.name));
        }
        if self.fields.contains_key(&meta.name) {
            return Err(FieldError::DuplicateField(meta.name));
        }

        let slot = FieldSlot { offset: self.nvar, len: meta.field_type.components() };
        self.nvar += slot.len;
        log::info!(
            "注册字段 {} ({:?}): 变量 {}..{}",
            meta.name,
            meta.field_type,
            slot.offset,
            slot.offset + slot.len
        );
        self.order.push(meta.name.clone());
        self.fields.insert(meta.name.clone(), (meta, slot));
        Ok(slot)
    }

    /// 注册输出切片名称
    pub fn register_slice(&mut self, name: &str) -> Result<(), FieldError> {
        if !is_valid_field_name(name) {
            return Err(FieldError::InvalidName(name.to_string()));
        }
        if self.slices.iter().any(|s| s == name) {
            return Err(FieldError::DuplicateSlice(name.to_string()));
        }
        self.slices.push(name.to_string());
        Ok(())
    }

    /// 字段槽位
    #[inline]
    pub fn slot(&self, name: &str) -> Option<FieldSlot> {
        self.fields.get(name).map(|(_, slot)| *slot)
    }

    /// 字段元数据
    #[inline]
    pub fn get(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name).map(|(meta, _)| meta)
    }

    /// 检查字段是否存在
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// 所有字段名（按注册顺序）
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// 输出切片名称
    #[inline]
    pub fn slices(&self) -> &[String] {
        &self.slices
    }

    /// 每点变量总数
    #[inline]
    pub fn nvar(&self) -> usize {
        self.nvar
    }

    /// 字段数量
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 注册表是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name_validation() {
        assert!(is_valid_field_name("poly"));
        assert!(is_valid_field_name("del2_poly"));
        assert!(is_valid_field_name("uu"));

        assert!(!is_valid_field_name(""));
        assert!(!is_valid_field_name("_trp"));
        assert!(!is_valid_field_name("trp_"));
        assert!(!is_valid_field_name("Poly"));
        assert!(!is_valid_field_name("tr__p"));
        assert!(!is_valid_field_name("tr-p"));
        assert!(!is_valid_field_name("tr p"));
    }

    #[test]
    fn test_slot_assignment_in_order() {
        let mut registry = FieldRegistry::new();
        let uu = registry.register(FieldMeta::vector3d("uu")).unwrap();
        let poly = registry.register(FieldMeta::sym_tensor3d("poly")).unwrap();
        let s = registry.register(FieldMeta::scalar("lnrho")).unwrap();

        assert_eq!(uu, FieldSlot { offset: 0, len: 3 });
        assert_eq!(poly, FieldSlot { offset: 3, len: 6 });
        assert_eq!(s, FieldSlot { offset: 9, len: 1 });
        assert_eq!(registry.nvar(), 10);
        assert_eq!(poly.var(5), 8);
        assert_eq!(registry.names(), &["uu", "poly", "lnrho"]);
        assert_eq!(registry.slot("poly"), Some(poly));
    }

    #[test]
    fn test_duplicate_and_invalid() {
        let mut registry = FieldRegistry::new();
        registry.register(FieldMeta::sym_tensor3d("poly")).unwrap();
        assert_eq!(
            registry.register(FieldMeta::scalar("poly")),
            Err(FieldError::DuplicateField("poly".into()))
        );
        assert!(matches!(
            registry.register(FieldMeta::scalar("Poly")),
            Err(FieldError::InvalidName(_))
        ));
        // 失败的注册不占槽位
        assert_eq!(registry.nvar(), 6);
    }

    #[test]
    fn test_slices() {
        let mut registry = FieldRegistry::new();
        registry.register_slice("trp").unwrap();
        registry.register_slice("fr").unwrap();
        assert_eq!(registry.slices(), &["trp", "fr"]);
        assert_eq!(registry.nvar(), 0);
        assert_eq!(
            registry.register_slice("trp"),
            Err(FieldError::DuplicateSlice("trp".into()))
        );
    }

    #[test]
    fn test_error_converts_to_config() {
        let err: PvError = FieldError::DuplicateField("poly".into()).into();
        assert!(err.is_config());
    }

    #[test]
    fn test_serde_compatibility() {
        let mut registry = FieldRegistry::new();
        registry.register(FieldMeta::vector3d("uu").with_desc("速度")).unwrap();
        registry.register(FieldMeta::sym_tensor3d("poly")).unwrap();
        let json = serde_json::to_string(&registry).unwrap();
        let back: FieldRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.names(), registry.names());
        assert_eq!(back.slot("poly"), registry.slot("poly"));
        assert_eq!(back.get("uu").map(|m| m.description.as_str()), Some("速度"));
    }
}
