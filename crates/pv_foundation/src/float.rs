// crates/pv_foundation/src/float.rs

//! 浮点辅助
//!
//! 逐点导数与外力在写回前需要检查有限性，非有限值不写入状态。

/// 切片中所有值是否有限
#[inline]
pub fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}
