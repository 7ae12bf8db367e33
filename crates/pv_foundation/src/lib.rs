// crates/pv_foundation/src/lib.rs

//! PolyVisc Foundation Layer
//!
//! 基础层，提供整个项目的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`float`]: 浮点有限性检查
//! - [`metrics`]: 线程安全的计数器与计时器
//!
//! # 设计原则
//!
//! 1. **最少依赖**: 仅依赖 thiserror
//! 2. **无全局状态**: 指标对象由调用方显式持有并按引用传递

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod float;
pub mod metrics;

// 重导出常用类型
pub use error::{PvError, PvResult};
pub use metrics::{Counter, MetricsSnapshot, RunMetrics, Timer};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{PvError, PvResult};
    pub use crate::float::all_finite;
    pub use crate::metrics::{Counter, RunMetrics};
}
