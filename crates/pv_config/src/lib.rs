// crates/pv_config/src/lib.rs

//! PolyVisc Config Layer
//!
//! 配置层（参数存储），提供运行参数的读取、默认值、验证与回显。
//!
//! # 模块概览
//!
//! - [`run_config`]: RunConfig 运行配置（网格、流场、时间推进）
//! - [`polymer_config`]: PolymerConfig 聚合物模型参数
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! pv_physics    ─> uses RunConfig, PolymerConfig
//! pv_config     ─> 本层
//! pv_foundation ─> PvError
//! ```
//!
//! # 设计原则
//!
//! 1. **全 f64 配置**: 所有数值使用 f64
//! 2. **缺省确定**: 每个键都有 serde 默认值
//! 3. **只读**: 加载并验证后不再修改

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod polymer_config;
pub mod run_config;

// 重导出核心类型
pub use error::ConfigError;
pub use polymer_config::{PolymerConfig, PolymerInit, PolymerModel};
pub use run_config::{GridConfig, HydroConfig, IntegratorKind, RunConfig, TimeConfig, VelocityInit};
