// crates/pv_physics/src/engine/mod.rs

//! 计算引擎
//!
//! # 模块结构
//!
//! - `rhs` - 逐 pencil 右端项扫描（rayon 并行 / 串行）
//! - `time_integrator` - 时间积分器 (ForwardEuler, SSP-RK3)
//! - `simulation` - 启动与推进驱动

pub mod rhs;
pub mod simulation;
pub mod time_integrator;

// 重导出常用类型
pub use rhs::{RhsEvaluator, StepSummary};
pub use simulation::Simulation;
pub use time_integrator::{
    create_integrator, ForwardEuler, IntegratorEnum, RhsComputer, SspRk3, TimeIntegrator,
};
