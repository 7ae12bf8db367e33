// crates/pv_physics/src/lib.rs

//! 粘弹性聚合物物理层
//!
//! 在周期盒有限差分求解器上演化聚合物构象张量 C，包括：
//! - 网格与状态数组 (grid, state)
//! - 六阶中心差分 (derivatives)
//! - 对称张量代数 (tensor)
//! - pencil 量声明、依赖解析与缓存 (pencil)
//! - 物理模块：速度提供者与聚合物 (modules)
//! - 诊断量归约 (diagnostics)
//! - 右端项扫描、时间积分与运行驱动 (engine)
//!
//! # 数据流
//!
//! ```text
//! RunConfig ─> ModuleSet::register_all ─> FieldRegistry
//!           ─> PencilResolver::resolve ─> PencilPlan
//!           ─> per step / per pencil:
//!                PencilCase::begin ─> calc_pencils ─> dfdt ─> apply_forces
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod derivatives;
pub mod diagnostics;
pub mod engine;
pub mod fields;
pub mod grid;
pub mod modules;
pub mod pencil;
pub mod state;
pub mod tensor;

// 重导出常用类型
pub use diagnostics::{DiagnosticKind, DiagnosticSet, DiagnosticSpec, Diagnostics};
pub use engine::{RhsComputer, RhsEvaluator, Simulation, StepSummary, TimeIntegrator};
pub use fields::{FieldMeta, FieldRegistry, FieldSlot, FieldType};
pub use grid::{Direction, Grid, Pencil, NGHOST};
pub use modules::{
    HydroModule, ModuleSet, PencilReport, PencilRhs, PhysicsModule, PhysicsModuleKind,
    PolymerModule,
};
pub use pencil::{
    PencilCase, PencilCriteria, PencilDeclaration, PencilError, PencilPlan, PencilQuantity,
    PencilResolver,
};
pub use state::FArray;
pub use tensor::SymTensor3;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::engine::Simulation;
    pub use crate::grid::{Grid, Pencil};
    pub use crate::modules::{ModuleSet, PhysicsModule};
    pub use crate::pencil::{PencilCase, PencilCriteria, PencilDeclaration, PencilQuantity};
    pub use crate::state::FArray;
    pub use pv_config::RunConfig;
    pub use pv_foundation::{PvError, PvResult};
}
