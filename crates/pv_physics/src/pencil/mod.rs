// crates/pv_physics/src/pencil/mod.rs

//! pencil 依赖系统
//!
//! 每个物理模块声明自己在每条 pencil 上需要的派生量（criteria）
//! 以及量之间的依赖（interdependency）。启动时 [`PencilResolver`]
//! 求全部需求的传递闭包，得到固定的 [`PencilPlan`]；步进时每条
//! pencil 的派生量只在 [`PencilCase`] 中计算一次，被所有模块共享。

pub mod case;
pub mod criteria;
pub mod error;
pub mod quantity;
pub mod resolver;

pub use case::{PencilCase, PencilLayout, PencilView};
pub use criteria::PencilCriteria;
pub use error::{PencilError, PencilResult};
pub use quantity::PencilQuantity;
pub use resolver::{PencilPlan, PencilResolver};

/// pencil 需求声明
///
/// 全部方法均为纯函数：同一配置下结果确定，且不修改模块状态。
pub trait PencilDeclaration {
    /// 模块名称
    fn name(&self) -> &'static str;

    /// 将本模块在当前配置下需要的量并入 `criteria`
    fn pencil_criteria(&self, criteria: &mut PencilCriteria);

    /// 量 `q` 的直接依赖（本模块视角）
    fn pencil_interdep(&self, q: PencilQuantity) -> &'static [PencilQuantity];

    /// 本模块负责计算的量
    fn provided_pencils(&self) -> PencilCriteria;
}
