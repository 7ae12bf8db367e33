// crates/pv_physics/src/modules/mod.rs

//! 物理模块
//!
//! 每个模块实现固定的能力集 [`PhysicsModule`]：注册字段、初始化、
//! 声明 pencil 需求、计算自己提供的 pencil 量、写入右端项。
//! 运行时模块集合是有限的标签枚举 [`PhysicsModuleKind`]，按注册
//! 顺序调用，顺序即 pencil 量的计算顺序。

pub mod hydro;
pub mod polymer;

use std::ops::AddAssign;

use pv_config::RunConfig;
use pv_foundation::PvResult;

use crate::diagnostics::{DiagnosticSet, DiagnosticSpec};
use crate::fields::FieldRegistry;
use crate::grid::{Pencil, NGHOST};
use crate::pencil::{
    PencilCase, PencilCriteria, PencilDeclaration, PencilPlan, PencilQuantity, PencilResolver,
    PencilResult,
};
use crate::state::FArray;

pub use hydro::HydroModule;
pub use polymer::PolymerModule;

/// 单条 pencil 的数值退化统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PencilReport {
    /// 伸展因子分母被截断的点数
    pub clamped: u64,
    /// 非有限导数被置零的点数
    pub non_finite: u64,
    /// 构象张量非半正定的点数
    pub non_psd: u64,
}

impl PencilReport {
    /// 无退化
    pub const ZERO: Self = Self { clamped: 0, non_finite: 0, non_psd: 0 };

    /// 是否无任何退化
    #[inline]
    pub fn is_clean(&self) -> bool {
        *self == Self::ZERO
    }
}

impl AddAssign for PencilReport {
    fn add_assign(&mut self, rhs: Self) {
        self.clamped += rhs.clamped;
        self.non_finite += rhs.non_finite;
        self.non_psd += rhs.non_psd;
    }
}

/// 单条 pencil 的右端项写入目标
///
/// `df` 为该 pencil 在导数累加数组中的整行（含虚单元，点序），
/// `force` 为动量方程外力累加器（分量主序 `i * nx + l`）。
pub struct PencilRhs<'a> {
    df: &'a mut [f64],
    force: &'a mut [f64],
    nvar: usize,
    nx: usize,
}

impl<'a> PencilRhs<'a> {
    /// 创建
    pub fn new(df: &'a mut [f64], force: &'a mut [f64], nvar: usize, nx: usize) -> Self {
        debug_assert_eq!(df.len(), (nx + 2 * NGHOST) * nvar);
        debug_assert_eq!(force.len(), 3 * nx);
        Self { df, force, nvar, nx }
    }

    /// pencil 长度
    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// `df[l, var] += v`（`l` 为内部点序号）
    #[inline]
    pub fn add(&mut self, l: usize, var: usize, v: f64) {
        self.df[(NGHOST + l) * self.nvar + var] += v;
    }

    /// 读取 `df[l, var]`
    #[inline]
    pub fn df(&self, l: usize, var: usize) -> f64 {
        self.df[(NGHOST + l) * self.nvar + var]
    }

    /// 外力 `F_i[l] += v`
    #[inline]
    pub fn add_force(&mut self, i: usize, l: usize, v: f64) {
        self.force[i * self.nx + l] += v;
    }

    /// 外力分量 `F_i`
    #[inline]
    pub fn force(&self, i: usize) -> &[f64] {
        &self.force[i * self.nx..(i + 1) * self.nx]
    }
}

/// 物理模块能力集
pub trait PhysicsModule: PencilDeclaration {
    /// 注册演化字段与输出切片
    fn register(&mut self, registry: &mut FieldRegistry) -> PvResult<()>;

    /// 写入初始条件（仅内部点，虚单元由宿主更新）
    fn initialize(&self, f: &mut FArray) -> PvResult<()>;

    /// 计算本模块提供且计划中的 pencil 量
    fn calc_pencils(&self, f: &FArray, pencil: Pencil, case: &mut PencilCase) -> PencilResult<()>;

    /// 写入本模块字段的右端项及对动量的外力贡献
    fn dfdt(&self, case: &PencilCase, rhs: &mut PencilRhs<'_>) -> PencilResult<PencilReport>;

    /// 将外力累加器施加到自身字段（所有模块 `dfdt` 之后调用）
    fn apply_forces(&self, _rhs: &mut PencilRhs<'_>) -> PencilResult<()> {
        Ok(())
    }

    /// 声明的诊断量
    fn diagnostics(&self) -> Vec<DiagnosticSpec> {
        Vec::new()
    }

    /// 在当前 pencil 上采样诊断量
    fn sample_diagnostics(&self, _case: &PencilCase, _set: &mut DiagnosticSet) -> PencilResult<()> {
        Ok(())
    }

    /// 输出切片名称对应的 pencil 量
    fn slice_quantity(&self, _name: &str) -> Option<PencilQuantity> {
        None
    }

    /// 回显参数到日志
    fn echo_params(&self) {}
}

/// 模块标签枚举
#[derive(Debug, Clone)]
pub enum PhysicsModuleKind {
    /// 速度提供者
    Hydro(HydroModule),
    /// 粘弹性聚合物
    Polymer(PolymerModule),
}

macro_rules! dispatch {
    ($self:ident, $m:ident => $body:expr) => {
        match $self {
            PhysicsModuleKind::Hydro($m) => $body,
            PhysicsModuleKind::Polymer($m) => $body,
        }
    };
}

impl PencilDeclaration for PhysicsModuleKind {
    fn name(&self) -> &'static str {
        dispatch!(self, m => m.name())
    }

    fn pencil_criteria(&self, criteria: &mut PencilCriteria) {
        dispatch!(self, m => m.pencil_criteria(criteria))
    }

    fn pencil_interdep(&self, q: PencilQuantity) -> &'static [PencilQuantity] {
        dispatch!(self, m => m.pencil_interdep(q))
    }

    fn provided_pencils(&self) -> PencilCriteria {
        dispatch!(self, m => m.provided_pencils())
    }
}

impl PhysicsModule for PhysicsModuleKind {
    fn register(&mut self, registry: &mut FieldRegistry) -> PvResult<()> {
        dispatch!(self, m => m.register(registry))
    }

    fn initialize(&self, f: &mut FArray) -> PvResult<()> {
        dispatch!(self, m => m.initialize(f))
    }

    fn calc_pencils(&self, f: &FArray, pencil: Pencil, case: &mut PencilCase) -> PencilResult<()> {
        dispatch!(self, m => m.calc_pencils(f, pencil, case))
    }

    fn dfdt(&self, case: &PencilCase, rhs: &mut PencilRhs<'_>) -> PencilResult<PencilReport> {
        dispatch!(self, m => m.dfdt(case, rhs))
    }

    fn apply_forces(&self, rhs: &mut PencilRhs<'_>) -> PencilResult<()> {
        dispatch!(self, m => m.apply_forces(rhs))
    }

    fn diagnostics(&self) -> Vec<DiagnosticSpec> {
        dispatch!(self, m => m.diagnostics())
    }

    fn sample_diagnostics(&self, case: &PencilCase, set: &mut DiagnosticSet) -> PencilResult<()> {
        dispatch!(self, m => m.sample_diagnostics(case, set))
    }

    fn slice_quantity(&self, name: &str) -> Option<PencilQuantity> {
        dispatch!(self, m => m.slice_quantity(name))
    }

    fn echo_params(&self) {
        dispatch!(self, m => m.echo_params())
    }
}

/// 有序模块集合
#[derive(Debug, Clone, Default)]
pub struct ModuleSet {
    modules: Vec<PhysicsModuleKind>,
}

impl ModuleSet {
    /// 空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 按配置构建：速度提供者总在最前，聚合物按开关加入
    pub fn from_config(config: &RunConfig) -> PvResult<Self> {
        let mut set = Self::new();
        set.push(PhysicsModuleKind::Hydro(HydroModule::new(config.hydro.clone())));
        if config.polymer.enabled {
            set.push(PhysicsModuleKind::Polymer(PolymerModule::from_config(&config.polymer)?));
        }
        Ok(set)
    }

    /// 追加模块
    pub fn push(&mut self, module: PhysicsModuleKind) {
        self.modules.push(module);
    }

    /// 全部模块（注册顺序）
    #[inline]
    pub fn modules(&self) -> &[PhysicsModuleKind] {
        &self.modules
    }

    /// 按名称查找
    pub fn get(&self, name: &str) -> Option<&PhysicsModuleKind> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// 聚合物模块
    pub fn polymer(&self) -> Option<&PolymerModule> {
        self.modules.iter().find_map(|m| match m {
            PhysicsModuleKind::Polymer(p) => Some(p),
            _ => None,
        })
    }

    /// 模块个数
    #[inline]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// 依次注册字段
    pub fn register_all(&mut self, registry: &mut FieldRegistry) -> PvResult<()> {
        for m in &mut self.modules {
            m.register(registry)?;
        }
        Ok(())
    }

    /// 依次初始化
    pub fn initialize_all(&self, f: &mut FArray) -> PvResult<()> {
        for m in &self.modules {
            m.initialize(f)?;
        }
        Ok(())
    }

    /// 解析 pencil 依赖
    pub fn resolve(
        &self,
        resolver: &PencilResolver,
        extra: PencilCriteria,
    ) -> PencilResult<PencilPlan> {
        resolver.resolve(&self.modules, extra)
    }

    /// 按注册顺序计算全部 pencil 量
    pub fn calc_pencils(&self, f: &FArray, pencil: Pencil, case: &mut PencilCase) -> PencilResult<()> {
        for m in &self.modules {
            m.calc_pencils(f, pencil, case)?;
        }
        Ok(())
    }

    /// 全部模块的右端项，随后施加外力
    pub fn dfdt(&self, case: &PencilCase, rhs: &mut PencilRhs<'_>) -> PencilResult<PencilReport> {
        let mut report = PencilReport::ZERO;
        for m in &self.modules {
            report += m.dfdt(case, rhs)?;
        }
        for m in &self.modules {
            m.apply_forces(rhs)?;
        }
        Ok(report)
    }

    /// 全部诊断声明
    pub fn diagnostics(&self) -> Vec<DiagnosticSpec> {
        self.modules.iter().flat_map(|m| m.diagnostics()).collect()
    }

    /// 采样诊断
    pub fn sample_diagnostics(&self, case: &PencilCase, set: &mut DiagnosticSet) -> PencilResult<()> {
        for m in &self.modules {
            m.sample_diagnostics(case, set)?;
        }
        Ok(())
    }

    /// 切片名称 → pencil 量
    pub fn slice_quantity(&self, name: &str) -> Option<PencilQuantity> {
        self.modules.iter().find_map(|m| m.slice_quantity(name))
    }

    /// 回显参数
    pub fn echo_params(&self) {
        for m in &self.modules {
            m.echo_params();
        }
    }
}
