// crates/pv_physics/src/modules/polymer/mod.rs

//! 粘弹性聚合物模块
//!
//! 演化对称构象张量 `C`（字段 `poly`，6 分量），并将弹性应力散度
//! 反馈到动量方程。
//!
//! # pencil 依赖
//!
//! ```text
//! ScaledConformationDivergence ─> ExtensibilityGradient ─> ExtensibilityFactor ─> ConformationTrace ─> Conformation
//!            │                          └──> ConformationGradient
//!            └──> ConformationDivergence ─> ConformationGradient
//! AdvectedConformation ─> Velocity, ConformationGradient
//! ScaledConformation   ─> Conformation, ExtensibilityFactor
//! ```

pub mod kernel;
pub mod params;

use pv_config::{PolymerConfig, PolymerInit};
use pv_foundation::PvResult;

use self::kernel::{evolve_pencil, extensibility_factor, extensibility_slope};
use self::params::PolymerParams;
use super::{PencilReport, PencilRhs, PhysicsModule};
use crate::derivatives::{der, der2, der2_add};
use crate::diagnostics::{DiagnosticKind, DiagnosticSet, DiagnosticSpec};
use crate::fields::{FieldMeta, FieldRegistry, FieldSlot};
use crate::grid::{Direction, Pencil};
use crate::pencil::{
    PencilCase, PencilCriteria, PencilDeclaration, PencilError, PencilQuantity, PencilResult,
};
use crate::state::FArray;
use crate::tensor::{SYM_DIAGONAL, SYM_INDEX};

use PencilQuantity::*;

const PROVIDED: [PencilQuantity; 10] = [
    Conformation,
    ConformationTrace,
    ExtensibilityFactor,
    ExtensibilityGradient,
    ScaledConformation,
    ConformationGradient,
    ConformationDivergence,
    AdvectedConformation,
    ScaledConformationDivergence,
    ConformationLaplacian,
];

/// 可用诊断量
pub const POLYMER_DIAGNOSTICS: [DiagnosticSpec; 3] = [
    DiagnosticSpec { name: "trpm", kind: DiagnosticKind::Mean, description: "<tr C>" },
    DiagnosticSpec { name: "trpmax", kind: DiagnosticKind::Max, description: "max(tr C)" },
    DiagnosticSpec { name: "frm", kind: DiagnosticKind::Mean, description: "<f(tr C)>" },
];

/// 聚合物模块
#[derive(Debug, Clone)]
pub struct PolymerModule {
    params: PolymerParams,
    init: PolymerInit,
    init_amplitude: f64,
    diagnostics: Vec<DiagnosticSpec>,
    slot: Option<FieldSlot>,
}

impl PolymerModule {
    /// 模块名
    pub const NAME: &'static str = "polymer";

    /// 从配置创建（参数先验证）
    pub fn from_config(cfg: &PolymerConfig) -> PvResult<Self> {
        let params = PolymerParams::from_config(cfg)?;
        let mut diagnostics = Vec::new();
        for name in &cfg.diagnostics {
            match POLYMER_DIAGNOSTICS.iter().find(|d| d.name == name.as_str()) {
                Some(spec) => diagnostics.push(*spec),
                None => log::warn!("忽略未知的聚合物诊断量 '{}'", name),
            }
        }
        Ok(Self {
            params,
            init: cfg.init,
            init_amplitude: cfg.init_amplitude,
            diagnostics,
            slot: None,
        })
    }

    /// 模型参数
    #[inline]
    pub fn params(&self) -> &PolymerParams {
        &self.params
    }

    /// 构象张量槽位
    pub fn slot(&self) -> PencilResult<FieldSlot> {
        self.slot.ok_or_else(|| PencilError::Unregistered { module: Self::NAME.to_string() })
    }

    /// 某点初始构象（对称正定，`Nothing` 返回 `None`）
    fn initial_conformation(&self, x: [f64; 3], lengths: [f64; 3]) -> Option<[f64; 6]> {
        let a = self.init_amplitude;
        match self.init {
            PolymerInit::Nothing => None,
            PolymerInit::Zero => Some([0.0; 6]),
            PolymerInit::Isotropic => Some([a, 0.0, 0.0, a, 0.0, a]),
            PolymerInit::Stretched => Some([1.0 + a, 0.0, 0.0, 1.0, 0.0, 1.0]),
            PolymerInit::Perturbed => {
                // 对角元取指数形式，任意幅值下保持正定
                let eps = 0.1 * a;
                let mut c = [0.0; 6];
                for (d, &k) in SYM_DIAGONAL.iter().enumerate() {
                    let phase = std::f64::consts::TAU * x[d] / lengths[d];
                    c[k] = (eps * phase.sin()).exp();
                }
                Some(c)
            }
        }
    }

    fn calc_conformation(
        &self,
        f: &FArray,
        pencil: Pencil,
        slot: FieldSlot,
        case: &mut PencilCase,
    ) -> PencilResult<()> {
        let nx = case.nx();
        let params = &self.params;

        if case.wants(Conformation) {
            case.provide(Conformation, |_, out| {
                for k in 0..6 {
                    for (l, o) in out[k * nx..(k + 1) * nx].iter_mut().enumerate() {
                        *o = f.pencil_value(pencil, l, slot.var(k));
                    }
                }
                Ok(())
            })?;
        }

        if case.wants(ConformationTrace) {
            case.provide(ConformationTrace, |view, out| {
                let poly = view.get(Conformation)?;
                for (l, o) in out.iter_mut().enumerate() {
                    *o = poly[l] + poly[3 * nx + l] + poly[5 * nx + l];
                }
                Ok(())
            })?;
        }

        if case.wants(ExtensibilityFactor) {
            case.provide(ExtensibilityFactor, |view, out| {
                let trace = view.get(ConformationTrace)?;
                for (o, &tr) in out.iter_mut().zip(trace) {
                    *o = extensibility_factor(tr, params).value;
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    fn calc_gradients(
        &self,
        f: &FArray,
        pencil: Pencil,
        slot: FieldSlot,
        case: &mut PencilCase,
    ) -> PencilResult<()> {
        let nx = case.nx();
        let params = &self.params;

        if case.wants(ConformationGradient) {
            case.provide(ConformationGradient, |_, out| {
                for dir in Direction::ALL {
                    for ij in 0..6 {
                        let k = dir.index() * 6 + ij;
                        der(f, pencil, slot.var(ij), dir, &mut out[k * nx..(k + 1) * nx]);
                    }
                }
                Ok(())
            })?;
        }

        if case.wants(ConformationDivergence) {
            case.provide(ConformationDivergence, |view, out| {
                let cijk = view.get(ConformationGradient)?;
                for i in 0..3 {
                    for (l, o) in out[i * nx..(i + 1) * nx].iter_mut().enumerate() {
                        *o = (0..3).map(|j| cijk[(j * 6 + SYM_INDEX[i][j]) * nx + l]).sum();
                    }
                }
                Ok(())
            })?;
        }

        if case.wants(ExtensibilityGradient) {
            case.provide(ExtensibilityGradient, |view, out| {
                let trace = view.get(ConformationTrace)?;
                let cijk = view.get(ConformationGradient)?;
                for l in 0..nx {
                    let slope = extensibility_slope(trace[l], params);
                    for k in 0..3 {
                        let grad_tr: f64 =
                            SYM_DIAGONAL.iter().map(|&d| cijk[(k * 6 + d) * nx + l]).sum();
                        out[k * nx + l] = slope * grad_tr;
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    fn calc_transport(
        &self,
        f: &FArray,
        pencil: Pencil,
        slot: FieldSlot,
        case: &mut PencilCase,
    ) -> PencilResult<()> {
        let nx = case.nx();

        if case.wants(ScaledConformation) {
            case.provide(ScaledConformation, |view, out| {
                let poly = view.get(Conformation)?;
                let fr = view.get(ExtensibilityFactor)?;
                for k in 0..6 {
                    for l in 0..nx {
                        out[k * nx + l] = fr[l] * poly[k * nx + l];
                    }
                }
                Ok(())
            })?;
        }

        if case.wants(AdvectedConformation) {
            case.provide(AdvectedConformation, |view, out| {
                let uu = view.get(Velocity)?;
                let cijk = view.get(ConformationGradient)?;
                for ij in 0..6 {
                    for l in 0..nx {
                        out[ij * nx + l] =
                            (0..3).map(|k| uu[k * nx + l] * cijk[(k * 6 + ij) * nx + l]).sum();
                    }
                }
                Ok(())
            })?;
        }

        if case.wants(ScaledConformationDivergence) {
            case.provide(ScaledConformationDivergence, |view, out| {
                let poly = view.get(Conformation)?;
                let fr = view.get(ExtensibilityFactor)?;
                let grad_fr = view.get(ExtensibilityGradient)?;
                let divc = view.get(ConformationDivergence)?;
                // ∂_j(f C_ij) = f ∂_j C_ij + C_ij ∂_j f
                for i in 0..3 {
                    for l in 0..nx {
                        let cgradf: f64 = (0..3)
                            .map(|j| poly[SYM_INDEX[i][j] * nx + l] * grad_fr[j * nx + l])
                            .sum();
                        out[i * nx + l] = fr[l] * divc[i * nx + l] + cgradf;
                    }
                }
                Ok(())
            })?;
        }

        if case.wants(ConformationLaplacian) {
            case.provide(ConformationLaplacian, |_, out| {
                for ij in 0..6 {
                    let dst = &mut out[ij * nx..(ij + 1) * nx];
                    der2(f, pencil, slot.var(ij), Direction::X, dst);
                    der2_add(f, pencil, slot.var(ij), Direction::Y, dst);
                    der2_add(f, pencil, slot.var(ij), Direction::Z, dst);
                }
                Ok(())
            })?;
        }
        Ok(())
    }
}

impl PencilDeclaration for PolymerModule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn pencil_criteria(&self, criteria: &mut PencilCriteria) {
        let p = &self.params;
        if p.stretching {
            criteria.insert(Conformation);
            criteria.insert(VelocityGradient);
        }
        if p.relaxation {
            criteria.insert(ScaledConformation);
        }
        if p.advection {
            criteria.insert(AdvectedConformation);
        }
        if p.diffusion {
            criteria.insert(ConformationLaplacian);
        }
        if p.feedback_active() {
            criteria.insert(ScaledConformationDivergence);
        }
        if !self.diagnostics.is_empty() {
            criteria.insert(ConformationTrace);
            criteria.insert(ExtensibilityFactor);
        }
    }

    fn pencil_interdep(&self, q: PencilQuantity) -> &'static [PencilQuantity] {
        match q {
            ConformationTrace => &[Conformation],
            ExtensibilityFactor => &[ConformationTrace],
            ExtensibilityGradient => &[ExtensibilityFactor, ConformationTrace, ConformationGradient],
            ScaledConformation => &[Conformation, ExtensibilityFactor],
            ConformationDivergence => &[ConformationGradient],
            AdvectedConformation => &[Velocity, ConformationGradient],
            ScaledConformationDivergence => &[
                Conformation,
                ExtensibilityFactor,
                ExtensibilityGradient,
                ConformationDivergence,
            ],
            _ => &[],
        }
    }

    fn provided_pencils(&self) -> PencilCriteria {
        PencilCriteria::of(&PROVIDED)
    }
}

impl PhysicsModule for PolymerModule {
    fn register(&mut self, registry: &mut FieldRegistry) -> PvResult<()> {
        let slot = registry.register(
            FieldMeta::sym_tensor3d("poly").with_desc("构象张量 [C11, C12, C13, C22, C23, C33]"),
        )?;
        registry.register_slice("trp")?;
        registry.register_slice("fr")?;
        self.slot = Some(slot);
        Ok(())
    }

    fn initialize(&self, f: &mut FArray) -> PvResult<()> {
        let slot = self.slot()?;
        let grid = f.grid().clone();
        let lengths = [
            grid.length(Direction::X),
            grid.length(Direction::Y),
            grid.length(Direction::Z),
        ];
        let points: Vec<_> = f.interior_points().collect();
        for (l, m, n) in points {
            let x = [
                grid.coord(Direction::X, l),
                grid.coord(Direction::Y, m),
                grid.coord(Direction::Z, n),
            ];
            let Some(c) = self.initial_conformation(x, lengths) else {
                return Ok(());
            };
            for (k, &v) in c.iter().enumerate() {
                f.set(l, m, n, slot.var(k), v);
            }
        }
        log::info!("构象张量初始化: {:?}, 幅值 {}", self.init, self.init_amplitude);
        Ok(())
    }

    fn calc_pencils(&self, f: &FArray, pencil: Pencil, case: &mut PencilCase) -> PencilResult<()> {
        let slot = self.slot()?;
        self.calc_conformation(f, pencil, slot, case)?;
        self.calc_gradients(f, pencil, slot, case)?;
        self.calc_transport(f, pencil, slot, case)
    }

    fn dfdt(&self, case: &PencilCase, rhs: &mut PencilRhs<'_>) -> PencilResult<PencilReport> {
        evolve_pencil(case, &self.params, self.slot()?, rhs)
    }

    fn diagnostics(&self) -> Vec<DiagnosticSpec> {
        self.diagnostics.clone()
    }

    fn sample_diagnostics(&self, case: &PencilCase, set: &mut DiagnosticSet) -> PencilResult<()> {
        for spec in &self.diagnostics {
            let q = match spec.name {
                "trpm" | "trpmax" => ConformationTrace,
                _ => ExtensibilityFactor,
            };
            set.push_slice(spec.name, case.get(q)?);
        }
        Ok(())
    }

    fn slice_quantity(&self, name: &str) -> Option<PencilQuantity> {
        match name {
            "trp" => Some(ConformationTrace),
            "fr" => Some(ExtensibilityFactor),
            _ => None,
        }
    }

    fn echo_params(&self) {
        let p = &self.params;
        log::info!(
            "polymer: model={}, tau={}, eta_p={}, L={}, stretching={}, relaxation={}, \
             advection={}, diffusion={} (kappa={}), feedback={}",
            p.model.name(),
            p.tau,
            p.eta_p,
            p.max_extension,
            p.stretching,
            p.relaxation,
            p.advection,
            p.diffusion,
            p.diffusivity,
            p.feedback_active()
        );
    }
}
