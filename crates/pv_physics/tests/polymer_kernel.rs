// crates/pv_physics/tests/polymer_kernel.rs

//! 构象张量演化核测试
//!
//! 直接向 pencil 缓存写入人工数据，检查 `evolve_pencil` 的逐点结果。

use pv_config::{PolymerConfig, PolymerModel};
use pv_physics::fields::FieldSlot;
use pv_physics::grid::NGHOST;
use pv_physics::modules::polymer::kernel::{evolve_pencil, extensibility_factor};
use pv_physics::modules::polymer::params::PolymerParams;
use pv_physics::modules::PencilRhs;
use pv_physics::pencil::{PencilCase, PencilCriteria, PencilError, PencilQuantity};
use pv_physics::tensor::sym_delta;

use PencilQuantity::*;

const NX: usize = 5;
const NVAR: usize = 6;
const SLOT: FieldSlot = FieldSlot { offset: 0, len: 6 };

fn params(cfg: PolymerConfig) -> PolymerParams {
    PolymerParams::from_config(&cfg).unwrap()
}

/// 逐点构象：对称正定，沿 pencil 变化
fn conformation(l: usize) -> [f64; 6] {
    let s = 0.1 * l as f64;
    [1.0 + s, 0.2 * s, -0.1, 1.5, 0.05 * s, 2.0 - s]
}

fn fill(case: &mut PencilCase, q: PencilQuantity, value: impl Fn(usize, usize) -> f64) {
    case.provide(q, |_, out| {
        for c in 0..q.components() {
            for l in 0..NX {
                out[c * NX + l] = value(c, l);
            }
        }
        Ok(())
    })
    .unwrap();
}

struct Output {
    df: Vec<f64>,
    force: Vec<f64>,
}

impl Output {
    fn new() -> Self {
        Self { df: vec![0.0; (NX + 2 * NGHOST) * NVAR], force: vec![0.0; 3 * NX] }
    }

    fn rhs(&mut self) -> PencilRhs<'_> {
        PencilRhs::new(&mut self.df, &mut self.force, NVAR, NX)
    }

    fn dc(&self, l: usize, k: usize) -> f64 {
        self.df[(NGHOST + l) * NVAR + k]
    }
}

#[test]
fn test_relaxation_only_is_exact() {
    // ∇u = 0 且无平流：dC/dt = −(C − I)/τ
    let p = params(PolymerConfig {
        tau: 0.7,
        advection: false,
        feedback: false,
        ..Default::default()
    });
    let planned = PencilCriteria::of(&[Conformation, VelocityGradient, ScaledConformation]);
    let mut case = PencilCase::with_criteria(planned, NX);
    fill(&mut case, Conformation, |k, l| conformation(l)[k]);
    fill(&mut case, VelocityGradient, |_, _| 0.0);
    fill(&mut case, ScaledConformation, |k, l| conformation(l)[k]);

    let mut out = Output::new();
    let report = evolve_pencil(&case, &p, SLOT, &mut out.rhs()).unwrap();
    assert!(report.is_clean());
    for l in 0..NX {
        let c = conformation(l);
        for k in 0..6 {
            assert_eq!(out.dc(l, k), -(c[k] - sym_delta(k)) / 0.7);
        }
    }
    // 虚单元不被写入
    assert!(out.df[..NGHOST * NVAR].iter().all(|&v| v == 0.0));
    assert!(out.force.iter().all(|&v| v == 0.0));
}

fn full_case(p: &PolymerParams) -> PencilCase {
    let planned = PencilCriteria::of(&[
        Conformation,
        VelocityGradient,
        ConformationTrace,
        ScaledConformation,
        AdvectedConformation,
        ConformationLaplacian,
        ScaledConformationDivergence,
    ]);
    let mut case = PencilCase::with_criteria(planned, NX);
    fill(&mut case, Conformation, |k, l| conformation(l)[k]);
    fill(&mut case, VelocityGradient, |c, l| 0.3 * (c as f64 - 4.0) + 0.01 * l as f64);
    fill(&mut case, ConformationTrace, |_, l| {
        let c = conformation(l);
        c[0] + c[3] + c[5]
    });
    let scale = if p.is_fene_p() { 1.05 } else { 1.0 };
    fill(&mut case, ScaledConformation, |k, l| scale * conformation(l)[k]);
    fill(&mut case, AdvectedConformation, |k, l| 0.01 * (k + l) as f64);
    fill(&mut case, ConformationLaplacian, |k, l| -0.02 * (k * l) as f64);
    fill(&mut case, ScaledConformationDivergence, |i, l| 0.5 - 0.1 * (i + l) as f64);
    case
}

#[test]
fn test_kernel_deterministic() {
    let p = params(PolymerConfig {
        model: PolymerModel::FeneP,
        eta_p: 0.2,
        diffusion: true,
        diffusivity: 0.01,
        ..Default::default()
    });
    let case = full_case(&p);

    let mut a = Output::new();
    let mut b = Output::new();
    let ra = evolve_pencil(&case, &p, SLOT, &mut a.rhs()).unwrap();
    let rb = evolve_pencil(&case, &p, SLOT, &mut b.rhs()).unwrap();
    assert_eq!(ra, rb);
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a.df), bits(&b.df));
    assert_eq!(a.force, b.force);

    // 反馈 F_i = (η_p/τ) ∂_j(f C_ij)
    for i in 0..3 {
        for l in 0..NX {
            let expect = 0.2 * (0.5 - 0.1 * (i + l) as f64);
            assert!((a.force[i * NX + l] - expect).abs() < 1e-15);
        }
    }
}

#[test]
fn test_trace_at_max_extension_is_clamped() {
    let p = params(PolymerConfig {
        model: PolymerModel::FeneP,
        max_extension: 4.0,
        eta_p: 0.1,
        stretching: false,
        advection: false,
        ..Default::default()
    });
    // l = 1, 3 处 tr C = L²，其余为平衡态
    let trace = |l: usize| if l % 2 == 1 { 16.0 } else { 3.0 };
    let f = |l: usize| extensibility_factor(trace(l), &p).value;
    let planned =
        PencilCriteria::of(&[ConformationTrace, ScaledConformation, ScaledConformationDivergence]);
    let mut case = PencilCase::with_criteria(planned, NX);
    fill(&mut case, ConformationTrace, |_, l| trace(l));
    fill(&mut case, ScaledConformation, |k, l| f(l) * trace(l) / 3.0 * sym_delta(k));
    fill(&mut case, ScaledConformationDivergence, |i, l| 0.01 * f(l) * (i + 1) as f64);

    let mut out = Output::new();
    let report = evolve_pencil(&case, &p, SLOT, &mut out.rhs()).unwrap();
    assert_eq!(report.clamped, 2);
    assert_eq!(report.non_finite, 0);
    assert!(out.df.iter().all(|v| v.is_finite()));
    assert!(out.force.iter().all(|v| v.is_finite()));

    // 截断后 f = (L² − 3)/(floor·L²) 有界
    let f_max = 13.0 / p.denominator_floor();
    assert_eq!(f(1), f_max);
    assert!(f_max < 100.0);
    for l in 0..NX {
        let fc = f(l) * trace(l) / 3.0;
        assert_eq!(out.dc(l, 0), -(fc - 1.0) / p.tau);
        assert_eq!(out.dc(l, 1), 0.0);
        for i in 0..3 {
            let expect = p.feedback_coefficient() * (0.01 * f(l) * (i + 1) as f64);
            assert_eq!(out.force[i * NX + l], expect);
        }
    }
    assert_eq!(out.dc(0, 0), 0.0);
}

#[test]
fn test_non_finite_derivative_is_skipped() {
    let p = params(PolymerConfig {
        stretching: false,
        advection: false,
        feedback: false,
        ..Default::default()
    });
    let mut case = PencilCase::with_criteria(PencilCriteria::of(&[ScaledConformation]), NX);
    fill(&mut case, ScaledConformation, |k, l| if l == 2 && k == 4 { f64::NAN } else { 1.0 });

    let mut out = Output::new();
    let report = evolve_pencil(&case, &p, SLOT, &mut out.rhs()).unwrap();
    assert_eq!(report.non_finite, 1);
    for k in 0..6 {
        assert_eq!(out.dc(2, k), 0.0);
    }
    assert_eq!(out.dc(1, 0), 0.0);
    assert_eq!(out.dc(1, 1), -1.0);
}

#[test]
fn test_non_psd_counted() {
    let p = params(PolymerConfig {
        relaxation: false,
        advection: false,
        feedback: false,
        ..Default::default()
    });
    let mut case =
        PencilCase::with_criteria(PencilCriteria::of(&[Conformation, VelocityGradient]), NX);
    fill(&mut case, Conformation, |k, l| if l == 0 && k == 3 { -1.0 } else { sym_delta(k) });
    fill(&mut case, VelocityGradient, |_, _| 0.0);

    let mut out = Output::new();
    let report = evolve_pencil(&case, &p, SLOT, &mut out.rhs()).unwrap();
    assert_eq!(report.non_psd, 1);
}

#[test]
fn test_missing_pencil_is_error() {
    let p = params(PolymerConfig::default());
    // 伸展项需要 Conformation 与 VelocityGradient，但缓存只计划了前者
    let mut case = PencilCase::with_criteria(PencilCriteria::of(&[Conformation]), NX);
    fill(&mut case, Conformation, |k, _| sym_delta(k));

    let mut out = Output::new();
    let err = evolve_pencil(&case, &p, SLOT, &mut out.rhs()).unwrap_err();
    assert_eq!(err, PencilError::MissingPencil { quantity: VelocityGradient });
    assert!(!err.is_config());
}

#[test]
fn test_shear_stretching_of_isotropic_state() {
    // u_x = S y：∂_y u_x = S，行主序 g[i*3+j] = ∂_j u_i
    let s = 0.25;
    let p = params(PolymerConfig {
        relaxation: false,
        advection: false,
        feedback: false,
        ..Default::default()
    });
    let mut case =
        PencilCase::with_criteria(PencilCriteria::of(&[Conformation, VelocityGradient]), NX);
    fill(&mut case, Conformation, |k, _| sym_delta(k));
    fill(&mut case, VelocityGradient, |c, _| if c == 1 { s } else { 0.0 });

    let mut out = Output::new();
    evolve_pencil(&case, &p, SLOT, &mut out.rhs()).unwrap();
    for l in 0..NX {
        assert_eq!(out.dc(l, 1), s);
        for k in [0, 2, 3, 4, 5] {
            assert_eq!(out.dc(l, k), 0.0);
        }
    }
}
