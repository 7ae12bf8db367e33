// crates/pv_physics/src/modules/polymer/kernel.rs

//! 构象张量演化核
//!
//! 逐点计算
//!
//! ```text
//! dC/dt = [L·C + C·Lᵀ] − (f·C − I)/τ − u·∇C + κ∇²C
//! F_i  += (η_p/τ) ∂_j (f C_ij)
//! ```
//!
//! 只读 pencil 缓存，不分配内存，不保留跨 pencil 状态。

use pv_foundation::float::all_finite;

use super::params::PolymerParams;
use crate::fields::FieldSlot;
use crate::modules::{PencilReport, PencilRhs};
use crate::pencil::{PencilCase, PencilQuantity, PencilResult};
use crate::tensor::{stretching, sym_delta, velocity_gradient, SymTensor3};

use PencilQuantity::*;

/// 伸展因子
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extensibility {
    /// f
    pub value: f64,
    /// 分母是否被截断
    pub clamped: bool,
}

/// 伸展因子 f(tr C)
///
/// Oldroyd-B 恒为 1；FENE-P 为 `(L² − 3)/(L² − tr C)`，分母低于
/// `floor·L²`（含负值与非有限迹）时取 `floor·L²`。
#[inline]
pub fn extensibility_factor(trace: f64, params: &PolymerParams) -> Extensibility {
    if !params.is_fene_p() {
        return Extensibility { value: 1.0, clamped: false };
    }
    let l2 = params.l2();
    let floor = params.denominator_floor();
    let denom = l2 - trace;
    // NaN 比较为 false，同样走截断分支
    if trace.is_finite() && denom >= floor {
        Extensibility { value: (l2 - 3.0) / denom, clamped: false }
    } else {
        Extensibility { value: (l2 - 3.0) / floor, clamped: true }
    }
}

/// df/d(tr C) = f² / (L² − 3)；截断点与 Oldroyd-B 为 0
#[inline]
pub fn extensibility_slope(trace: f64, params: &PolymerParams) -> f64 {
    let f = extensibility_factor(trace, params);
    if !params.is_fene_p() || f.clamped {
        return 0.0;
    }
    f.value * f.value / (params.l2() - 3.0)
}

/// 在一条 pencil 上计算 dC/dt 与弹性应力散度
pub fn evolve_pencil(
    case: &PencilCase,
    params: &PolymerParams,
    slot: FieldSlot,
    rhs: &mut PencilRhs<'_>,
) -> PencilResult<PencilReport> {
    let nx = case.nx();
    let mut report = PencilReport::ZERO;

    let poly = if params.stretching { Some(case.get(Conformation)?) } else { None };
    let uij = if params.stretching { Some(case.get(VelocityGradient)?) } else { None };
    let frc = if params.relaxation { Some(case.get(ScaledConformation)?) } else { None };
    let adv = if params.advection { Some(case.get(AdvectedConformation)?) } else { None };
    let del2 = if params.diffusion { Some(case.get(ConformationLaplacian)?) } else { None };
    let divfrc = if params.feedback_active() {
        Some(case.get(ScaledConformationDivergence)?)
    } else {
        None
    };

    // 退化统计只依赖已在缓存中的量
    let trace = case.get(ConformationTrace).ok().filter(|_| params.is_fene_p());
    let conformation = case.get(Conformation).ok();

    let tau = params.tau;
    let kappa = params.diffusivity;
    let coef = params.feedback_coefficient();

    for l in 0..nx {
        let mut dc = [0.0f64; 6];

        if let (Some(poly), Some(uij)) = (poly, uij) {
            let c = SymTensor3(std::array::from_fn(|k| poly[k * nx + l]));
            let g = velocity_gradient(std::array::from_fn(|k| uij[k * nx + l]));
            dc = stretching(&g, &c).0;
        }

        if let Some(frc) = frc {
            for (k, d) in dc.iter_mut().enumerate() {
                *d -= (frc[k * nx + l] - sym_delta(k)) / tau;
            }
        }

        if let Some(adv) = adv {
            for (k, d) in dc.iter_mut().enumerate() {
                *d -= adv[k * nx + l];
            }
        }

        if let Some(del2) = del2 {
            for (k, d) in dc.iter_mut().enumerate() {
                *d += kappa * del2[k * nx + l];
            }
        }

        if all_finite(&dc) {
            for (k, &d) in dc.iter().enumerate() {
                rhs.add(l, slot.var(k), d);
            }
        } else {
            report.non_finite += 1;
        }

        if let Some(divfrc) = divfrc {
            let force: [f64; 3] = std::array::from_fn(|i| coef * divfrc[i * nx + l]);
            if all_finite(&force) {
                for (i, &fi) in force.iter().enumerate() {
                    rhs.add_force(i, l, fi);
                }
            } else {
                report.non_finite += 1;
            }
        }

        if let Some(trace) = trace {
            if extensibility_factor(trace[l], params).clamped {
                report.clamped += 1;
            }
        }
        if let Some(poly) = conformation {
            let c = SymTensor3(std::array::from_fn(|k| poly[k * nx + l]));
            if !c.is_positive_semidefinite() {
                report.non_psd += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_config::{PolymerConfig, PolymerModel};

    fn fene_p(l: f64) -> PolymerParams {
        PolymerParams::from_config(&PolymerConfig {
            model: PolymerModel::FeneP,
            max_extension: l,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_oldroyd_b_factor_is_one() {
        let p = PolymerParams::from_config(&PolymerConfig::default()).unwrap();
        for tr in [0.0, 3.0, 1e6, f64::NAN] {
            assert_eq!(extensibility_factor(tr, &p), Extensibility { value: 1.0, clamped: false });
            assert_eq!(extensibility_slope(tr, &p), 0.0);
        }
    }

    #[test]
    fn test_fene_p_equilibrium() {
        let p = fene_p(10.0);
        let f = extensibility_factor(3.0, &p);
        assert_eq!(f.value, 1.0);
        assert!(!f.clamped);
        assert!((extensibility_slope(3.0, &p) - 1.0 / 97.0).abs() < 1e-15);
    }

    #[test]
    fn test_fene_p_clamp_at_max_extension() {
        let p = fene_p(10.0);
        for tr in [100.0, 150.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let f = extensibility_factor(tr, &p);
            assert!(f.clamped, "tr = {}", tr);
            assert!(f.value.is_finite());
            assert_eq!(f.value, 97.0 / p.denominator_floor());
            assert!((f.value - 97.0).abs() < 1e-12);
            assert_eq!(extensibility_slope(tr, &p), 0.0);
        }
    }

    #[test]
    fn test_slope_matches_finite_difference() {
        let p = fene_p(5.0);
        let tr = 10.0;
        let h = 1e-6;
        let fd = (extensibility_factor(tr + h, &p).value - extensibility_factor(tr - h, &p).value)
            / (2.0 * h);
        assert!((extensibility_slope(tr, &p) - fd).abs() < 1e-6);
    }
}
