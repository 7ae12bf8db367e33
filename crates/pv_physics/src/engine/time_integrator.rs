// crates/pv_physics/src/engine/time_integrator.rs

//! 显式时间积分器（固定步长）
//!
//! ### 前向欧拉
//!
//! ```text
//! U^{n+1} = U^n + Δt L(U^n)
//! ```
//!
//! ### SSP-RK3 (Shu-Osher)
//!
//! ```text
//! U^{(1)} = U^n + Δt L(U^n)
//! U^{(2)} = 3/4 U^n + 1/4 (U^{(1)} + Δt L(U^{(1)}))
//! U^{n+1} = 1/3 U^n + 2/3 (U^{(2)} + Δt L(U^{(2)}))
//! ```
//!
//! 实现采用等价的增量形式，`L = 0` 时状态逐位不变：
//!
//! ```text
//! U^{(1)} = U^n + Δt k1
//! U^{(2)} = U^n + Δt/4 (k1 + k2)
//! U^{n+1} = U^n + Δt/6 k1 + Δt/6 k2 + 2Δt/3 k3
//! ```
//!
//! 参考：Gottlieb, Shu & Tadmor (2001), SIAM Review 43(1), 89-112.

use pv_config::IntegratorKind;
use pv_foundation::PvResult;

use super::rhs::StepSummary;
use crate::grid::Grid;
use crate::state::FArray;

/// 右端项计算器
pub trait RhsComputer {
    /// 计算 `output = L(state)`
    ///
    /// `state` 可变仅用于更新虚单元；`stage` 为子步序号（从 0 起）。
    fn compute_rhs(
        &mut self,
        state: &mut FArray,
        time: f64,
        output: &mut FArray,
        stage: u8,
    ) -> PvResult<StepSummary>;
}

/// 时间积分器
pub trait TimeIntegrator {
    /// 名称
    fn name(&self) -> &'static str;

    /// 精度阶数
    fn order(&self) -> u8;

    /// 子步数
    fn stages(&self) -> u8;

    /// 推进一个时间步
    fn advance<R: RhsComputer>(
        &mut self,
        state: &mut FArray,
        time: f64,
        dt: f64,
        rhs: &mut R,
    ) -> PvResult<StepSummary>;
}

/// 一阶前向欧拉
pub struct ForwardEuler {
    k1: FArray,
}

impl ForwardEuler {
    /// 创建
    pub fn new(grid: &Grid, nvar: usize) -> Self {
        Self { k1: FArray::new(grid, nvar) }
    }
}

impl TimeIntegrator for ForwardEuler {
    fn name(&self) -> &'static str {
        "ForwardEuler"
    }

    fn order(&self) -> u8 {
        1
    }

    fn stages(&self) -> u8 {
        1
    }

    fn advance<R: RhsComputer>(
        &mut self,
        state: &mut FArray,
        time: f64,
        dt: f64,
        rhs: &mut R,
    ) -> PvResult<StepSummary> {
        let summary = rhs.compute_rhs(state, time, &mut self.k1, 0)?;
        state.add_scaled(&self.k1, dt)?;
        Ok(summary)
    }
}

/// 三阶 SSP Runge-Kutta
pub struct SspRk3 {
    stage: FArray,
    k1: FArray,
    k2: FArray,
    k3: FArray,
}

impl SspRk3 {
    /// 创建
    pub fn new(grid: &Grid, nvar: usize) -> Self {
        Self {
            stage: FArray::new(grid, nvar),
            k1: FArray::new(grid, nvar),
            k2: FArray::new(grid, nvar),
            k3: FArray::new(grid, nvar),
        }
    }
}

impl TimeIntegrator for SspRk3 {
    fn name(&self) -> &'static str {
        "SSP-RK3"
    }

    fn order(&self) -> u8 {
        3
    }

    fn stages(&self) -> u8 {
        3
    }

    fn advance<R: RhsComputer>(
        &mut self,
        state: &mut FArray,
        time: f64,
        dt: f64,
        rhs: &mut R,
    ) -> PvResult<StepSummary> {
        let mut summary = rhs.compute_rhs(state, time, &mut self.k1, 0)?;

        self.stage.copy_from(state)?;
        self.stage.add_scaled(&self.k1, dt)?;
        summary.absorb(rhs.compute_rhs(&mut self.stage, time + dt, &mut self.k2, 1)?);

        self.stage.copy_from(state)?;
        self.stage.add_scaled(&self.k1, 0.25 * dt)?;
        self.stage.add_scaled(&self.k2, 0.25 * dt)?;
        summary.absorb(rhs.compute_rhs(&mut self.stage, time + 0.5 * dt, &mut self.k3, 2)?);

        state.add_scaled(&self.k1, dt / 6.0)?;
        state.add_scaled(&self.k2, dt / 6.0)?;
        state.add_scaled(&self.k3, 2.0 * dt / 3.0)?;
        Ok(summary)
    }
}

/// 积分器枚举分发
pub enum IntegratorEnum {
    /// 前向欧拉
    ForwardEuler(ForwardEuler),
    /// SSP-RK3
    SspRk3(SspRk3),
}

impl IntegratorEnum {
    /// 名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::ForwardEuler(i) => i.name(),
            Self::SspRk3(i) => i.name(),
        }
    }

    /// 精度阶数
    pub fn order(&self) -> u8 {
        match self {
            Self::ForwardEuler(i) => i.order(),
            Self::SspRk3(i) => i.order(),
        }
    }

    /// 子步数
    pub fn stages(&self) -> u8 {
        match self {
            Self::ForwardEuler(i) => i.stages(),
            Self::SspRk3(i) => i.stages(),
        }
    }

    /// 推进一个时间步
    pub fn advance<R: RhsComputer>(
        &mut self,
        state: &mut FArray,
        time: f64,
        dt: f64,
        rhs: &mut R,
    ) -> PvResult<StepSummary> {
        match self {
            Self::ForwardEuler(i) => i.advance(state, time, dt, rhs),
            Self::SspRk3(i) => i.advance(state, time, dt, rhs),
        }
    }
}

/// 按配置创建积分器
pub fn create_integrator(kind: IntegratorKind, grid: &Grid, nvar: usize) -> IntegratorEnum {
    match kind {
        IntegratorKind::ForwardEuler => IntegratorEnum::ForwardEuler(ForwardEuler::new(grid, nvar)),
        IntegratorKind::SspRk3 => IntegratorEnum::SspRk3(SspRk3::new(grid, nvar)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::NGHOST;

    /// dU/dt = λU（逐点）
    struct Decay {
        lambda: f64,
        calls: Vec<(f64, u8)>,
    }

    impl RhsComputer for Decay {
        fn compute_rhs(
            &mut self,
            state: &mut FArray,
            time: f64,
            output: &mut FArray,
            stage: u8,
        ) -> PvResult<StepSummary> {
            self.calls.push((time, stage));
            for (o, &u) in output.data_mut().iter_mut().zip(state.data()) {
                *o = self.lambda * u;
            }
            Ok(StepSummary { pencils: 1, ..Default::default() })
        }
    }

    fn one_point() -> (Grid, FArray) {
        let grid = Grid::new(1, 1, 1, 1.0, 1.0, 1.0).unwrap();
        let mut f = FArray::new(&grid, 1);
        f.set(NGHOST, NGHOST, NGHOST, 0, 1.0);
        (grid, f)
    }

    #[test]
    fn test_forward_euler() {
        let (grid, mut f) = one_point();
        let mut rhs = Decay { lambda: -2.0, calls: vec![] };
        let mut integrator = create_integrator(IntegratorKind::ForwardEuler, &grid, 1);
        integrator.advance(&mut f, 0.0, 0.1, &mut rhs).unwrap();
        assert!((f.get(NGHOST, NGHOST, NGHOST, 0) - 0.8).abs() < 1e-15);
        assert_eq!(rhs.calls, vec![(0.0, 0)]);
        assert_eq!(integrator.order(), 1);
    }

    #[test]
    fn test_ssp_rk3_third_order() {
        // 单步误差 ~ O(Δt⁴)
        let (grid, mut f) = one_point();
        let mut rhs = Decay { lambda: -1.0, calls: vec![] };
        let mut integrator = create_integrator(IntegratorKind::SspRk3, &grid, 1);
        let dt = 0.1;
        let summary = integrator.advance(&mut f, 1.0, dt, &mut rhs).unwrap();
        let exact = (-dt).exp();
        let taylor3 = 1.0 - dt + dt * dt / 2.0 - dt * dt * dt / 6.0;
        let u = f.get(NGHOST, NGHOST, NGHOST, 0);
        assert!((u - taylor3).abs() < 1e-15);
        assert!((u - exact).abs() < 1e-5);
        assert_eq!(rhs.calls, vec![(1.0, 0), (1.1, 1), (1.05, 2)]);
        assert_eq!(summary.pencils, 3);
        assert_eq!(integrator.name(), "SSP-RK3");
        assert_eq!(integrator.stages(), 3);
    }

    #[test]
    fn test_zero_rhs_is_bit_exact() {
        let (grid, mut f) = one_point();
        f.set(NGHOST, NGHOST, NGHOST, 0, 0.1 + 0.2);
        let before = f.clone();
        let mut rhs = Decay { lambda: 0.0, calls: vec![] };
        let mut integrator = create_integrator(IntegratorKind::SspRk3, &grid, 1);
        integrator.advance(&mut f, 0.0, 0.37, &mut rhs).unwrap();
        assert_eq!(f, before);
    }
}
