// crates/pv_physics/src/modules/hydro.rs

//! 速度提供者
//!
//! 注册速度场 `uu` 并提供速度相关的 pencil 量。自身演化仅为
//! 施加外力累加器（运动学模式下速度冻结）。

use pv_config::{HydroConfig, VelocityInit};
use pv_foundation::{PvError, PvResult};

use super::{PencilReport, PencilRhs, PhysicsModule};
use crate::derivatives::der;
use crate::fields::{FieldMeta, FieldRegistry, FieldSlot};
use crate::grid::{Direction, Pencil};
use crate::pencil::{
    PencilCase, PencilCriteria, PencilDeclaration, PencilError, PencilQuantity, PencilResult,
};
use crate::state::FArray;

use PencilQuantity::*;

const PROVIDED: [PencilQuantity; 3] = [Velocity, VelocityFirstDerivatives, VelocityGradient];

/// 速度模块
#[derive(Debug, Clone)]
pub struct HydroModule {
    config: HydroConfig,
    slot: Option<FieldSlot>,
}

impl HydroModule {
    /// 模块名
    pub const NAME: &'static str = "hydro";

    /// 创建
    pub fn new(config: HydroConfig) -> Self {
        Self { config, slot: None }
    }

    /// 速度槽位
    pub fn slot(&self) -> PencilResult<FieldSlot> {
        self.slot.ok_or_else(|| PencilError::Unregistered { module: Self::NAME.to_string() })
    }

    /// 某点初始速度
    fn initial_velocity(&self, x: [f64; 3]) -> [f64; 3] {
        let c = &self.config;
        let (a, k) = (c.amplitude, c.wavenumber);
        match c.init {
            VelocityInit::Zero => [0.0; 3],
            VelocityInit::Uniform => c.velocity,
            VelocityInit::Shear => [a * (k * x[1]).sin(), 0.0, 0.0],
            VelocityInit::TaylorGreen => [
                a * (k * x[0]).sin() * (k * x[1]).cos() * (k * x[2]).cos(),
                -a * (k * x[0]).cos() * (k * x[1]).sin() * (k * x[2]).cos(),
                0.0,
            ],
        }
    }
}

impl PencilDeclaration for HydroModule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn pencil_criteria(&self, _criteria: &mut PencilCriteria) {}

    fn pencil_interdep(&self, q: PencilQuantity) -> &'static [PencilQuantity] {
        match q {
            VelocityGradient => &[VelocityFirstDerivatives],
            _ => &[],
        }
    }

    fn provided_pencils(&self) -> PencilCriteria {
        PencilCriteria::of(&PROVIDED)
    }
}

impl PhysicsModule for HydroModule {
    fn register(&mut self, registry: &mut FieldRegistry) -> PvResult<()> {
        self.slot = Some(registry.register(FieldMeta::vector3d("uu").with_desc("速度 u"))?);
        Ok(())
    }

    fn initialize(&self, f: &mut FArray) -> PvResult<()> {
        let slot = self.slot()?;
        if self.config.init == VelocityInit::Zero {
            // 新分配的数组已为零
            return Ok(());
        }
        let grid = f.grid().clone();
        let points: Vec<_> = f.interior_points().collect();
        for (l, m, n) in points {
            let x = [
                grid.coord(Direction::X, l),
                grid.coord(Direction::Y, m),
                grid.coord(Direction::Z, n),
            ];
            let u = self.initial_velocity(x);
            if u.iter().any(|v| !v.is_finite()) {
                return Err(PvError::invalid_input("初始速度非有限值"));
            }
            for (i, &ui) in u.iter().enumerate() {
                f.set(l, m, n, slot.var(i), ui);
            }
        }
        log::info!("速度场初始化: {:?}", self.config.init);
        Ok(())
    }

    fn calc_pencils(&self, f: &FArray, pencil: Pencil, case: &mut PencilCase) -> PencilResult<()> {
        let slot = self.slot()?;
        let nx = case.nx();

        if case.wants(Velocity) {
            case.provide(Velocity, |_, out| {
                for i in 0..3 {
                    for (l, o) in out[i * nx..(i + 1) * nx].iter_mut().enumerate() {
                        *o = f.pencil_value(pencil, l, slot.var(i));
                    }
                }
                Ok(())
            })?;
        }

        if case.wants(VelocityFirstDerivatives) {
            case.provide(VelocityFirstDerivatives, |_, out| {
                for dir in Direction::ALL {
                    let j = dir.index();
                    for i in 0..3 {
                        let k = j * 3 + i;
                        der(f, pencil, slot.var(i), dir, &mut out[k * nx..(k + 1) * nx]);
                    }
                }
                Ok(())
            })?;
        }

        if case.wants(VelocityGradient) {
            case.provide(VelocityGradient, |view, out| {
                let du = view.get(VelocityFirstDerivatives)?;
                for i in 0..3 {
                    for j in 0..3 {
                        let src = &du[(j * 3 + i) * nx..(j * 3 + i + 1) * nx];
                        out[(i * 3 + j) * nx..(i * 3 + j + 1) * nx].copy_from_slice(src);
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    fn dfdt(&self, _case: &PencilCase, _rhs: &mut PencilRhs<'_>) -> PencilResult<PencilReport> {
        Ok(PencilReport::ZERO)
    }

    fn apply_forces(&self, rhs: &mut PencilRhs<'_>) -> PencilResult<()> {
        if self.config.kinematic {
            return Ok(());
        }
        let slot = self.slot()?;
        for i in 0..3 {
            for l in 0..rhs.nx() {
                let fi = rhs.force(i)[l];
                rhs.add(l, slot.var(i), fi);
            }
        }
        Ok(())
    }

    fn echo_params(&self) {
        log::info!(
            "hydro: init={:?}, amplitude={}, wavenumber={}, kinematic={}",
            self.config.init,
            self.config.amplitude,
            self.config.wavenumber,
            self.config.kinematic
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, NGHOST};
    use std::f64::consts::TAU;

    fn setup(config: HydroConfig) -> (HydroModule, FArray) {
        let mut module = HydroModule::new(config);
        let mut registry = FieldRegistry::new();
        module.register(&mut registry).unwrap();
        let grid = Grid::new(16, 16, 4, TAU, TAU, TAU).unwrap();
        let mut f = FArray::new(&grid, registry.nvar());
        module.initialize(&mut f).unwrap();
        f.update_ghosts_periodic();
        (module, f)
    }

    #[test]
    fn test_shear_gradient() {
        let (module, f) = setup(HydroConfig {
            init: VelocityInit::Shear,
            amplitude: 2.0,
            ..Default::default()
        });
        let mut case =
            PencilCase::with_criteria(PencilCriteria::of(&PROVIDED), f.grid().nx());
        let pencil = Pencil { m: NGHOST + 5, n: NGHOST + 1 };
        case.begin(pencil);
        module.calc_pencils(&f, pencil, &mut case).unwrap();

        let y = f.grid().coord(Direction::Y, pencil.m);
        // L_xy = ∂u_x/∂y = a·cos(y)
        let lxy = case.component(VelocityGradient, 1).unwrap();
        let raw = case.component(VelocityFirstDerivatives, 3).unwrap();
        for l in 0..f.grid().nx() {
            assert!((lxy[l] - 2.0 * y.cos()).abs() < 1e-4);
            assert_eq!(lxy[l], raw[l]);
        }
        // 其余分量为零
        assert!(case.component(VelocityGradient, 3).unwrap().iter().all(|&v| v == 0.0));
        let ux = case.component(Velocity, 0).unwrap();
        assert!((ux[0] - 2.0 * y.sin()).abs() < 1e-14);
    }

    #[test]
    fn test_only_planned_quantities_written() {
        let (module, f) = setup(HydroConfig::default());
        let mut case =
            PencilCase::with_criteria(PencilCriteria::of(&[Velocity]), f.grid().nx());
        let pencil = Pencil { m: NGHOST, n: NGHOST };
        case.begin(pencil);
        module.calc_pencils(&f, pencil, &mut case).unwrap();
        assert_eq!(case.written(), PencilCriteria::of(&[Velocity]));
    }

    #[test]
    fn test_apply_forces_respects_kinematic() {
        let nx = 4;
        for (kinematic, expected) in [(false, 1.5), (true, 0.0)] {
            let (module, _) = setup(HydroConfig { kinematic, ..Default::default() });
            let mut df = vec![0.0; (nx + 2 * NGHOST) * 3];
            let mut force = vec![0.0; 3 * nx];
            force[nx + 2] = 1.5;
            let mut rhs = PencilRhs::new(&mut df, &mut force, 3, nx);
            module.apply_forces(&mut rhs).unwrap();
            assert_eq!(rhs.df(2, 1), expected);
        }
    }

    #[test]
    fn test_unregistered_slot() {
        let module = HydroModule::new(HydroConfig::default());
        assert!(matches!(module.slot(), Err(PencilError::Unregistered { .. })));
    }
}
