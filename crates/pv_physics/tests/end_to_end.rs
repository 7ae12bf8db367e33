// crates/pv_physics/tests/end_to_end.rs

//! 端到端测试：配置 → 启动 → 推进 → 诊断

use pv_config::{
    GridConfig, HydroConfig, IntegratorKind, PolymerConfig, PolymerInit, PolymerModel, RunConfig,
    TimeConfig, VelocityInit,
};
use pv_physics::engine::{RhsComputer, RhsEvaluator, Simulation};
use pv_physics::fields::FieldRegistry;
use pv_physics::grid::Grid;
use pv_physics::modules::ModuleSet;
use pv_physics::pencil::{PencilCriteria, PencilResolver};
use pv_physics::state::FArray;
use pv_physics::tensor::SymTensor3;

fn small_grid(n: usize) -> GridConfig {
    GridConfig { nx: n, ny: n, nz: n, ..Default::default() }
}

fn equilibrium_config(model: PolymerModel, integrator: IntegratorKind) -> RunConfig {
    RunConfig {
        grid: small_grid(8),
        hydro: HydroConfig::default(),
        polymer: PolymerConfig {
            model,
            tau: 1.0,
            eta_p: 0.1,
            init: PolymerInit::Isotropic,
            init_amplitude: 1.0,
            ..Default::default()
        },
        time: TimeConfig { dt: 0.01, n_steps: 1, integrator, ..Default::default() },
    }
}

/// 手动搭建求值器，返回 (状态, 求值器)
fn evaluator(config: &RunConfig) -> (FArray, RhsEvaluator) {
    let grid = Grid::from_config(&config.grid).unwrap();
    let mut modules = ModuleSet::from_config(config).unwrap();
    let mut registry = FieldRegistry::new();
    modules.register_all(&mut registry).unwrap();
    let mut state = FArray::new(&grid, registry.nvar());
    modules.initialize_all(&mut state).unwrap();
    let plan = modules.resolve(&PencilResolver::new(), PencilCriteria::EMPTY).unwrap();
    (state, RhsEvaluator::new(grid, modules, plan, config.time.parallel))
}

#[test]
fn test_equilibrium_is_steady() {
    for model in [PolymerModel::OldroydB, PolymerModel::FeneP] {
        let config = equilibrium_config(model, IntegratorKind::ForwardEuler);
        let mut sim = Simulation::from_config(config).unwrap();
        let before = sim.state().clone();
        sim.step().unwrap();

        let poly = sim.registry().slot("poly").unwrap();
        let uu = sim.registry().slot("uu").unwrap();
        let state = sim.state();
        for (l, m, n) in state.interior_points() {
            for (k, expect) in [1.0, 0.0, 0.0, 1.0, 0.0, 1.0].into_iter().enumerate() {
                assert_eq!(state.get(l, m, n, poly.var(k)), expect);
            }
            for i in 0..3 {
                assert_eq!(state.get(l, m, n, uu.var(i)), 0.0);
            }
        }
        for (l, m, n) in state.interior_points() {
            for v in 0..state.nvar() {
                assert_eq!(state.get(l, m, n, v), before.get(l, m, n, v));
            }
        }
    }
}

#[test]
fn test_equilibrium_rhs_and_force_are_zero() {
    let config = equilibrium_config(PolymerModel::FeneP, IntegratorKind::ForwardEuler);
    let (mut state, mut rhs) = evaluator(&config);
    let mut df = FArray::new(state.grid(), state.nvar());
    let summary = rhs.compute_rhs(&mut state, 0.0, &mut df, 0).unwrap();

    // uu 的右端项即弹性外力
    assert!(df.data().iter().all(|&v| v == 0.0));
    assert!(summary.report.is_clean());
    assert_eq!(summary.pencils, 64);
}

#[test]
fn test_parallel_matches_sequential() {
    let config = RunConfig {
        grid: small_grid(8),
        hydro: HydroConfig {
            init: VelocityInit::TaylorGreen,
            amplitude: 1.0,
            wavenumber: 1.0,
            ..Default::default()
        },
        polymer: PolymerConfig {
            model: PolymerModel::FeneP,
            eta_p: 0.1,
            tau: 0.5,
            max_extension: 5.0,
            diffusion: true,
            diffusivity: 0.01,
            init: PolymerInit::Perturbed,
            init_amplitude: 2.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let (mut state, mut rhs) = evaluator(&config);
    let mut seq = FArray::new(state.grid(), state.nvar());
    let mut par = FArray::new(state.grid(), state.nvar());

    rhs.set_parallel(false);
    let a = rhs.compute_rhs(&mut state, 0.0, &mut seq, 0).unwrap();
    rhs.set_parallel(true);
    let b = rhs.compute_rhs(&mut state, 0.0, &mut par, 0).unwrap();

    let bits = |f: &FArray| f.data().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&seq), bits(&par));
    assert_eq!(a.report, b.report);
    assert_eq!(a.pencils, b.pencils);
    assert!(seq.data().iter().any(|&v| v != 0.0));
    assert_eq!(rhs.metrics().rhs_evals.get(), 2);
}

#[test]
fn test_relaxation_of_stretched_state() {
    let config = RunConfig {
        grid: small_grid(4),
        polymer: PolymerConfig {
            tau: 1.0,
            init: PolymerInit::Stretched,
            init_amplitude: 1.0,
            ..Default::default()
        },
        time: TimeConfig {
            dt: 0.01,
            n_steps: 10,
            integrator: IntegratorKind::SspRk3,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut sim = Simulation::from_config(config).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.steps(), 10);
    assert!((sim.time() - 0.1).abs() < 1e-12);

    let poly = sim.registry().slot("poly").unwrap();
    let expect = 1.0 + (-0.1f64).exp();
    for (l, m, n) in sim.state().interior_points() {
        assert!((sim.state().get(l, m, n, poly.var(0)) - expect).abs() < 1e-8);
        assert_eq!(sim.state().get(l, m, n, poly.var(3)), 1.0);
    }
    assert_eq!(sim.metrics_snapshot().rhs_evals, 30);
}

#[test]
fn test_diagnostics_and_slices() {
    let config = equilibrium_config(PolymerModel::FeneP, IntegratorKind::SspRk3);
    let mut sim = Simulation::from_config(config).unwrap();
    sim.step().unwrap();

    assert_eq!(sim.diagnostic("trpm"), Some(3.0));
    assert_eq!(sim.diagnostic("trpmax"), Some(3.0));
    assert_eq!(sim.diagnostic("frm"), Some(1.0));
    assert_eq!(sim.diagnostic("poly_clamps"), Some(0.0));
    assert_eq!(sim.diagnostic("poly_nonpsd"), Some(0.0));
    assert_eq!(sim.diagnostic("bogus"), None);

    let trp = sim.slice("trp").unwrap();
    assert_eq!(trp.len(), 8 * 8 * 8);
    assert!(trp.iter().all(|&t| t == 3.0));
    let fr = sim.slice("fr").unwrap();
    assert!(fr.iter().all(|&f| f == 1.0));
    assert!(sim.slice("nope").is_err());
}

#[test]
fn test_clamp_events_reach_diagnostics() {
    // tr C = 3·a 超过 L² = 4，三个子步都被截断
    let config = RunConfig {
        grid: small_grid(4),
        polymer: PolymerConfig {
            model: PolymerModel::FeneP,
            max_extension: 2.0,
            init: PolymerInit::Isotropic,
            init_amplitude: 2.0,
            ..Default::default()
        },
        time: TimeConfig { dt: 1e-4, integrator: IntegratorKind::SspRk3, ..Default::default() },
        ..Default::default()
    };
    let mut sim = Simulation::from_config(config).unwrap();
    for step in 1..=2u64 {
        let summary = sim.step().unwrap();
        assert_eq!(summary.report.clamped, 3 * 64);
        assert_eq!(summary.first_stage.clamped, 64);
        // 诊断量为本步首个子步的计数，不随步数累加
        assert_eq!(sim.diagnostic("poly_clamps"), Some(64.0));
        assert_eq!(sim.metrics_snapshot().clamp_events, step * 3 * 64);
    }
}

#[test]
fn test_saturated_state_stays_positive_definite() {
    // tr C = L² = 16：分母截断后 f 有界，松弛不会把 C 推出正定锥
    let config = RunConfig {
        grid: small_grid(4),
        polymer: PolymerConfig {
            model: PolymerModel::FeneP,
            max_extension: 4.0,
            eta_p: 0.1,
            init: PolymerInit::Isotropic,
            init_amplitude: 16.0 / 3.0,
            ..Default::default()
        },
        time: TimeConfig { dt: 1e-3, integrator: IntegratorKind::SspRk3, ..Default::default() },
        ..Default::default()
    };
    let mut sim = Simulation::from_config(config).unwrap();
    let summary = sim.step().unwrap();
    assert_eq!(summary.first_stage.clamped, 64);
    assert_eq!(summary.report.non_finite, 0);
    assert_eq!(summary.report.non_psd, 0);

    let poly = sim.registry().slot("poly").unwrap();
    let state = sim.state();
    for (l, m, n) in state.interior_points() {
        let c = SymTensor3(std::array::from_fn(|k| state.get(l, m, n, poly.var(k))));
        assert!(c.is_positive_semidefinite());
        assert!(c.is_finite());
        // 向平衡态松弛，但一步内不越过
        let c11 = c.get(0, 0);
        assert!(c11 < 16.0 / 3.0 && c11 > 1.0, "C11 = {}", c11);
    }
    assert_eq!(sim.diagnostic("poly_nonpsd"), Some(0.0));
}

#[test]
fn test_polymer_disabled_runs() {
    let config = RunConfig {
        grid: small_grid(4),
        polymer: PolymerConfig { enabled: false, ..Default::default() },
        time: TimeConfig { n_steps: 3, parallel: false, ..Default::default() },
        ..Default::default()
    };
    let mut sim = Simulation::from_config(config).unwrap();
    sim.run().unwrap();
    assert!(sim.diagnostics().is_empty());
    assert!(sim.plan().needed().is_empty());
    assert_eq!(sim.registry().nvar(), 3);
}

#[test]
fn test_invalid_config_fails_at_setup() {
    let config = RunConfig {
        polymer: PolymerConfig { tau: -1.0, ..Default::default() },
        ..Default::default()
    };
    let err = Simulation::from_config(config).err().unwrap();
    assert!(err.is_config());

    let config = RunConfig {
        polymer: PolymerConfig {
            model: PolymerModel::FeneP,
            max_extension: 1.5,
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(Simulation::from_config(config).err().unwrap().is_config());
}

#[test]
fn test_from_json_config() {
    let json = r#"{
        "grid": {"nx": 4, "ny": 4, "nz": 4},
        "polymer": {"model": "fene_p", "eta_p": 0.1, "init": "isotropic"},
        "time": {"dt": 0.01, "n_steps": 2, "integrator": "forward_euler"}
    }"#;
    let config = RunConfig::from_json_str(json).unwrap();
    let mut sim = Simulation::from_config(config).unwrap();
    sim.run().unwrap();
    assert_eq!(sim.integrator_name(), "ForwardEuler");
    assert_eq!(sim.diagnostic("trpm"), Some(3.0));
}
