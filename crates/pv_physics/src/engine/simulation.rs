// crates/pv_physics/src/engine/simulation.rs

//! 运行驱动
//!
//! 启动流程：验证并回显配置 → 网格 → 模块注册 → 初始条件 →
//! pencil 依赖解析 → 积分器。之后 [`Simulation::step`] 以固定步长推进。

use pv_config::RunConfig;
use pv_foundation::{MetricsSnapshot, PvError, PvResult, RunMetrics};

use super::rhs::{RhsEvaluator, StepSummary};
use super::time_integrator::{create_integrator, IntegratorEnum};
use crate::diagnostics::Diagnostics;
use crate::fields::FieldRegistry;
use crate::grid::Grid;
use crate::modules::ModuleSet;
use crate::pencil::{PencilCase, PencilCriteria, PencilPlan, PencilResolver};
use crate::state::FArray;

/// 单次运行
pub struct Simulation {
    config: RunConfig,
    grid: Grid,
    registry: FieldRegistry,
    state: FArray,
    integrator: IntegratorEnum,
    evaluator: RhsEvaluator,
    time: f64,
    step: usize,
    diagnostics: Diagnostics,
}

impl Simulation {
    /// 按配置完成启动阶段
    pub fn from_config(config: RunConfig) -> PvResult<Self> {
        config.validate()?;
        config.echo();

        let grid = Grid::from_config(&config.grid)?;
        let mut modules = ModuleSet::from_config(&config)?;

        let mut registry = FieldRegistry::new();
        modules.register_all(&mut registry)?;
        let nvar = registry.nvar();
        modules.echo_params();

        let mut state = FArray::new(&grid, nvar);
        modules.initialize_all(&mut state)?;
        state.update_ghosts_periodic();

        let plan = modules.resolve(&PencilResolver::new(), PencilCriteria::EMPTY)?;
        let integrator = create_integrator(config.time.integrator, &grid, nvar);
        log::info!(
            "启动完成: 网格 {}x{}x{}, {} 个变量, 积分器 {} ({} 阶)",
            grid.nx(),
            grid.ny(),
            grid.nz(),
            nvar,
            integrator.name(),
            integrator.order()
        );

        let evaluator = RhsEvaluator::new(grid.clone(), modules, plan, config.time.parallel);
        Ok(Self {
            config,
            grid,
            registry,
            state,
            integrator,
            evaluator,
            time: 0.0,
            step: 0,
            diagnostics: Diagnostics::default(),
        })
    }

    /// 推进一个时间步
    pub fn step(&mut self) -> PvResult<StepSummary> {
        let dt = self.config.time.dt;
        let sample = self.step % self.config.time.diag_every == 0;
        self.evaluator.set_sampling(sample);

        let summary = self.integrator.advance(&mut self.state, self.time, dt, &mut self.evaluator)?;
        self.time += dt;
        self.step += 1;

        if sample {
            self.diagnostics = summary.diagnostics.clone();
            // 与其他诊断量一致，只统计本步首个子步；累计值见 metrics()
            if self.evaluator.modules().polymer().is_some() {
                let stage = summary.first_stage;
                self.diagnostics.insert("poly_clamps", stage.clamped as f64);
                self.diagnostics.insert("poly_nonpsd", stage.non_psd as f64);
            }
        }
        log::debug!("步 {} 完成, t = {:.6}", self.step, self.time);
        Ok(summary)
    }

    /// 按配置步数推进
    pub fn run(&mut self) -> PvResult<()> {
        for _ in 0..self.config.time.n_steps {
            self.step()?;
        }
        let s = self.metrics().snapshot();
        log::info!(
            "运行结束: {} 步, t = {:.6}, 右端项 {} 次 ({:.3} s), 截断 {} 点, 非半正定 {} 点",
            self.step,
            self.time,
            s.rhs_evals,
            s.rhs_time_sec,
            s.clamp_events,
            s.non_psd_points
        );
        Ok(())
    }

    /// 切换并行扫描
    pub fn set_parallel(&mut self, parallel: bool) {
        self.evaluator.set_parallel(parallel);
    }

    /// 输出切片：按名称计算内部点上的值（x 最快变化）
    pub fn slice(&mut self, name: &str) -> PvResult<Vec<f64>> {
        let modules = self.evaluator.modules();
        let quantity = modules
            .slice_quantity(name)
            .ok_or_else(|| PvError::invalid_input(format!("未知切片: {}", name)))?;
        let plan = modules.resolve(&PencilResolver::new(), PencilCriteria::of(&[quantity]))?;

        self.state.update_ghosts_periodic();
        let mut case = PencilCase::new(&plan, self.grid.nx());
        let mut out = Vec::with_capacity(self.grid.nx() * self.grid.ny() * self.grid.nz());
        for pencil in self.grid.pencils() {
            case.begin(pencil);
            modules.calc_pencils(&self.state, pencil, &mut case)?;
            out.extend_from_slice(case.component(quantity, 0)?);
        }
        Ok(out)
    }

    /// 状态数组
    #[inline]
    pub fn state(&self) -> &FArray {
        &self.state
    }

    /// 可变状态数组
    #[inline]
    pub fn state_mut(&mut self) -> &mut FArray {
        &mut self.state
    }

    /// 网格
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// 字段注册表
    #[inline]
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// 解析计划
    #[inline]
    pub fn plan(&self) -> &PencilPlan {
        self.evaluator.plan()
    }

    /// 模块集合
    #[inline]
    pub fn modules(&self) -> &ModuleSet {
        self.evaluator.modules()
    }

    /// 积分器名称
    #[inline]
    pub fn integrator_name(&self) -> &'static str {
        self.integrator.name()
    }

    /// 最近一次采样的诊断量
    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// 按名称读取诊断量
    pub fn diagnostic(&self, name: &str) -> Option<f64> {
        self.diagnostics.get(name)
    }

    /// 当前时间
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// 已完成步数
    #[inline]
    pub fn steps(&self) -> usize {
        self.step
    }

    /// 运行指标
    #[inline]
    pub fn metrics(&self) -> &RunMetrics {
        self.evaluator.metrics()
    }

    /// 运行指标快照
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.evaluator.metrics().snapshot()
    }

    /// 配置
    #[inline]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }
}
