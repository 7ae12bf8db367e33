// crates/pv_physics/src/engine/rhs.rs

//! 右端项计算：逐 pencil 扫描
//!
//! 每次求值：
//!
//! 1. 更新状态数组虚单元（周期）
//! 2. 清零导数累加数组 `df`
//! 3. 对每条内部 pencil：`case.begin → calc_pencils → dfdt → apply_forces`
//!
//! 并行路径按 `df` 的行（一行即一条 pencil，互不重叠）切分，
//! 每个 rayon 任务持有自己的 [`PencilCase`] 与外力缓冲，统计量在
//! 扫描结束后归约。串行路径逐行执行相同代码，`df` 结果逐位一致。

use rayon::prelude::*;

use pv_foundation::{PvResult, RunMetrics};

use super::time_integrator::RhsComputer;
use crate::diagnostics::{DiagnosticSet, DiagnosticSpec, Diagnostics};
use crate::grid::{Grid, Pencil};
use crate::modules::{ModuleSet, PencilReport, PencilRhs};
use crate::pencil::{PencilCase, PencilError, PencilPlan};
use crate::state::FArray;

/// 一次右端项求值的汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepSummary {
    /// 数值退化统计（各子步累加）
    pub report: PencilReport,
    /// 首个子步的退化统计，与诊断量取自同一状态
    pub first_stage: PencilReport,
    /// 处理的 pencil 数
    pub pencils: u64,
    /// 诊断量（未采样时为空）
    pub diagnostics: Diagnostics,
}

impl StepSummary {
    /// 合并同一时间步内后续子步的汇总
    ///
    /// `first_stage` 不变，诊断量保留首个非空结果。
    pub fn absorb(&mut self, other: StepSummary) {
        self.report += other.report;
        self.pencils += other.pencils;
        if self.diagnostics.is_empty() {
            self.diagnostics = other.diagnostics;
        }
    }
}

/// 工作线程的部分汇总
struct Partial {
    report: PencilReport,
    pencils: u64,
    diagnostics: DiagnosticSet,
}

impl Partial {
    fn empty(specs: &[DiagnosticSpec]) -> Self {
        Self { report: PencilReport::ZERO, pencils: 0, diagnostics: DiagnosticSet::new(specs) }
    }

    fn merge(mut self, other: Partial) -> Self {
        self.report += other.report;
        self.pencils += other.pencils;
        self.diagnostics.merge(&other.diagnostics);
        self
    }

    fn finish(self) -> StepSummary {
        StepSummary {
            report: self.report,
            first_stage: self.report,
            pencils: self.pencils,
            diagnostics: self.diagnostics.finalize(),
        }
    }
}

/// 单个工作线程的可复用缓冲
struct Worker {
    case: PencilCase,
    force: Vec<f64>,
    partial: Partial,
}

impl Worker {
    fn new(plan: &PencilPlan, nx: usize, specs: &[DiagnosticSpec]) -> Self {
        Self {
            case: PencilCase::new(plan, nx),
            force: vec![0.0; 3 * nx],
            partial: Partial::empty(specs),
        }
    }

    fn process(
        &mut self,
        modules: &ModuleSet,
        f: &FArray,
        pencil: Pencil,
        df_row: &mut [f64],
        sample: bool,
    ) -> Result<(), PencilError> {
        let nx = self.case.nx();
        self.case.begin(pencil);
        modules.calc_pencils(f, pencil, &mut self.case)?;

        self.force.fill(0.0);
        let mut rhs = PencilRhs::new(df_row, &mut self.force, f.nvar(), nx);
        self.partial.report += modules.dfdt(&self.case, &mut rhs)?;

        if sample {
            modules.sample_diagnostics(&self.case, &mut self.partial.diagnostics)?;
        }
        self.partial.pencils += 1;
        Ok(())
    }
}

/// 右端项求值器
pub struct RhsEvaluator {
    grid: Grid,
    modules: ModuleSet,
    plan: PencilPlan,
    specs: Vec<DiagnosticSpec>,
    parallel: bool,
    sample: bool,
    metrics: RunMetrics,
}

impl RhsEvaluator {
    /// 创建
    pub fn new(grid: Grid, modules: ModuleSet, plan: PencilPlan, parallel: bool) -> Self {
        let specs = modules.diagnostics();
        Self {
            grid,
            modules,
            plan,
            specs,
            parallel,
            sample: false,
            metrics: RunMetrics::new(),
        }
    }

    /// 设置下一步是否采样诊断量（仅第一个子步采样）
    pub fn set_sampling(&mut self, sample: bool) {
        self.sample = sample;
    }

    /// 切换并行/串行扫描
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// 模块集合
    #[inline]
    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// 解析计划
    #[inline]
    pub fn plan(&self) -> &PencilPlan {
        &self.plan
    }

    /// 运行指标
    #[inline]
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// 诊断声明
    #[inline]
    pub fn diagnostic_specs(&self) -> &[DiagnosticSpec] {
        &self.specs
    }

    fn sweep_sequential(&self, f: &FArray, df: &mut FArray, sample: bool) -> PvResult<StepSummary> {
        let row_len = df.row_len();
        let mut worker = Worker::new(&self.plan, self.grid.nx(), &self.specs);
        for (row, df_row) in df.data_mut().chunks_mut(row_len).enumerate() {
            if let Some(pencil) = self.grid.pencil_from_row(row) {
                worker.process(&self.modules, f, pencil, df_row, sample)?;
            }
        }
        Ok(worker.partial.finish())
    }

    fn sweep_parallel(&self, f: &FArray, df: &mut FArray, sample: bool) -> PvResult<StepSummary> {
        let row_len = df.row_len();
        let nx = self.grid.nx();
        let (grid, modules, plan, specs) = (&self.grid, &self.modules, &self.plan, &self.specs);

        let partial = df
            .data_mut()
            .par_chunks_mut(row_len)
            .enumerate()
            .try_fold(
                || Worker::new(plan, nx, specs),
                |mut worker, (row, df_row)| {
                    if let Some(pencil) = grid.pencil_from_row(row) {
                        worker.process(modules, f, pencil, df_row, sample)?;
                    }
                    Ok::<_, PencilError>(worker)
                },
            )
            .map(|worker| worker.map(|w| w.partial))
            .try_reduce(|| Partial::empty(specs), |a, b| Ok(a.merge(b)))?;
        Ok(partial.finish())
    }
}

impl RhsComputer for RhsEvaluator {
    fn compute_rhs(
        &mut self,
        state: &mut FArray,
        time: f64,
        output: &mut FArray,
        stage: u8,
    ) -> PvResult<StepSummary> {
        let _guard = self.metrics.rhs_timer.start();

        state.update_ghosts_periodic();
        output.fill(0.0);

        let sample = self.sample && stage == 0;
        let summary = if self.parallel {
            self.sweep_parallel(state, output, sample)?
        } else {
            self.sweep_sequential(state, output, sample)?
        };

        let m = &self.metrics;
        m.rhs_evals.inc();
        m.pencils.add(summary.pencils);
        m.clamp_events.add(summary.report.clamped);
        m.non_finite_events.add(summary.report.non_finite);
        m.non_psd_points.add(summary.report.non_psd);

        let r = &summary.report;
        if !r.is_clean() {
            log::warn!(
                "t={:.6} 子步 {}: 伸展因子截断 {} 点, 非有限导数 {} 点, 非半正定 {} 点",
                time,
                stage,
                r.clamped,
                r.non_finite,
                r.non_psd
            );
        }
        log::debug!("t={:.6} 子步 {}: {} 条 pencil", time, stage, summary.pencils);
        Ok(summary)
    }
}
