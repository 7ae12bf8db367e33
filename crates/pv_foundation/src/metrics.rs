// crates/pv_foundation/src/metrics.rs

//! 运行时指标收集
//!
//! 提供线程安全的计数器与计时器。pencil 扫描在 rayon 工作线程中并行执行，
//! 数值退化事件（截断、非有限值、非正定）通过原子计数器汇总，
//! 不引入锁。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 原子计数器
#[derive(Debug)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// 创建零值计数器
    pub const fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// 增加计数
    #[inline]
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// 增加指定值
    #[inline]
    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// 获取当前值
    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// 重置为零
    #[inline]
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// 计时器
// =============================================================================

/// 累积计时器
#[derive(Debug)]
pub struct Timer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Timer {
    /// 创建新计时器
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// 开始计时，返回守卫
    ///
    /// ```rust
    /// use pv_foundation::metrics::Timer;
    ///
    /// let timer = Timer::new();
    /// {
    ///     let _guard = timer.start();
    /// }
    /// assert_eq!(timer.count(), 1);
    /// ```
    pub fn start(&self) -> TimerGuard<'_> {
        TimerGuard {
            timer: self,
            start: Instant::now(),
        }
    }

    fn record(&self, elapsed: Duration) {
        self.total_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取总时间（秒）
    pub fn total_sec(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1_000_000_000.0
    }

    /// 获取调用次数
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// 重置计时器
    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// 计时守卫
///
/// 当守卫被 drop 时，自动记录时间。
pub struct TimerGuard<'a> {
    timer: &'a Timer,
    start: Instant,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed());
    }
}

// =============================================================================
// 运行指标
// =============================================================================

/// 求解运行指标
///
/// 全部字段可在并行扫描中通过 `&self` 更新。
#[derive(Debug, Default)]
pub struct RunMetrics {
    /// 右端项计算次数（每个 RK 子步一次）
    pub rhs_evals: Counter,
    /// 已处理 pencil 数
    pub pencils: Counter,
    /// 伸展因子截断次数（逐点累计）
    pub clamp_events: Counter,
    /// 非有限导数被置零的点数
    pub non_finite_events: Counter,
    /// 构象张量非半正定的点数
    pub non_psd_points: Counter,
    /// 右端项计算耗时
    pub rhs_timer: Timer,
}

/// 运行指标快照
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// 右端项计算次数
    pub rhs_evals: u64,
    /// 已处理 pencil 数
    pub pencils: u64,
    /// 伸展因子截断次数
    pub clamp_events: u64,
    /// 非有限导数点数
    pub non_finite_events: u64,
    /// 非半正定点数
    pub non_psd_points: u64,
    /// 右端项总耗时（秒）
    pub rhs_time_sec: f64,
}

impl RunMetrics {
    /// 创建空指标
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rhs_evals: self.rhs_evals.get(),
            pencils: self.pencils.get(),
            clamp_events: self.clamp_events.get(),
            non_finite_events: self.non_finite_events.get(),
            non_psd_points: self.non_psd_points.get(),
            rhs_time_sec: self.rhs_timer.total_sec(),
        }
    }

    /// 重置全部指标
    pub fn reset(&self) {
        self.rhs_evals.reset();
        self.pencils.reset();
        self.clamp_events.reset();
        self.non_finite_events.reset();
        self.non_psd_points.reset();
        self.rhs_timer.reset();
    }
}
