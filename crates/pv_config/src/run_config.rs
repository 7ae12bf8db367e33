// crates/pv_config/src/run_config.rs

//! RunConfig - 运行配置（全 f64）
//!
//! 汇总网格、流场、聚合物与时间推进参数。JSON 中缺省的任何键
//! 都取确定的默认值，因此 `{}` 是一个合法配置。

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::path::Path;

use crate::error::ConfigError;
use crate::polymer_config::PolymerConfig;

/// 运行配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// 网格参数
    #[serde(default)]
    pub grid: GridConfig,

    /// 流场参数
    #[serde(default)]
    pub hydro: HydroConfig,

    /// 聚合物参数
    #[serde(default)]
    pub polymer: PolymerConfig,

    /// 时间推进参数
    #[serde(default)]
    pub time: TimeConfig,
}

/// 网格配置（周期盒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// x 方向内部点数
    #[serde(default = "default_n")]
    pub nx: usize,
    /// y 方向内部点数
    #[serde(default = "default_n")]
    pub ny: usize,
    /// z 方向内部点数
    #[serde(default = "default_n")]
    pub nz: usize,
    /// x 方向盒长
    #[serde(default = "default_length")]
    pub lx: f64,
    /// y 方向盒长
    #[serde(default = "default_length")]
    pub ly: f64,
    /// z 方向盒长
    #[serde(default = "default_length")]
    pub lz: f64,
}

fn default_n() -> usize { 16 }
fn default_length() -> f64 { TAU }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            nx: default_n(),
            ny: default_n(),
            nz: default_n(),
            lx: default_length(),
            ly: default_length(),
            lz: default_length(),
        }
    }
}

/// 速度场初始条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VelocityInit {
    /// 静止
    #[default]
    Zero,
    /// 均匀来流 `velocity`
    Uniform,
    /// 剪切流 u_x = a·sin(k·y)
    Shear,
    /// Taylor-Green 涡
    TaylorGreen,
}

/// 流场配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydroConfig {
    /// 初始速度场
    #[serde(default)]
    pub init: VelocityInit,
    /// 均匀流速度
    #[serde(default)]
    pub velocity: [f64; 3],
    /// 剪切/涡幅值
    #[serde(default)]
    pub amplitude: f64,
    /// 波数
    #[serde(default = "default_wavenumber")]
    pub wavenumber: f64,
    /// 运动学模式：速度场冻结，不受外力更新
    #[serde(default)]
    pub kinematic: bool,
}

fn default_wavenumber() -> f64 { 1.0 }

impl Default for HydroConfig {
    fn default() -> Self {
        Self {
            init: VelocityInit::default(),
            velocity: [0.0; 3],
            amplitude: 0.0,
            wavenumber: default_wavenumber(),
            kinematic: false,
        }
    }
}

/// 时间积分器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// 一阶前向欧拉
    ForwardEuler,
    /// 三阶 SSP Runge-Kutta
    #[default]
    SspRk3,
}

/// 时间推进配置（固定步长）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 时间步长
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// 步数
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,
    /// 积分器
    #[serde(default)]
    pub integrator: IntegratorKind,
    /// 是否并行扫描 pencil
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// 诊断采样间隔（步）
    #[serde(default = "default_diag_every")]
    pub diag_every: usize,
}

fn default_dt() -> f64 { 1e-3 }
fn default_n_steps() -> usize { 10 }
fn default_parallel() -> bool { true }
fn default_diag_every() -> usize { 1 }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            n_steps: default_n_steps(),
            integrator: IntegratorKind::default(),
            parallel: default_parallel(),
            diag_every: default_diag_every(),
        }
    }
}

impl RunConfig {
    /// 从 JSON 字符串解析并验证
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// 序列化为格式化 JSON（运行日志回显）
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 将参数回显到日志
    pub fn echo(&self) {
        match self.to_json_pretty() {
            Ok(json) => log::info!("运行参数:\n{}", json),
            Err(e) => log::warn!("运行参数回显失败: {}", e),
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.grid;
        for (key, n) in [("grid.nx", g.nx), ("grid.ny", g.ny), ("grid.nz", g.nz)] {
            if n == 0 {
                return Err(ConfigError::invalid(key, n, "网格点数必须为正"));
            }
        }
        for (key, l) in [("grid.lx", g.lx), ("grid.ly", g.ly), ("grid.lz", g.lz)] {
            if !(l > 0.0 && l.is_finite()) {
                return Err(ConfigError::invalid(key, l, "盒长必须为正"));
            }
        }

        if !(self.time.dt > 0.0 && self.time.dt.is_finite()) {
            return Err(ConfigError::invalid("time.dt", self.time.dt, "时间步长必须为正"));
        }
        if self.time.diag_every == 0 {
            return Err(ConfigError::invalid("time.diag_every", 0, "采样间隔必须 >= 1"));
        }

        if !self.hydro.amplitude.is_finite() || self.hydro.velocity.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::invalid("hydro", "non-finite", "速度参数必须为有限值"));
        }

        self.polymer.validate()
    }
}
