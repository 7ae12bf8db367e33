// crates/pv_physics/src/modules/polymer/params.rs

//! 聚合物模型参数（启动后只读）

use pv_config::{PolymerConfig, PolymerModel};
use pv_foundation::PvResult;

/// 聚合物模型参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolymerParams {
    /// 本构闭合
    pub model: PolymerModel,
    /// 松弛时间 τ
    pub tau: f64,
    /// 粘度比 η_p
    pub eta_p: f64,
    /// 最大伸长 L
    pub max_extension: f64,
    /// 伸展项开关
    pub stretching: bool,
    /// 松弛项开关
    pub relaxation: bool,
    /// 平流项开关
    pub advection: bool,
    /// 扩散项开关
    pub diffusion: bool,
    /// 扩散系数 κ
    pub diffusivity: f64,
    /// 反馈开关
    pub feedback: bool,
    /// 分母下限（相对 L²）
    pub extensibility_floor: f64,
}

impl PolymerParams {
    /// 从配置构造（先验证）
    pub fn from_config(cfg: &PolymerConfig) -> PvResult<Self> {
        cfg.validate()?;
        Ok(Self {
            model: cfg.model,
            tau: cfg.tau,
            eta_p: cfg.eta_p,
            max_extension: cfg.max_extension,
            stretching: cfg.stretching,
            relaxation: cfg.relaxation,
            advection: cfg.advection,
            diffusion: cfg.diffusion,
            diffusivity: cfg.diffusivity,
            feedback: cfg.feedback,
            extensibility_floor: cfg.extensibility_floor,
        })
    }

    /// L²
    #[inline]
    pub fn l2(&self) -> f64 {
        self.max_extension * self.max_extension
    }

    /// 伸展因子分母的绝对下限 `floor · L²`
    #[inline]
    pub fn denominator_floor(&self) -> f64 {
        self.extensibility_floor * self.l2()
    }

    /// 反馈系数 η_p / τ
    #[inline]
    pub fn feedback_coefficient(&self) -> f64 {
        self.eta_p / self.tau
    }

    /// 反馈是否实际生效
    #[inline]
    pub fn feedback_active(&self) -> bool {
        self.feedback && self.eta_p > 0.0
    }

    /// 是否为 FENE-P
    #[inline]
    pub fn is_fene_p(&self) -> bool {
        self.model == PolymerModel::FeneP
    }
}
