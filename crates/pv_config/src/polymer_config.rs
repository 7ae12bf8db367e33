// crates/pv_config/src/polymer_config.rs

//! 聚合物（粘弹性添加剂）参数配置
//!
//! 所有键均有默认值，缺省时行为确定。物理量约定：
//! - `tau`: 松弛时间 τ > 0
//! - `eta_p`: 聚合物粘度比 η_p ≥ 0
//! - `max_extension`: 最大伸长 L ≥ 1（FENE-P 另要求 L² > 3）

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 本构闭合模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolymerModel {
    /// Oldroyd-B：伸展因子恒为 1
    #[default]
    OldroydB,
    /// FENE-P：f = (L² - 3) / (L² - tr C)
    FeneP,
}

impl PolymerModel {
    /// 模型名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::OldroydB => "oldroyd-B",
            Self::FeneP => "FENE-P",
        }
    }
}

/// 构象张量初始条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolymerInit {
    /// 不修改已分配存储
    Nothing,
    /// 全零
    Zero,
    /// 各向同性 C = a·I
    #[default]
    Isotropic,
    /// 沿 x 拉伸 C = I + a·e_x e_x
    Stretched,
    /// 各向同性加正弦扰动（保持对称正定）
    Perturbed,
}

/// 聚合物参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolymerConfig {
    /// 是否启用聚合物模块
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 本构模型
    #[serde(default)]
    pub model: PolymerModel,

    /// 松弛时间 τ
    #[serde(default = "default_tau")]
    pub tau: f64,

    /// 粘度比 η_p
    #[serde(default)]
    pub eta_p: f64,

    /// 最大伸长 L
    #[serde(default = "default_max_extension")]
    pub max_extension: f64,

    /// 伸展项 L·C + C·Lᵀ
    #[serde(default = "default_true")]
    pub stretching: bool,

    /// 松弛项 -(fC - I)/τ
    #[serde(default = "default_true")]
    pub relaxation: bool,

    /// 平流项 -u·∇C
    #[serde(default = "default_true")]
    pub advection: bool,

    /// 扩散项 κ∇²C
    #[serde(default)]
    pub diffusion: bool,

    /// 扩散系数 κ
    #[serde(default)]
    pub diffusivity: f64,

    /// 弹性应力反馈到动量方程
    #[serde(default = "default_true")]
    pub feedback: bool,

    /// 伸展因子分母下限（相对 L²）
    ///
    /// 截断后 f 不超过 `(L² − 3)/(floor·L²)`，缺省 L = 10 时约为 97。
    #[serde(default = "default_extensibility_floor")]
    pub extensibility_floor: f64,

    /// 初始条件
    #[serde(default)]
    pub init: PolymerInit,

    /// 初始条件幅值
    #[serde(default = "default_init_amplitude")]
    pub init_amplitude: f64,

    /// 需要采样的诊断量名称
    #[serde(default = "default_diagnostics")]
    pub diagnostics: Vec<String>,
}

fn default_true() -> bool { true }
fn default_tau() -> f64 { 1.0 }
fn default_max_extension() -> f64 { 10.0 }
fn default_extensibility_floor() -> f64 { 1e-2 }
fn default_init_amplitude() -> f64 { 1.0 }
fn default_diagnostics() -> Vec<String> {
    vec!["trpm".to_string(), "trpmax".to_string(), "frm".to_string()]
}

impl Default for PolymerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: PolymerModel::default(),
            tau: default_tau(),
            eta_p: 0.0,
            max_extension: default_max_extension(),
            stretching: true,
            relaxation: true,
            advection: true,
            diffusion: false,
            diffusivity: 0.0,
            feedback: true,
            extensibility_floor: default_extensibility_floor(),
            init: PolymerInit::default(),
            init_amplitude: default_init_amplitude(),
            diagnostics: default_diagnostics(),
        }
    }
}

impl PolymerConfig {
    /// 所有物理项均关闭（模块存在但惰性）
    pub fn is_inert(&self) -> bool {
        !(self.stretching || self.relaxation || self.advection || self.diffusion || self.feedback)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tau > 0.0 && self.tau.is_finite()) {
            return Err(ConfigError::invalid("polymer.tau", self.tau, "松弛时间必须为正"));
        }
        if !(self.eta_p >= 0.0 && self.eta_p.is_finite()) {
            return Err(ConfigError::invalid("polymer.eta_p", self.eta_p, "粘度比不能为负"));
        }
        if !(self.max_extension >= 1.0 && self.max_extension.is_finite()) {
            return Err(ConfigError::invalid(
                "polymer.max_extension",
                self.max_extension,
                "最大伸长 L 必须 >= 1",
            ));
        }
        if self.model == PolymerModel::FeneP && self.max_extension * self.max_extension <= 3.0 {
            return Err(ConfigError::invalid(
                "polymer.max_extension",
                self.max_extension,
                "FENE-P 要求 L² > 3（静止态 tr C = 3）",
            ));
        }
        if !(self.diffusivity >= 0.0 && self.diffusivity.is_finite()) {
            return Err(ConfigError::invalid(
                "polymer.diffusivity",
                self.diffusivity,
                "扩散系数不能为负",
            ));
        }
        if !(self.extensibility_floor > 0.0 && self.extensibility_floor < 1.0) {
            return Err(ConfigError::invalid(
                "polymer.extensibility_floor",
                self.extensibility_floor,
                "必须在 (0, 1) 范围内",
            ));
        }
        if !self.init_amplitude.is_finite() {
            return Err(ConfigError::invalid(
                "polymer.init_amplitude",
                self.init_amplitude,
                "必须为有限值",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = PolymerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.model, PolymerModel::OldroydB);
        assert!(!cfg.is_inert());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let cfg: PolymerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.tau, 1.0);
        assert_eq!(cfg.max_extension, 10.0);
        assert!(cfg.stretching && cfg.relaxation && cfg.advection && cfg.feedback);
        assert!(!cfg.diffusion);
        assert_eq!(cfg.extensibility_floor, 1e-2);
        assert_eq!(cfg.diagnostics, vec!["trpm", "trpmax", "frm"]);
    }

    #[test]
    fn test_snake_case_enums() {
        let cfg: PolymerConfig =
            serde_json::from_str(r#"{"model": "fene_p", "init": "stretched"}"#).unwrap();
        assert_eq!(cfg.model, PolymerModel::FeneP);
        assert_eq!(cfg.init, PolymerInit::Stretched);
    }

    #[test]
    fn test_invalid_tau() {
        let cfg = PolymerConfig { tau: 0.0, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "polymer.tau"
        ));
    }

    #[test]
    fn test_invalid_extension() {
        let cfg = PolymerConfig { max_extension: 0.5, ..Default::default() };
        assert!(cfg.validate().is_err());

        // Oldroyd-B 允许 L = 1
        let cfg = PolymerConfig { max_extension: 1.0, ..Default::default() };
        assert!(cfg.validate().is_ok());

        // FENE-P 需要 L² > 3
        let cfg = PolymerConfig {
            model: PolymerModel::FeneP,
            max_extension: 1.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_inert() {
        let cfg = PolymerConfig {
            stretching: false,
            relaxation: false,
            advection: false,
            diffusion: false,
            feedback: false,
            ..Default::default()
        };
        assert!(cfg.is_inert());
        assert!(cfg.validate().is_ok());
    }
}
