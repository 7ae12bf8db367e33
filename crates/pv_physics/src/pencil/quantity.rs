// crates/pv_physics/src/pencil/quantity.rs

//! pencil 量目录
//!
//! 每个量有固定分量数，缓存布局在解析后由此决定。

use std::fmt;

/// 每条 pencil 上可缓存的派生量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PencilQuantity {
    /// 速度 u_i
    Velocity = 0,
    /// 速度一阶差分原始结果，布局 `(j * 3 + i)`：∂_j u_i
    VelocityFirstDerivatives,
    /// 速度梯度张量，布局 `(i * 3 + j)`：L_ij = ∂u_i/∂x_j
    VelocityGradient,
    /// 构象张量 C（6 分量）
    Conformation,
    /// tr C
    ConformationTrace,
    /// 伸展因子 f
    ExtensibilityFactor,
    /// ∇f
    ExtensibilityGradient,
    /// f·C
    ScaledConformation,
    /// ∂_k C_ij，布局 `(k * 6 + ij)`
    ConformationGradient,
    /// ∂_j C_ij
    ConformationDivergence,
    /// u·∇C
    AdvectedConformation,
    /// ∂_j (f C_ij)
    ScaledConformationDivergence,
    /// ∇²C
    ConformationLaplacian,
}

impl PencilQuantity {
    /// 量的总数
    pub const COUNT: usize = 13;

    /// 全部量（按序号）
    pub const ALL: [PencilQuantity; Self::COUNT] = [
        Self::Velocity,
        Self::VelocityFirstDerivatives,
        Self::VelocityGradient,
        Self::Conformation,
        Self::ConformationTrace,
        Self::ExtensibilityFactor,
        Self::ExtensibilityGradient,
        Self::ScaledConformation,
        Self::ConformationGradient,
        Self::ConformationDivergence,
        Self::AdvectedConformation,
        Self::ScaledConformationDivergence,
        Self::ConformationLaplacian,
    ];

    /// 序号
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// 由序号取量
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 每点分量数
    pub fn components(self) -> usize {
        match self {
            Self::Velocity => 3,
            Self::VelocityFirstDerivatives => 9,
            Self::VelocityGradient => 9,
            Self::Conformation => 6,
            Self::ConformationTrace => 1,
            Self::ExtensibilityFactor => 1,
            Self::ExtensibilityGradient => 3,
            Self::ScaledConformation => 6,
            Self::ConformationGradient => 18,
            Self::ConformationDivergence => 3,
            Self::AdvectedConformation => 6,
            Self::ScaledConformationDivergence => 3,
            Self::ConformationLaplacian => 6,
        }
    }

    /// 短名称（日志用）
    pub fn name(self) -> &'static str {
        match self {
            Self::Velocity => "uu",
            Self::VelocityFirstDerivatives => "du",
            Self::VelocityGradient => "uij",
            Self::Conformation => "poly",
            Self::ConformationTrace => "trp",
            Self::ExtensibilityFactor => "fr",
            Self::ExtensibilityGradient => "grad_fr",
            Self::ScaledConformation => "frc",
            Self::ConformationGradient => "cijk",
            Self::ConformationDivergence => "div_c",
            Self::AdvectedConformation => "u_dot_grad_c",
            Self::ScaledConformationDivergence => "div_frc",
            Self::ConformationLaplacian => "del2_poly",
        }
    }
}

impl fmt::Display for PencilQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
