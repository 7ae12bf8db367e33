// crates/pv_physics/src/tensor.rs

//! 对称 3×3 张量
//!
//! 构象张量每点存储 6 个独立分量，顺序为
//! `[C11, C12, C13, C22, C23, C33]`。

use glam::{DMat3, DVec3};
use pv_foundation::float::all_finite;

/// 分量序号 → (i, j)
pub const SYM_PAIRS: [(usize, usize); 6] = [(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)];

/// (i, j) → 分量序号
pub const SYM_INDEX: [[usize; 3]; 3] = [[0, 1, 2], [1, 3, 4], [2, 4, 5]];

/// 对角分量序号
pub const SYM_DIAGONAL: [usize; 3] = [0, 3, 5];

/// Kronecker δ（按对称分量序号）
#[inline]
pub fn sym_delta(k: usize) -> f64 {
    if SYM_DIAGONAL.contains(&k) {
        1.0
    } else {
        0.0
    }
}

/// 对称张量（紧凑存储）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymTensor3(pub [f64; 6]);

impl SymTensor3 {
    /// 单位张量
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 1.0]);

    /// 零张量
    pub const ZERO: Self = Self([0.0; 6]);

    /// 按 (i, j) 取分量
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.0[SYM_INDEX[i][j]]
    }

    /// 迹
    #[inline]
    pub fn trace(&self) -> f64 {
        self.0[0] + self.0[3] + self.0[5]
    }

    /// 全部分量有限
    #[inline]
    pub fn is_finite(&self) -> bool {
        all_finite(&self.0)
    }

    /// 展开为满矩阵
    pub fn to_mat3(&self) -> DMat3 {
        let c = &self.0;
        DMat3::from_cols(
            DVec3::new(c[0], c[1], c[2]),
            DVec3::new(c[1], c[3], c[4]),
            DVec3::new(c[2], c[4], c[5]),
        )
    }

    /// 从满矩阵取上三角（不检查对称性）
    pub fn from_mat3_upper(m: &DMat3) -> Self {
        let mut out = [0.0; 6];
        for (k, &(i, j)) in SYM_PAIRS.iter().enumerate() {
            out[k] = m.col(j)[i];
        }
        Self(out)
    }

    /// 半正定判定（全部主子式非负，容差按迹缩放）
    pub fn is_positive_semidefinite(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        let scale = self.trace().abs().max(1.0);
        let tol = 1e-12 * scale;
        let (a, b, c) = (self.0[0], self.0[3], self.0[5]);
        if a < -tol || b < -tol || c < -tol {
            return false;
        }
        let (xy, xz, yz) = (self.0[1], self.0[2], self.0[4]);
        let tol2 = tol * scale;
        if a * b - xy * xy < -tol2 || a * c - xz * xz < -tol2 || b * c - yz * yz < -tol2 {
            return false;
        }
        self.to_mat3().determinant() >= -tol2 * scale
    }
}

/// 伸展项 `A + Aᵀ`，`A = L·C`，`L_ij = ∂u_i/∂x_j`
///
/// 以 `A + Aᵀ` 形式构造，结果严格对称。
pub fn stretching_full(grad_u: &DMat3, c: &DMat3) -> DMat3 {
    let a = grad_u.mul_mat3(c);
    a + a.transpose()
}

/// 伸展项紧凑形式
pub fn stretching(grad_u: &DMat3, c: &SymTensor3) -> SymTensor3 {
    SymTensor3::from_mat3_upper(&stretching_full(grad_u, &c.to_mat3()))
}

/// 由行主序 9 分量 `g[i * 3 + j] = ∂u_i/∂x_j` 构造速度梯度矩阵
pub fn velocity_gradient(g: [f64; 9]) -> DMat3 {
    // glam 为列主序
    DMat3::from_cols(
        DVec3::new(g[0], g[3], g[6]),
        DVec3::new(g[1], g[4], g[7]),
        DVec3::new(g[2], g[5], g[8]),
    )
}
