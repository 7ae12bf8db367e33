// crates/pv_physics/src/derivatives.rs

//! 沿 pencil 的 6 阶中心差分
//!
//! ```text
//! f'  ≈ [45(f₁-f₋₁) - 9(f₂-f₋₂) + (f₃-f₋₃)] / (60Δ)
//! f'' ≈ [-490f₀ + 270(f₁+f₋₁) - 27(f₂+f₋₂) + 2(f₃+f₋₃)] / (180Δ²)
//! ```
//!
//! 所有函数写入调用方提供的切片，不做分配。调用前虚单元必须已更新。

use crate::grid::{Direction, Pencil, NGHOST};
use crate::state::FArray;

/// 在 pencil 第 `l` 个内部点处取方向 `dir` 上偏移 `k` 的值
#[inline(always)]
fn stencil(f: &FArray, center: usize, stride: usize, var: usize, k: usize) -> (f64, f64) {
    let nvar = f.nvar();
    let data = f.data();
    (
        data[(center + k * stride) * nvar + var],
        data[(center - k * stride) * nvar + var],
    )
}

/// 一阶导数 ∂f/∂dir，写入 `out[0..nx]`
pub fn der(f: &FArray, pencil: Pencil, var: usize, dir: Direction, out: &mut [f64]) {
    let g = f.grid();
    let stride = g.stride(dir);
    let fac = 1.0 / (60.0 * g.spacing(dir));
    let base = g.point_index(NGHOST, pencil.m, pencil.n);

    for (l, o) in out.iter_mut().enumerate().take(g.nx()) {
        let c = base + l;
        let (p1, m1) = stencil(f, c, stride, var, 1);
        let (p2, m2) = stencil(f, c, stride, var, 2);
        let (p3, m3) = stencil(f, c, stride, var, 3);
        *o = fac * (45.0 * (p1 - m1) - 9.0 * (p2 - m2) + (p3 - m3));
    }
}

#[inline(always)]
fn second(f: &FArray, c: usize, stride: usize, var: usize) -> f64 {
    let f0 = f.data()[c * f.nvar() + var];
    let (p1, m1) = stencil(f, c, stride, var, 1);
    let (p2, m2) = stencil(f, c, stride, var, 2);
    let (p3, m3) = stencil(f, c, stride, var, 3);
    -490.0 * f0 + 270.0 * (p1 + m1) - 27.0 * (p2 + m2) + 2.0 * (p3 + m3)
}

/// 二阶导数 ∂²f/∂dir²，写入 `out[0..nx]`
pub fn der2(f: &FArray, pencil: Pencil, var: usize, dir: Direction, out: &mut [f64]) {
    let g = f.grid();
    let stride = g.stride(dir);
    let dx = g.spacing(dir);
    let fac = 1.0 / (180.0 * dx * dx);
    let base = g.point_index(NGHOST, pencil.m, pencil.n);

    for (l, o) in out.iter_mut().enumerate().take(g.nx()) {
        *o = fac * second(f, base + l, stride, var);
    }
}

/// 二阶导数累加：`out += ∂²f/∂dir²`（用于拉普拉斯）
pub fn der2_add(f: &FArray, pencil: Pencil, var: usize, dir: Direction, out: &mut [f64]) {
    let g = f.grid();
    let stride = g.stride(dir);
    let dx = g.spacing(dir);
    let fac = 1.0 / (180.0 * dx * dx);
    let base = g.point_index(NGHOST, pencil.m, pencil.n);

    for (l, o) in out.iter_mut().enumerate().take(g.nx()) {
        *o += fac * second(f, base + l, stride, var);
    }
}
