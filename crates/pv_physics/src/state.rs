// crates/pv_physics/src/state.rs

//! 全局状态数组
//!
//! `FArray` 以点序存储所有注册字段：`data[point * nvar + var]`。
//! 右端项累加器 `df` 使用同一布局，因此一条 pencil 在两者中
//! 都对应长度为 `mx * nvar` 的连续行。

use crate::grid::{Direction, Grid, Pencil, NGHOST};
use pv_foundation::{PvError, PvResult};

/// 状态数组（含虚单元）
#[derive(Debug, Clone, PartialEq)]
pub struct FArray {
    grid: Grid,
    nvar: usize,
    data: Vec<f64>,
}

impl FArray {
    /// 创建全零数组
    pub fn new(grid: &Grid, nvar: usize) -> Self {
        Self {
            grid: grid.clone(),
            nvar,
            data: vec![0.0; grid.n_points() * nvar],
        }
    }

    /// 网格
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// 每点变量数
    #[inline]
    pub fn nvar(&self) -> usize {
        self.nvar
    }

    /// 原始数据
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// 原始数据（可变）
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// 一条 pencil 行长度
    #[inline]
    pub fn row_len(&self) -> usize {
        self.grid.mx() * self.nvar
    }

    /// 元素索引
    #[inline]
    pub fn index(&self, l: usize, m: usize, n: usize, var: usize) -> usize {
        self.grid.point_index(l, m, n) * self.nvar + var
    }

    /// 读取值
    #[inline]
    pub fn get(&self, l: usize, m: usize, n: usize, var: usize) -> f64 {
        self.data[self.index(l, m, n, var)]
    }

    /// 写入值
    #[inline]
    pub fn set(&mut self, l: usize, m: usize, n: usize, var: usize, value: f64) {
        let i = self.index(l, m, n, var);
        self.data[i] = value;
    }

    /// pencil 内第 `l` 个内部点的变量值（`l` 从 0 起）
    #[inline]
    pub fn pencil_value(&self, pencil: Pencil, l: usize, var: usize) -> f64 {
        self.get(NGHOST + l, pencil.m, pencil.n, var)
    }

    /// pencil 对应的整行
    #[inline]
    pub fn row(&self, pencil: Pencil) -> &[f64] {
        let start = self.grid.point_index(0, pencil.m, pencil.n) * self.nvar;
        &self.data[start..start + self.row_len()]
    }

    /// 置为常数
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// 检查形状一致
    fn check_shape(&self, other: &FArray) -> PvResult<()> {
        PvError::check_size("farray", self.data.len(), other.data.len())?;
        PvError::check_size("nvar", self.nvar, other.nvar)
    }

    /// 从另一数组复制
    pub fn copy_from(&mut self, other: &FArray) -> PvResult<()> {
        self.check_shape(other)?;
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// `self += s * other`
    pub fn add_scaled(&mut self, other: &FArray, s: f64) -> PvResult<()> {
        self.check_shape(other)?;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a += s * b;
        }
        Ok(())
    }

    /// 迭代全部内部点 `(l, m, n)`
    pub fn interior_points(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        let g = &self.grid;
        (NGHOST..NGHOST + g.nz()).flat_map(move |n| {
            (NGHOST..NGHOST + g.ny())
                .flat_map(move |m| (NGHOST..NGHOST + g.nx()).map(move |l| (l, m, n)))
        })
    }

    /// 内部点上某变量的最大绝对值
    pub fn max_abs_interior(&self, var: usize) -> f64 {
        self.interior_points()
            .map(|(l, m, n)| self.get(l, m, n, var).abs())
            .fold(0.0, f64::max)
    }

    /// 周期虚单元填充
    ///
    /// 依次处理 x、y、z；后一方向复制时包含前一方向已填好的虚单元，
    /// 因此棱与角点也得到正确的周期像。
    pub fn update_ghosts_periodic(&mut self) {
        let g = self.grid.clone();
        let nvar = self.nvar;

        for n in 0..g.mz() {
            for m in 0..g.my() {
                for l in (0..NGHOST).chain(NGHOST + g.nx()..g.mx()) {
                    let src = g.point_index(g.wrap(Direction::X, l), m, n) * nvar;
                    let dst = g.point_index(l, m, n) * nvar;
                    self.data.copy_within(src..src + nvar, dst);
                }
            }
        }

        let row = g.mx() * nvar;
        for n in 0..g.mz() {
            for m in (0..NGHOST).chain(NGHOST + g.ny()..g.my()) {
                let src = g.point_index(0, g.wrap(Direction::Y, m), n) * nvar;
                let dst = g.point_index(0, m, n) * nvar;
                self.data.copy_within(src..src + row, dst);
            }
        }

        let plane = g.mx() * g.my() * nvar;
        for n in (0..NGHOST).chain(NGHOST + g.nz()..g.mz()) {
            let src = g.point_index(0, 0, g.wrap(Direction::Z, n)) * nvar;
            let dst = g.point_index(0, 0, n) * nvar;
            self.data.copy_within(src..src + plane, dst);
        }
    }
}
