// crates/pv_physics/src/grid.rs

//! 均匀结构化网格与 pencil 视图
//!
//! 单进程周期盒，每侧 [`NGHOST`] 层虚单元，供 6 阶中心差分使用。
//! 点序为 x 最快：`point = (n * my + m) * mx + l`，因此一条 x 方向
//! pencil 在状态数组中是一段连续内存。
//!
//! ```text
//!   l:  0 1 2 | 3 ...... nx+2 | nx+3 nx+4 nx+5
//!       ghost |   interior    |     ghost
//! ```

use pv_config::GridConfig;
use pv_foundation::{PvError, PvResult};

/// 每侧虚单元层数（6 阶中心差分需要 3 层）
pub const NGHOST: usize = 3;

/// 坐标方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// x 方向（pencil 方向）
    X,
    /// y 方向
    Y,
    /// z 方向
    Z,
}

impl Direction {
    /// 全部方向
    pub const ALL: [Direction; 3] = [Direction::X, Direction::Y, Direction::Z];

    /// 方向索引 0/1/2
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// 一条 x 方向 pencil：固定横向索引 `(m, n)`（含虚单元偏移）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pencil {
    /// y 索引（全局数组坐标）
    pub m: usize,
    /// z 索引（全局数组坐标）
    pub n: usize,
}

/// 周期盒网格
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    nx: usize,
    ny: usize,
    nz: usize,
    lengths: [f64; 3],
    spacing: [f64; 3],
}

impl Grid {
    /// 创建网格
    pub fn new(nx: usize, ny: usize, nz: usize, lx: f64, ly: f64, lz: f64) -> PvResult<Self> {
        for (name, n) in [("grid.nx", nx), ("grid.ny", ny), ("grid.nz", nz)] {
            if n == 0 {
                return Err(PvError::invalid_config(name, "0", "网格点数必须为正"));
            }
        }
        for (name, l) in [("grid.lx", lx), ("grid.ly", ly), ("grid.lz", lz)] {
            if !(l > 0.0 && l.is_finite()) {
                return Err(PvError::invalid_config(name, l.to_string(), "盒长必须为正"));
            }
        }
        Ok(Self {
            nx,
            ny,
            nz,
            lengths: [lx, ly, lz],
            spacing: [lx / nx as f64, ly / ny as f64, lz / nz as f64],
        })
    }

    /// 从配置创建
    pub fn from_config(cfg: &GridConfig) -> PvResult<Self> {
        Self::new(cfg.nx, cfg.ny, cfg.nz, cfg.lx, cfg.ly, cfg.lz)
    }

    /// x 方向内部点数（pencil 长度）
    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// y 方向内部点数
    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// z 方向内部点数
    #[inline]
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// x 方向含虚单元总点数
    #[inline]
    pub fn mx(&self) -> usize {
        self.nx + 2 * NGHOST
    }

    /// y 方向含虚单元总点数
    #[inline]
    pub fn my(&self) -> usize {
        self.ny + 2 * NGHOST
    }

    /// z 方向含虚单元总点数
    #[inline]
    pub fn mz(&self) -> usize {
        self.nz + 2 * NGHOST
    }

    /// 网格间距
    #[inline]
    pub fn spacing(&self, dir: Direction) -> f64 {
        self.spacing[dir.index()]
    }

    /// 盒长
    #[inline]
    pub fn length(&self, dir: Direction) -> f64 {
        self.lengths[dir.index()]
    }

    /// 某方向上相邻点在点序中的步长
    #[inline]
    pub fn stride(&self, dir: Direction) -> usize {
        match dir {
            Direction::X => 1,
            Direction::Y => self.mx(),
            Direction::Z => self.mx() * self.my(),
        }
    }

    /// 总点数（含虚单元）
    #[inline]
    pub fn n_points(&self) -> usize {
        self.mx() * self.my() * self.mz()
    }

    /// 内部 pencil 数
    #[inline]
    pub fn n_pencils(&self) -> usize {
        self.ny * self.nz
    }

    /// 点序索引
    #[inline]
    pub fn point_index(&self, l: usize, m: usize, n: usize) -> usize {
        (n * self.my() + m) * self.mx() + l
    }

    /// 数组索引对应的坐标（第一个内部点位于 0）
    #[inline]
    pub fn coord(&self, dir: Direction, index: usize) -> f64 {
        (index as f64 - NGHOST as f64) * self.spacing(dir)
    }

    /// 数组索引是否为内部点
    #[inline]
    pub fn is_interior(&self, dir: Direction, index: usize) -> bool {
        let n = match dir {
            Direction::X => self.nx,
            Direction::Y => self.ny,
            Direction::Z => self.nz,
        };
        (NGHOST..NGHOST + n).contains(&index)
    }

    /// 由行号（`n * my + m`）得到内部 pencil，虚单元行返回 `None`
    #[inline]
    pub fn pencil_from_row(&self, row: usize) -> Option<Pencil> {
        let m = row % self.my();
        let n = row / self.my();
        if self.is_interior(Direction::Y, m) && self.is_interior(Direction::Z, n) {
            Some(Pencil { m, n })
        } else {
            None
        }
    }

    /// 按 (n, m) 顺序迭代全部内部 pencil
    pub fn pencils(&self) -> impl Iterator<Item = Pencil> + '_ {
        (NGHOST..NGHOST + self.nz)
            .flat_map(move |n| (NGHOST..NGHOST + self.ny).map(move |m| Pencil { m, n }))
    }

    /// 周期映射：任意数组索引 → 对应内部索引
    #[inline]
    pub fn wrap(&self, dir: Direction, index: usize) -> usize {
        let n = match dir {
            Direction::X => self.nx,
            Direction::Y => self.ny,
            Direction::Z => self.nz,
        } as isize;
        let offset = (index as isize - NGHOST as isize).rem_euclid(n);
        NGHOST + offset as usize
    }
}
