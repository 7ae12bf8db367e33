// crates/pv_physics/src/pencil/criteria.rs

//! PencilCriteria - pencil 量集合（位集）

use std::fmt;

use super::quantity::PencilQuantity;

const _: () = assert!(PencilQuantity::COUNT <= 32);

/// pencil 量集合
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PencilCriteria {
    bits: u32,
}

impl PencilCriteria {
    /// 空集
    pub const EMPTY: Self = Self { bits: 0 };

    /// 创建空集
    #[inline]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// 由若干量构造
    pub fn of(quantities: &[PencilQuantity]) -> Self {
        quantities.iter().copied().collect()
    }

    /// 插入，返回是否新增
    #[inline]
    pub fn insert(&mut self, q: PencilQuantity) -> bool {
        let mask = 1u32 << q.index();
        let added = self.bits & mask == 0;
        self.bits |= mask;
        added
    }

    /// 移除
    #[inline]
    pub fn remove(&mut self, q: PencilQuantity) {
        self.bits &= !(1u32 << q.index());
    }

    /// 是否包含
    #[inline]
    pub fn contains(&self, q: PencilQuantity) -> bool {
        self.bits & (1u32 << q.index()) != 0
    }

    /// 并集
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self { bits: self.bits | other.bits }
    }

    /// 交集
    #[inline]
    pub fn intersection(self, other: Self) -> Self {
        Self { bits: self.bits & other.bits }
    }

    /// 差集 `self \ other`
    #[inline]
    pub fn difference(self, other: Self) -> Self {
        Self { bits: self.bits & !other.bits }
    }

    /// 是否为子集
    #[inline]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.bits & !other.bits == 0
    }

    /// 元素个数
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// 按序号升序迭代
    pub fn iter(&self) -> impl Iterator<Item = PencilQuantity> + '_ {
        PencilQuantity::ALL.iter().copied().filter(move |q| self.contains(*q))
    }
}

impl FromIterator<PencilQuantity> for PencilCriteria {
    fn from_iter<I: IntoIterator<Item = PencilQuantity>>(iter: I) -> Self {
        let mut c = Self::EMPTY;
        for q in iter {
            c.insert(q);
        }
        c
    }
}

impl Extend<PencilQuantity> for PencilCriteria {
    fn extend<I: IntoIterator<Item = PencilQuantity>>(&mut self, iter: I) {
        for q in iter {
            self.insert(q);
        }
    }
}

impl fmt::Debug for PencilCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
