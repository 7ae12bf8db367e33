// crates/pv_physics/src/pencil/resolver.rs

//! pencil 依赖解析器
//!
//! 启动期执行一次：
//!
//! 1. 合并所有模块的依赖表，深度优先检查环并求最长链长
//! 2. 以全部模块的需求为初值，逐轮（基于上一轮快照）展开依赖直到不动点
//! 3. 检查每个所需量恰有一个提供者，且提供者的依赖不由更晚的模块提供
//!
//! 结果 [`PencilPlan`] 与模块注册顺序无关（集合运算可交换）。

use super::criteria::PencilCriteria;
use super::error::{PencilError, PencilResult};
use super::quantity::PencilQuantity;
use super::PencilDeclaration;

/// 默认轮数硬上限
pub const DEFAULT_PASS_LIMIT: usize = 32;

/// 合并依赖表：`table[q]` 为所有模块声明的 q 的直接依赖之并
pub type DependencyTable = [PencilCriteria; PencilQuantity::COUNT];

/// 合并各模块依赖表
pub fn dependency_table<M: PencilDeclaration>(modules: &[M]) -> DependencyTable {
    let mut table = [PencilCriteria::EMPTY; PencilQuantity::COUNT];
    for q in PencilQuantity::ALL {
        for module in modules {
            table[q.index()].extend(module.pencil_interdep(q).iter().copied());
        }
    }
    table
}

/// 单轮展开：快照中每个量的直接依赖并入
pub fn expand_once(table: &DependencyTable, snapshot: PencilCriteria) -> PencilCriteria {
    snapshot
        .iter()
        .fold(snapshot, |acc, q| acc.union(table[q.index()]))
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// 深度优先检查环，返回最长依赖链边数
pub fn check_acyclic(table: &DependencyTable) -> PencilResult<usize> {
    fn visit(
        q: PencilQuantity,
        table: &DependencyTable,
        marks: &mut [Mark; PencilQuantity::COUNT],
        depth: &mut [usize; PencilQuantity::COUNT],
    ) -> PencilResult<usize> {
        match marks[q.index()] {
            Mark::Done => return Ok(depth[q.index()]),
            Mark::InProgress => return Err(PencilError::CyclicDependency { quantity: q }),
            Mark::Unvisited => {}
        }
        marks[q.index()] = Mark::InProgress;
        let mut longest = 0;
        for dep in table[q.index()].iter() {
            longest = longest.max(visit(dep, table, marks, depth)? + 1);
        }
        marks[q.index()] = Mark::Done;
        depth[q.index()] = longest;
        Ok(longest)
    }

    let mut marks = [Mark::Unvisited; PencilQuantity::COUNT];
    let mut depth = [0usize; PencilQuantity::COUNT];
    let mut max_chain = 0;
    for q in PencilQuantity::ALL {
        max_chain = max_chain.max(visit(q, table, &mut marks, &mut depth)?);
    }
    Ok(max_chain)
}

/// 解析结果：固定执行计划
#[derive(Debug, Clone, PartialEq)]
pub struct PencilPlan {
    needed: PencilCriteria,
    passes: usize,
    max_chain: usize,
    modules: Vec<(&'static str, PencilCriteria)>,
}

impl PencilPlan {
    /// 全部需要计算的量
    #[inline]
    pub fn needed(&self) -> PencilCriteria {
        self.needed
    }

    /// 是否包含某量
    #[inline]
    pub fn contains(&self, q: PencilQuantity) -> bool {
        self.needed.contains(q)
    }

    /// 达到不动点所用轮数（含确认轮）
    #[inline]
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// 依赖表最长链边数
    #[inline]
    pub fn max_chain(&self) -> usize {
        self.max_chain
    }

    /// 某模块需要负责计算的量
    pub fn module_criteria(&self, module: &str) -> PencilResult<PencilCriteria> {
        self.modules
            .iter()
            .find(|(name, _)| *name == module)
            .map(|(_, c)| *c)
            .ok_or_else(|| PencilError::Unregistered { module: module.to_string() })
    }

    /// 按注册顺序迭代 (模块名, 负责量)
    pub fn modules(&self) -> impl Iterator<Item = (&'static str, PencilCriteria)> + '_ {
        self.modules.iter().copied()
    }
}

/// 依赖解析器
#[derive(Debug, Clone)]
pub struct PencilResolver {
    pass_limit: usize,
}

impl Default for PencilResolver {
    fn default() -> Self {
        Self { pass_limit: DEFAULT_PASS_LIMIT }
    }
}

impl PencilResolver {
    /// 创建默认解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置轮数硬上限（至少 1）
    pub fn with_pass_limit(mut self, limit: usize) -> Self {
        self.pass_limit = limit.max(1);
        self
    }

    /// 解析
    ///
    /// `extra` 为模块之外的需求（例如宿主诊断）。
    pub fn resolve<M: PencilDeclaration>(
        &self,
        modules: &[M],
        extra: PencilCriteria,
    ) -> PencilResult<PencilPlan> {
        let table = dependency_table(modules);
        let max_chain = check_acyclic(&table)?;

        let mut needed = extra;
        for module in modules {
            module.pencil_criteria(&mut needed);
        }

        let cap = self.pass_limit.min(max_chain + 2);
        let mut passes = 0;
        loop {
            passes += 1;
            let snapshot = needed;
            needed = expand_once(&table, snapshot);
            let added = needed.difference(snapshot);
            log::trace!("pencil 解析第 {} 轮: 新增 {:?}", passes, added);
            let Some(quantity) = added.iter().next() else { break };
            if passes >= cap {
                return Err(PencilError::NotConverged { passes, quantity });
            }
        }

        let providers = Self::assign_providers(modules, needed)?;
        Self::check_order(modules, &table, needed, &providers)?;

        let plan = PencilPlan {
            needed,
            passes,
            max_chain,
            modules: modules
                .iter()
                .map(|m| (m.name(), m.provided_pencils().intersection(needed)))
                .collect(),
        };
        log::info!(
            "pencil 依赖解析完成: {} 个量, {} 轮, 最长链 {}: {:?}",
            needed.len(),
            passes,
            max_chain,
            needed
        );
        Ok(plan)
    }

    /// 每个所需量的提供模块序号
    fn assign_providers<M: PencilDeclaration>(
        modules: &[M],
        needed: PencilCriteria,
    ) -> PencilResult<[Option<usize>; PencilQuantity::COUNT]> {
        let mut providers: [Option<usize>; PencilQuantity::COUNT] = [None; PencilQuantity::COUNT];
        for q in needed.iter() {
            for (i, module) in modules.iter().enumerate() {
                if !module.provided_pencils().contains(q) {
                    continue;
                }
                if let Some(first) = providers[q.index()] {
                    return Err(PencilError::DuplicateProvider {
                        quantity: q,
                        first: modules[first].name(),
                        second: module.name(),
                    });
                }
                providers[q.index()] = Some(i);
            }
            if providers[q.index()].is_none() {
                return Err(PencilError::NoProvider { quantity: q });
            }
        }
        Ok(providers)
    }

    /// 模块按注册顺序计算 pencil，依赖必须由同一或更早的模块提供
    fn check_order<M: PencilDeclaration>(
        modules: &[M],
        table: &DependencyTable,
        needed: PencilCriteria,
        providers: &[Option<usize>; PencilQuantity::COUNT],
    ) -> PencilResult<()> {
        for q in needed.iter() {
            let Some(owner) = providers[q.index()] else { continue };
            for dep in table[q.index()].iter() {
                if let Some(dep_owner) = providers[dep.index()] {
                    if dep_owner > owner {
                        return Err(PencilError::ProviderOrder {
                            module: modules[owner].name(),
                            quantity: q,
                            dependency: dep,
                            provider: modules[dep_owner].name(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
