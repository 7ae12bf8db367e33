// crates/pv_physics/src/pencil/error.rs

//! pencil 依赖解析与缓存访问错误

use pv_foundation::PvError;
use thiserror::Error;

use super::quantity::PencilQuantity;

/// pencil 子系统结果类型
pub type PencilResult<T> = Result<T, PencilError>;

/// pencil 子系统错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PencilError {
    /// 依赖表存在环
    #[error("pencil 依赖表存在环，涉及量: {quantity}")]
    CyclicDependency {
        /// 环上的量
        quantity: PencilQuantity,
    },

    /// 迭代次数内未收敛
    #[error("pencil 依赖解析 {passes} 轮后仍未收敛，最后新增量: {quantity}")]
    NotConverged {
        /// 已执行轮数
        passes: usize,
        /// 最后一轮新增的量
        quantity: PencilQuantity,
    },

    /// 需要的量没有提供者
    #[error("pencil 量 {quantity} 被需要但没有模块提供")]
    NoProvider {
        /// 量
        quantity: PencilQuantity,
    },

    /// 同一量有多个提供者
    #[error("pencil 量 {quantity} 同时由 {first} 与 {second} 提供")]
    DuplicateProvider {
        /// 量
        quantity: PencilQuantity,
        /// 第一个提供模块
        first: &'static str,
        /// 第二个提供模块
        second: &'static str,
    },

    /// 提供者顺序错误：依赖由后注册的模块提供
    #[error("模块 {module} 计算 {quantity} 需要 {dependency}，但后者由更晚的模块 {provider} 提供")]
    ProviderOrder {
        /// 模块
        module: &'static str,
        /// 量
        quantity: PencilQuantity,
        /// 依赖
        dependency: PencilQuantity,
        /// 依赖的提供模块
        provider: &'static str,
    },

    /// 读取未计划或本 pencil 尚未写入的量
    #[error("pencil 量 {quantity} 未计划或当前 pencil 尚未计算")]
    MissingPencil {
        /// 量
        quantity: PencilQuantity,
    },

    /// 同一 pencil 内重复写入
    #[error("pencil 量 {quantity} 在当前 pencil 已写入")]
    AlreadyWritten {
        /// 量
        quantity: PencilQuantity,
    },

    /// 计划中不存在的模块
    #[error("模块 {module} 不在解析计划中")]
    Unregistered {
        /// 模块名
        module: String,
    },
}

impl PencilError {
    /// 是否为启动期配置错误
    pub fn is_config(&self) -> bool {
        !matches!(
            self,
            Self::MissingPencil { .. } | Self::AlreadyWritten { .. } | Self::Unregistered { .. }
        )
    }
}

impl From<PencilError> for PvError {
    fn from(err: PencilError) -> Self {
        if err.is_config() {
            PvError::config(err.to_string())
        } else {
            PvError::contract(err.to_string())
        }
    }
}
