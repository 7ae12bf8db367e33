// crates/pv_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `PvError` 枚举和 `PvResult` 类型别名，用于整个项目的错误处理。
//!
//! # 设计原则
//!
//! 1. **层次化**: 基础层只定义核心错误，pencil 解析相关错误在 pv_physics 中定义，
//!    并通过 `From` 转换汇入本类型
//! 2. **易用性**: 提供便捷的构造方法
//! 3. **可追溯**: 支持错误链
//!
//! # 示例
//!
//! ```
//! use pv_foundation::error::{PvError, PvResult};
//!
//! fn read_tau() -> PvResult<f64> {
//!     Err(PvError::invalid_config("polymer.tau", "-1", "必须为正"))
//! }
//! assert!(read_tau().is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type PvResult<T> = Result<T, PvError>;

/// PolyVisc 错误类型
///
/// 按运行阶段分为三类：
/// - 启动期配置错误（致命，任何时间步之前终止）
/// - 运行期契约违背（致命，例如 pencil 缓存缺失依赖）
/// - 数值退化不属于错误，由计数器与日志报告
#[derive(Error, Debug)]
pub enum PvError {
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    /// 物理模块契约违背（缓存缺失、提供者未写入等）
    #[error("契约违背: {message}")]
    Contract {
        /// 具体错误信息
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl PvError {
    /// 从IO错误创建（带源）
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 契约违背
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract {
            message: message.into(),
        }
    }

    /// 是否为启动期配置类错误
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::InvalidConfig { .. })
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl PvError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> PvResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }
}

impl From<std::io::Error> for PvError {
    fn from(err: std::io::Error) -> Self {
        Self::io_with_source(err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PvError::invalid_config("polymer.tau", "0", "必须为正");
        let msg = err.to_string();
        assert!(msg.contains("polymer.tau"));
        assert!(msg.contains("必须为正"));
        assert!(err.is_config());
    }

    #[test]
    fn test_check_size() {
        assert!(PvError::check_size("poly", 6, 6).is_ok());
        let err = PvError::check_size("poly", 6, 5).unwrap_err();
        assert!(matches!(err, PvError::SizeMismatch { expected: 6, actual: 5, .. }));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "run.json");
        let err: PvError = io.into();
        assert!(matches!(err, PvError::Io { source: Some(_), .. }));
        assert!(!err.is_config());
    }
}
