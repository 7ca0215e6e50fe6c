//! 验证框架错误类型
//!
//! 比较不一致 (mismatch) 不是错误值：它记录在 `TestOutcome` 上，不会中断后续场景。
//! 这里只包含立即终止运行的错误，以及运行结束时的汇总失败。

use vm_mem::MemError;
use vm_simd::SimdError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// 数据表分配失败，测试实例无法继续
    #[error("Aligned data table allocation failed: {0}")]
    Allocation(#[from] MemError),

    /// 不在预期位置出现的 intrinsic 错误（包括支持状态下的 PlatformNotSupported）
    #[error("Unexpected intrinsic failure: {0}")]
    Simd(#[from] SimdError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Dynamic invocation of {method} returned {actual}, expected bool")]
    UnexpectedReturnType { method: String, actual: String },

    /// 至少一个场景的结果与参考计算不一致
    #[error("One or more scenarios did not complete as expected.")]
    ScenariosFailed { failed: usize },
}
