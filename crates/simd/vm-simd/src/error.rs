//! vm-simd 错误类型

/// intrinsic 调用错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimdError {
    /// 硬件不支持该指令
    #[error("Operation is not supported on this platform: {isa}::{operation}")]
    PlatformNotSupported {
        isa: &'static str,
        operation: &'static str,
    },

    /// 对齐加载的地址不满足向量宽度对齐
    #[error("Address {address:#x} is not aligned to {required} bytes")]
    Misaligned { address: usize, required: usize },

    #[error("Expected {expected} lanes, got {actual}")]
    LaneCount { expected: usize, actual: usize },

    /// 动态调用的参数与签名不符
    #[error("Argument mismatch for {method}: {message}")]
    ArgumentMismatch { method: String, message: String },
}

impl SimdError {
    pub fn is_not_supported(&self) -> bool {
        matches!(self, SimdError::PlatformNotSupported { .. })
    }
}
