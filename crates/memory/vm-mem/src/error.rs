//! vm-mem 错误类型

/// 对齐内存分配错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemError {
    #[error("Invalid alignment {align} for a {size}-byte buffer")]
    InvalidAlignment { size: usize, align: usize },

    #[error("Invalid buffer size: {0}")]
    InvalidSize(usize),

    #[error("Memory allocation failed: {size} bytes aligned to {align}")]
    AllocationFailed { size: usize, align: usize },
}
