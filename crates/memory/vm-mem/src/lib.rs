//! vm-mem - 对齐原生内存
//!
//! 为 intrinsic 测试提供：
//! - 显式分配器能力与带对齐标记的缓冲区句柄 ([`aligned`])
//! - 两个输入缓冲区的只读数据表 ([`data_table`])

pub mod aligned;
pub mod data_table;
pub mod error;

pub use aligned::{
    AlignedBuffer, AlignmentTag, BufferAllocator, MisalignedAllocator, SystemAlignedAllocator,
    VECTOR256_ALIGNMENT,
};
pub use data_table::AlignedDataTable;
pub use error::MemError;
