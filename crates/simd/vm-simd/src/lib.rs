//! vm-simd - 256-bit 向量与 AVX TestZ intrinsic
//!
//! ## 组成
//! - [`Lane`] / [`LaneKind`]: 向量元素类型（u8..i64）
//! - [`Vector256`]: 不可变的 256-bit 向量值
//! - [`Avx`]: 与硬件能力绑定的 intrinsic 句柄（`test_z`、非对齐/对齐加载）
//! - [`IntrinsicRegistry`]: 按名称和签名查找、以装箱参数调用的后绑定调用面

pub mod avx;
pub mod error;
pub mod lane;
pub mod registry;
pub mod vector;

pub use avx::Avx;
pub use error::SimdError;
pub use lane::{Lane, LaneKind};
pub use registry::{IntrinsicRegistry, MethodHandle, MethodKey, TypeTag, Value};
pub use vector::{VECTOR256_BYTES, Vector256};
