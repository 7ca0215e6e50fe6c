//! 256-bit 向量值
//!
//! [`Vector256<T>`] 是不可变的寄存器值，只由 lane 内容决定，没有身份。
//! 内部以 32 字节保存，按 32 字节对齐布局，方便直接作为 YMM 操作数来源。

use std::fmt;
use std::marker::PhantomData;

use crate::error::SimdError;
use crate::lane::Lane;

/// 256-bit 向量的字节数
pub const VECTOR256_BYTES: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C, align(32))]
pub struct Vector256<T: Lane> {
    bytes: [u8; VECTOR256_BYTES],
    _lane: PhantomData<T>,
}

impl<T: Lane> Vector256<T> {
    /// lane 数
    pub const ELEMENT_COUNT: usize = VECTOR256_BYTES / T::SIZE;

    pub const fn zero() -> Self {
        Self::from_bytes([0; VECTOR256_BYTES])
    }

    pub const fn from_bytes(bytes: [u8; VECTOR256_BYTES]) -> Self {
        Self {
            bytes,
            _lane: PhantomData,
        }
    }

    /// 由恰好 `ELEMENT_COUNT` 个 lane 构造
    pub fn from_lanes(lanes: &[T]) -> Result<Self, SimdError> {
        if lanes.len() != Self::ELEMENT_COUNT {
            return Err(SimdError::LaneCount {
                expected: Self::ELEMENT_COUNT,
                actual: lanes.len(),
            });
        }

        let mut bytes = [0u8; VECTOR256_BYTES];
        for (lane, chunk) in lanes.iter().zip(bytes.chunks_exact_mut(T::SIZE)) {
            lane.write_ne(chunk);
        }
        Ok(Self::from_bytes(bytes))
    }

    /// 所有 lane 取同一个值
    pub fn splat(value: T) -> Self {
        let mut bytes = [0u8; VECTOR256_BYTES];
        for chunk in bytes.chunks_exact_mut(T::SIZE) {
            value.write_ne(chunk);
        }
        Self::from_bytes(bytes)
    }

    /// 从任意地址读取 32 字节，不要求对齐
    ///
    /// # Safety
    ///
    /// `address` 起始的 32 字节必须可读。
    pub unsafe fn read_unaligned(address: *const T) -> Self {
        // SAFETY: 由调用方保证 32 字节可读；read_unaligned 不要求对齐。
        let bytes = unsafe { std::ptr::read_unaligned(address.cast::<[u8; VECTOR256_BYTES]>()) };
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; VECTOR256_BYTES] {
        &self.bytes
    }

    pub fn lanes(&self) -> Vec<T> {
        self.bytes.chunks_exact(T::SIZE).map(T::from_ne_slice).collect()
    }

    pub fn lane(&self, index: usize) -> Option<T> {
        self.bytes.chunks_exact(T::SIZE).nth(index).map(T::from_ne_slice)
    }
}

impl<T: Lane> Default for Vector256<T> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<T: Lane> fmt::Debug for Vector256<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector256<{}>{}", T::KIND, self)
    }
}

/// `(l0, l1, ...)`
impl<T: Lane> fmt::Display for Vector256<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, lane) in self.lanes().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", lane)?;
        }
        f.write_str(")")
    }
}
