//! AVX intrinsic 接口
//!
//! 与硬件能力绑定的 [`Avx`] 句柄提供：
//! - `test_z`: VPTEST ymm，两个操作数按位与后全零时返回 true
//! - `load_vector256`: VMOVDQU ymm，非对齐加载
//! - `load_aligned_vector256`: VMOVDQA ymm，要求 32 字节对齐
//!
//! 能力缺失时调用返回 `SimdError::PlatformNotSupported`，不会执行指令。

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use vm_accel::SimdCapabilities;

use crate::error::SimdError;
use crate::lane::Lane;
use crate::vector::{VECTOR256_BYTES, Vector256};

/// AVX 指令集句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avx {
    caps: SimdCapabilities,
}

impl Avx {
    /// 动态调用时使用的类名
    pub const NAME: &'static str = "Avx";
    pub const TEST_Z: &'static str = "test_z";
    pub const LOAD_VECTOR256: &'static str = "load_vector256";
    pub const LOAD_ALIGNED_VECTOR256: &'static str = "load_aligned_vector256";

    pub fn new(caps: SimdCapabilities) -> Self {
        Self { caps }
    }

    /// 按主机 CPU 检测结果创建
    pub fn detect() -> Self {
        Self::new(SimdCapabilities::detect())
    }

    pub fn capabilities(&self) -> SimdCapabilities {
        self.caps
    }

    /// TestZ 归约指令是否可用
    pub fn is_supported(&self) -> bool {
        self.caps.test_z()
    }

    /// 向量加载指令是否可用（与 TestZ 独立）
    pub fn is_load_supported(&self) -> bool {
        self.caps.vector_load()
    }

    fn not_supported(operation: &'static str) -> SimdError {
        SimdError::PlatformNotSupported {
            isa: Self::NAME,
            operation,
        }
    }

    /// `(left & right) == 0` 对整个 256 位寄存器成立时返回 true
    pub fn test_z<T: Lane>(&self, left: Vector256<T>, right: Vector256<T>) -> Result<bool, SimdError> {
        if !self.caps.test_z() {
            return Err(Self::not_supported(Self::TEST_Z));
        }
        platform::test_z(left.as_bytes(), right.as_bytes())
            .ok_or_else(|| Self::not_supported(Self::TEST_Z))
    }

    /// 非对齐加载 256 位
    ///
    /// # Safety
    ///
    /// `address` 起始的 32 字节必须可读。
    pub unsafe fn load_vector256<T: Lane>(&self, address: *const T) -> Result<Vector256<T>, SimdError> {
        if !self.caps.vector_load() {
            return Err(Self::not_supported(Self::LOAD_VECTOR256));
        }
        // SAFETY: 由调用方保证 32 字节可读。
        unsafe { platform::load_unaligned(address.cast()) }
            .map(Vector256::from_bytes)
            .ok_or_else(|| Self::not_supported(Self::LOAD_VECTOR256))
    }

    /// 对齐加载 256 位；地址未按 32 字节对齐时返回 `SimdError::Misaligned`
    ///
    /// # Safety
    ///
    /// `address` 起始的 32 字节必须可读。
    pub unsafe fn load_aligned_vector256<T: Lane>(
        &self,
        address: *const T,
    ) -> Result<Vector256<T>, SimdError> {
        if !self.caps.vector_load() {
            return Err(Self::not_supported(Self::LOAD_ALIGNED_VECTOR256));
        }

        let addr = address as usize;
        if addr % VECTOR256_BYTES != 0 {
            return Err(SimdError::Misaligned {
                address: addr,
                required: VECTOR256_BYTES,
            });
        }

        // SAFETY: 地址已检查对齐，可读性由调用方保证。
        unsafe { platform::load_aligned(address.cast()) }
            .map(Vector256::from_bytes)
            .ok_or_else(|| Self::not_supported(Self::LOAD_ALIGNED_VECTOR256))
    }
}

/// 硬件路径；返回 `None` 表示当前 CPU 无法执行
#[cfg(target_arch = "x86_64")]
mod platform {
    use super::*;

    pub(super) fn test_z(left: &[u8; VECTOR256_BYTES], right: &[u8; VECTOR256_BYTES]) -> Option<bool> {
        if !is_x86_feature_detected!("avx") {
            return None;
        }
        // SAFETY: 已确认 AVX 可用，两个数组各 32 字节。
        Some(unsafe { vptest_256(left.as_ptr(), right.as_ptr()) })
    }

    pub(super) unsafe fn load_unaligned(address: *const u8) -> Option<[u8; VECTOR256_BYTES]> {
        if !is_x86_feature_detected!("avx") {
            return None;
        }
        // SAFETY: 已确认 AVX 可用，可读性由调用方保证。
        Some(unsafe { vmovdqu_256(address) })
    }

    pub(super) unsafe fn load_aligned(address: *const u8) -> Option<[u8; VECTOR256_BYTES]> {
        if !is_x86_feature_detected!("avx") {
            return None;
        }
        // SAFETY: 已确认 AVX 可用，地址对齐与可读性由调用方保证。
        Some(unsafe { vmovdqa_256(address) })
    }

    #[target_feature(enable = "avx")]
    unsafe fn vptest_256(left: *const u8, right: *const u8) -> bool {
        // SAFETY: 两个指针各指向 32 字节。
        let (a, b) = unsafe {
            (
                _mm256_loadu_si256(left.cast::<__m256i>()),
                _mm256_loadu_si256(right.cast::<__m256i>()),
            )
        };
        _mm256_testz_si256(a, b) != 0
    }

    #[target_feature(enable = "avx")]
    unsafe fn vmovdqu_256(address: *const u8) -> [u8; VECTOR256_BYTES] {
        let mut out = [0u8; VECTOR256_BYTES];
        // SAFETY: 源 32 字节可读，out 为 32 字节。
        unsafe {
            let v = _mm256_loadu_si256(address.cast::<__m256i>());
            _mm256_storeu_si256(out.as_mut_ptr().cast::<__m256i>(), v);
        }
        out
    }

    #[target_feature(enable = "avx")]
    unsafe fn vmovdqa_256(address: *const u8) -> [u8; VECTOR256_BYTES] {
        let mut out = [0u8; VECTOR256_BYTES];
        // SAFETY: 源 32 字节对齐且可读，out 为 32 字节。
        unsafe {
            let v = _mm256_load_si256(address.cast::<__m256i>());
            _mm256_storeu_si256(out.as_mut_ptr().cast::<__m256i>(), v);
        }
        out
    }
}

#[cfg(not(target_arch = "x86_64"))]
mod platform {
    use super::*;

    pub(super) fn test_z(_left: &[u8; VECTOR256_BYTES], _right: &[u8; VECTOR256_BYTES]) -> Option<bool> {
        None
    }

    pub(super) unsafe fn load_unaligned(_address: *const u8) -> Option<[u8; VECTOR256_BYTES]> {
        None
    }

    pub(super) unsafe fn load_aligned(_address: *const u8) -> Option<[u8; VECTOR256_BYTES]> {
        None
    }
}
