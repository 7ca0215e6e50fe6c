//! SIMD capability flags consumed by the intrinsic layer.
//!
//! Two flags are tracked independently because a platform (or a configuration
//! override) may expose the 256-bit test instruction without the separate
//! vector load/store path, or the reverse.

use serde::Serialize;

use crate::cpuinfo::CpuInfo;

/// 硬件能力查询结果
///
/// 字段是私有的：能力只能从检测结果得到，之后只能被收窄
/// (`without_*` / `none`)，不能凭空打开。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimdCapabilities {
    test_z: bool,
    vector_load: bool,
}

impl SimdCapabilities {
    /// 从主机 CPU 检测能力
    pub fn detect() -> Self {
        Self::from_cpu(CpuInfo::get())
    }

    /// 从已检测的 CPU 信息推导能力
    pub fn from_cpu(info: &CpuInfo) -> Self {
        // VPTEST ymm 与 VMOVDQU/VMOVDQA ymm 都属于 AVX
        let avx = info.features.avx;
        Self {
            test_z: avx,
            vector_load: avx,
        }
    }

    /// 不支持任何路径（模拟缺少 AVX 的硬件）
    pub const fn none() -> Self {
        Self {
            test_z: false,
            vector_load: false,
        }
    }

    /// 256-bit TestZ 归约指令是否可用
    pub const fn test_z(&self) -> bool {
        self.test_z
    }

    /// 256-bit 对齐/非对齐加载指令是否可用
    pub const fn vector_load(&self) -> bool {
        self.vector_load
    }

    #[must_use]
    pub const fn without_test_z(self) -> Self {
        Self {
            test_z: false,
            ..self
        }
    }

    #[must_use]
    pub const fn without_vector_load(self) -> Self {
        Self {
            vector_load: false,
            ..self
        }
    }
}
