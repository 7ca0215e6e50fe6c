//! CPU Information and Feature Detection
//!
//! 检测 CPU 型号、厂商和 SIMD 特性。检测结果在进程内只计算一次。

use std::sync::OnceLock;

use serde::Serialize;

/// CPU 厂商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CpuVendor {
    Intel,
    AMD,
    Apple,
    ARM,
    Unknown,
}

/// CPU 架构
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CpuArch {
    X86_64,
    AArch64,
    Unknown,
}

/// 256 位及以上的 SIMD 特性标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CpuFeatures {
    /// CPUID 报告 AVX 且操作系统保存 YMM 状态
    pub avx: bool,
    pub avx2: bool,
    pub avx512f: bool,
}

/// CPU 信息
#[derive(Debug, Clone, Serialize)]
pub struct CpuInfo {
    pub vendor: CpuVendor,
    pub arch: CpuArch,
    pub model_name: String,
    pub features: CpuFeatures,
    pub core_count: usize,
}

static CPU_INFO: OnceLock<CpuInfo> = OnceLock::new();

impl CpuInfo {
    /// 获取全局 CPU 信息（单例）
    pub fn get() -> &'static CpuInfo {
        CPU_INFO.get_or_init(Self::detect)
    }

    /// 检测 CPU 信息
    fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        let info = Self::detect_x86_64();

        #[cfg(target_arch = "aarch64")]
        let info = Self::detect_aarch64();

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        let info = Self::unknown();

        log::debug!(
            "Detected {:?} CPU ({:?}): {}",
            info.vendor,
            info.arch,
            info.model_name
        );
        info
    }

    /// 检测 x86_64 CPU 信息
    #[cfg(target_arch = "x86_64")]
    fn detect_x86_64() -> Self {
        use raw_cpuid::CpuId;

        let cpuid = CpuId::new();
        let mut features = CpuFeatures::default();
        let mut vendor = CpuVendor::Unknown;
        let mut model_name = String::from("Unknown x86_64 CPU");

        // 检测厂商
        if let Some(vendor_info) = cpuid.get_vendor_info() {
            vendor = match vendor_info.as_str() {
                "GenuineIntel" => CpuVendor::Intel,
                "AuthenticAMD" => CpuVendor::AMD,
                _ => CpuVendor::Unknown,
            };
        }

        // 获取型号名称
        if let Some(brand) = cpuid.get_processor_brand_string() {
            let brand = brand.as_str().trim();
            if !brand.is_empty() {
                model_name = brand.to_string();
            }
        }

        if let Some(feature_info) = cpuid.get_feature_info() {
            // CPUID 只说明硬件支持；YMM 寄存器是否被 OS 保存由标准库检测器确认 (XCR0)
            features.avx = feature_info.has_avx() && is_x86_feature_detected!("avx");
        }

        // 检测扩展特性
        if let Some(ext_features) = cpuid.get_extended_feature_info() {
            features.avx2 = ext_features.has_avx2() && is_x86_feature_detected!("avx2");
            features.avx512f = ext_features.has_avx512f() && is_x86_feature_detected!("avx512f");
        }

        Self {
            vendor,
            arch: CpuArch::X86_64,
            model_name,
            features,
            core_count: num_cpus::get(),
        }
    }

    /// 检测 AArch64 CPU 信息
    #[cfg(target_arch = "aarch64")]
    fn detect_aarch64() -> Self {
        // 没有 256 位 YMM 指令
        let features = CpuFeatures::default();

        let vendor = if cfg!(target_os = "macos") {
            CpuVendor::Apple
        } else {
            CpuVendor::ARM
        };

        Self {
            vendor,
            arch: CpuArch::AArch64,
            model_name: String::from("Unknown ARM64 CPU"),
            features,
            core_count: num_cpus::get(),
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    fn unknown() -> Self {
        Self {
            vendor: CpuVendor::Unknown,
            arch: CpuArch::Unknown,
            model_name: String::from("Unknown CPU"),
            features: CpuFeatures::default(),
            core_count: num_cpus::get(),
        }
    }

    /// 一行摘要，用于日志和运行报告
    pub fn summary(&self) -> String {
        format!(
            "{:?} {:?} '{}' ({} cores, avx={}, avx2={}, avx512f={})",
            self.vendor,
            self.arch,
            self.model_name,
            self.core_count,
            self.features.avx,
            self.features.avx2,
            self.features.avx512f
        )
    }
}
