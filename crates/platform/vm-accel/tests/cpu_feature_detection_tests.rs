//! CPU Feature Detection Tests

use vm_accel::cpuinfo::{CpuArch, CpuInfo};
use vm_accel::{CpuFeatures, SimdCapabilities};

#[test]
fn test_cpu_features_detect() {
    let features = CpuInfo::get().features;

    println!("CPU Features detected:");
    println!("  AVX: {}", features.avx);
    println!("  AVX2: {}", features.avx2);
    println!("  AVX512F: {}", features.avx512f);

    #[cfg(not(target_arch = "x86_64"))]
    assert_eq!(features, CpuFeatures::default());
}

#[test]
fn test_cpu_features_default() {
    let features = CpuFeatures::default();

    assert!(!features.avx);
    assert!(!features.avx2);
    assert!(!features.avx512f);
}

#[test]
fn test_cpu_info_detection() {
    let cpu_info = CpuInfo::get();

    println!("CPU Information: {}", cpu_info.summary());

    assert!(cpu_info.core_count > 0, "Should have at least one core");
    assert!(!cpu_info.model_name.is_empty(), "Model name should not be empty");

    #[cfg(target_arch = "x86_64")]
    assert_eq!(cpu_info.arch, CpuArch::X86_64);

    #[cfg(target_arch = "aarch64")]
    assert_eq!(cpu_info.arch, CpuArch::AArch64);
}

#[test]
fn test_capabilities_follow_avx() {
    let info = CpuInfo::get();
    let caps = SimdCapabilities::from_cpu(info);

    assert_eq!(caps.test_z(), info.features.avx);
    assert_eq!(caps.vector_load(), info.features.avx);

    #[cfg(not(target_arch = "x86_64"))]
    assert_eq!(caps, SimdCapabilities::none());
}

#[test]
fn test_capabilities_serialize() {
    let json = serde_json::to_string(&SimdCapabilities::none()).unwrap();
    assert_eq!(json, r#"{"test_z":false,"vector_load":false}"#);
}
