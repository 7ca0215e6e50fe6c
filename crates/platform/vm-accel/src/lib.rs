//! vm-accel - 主机 CPU 检测
//!
//! 为 intrinsic 层提供硬件能力查询：
//! - [`CpuInfo`]：厂商、架构、型号和 SIMD 特性（进程内单例）
//! - [`SimdCapabilities`]：TestZ 归约指令与向量加载指令两个独立标志

pub mod caps;
pub mod cpuinfo;

pub use caps::SimdCapabilities;
pub use cpuinfo::{CpuArch, CpuFeatures, CpuInfo, CpuVendor};
