//! vm-validation - AVX TestZ 场景矩阵验证
//!
//! 对 `Avx::test_z` 的每一种操作数来源（数据表非对齐读取、加载、对齐加载、进程级 fixture、
//! 局部变量、实例字段、新实例字段）以及直接调用和动态查找调用两种方式，把硬件结果与
//! 标量参考计算比较。
//!
//! ## 使用
//!
//! ```rust,no_run
//! use vm_validation::{Config, HarnessConfig, TestZHarness};
//!
//! let config = HarnessConfig::defaults();
//! let report = TestZHarness::new(config)?.run()?;
//! println!("{} scenarios executed", report.executed.len());
//! # Ok::<(), vm_validation::HarnessError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod fixture;
pub mod harness;
pub mod outcome;
pub mod runner;
pub mod scenario;
pub mod validator;

pub use config::{Config, ConfigError, ENV_PREFIX, HarnessConfig, MAX_SEED};
pub use data::RandomLane;
pub use error::HarnessError;
pub use fixture::ClassFixture;
pub use harness::{RunReport, TestZHarness, run_test_z};
pub use outcome::{MismatchReport, SkippedScenario, TestOutcome};
pub use runner::{BooleanBinaryOpTest, ScenarioStatus, SupportState, TestSetup, TestZFn};
pub use scenario::{PlannedScenario, Scenario, ScenarioMatrix, SkipReason};
pub use validator::{reference_test_z, validate_bytes, validate_lanes, validate_vectors};
