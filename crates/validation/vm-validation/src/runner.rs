//! 布尔二元 intrinsic 测试实例
//!
//! 一个 [`BooleanBinaryOpTest`] 拥有自己的数据表和实例字段操作数，按场景矩阵把操作数送进
//! `Avx::test_z`，再交给校验器比较。构造时根据能力查询确定支持状态：
//!
//! - `Supported`: 运行完整矩阵
//! - `Unsupported`: 只运行 `basic_unsafe_read`，必须得到 `PlatformNotSupported`
//!
//! 初始化分三步：进程级 fixture 由调用方预先生成；实例先生成字段操作数，再为数据表生成新数据。

use std::sync::Arc;

use log::{debug, error, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use vm_mem::{AlignedDataTable, BufferAllocator, SystemAlignedAllocator, VECTOR256_ALIGNMENT};
use vm_simd::{Avx, IntrinsicRegistry, SimdError, TypeTag, VECTOR256_BYTES, Value, Vector256};

use crate::data::{RandomLane, random_lanes, random_vector};
use crate::error::HarnessError;
use crate::fixture::ClassFixture;
use crate::outcome::TestOutcome;
use crate::scenario::{Scenario, ScenarioMatrix, SkipReason};
use crate::validator::{method_descriptor, validate_bytes, validate_vectors};

/// 直接调用路径使用的 `test_z`
pub type TestZFn<T> = Arc<dyn Fn(Vector256<T>, Vector256<T>) -> Result<bool, SimdError> + Send + Sync>;

/// 所有测试实例共享的只读环境
#[derive(Clone)]
pub struct TestSetup<T: RandomLane> {
    pub avx: Avx,
    /// 默认转发到 `avx.test_z`
    pub test_z: TestZFn<T>,
    pub registry: Arc<IntrinsicRegistry>,
    pub fixture: Arc<ClassFixture<T>>,
    pub allocator: Arc<dyn BufferAllocator>,
    pub alignment: usize,
}

impl<T: RandomLane> TestSetup<T> {
    /// 系统对齐分配器、按 `avx` 注册的方法表
    pub fn new(avx: Avx, fixture: ClassFixture<T>) -> Self {
        Self {
            avx,
            test_z: Arc::new(move |left: Vector256<T>, right: Vector256<T>| avx.test_z(left, right)),
            registry: Arc::new(IntrinsicRegistry::with_avx(avx)),
            fixture: Arc::new(fixture),
            allocator: Arc::new(SystemAlignedAllocator),
            alignment: VECTOR256_ALIGNMENT,
        }
    }

    #[must_use]
    pub fn with_test_z<F>(mut self, test_z: F) -> Self
    where
        F: Fn(Vector256<T>, Vector256<T>) -> Result<bool, SimdError> + Send + Sync + 'static,
    {
        self.test_z = Arc::new(test_z);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<IntrinsicRegistry>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_allocator(mut self, allocator: Arc<dyn BufferAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    #[must_use]
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }
}

impl<T: RandomLane> std::fmt::Debug for TestSetup<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSetup")
            .field("avx", &self.avx)
            .field("registry", &self.registry)
            .field("fixture", &self.fixture)
            .field("allocator", &self.allocator)
            .field("alignment", &self.alignment)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportState {
    Supported,
    Unsupported,
}

/// 单个场景的执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioStatus {
    Completed,
    Skipped(SkipReason),
}

/// 数据表操作数的读取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandSource {
    UnsafeRead,
    Load,
    LoadAligned,
}

pub struct BooleanBinaryOpTest<T: RandomLane> {
    setup: TestSetup<T>,
    state: SupportState,
    fld1: Vector256<T>,
    fld2: Vector256<T>,
    data_table: AlignedDataTable<T>,
    rng: StdRng,
    outcome: TestOutcome,
}

impl<T: RandomLane> BooleanBinaryOpTest<T> {
    /// 构造测试实例；数据表分配失败时返回 `HarnessError::Allocation`
    pub fn new(setup: TestSetup<T>, seed: u64) -> Result<Self, HarnessError> {
        let mut rng = StdRng::seed_from_u64(seed);

        let fld1 = random_vector(&mut rng);
        let fld2 = random_vector(&mut rng);

        let data1 = random_lanes::<T, _>(&mut rng);
        let data2 = random_lanes::<T, _>(&mut rng);
        let data_table =
            AlignedDataTable::with_allocator(&data1, &data2, setup.alignment, setup.allocator.as_ref())?;

        let state = if setup.avx.is_supported() {
            SupportState::Supported
        } else {
            SupportState::Unsupported
        };

        Ok(Self {
            setup,
            state,
            fld1,
            fld2,
            data_table,
            rng,
            outcome: TestOutcome::new(),
        })
    }

    pub fn state(&self) -> SupportState {
        self.state
    }

    pub fn fields(&self) -> (Vector256<T>, Vector256<T>) {
        (self.fld1, self.fld2)
    }

    pub fn data_table(&self) -> &AlignedDataTable<T> {
        &self.data_table
    }

    pub fn outcome(&self) -> &TestOutcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> TestOutcome {
        self.outcome
    }

    /// 数据表两块缓冲区是否都满足向量宽度对齐
    pub fn table_aligned(&self) -> bool {
        self.data_table.is_aligned_to(VECTOR256_BYTES)
    }

    /// 按支持状态运行
    ///
    /// 不一致会累积到 outcome；只有分配失败和意外的 intrinsic 错误会中断。
    pub fn run(&mut self, matrix: &ScenarioMatrix) -> Result<(), HarnessError> {
        match self.state {
            SupportState::Supported => self.run_matrix(matrix),
            SupportState::Unsupported => self.run_unsupported_scenario(),
        }
    }

    fn run_matrix(&mut self, matrix: &ScenarioMatrix) -> Result<(), HarnessError> {
        for planned in matrix.plan(&self.setup.avx, self.table_aligned()) {
            let scenario = planned.scenario;
            if let Some(reason) = planned.skip {
                warn!("Skipping {}: {}", scenario, reason);
                self.outcome.record_skipped(scenario, reason);
                continue;
            }

            debug!("Running {} for {}", scenario, method_descriptor::<T>());
            match self.run_scenario(scenario)? {
                ScenarioStatus::Completed => self.outcome.record_executed(scenario),
                ScenarioStatus::Skipped(reason) => self.outcome.record_skipped(scenario, reason),
            }
        }
        Ok(())
    }

    /// 硬件不支持时，唯一允许的结果是 `PlatformNotSupported`
    pub fn run_unsupported_scenario(&mut self) -> Result<(), HarnessError> {
        let scenario = Scenario::BasicUnsafeRead;
        let result = self.run_scenario(scenario);
        self.outcome.record_executed(scenario);

        match result {
            Err(HarnessError::Simd(err)) if err.is_not_supported() => {
                debug!("{} raised the expected failure: {}", scenario, err);
                Ok(())
            }
            Ok(_) => {
                error!(
                    "{}: {} completed although the platform reports no support",
                    method_descriptor::<T>(),
                    scenario
                );
                self.outcome.fail();
                Ok(())
            }
            Err(err) => {
                self.outcome.fail();
                Err(err)
            }
        }
    }

    /// 运行单个场景
    pub fn run_scenario(&mut self, scenario: Scenario) -> Result<ScenarioStatus, HarnessError> {
        match scenario {
            Scenario::BasicUnsafeRead => self.run_basic(scenario, OperandSource::UnsafeRead),
            Scenario::BasicLoad => self.run_basic(scenario, OperandSource::Load),
            Scenario::BasicLoadAligned => self.run_basic(scenario, OperandSource::LoadAligned),
            Scenario::DynamicUnsafeRead => self.run_dynamic(scenario, OperandSource::UnsafeRead),
            Scenario::DynamicLoad => self.run_dynamic(scenario, OperandSource::Load),
            Scenario::DynamicLoadAligned => self.run_dynamic(scenario, OperandSource::LoadAligned),
            Scenario::ClassFixture => {
                let (left, right) = self.setup.fixture.operands();
                self.run_vectors(scenario, left, right)
            }
            Scenario::LocalUnsafeRead => self.run_local(scenario, OperandSource::UnsafeRead),
            Scenario::LocalLoad => self.run_local(scenario, OperandSource::Load),
            Scenario::LocalLoadAligned => self.run_local(scenario, OperandSource::LoadAligned),
            Scenario::FreshInstanceField => {
                let fresh = Self::new(self.setup.clone(), self.rng.next_u64())?;
                self.run_vectors(scenario, fresh.fld1, fresh.fld2)
            }
            Scenario::InstanceField => self.run_vectors(scenario, self.fld1, self.fld2),
        }
    }

    fn table_operands(&self, source: OperandSource) -> Result<(Vector256<T>, Vector256<T>), HarnessError> {
        let avx = &self.setup.avx;
        let op1 = self.data_table.in_array1_ptr();
        let op2 = self.data_table.in_array2_ptr();

        // SAFETY: 两块缓冲区各保存恰好一个向量宽度（ELEMENT_COUNT 个 lane），生命周期与 self 相同。
        let operands = unsafe {
            match source {
                OperandSource::UnsafeRead => (Vector256::read_unaligned(op1), Vector256::read_unaligned(op2)),
                OperandSource::Load => (avx.load_vector256(op1)?, avx.load_vector256(op2)?),
                OperandSource::LoadAligned => {
                    (avx.load_aligned_vector256(op1)?, avx.load_aligned_vector256(op2)?)
                }
            }
        };
        Ok(operands)
    }

    /// 直接调用，按数据表原始字节校验
    fn run_basic(&mut self, scenario: Scenario, source: OperandSource) -> Result<ScenarioStatus, HarnessError> {
        let (left, right) = self.table_operands(source)?;
        let result = (self.setup.test_z)(left, right)?;

        validate_bytes::<T>(
            &mut self.outcome,
            scenario,
            self.data_table.in_array1_bytes(),
            self.data_table.in_array2_bytes(),
            result,
        );
        Ok(ScenarioStatus::Completed)
    }

    /// 经注册表查找并以装箱参数调用
    fn run_dynamic(&mut self, scenario: Scenario, source: OperandSource) -> Result<ScenarioStatus, HarnessError> {
        let registry = Arc::clone(&self.setup.registry);
        let vector = TypeTag::Vector256(T::KIND);
        let Some(method) = registry.get_method(Avx::NAME, Avx::TEST_Z, &[vector, vector]) else {
            warn!(
                "{}: could not resolve {}::{}({}, {}), skipping",
                scenario,
                Avx::NAME,
                Avx::TEST_Z,
                vector,
                vector
            );
            return Ok(ScenarioStatus::Skipped(SkipReason::MethodNotFound));
        };

        let (left, right) = self.table_operands(source)?;
        let value = method.invoke(&[Value::from(left), Value::from(right)])?;
        let result = value.as_bool().ok_or_else(|| HarnessError::UnexpectedReturnType {
            method: method.key().to_string(),
            actual: value.type_tag().to_string(),
        })?;

        validate_bytes::<T>(
            &mut self.outcome,
            scenario,
            self.data_table.in_array1_bytes(),
            self.data_table.in_array2_bytes(),
            result,
        );
        Ok(ScenarioStatus::Completed)
    }

    /// 先复制到局部变量再调用
    fn run_local(&mut self, scenario: Scenario, source: OperandSource) -> Result<ScenarioStatus, HarnessError> {
        let (op1, op2) = self.table_operands(source)?;
        self.run_vectors(scenario, op1, op2)
    }

    fn run_vectors(
        &mut self,
        scenario: Scenario,
        left: Vector256<T>,
        right: Vector256<T>,
    ) -> Result<ScenarioStatus, HarnessError> {
        let result = (self.setup.test_z)(left, right)?;
        validate_vectors(&mut self.outcome, scenario, &left, &right, result);
        Ok(ScenarioStatus::Completed)
    }
}

impl<T: RandomLane> std::fmt::Debug for BooleanBinaryOpTest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BooleanBinaryOpTest")
            .field("state", &self.state)
            .field("fld1", &self.fld1)
            .field("fld2", &self.fld2)
            .field("data_table", &self.data_table)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}
