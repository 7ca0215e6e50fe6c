//! 运行入口
//!
//! 根据配置检测能力、生成进程级 fixture、构造测试实例并运行场景矩阵，最后汇总成
//! [`RunReport`]。结果不成功时 [`TestZHarness::run`] 返回 `HarnessError::ScenariosFailed`。

use std::sync::Arc;

use log::{error, info};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::Serialize;
use vm_accel::{CpuInfo, SimdCapabilities};
use vm_mem::{BufferAllocator, MisalignedAllocator, SystemAlignedAllocator};
use vm_simd::{Avx, IntrinsicRegistry, LaneKind};

use crate::config::{Config, HarnessConfig, MAX_SEED};
use crate::data::RandomLane;
use crate::error::HarnessError;
use crate::fixture::ClassFixture;
use crate::outcome::{MismatchReport, SkippedScenario};
use crate::runner::{BooleanBinaryOpTest, SupportState, TestSetup};
use crate::scenario::{Scenario, ScenarioMatrix};
use crate::validator::method_descriptor;

/// 一次运行的汇总
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub lane: LaneKind,
    pub method: String,
    pub seed: u64,
    pub host: String,
    pub capabilities: SimdCapabilities,
    pub state: SupportState,
    pub table_aligned: bool,
    pub succeeded: bool,
    pub executed: Vec<Scenario>,
    pub skipped: Vec<SkippedScenario>,
    pub mismatches: Vec<MismatchReport>,
}

impl RunReport {
    /// 不成功时转换为终止错误
    pub fn into_result(self) -> Result<Self, HarnessError> {
        if self.succeeded {
            Ok(self)
        } else {
            Err(HarnessError::ScenariosFailed {
                failed: self.mismatches.len().max(1),
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestZHarness {
    config: HarnessConfig,
    capabilities: SimdCapabilities,
    registry: Option<Arc<IntrinsicRegistry>>,
}

impl TestZHarness {
    /// 验证配置并按主机检测结果确定能力
    pub fn new(config: HarnessConfig) -> Result<Self, HarnessError> {
        config.validate()?;
        let capabilities = config.capabilities(SimdCapabilities::detect());
        Ok(Self {
            config,
            capabilities,
            registry: None,
        })
    }

    /// 以给定能力替换检测结果（配置中的覆盖项仍然生效）
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: SimdCapabilities) -> Self {
        self.capabilities = self.config.capabilities(capabilities);
        self
    }

    /// 替换动态调用使用的方法表
    #[must_use]
    pub fn with_registry(mut self, registry: IntrinsicRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn capabilities(&self) -> SimdCapabilities {
        self.capabilities
    }

    /// 运行并返回报告；不一致不会变成错误
    pub fn execute(&self) -> Result<RunReport, HarnessError> {
        match self.config.lane {
            LaneKind::U8 => self.execute_lane::<u8>(),
            LaneKind::I8 => self.execute_lane::<i8>(),
            LaneKind::U16 => self.execute_lane::<u16>(),
            LaneKind::I16 => self.execute_lane::<i16>(),
            LaneKind::U32 => self.execute_lane::<u32>(),
            LaneKind::I32 => self.execute_lane::<i32>(),
            LaneKind::U64 => self.execute_lane::<u64>(),
            LaneKind::I64 => self.execute_lane::<i64>(),
        }
    }

    /// 运行；任一场景不一致时返回 `HarnessError::ScenariosFailed`
    pub fn run(&self) -> Result<RunReport, HarnessError> {
        self.execute()?.into_result()
    }

    fn execute_lane<T: RandomLane>(&self) -> Result<RunReport, HarnessError> {
        let method = method_descriptor::<T>();
        // 抽取的种子也要能写回 TOML 配置
        let seed = self
            .config
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(0..=MAX_SEED));
        let host = CpuInfo::get().summary();
        info!("{} on {} (seed {})", method, host, seed);
        info!(
            "Capabilities: test_z={}, vector_load={}",
            self.capabilities.test_z(),
            self.capabilities.vector_load()
        );

        let avx = Avx::new(self.capabilities);
        let mut rng = StdRng::seed_from_u64(seed);
        let fixture = ClassFixture::<T>::generate(&mut rng);

        let registry = self
            .registry
            .clone()
            .unwrap_or_else(|| Arc::new(IntrinsicRegistry::with_avx(avx)));
        let allocator: Arc<dyn BufferAllocator> = if self.config.misaligned_table {
            Arc::new(MisalignedAllocator::default())
        } else {
            Arc::new(SystemAlignedAllocator)
        };

        let setup = TestSetup::new(avx, fixture)
            .with_registry(registry)
            .with_allocator(allocator)
            .with_alignment(self.config.alignment);

        let mut test = BooleanBinaryOpTest::new(setup, rng.next_u64())?;
        test.run(&ScenarioMatrix::new(&self.config.skip))?;

        let state = test.state();
        let table_aligned = test.table_aligned();
        let outcome = test.into_outcome();

        info!(
            "{}: {} executed, {} skipped, {} mismatches",
            method,
            outcome.executed().len(),
            outcome.skipped().len(),
            outcome.mismatches().len()
        );
        if !outcome.succeeded() {
            error!("{}: run failed (seed {})", method, seed);
        }

        Ok(RunReport {
            lane: T::KIND,
            method,
            seed,
            host,
            capabilities: self.capabilities,
            state,
            table_aligned,
            succeeded: outcome.succeeded(),
            executed: outcome.executed().to_vec(),
            skipped: outcome.skipped().to_vec(),
            mismatches: outcome.mismatches().to_vec(),
        })
    }
}

/// 以主机能力运行一次
pub fn run_test_z(config: HarnessConfig) -> Result<RunReport, HarnessError> {
    TestZHarness::new(config)?.run()
}
