//! 测试结果累积
//!
//! 成功标志初始为 true，第一次不一致或意外错误时置为 false，之后不再恢复。
//! 所有不一致都会累积，一次运行报告全部失败场景。

use serde::Serialize;

use crate::scenario::{Scenario, SkipReason};

/// 一次不一致的诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchReport {
    pub scenario: Scenario,
    /// 例如 `Avx::test_z<u16>(Vector256<u16>, Vector256<u16>)`
    pub method: String,
    pub left: String,
    pub right: String,
    pub result: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkippedScenario {
    pub scenario: Scenario,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct TestOutcome {
    succeeded: bool,
    executed: Vec<Scenario>,
    skipped: Vec<SkippedScenario>,
    mismatches: Vec<MismatchReport>,
}

impl Default for TestOutcome {
    fn default() -> Self {
        Self::new()
    }
}

impl TestOutcome {
    pub fn new() -> Self {
        Self {
            succeeded: true,
            executed: Vec::new(),
            skipped: Vec::new(),
            mismatches: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// 标记失败（不可恢复）
    pub fn fail(&mut self) {
        self.succeeded = false;
    }

    pub fn record_mismatch(&mut self, report: MismatchReport) {
        self.fail();
        self.mismatches.push(report);
    }

    pub fn record_executed(&mut self, scenario: Scenario) {
        self.executed.push(scenario);
    }

    pub fn record_skipped(&mut self, scenario: Scenario, reason: SkipReason) {
        self.skipped.push(SkippedScenario { scenario, reason });
    }

    pub fn executed(&self) -> &[Scenario] {
        &self.executed
    }

    pub fn skipped(&self) -> &[SkippedScenario] {
        &self.skipped
    }

    pub fn mismatches(&self) -> &[MismatchReport] {
        &self.mismatches
    }
}
