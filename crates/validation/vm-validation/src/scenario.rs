//! 场景矩阵
//!
//! 每个场景是一种操作数来源（非对齐读取、加载、对齐加载、进程级预置值、局部变量、
//! 实例字段、新实例字段）与调用方式（直接调用或动态查找调用）的组合。不同来源会让
//! JIT 走不同的代码生成路径，但结果必须与参考计算一致。

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vm_simd::Avx;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// 从数据表非对齐读取
    BasicUnsafeRead,
    /// 从数据表 `load_vector256`
    BasicLoad,
    /// 从数据表 `load_aligned_vector256`
    BasicLoadAligned,
    /// 经注册表查找调用，操作数非对齐读取
    DynamicUnsafeRead,
    DynamicLoad,
    DynamicLoadAligned,
    /// 进程级预置操作数
    ClassFixture,
    /// 先复制到局部变量再调用
    LocalUnsafeRead,
    LocalLoad,
    LocalLoadAligned,
    /// 新构造实例的字段
    FreshInstanceField,
    /// 当前实例的字段
    InstanceField,
}

impl Scenario {
    /// 执行顺序
    pub const ALL: [Scenario; 12] = [
        Scenario::BasicUnsafeRead,
        Scenario::BasicLoad,
        Scenario::BasicLoadAligned,
        Scenario::DynamicUnsafeRead,
        Scenario::DynamicLoad,
        Scenario::DynamicLoadAligned,
        Scenario::ClassFixture,
        Scenario::LocalUnsafeRead,
        Scenario::LocalLoad,
        Scenario::LocalLoadAligned,
        Scenario::FreshInstanceField,
        Scenario::InstanceField,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Scenario::BasicUnsafeRead => "basic_unsafe_read",
            Scenario::BasicLoad => "basic_load",
            Scenario::BasicLoadAligned => "basic_load_aligned",
            Scenario::DynamicUnsafeRead => "dynamic_unsafe_read",
            Scenario::DynamicLoad => "dynamic_load",
            Scenario::DynamicLoadAligned => "dynamic_load_aligned",
            Scenario::ClassFixture => "class_fixture",
            Scenario::LocalUnsafeRead => "local_unsafe_read",
            Scenario::LocalLoad => "local_load",
            Scenario::LocalLoadAligned => "local_load_aligned",
            Scenario::FreshInstanceField => "fresh_instance_field",
            Scenario::InstanceField => "instance_field",
        }
    }

    /// 需要向量加载指令（独立于 TestZ 的能力标志）
    pub const fn requires_vector_load(self) -> bool {
        matches!(
            self,
            Scenario::BasicLoad
                | Scenario::BasicLoadAligned
                | Scenario::DynamicLoad
                | Scenario::DynamicLoadAligned
                | Scenario::LocalLoad
                | Scenario::LocalLoadAligned
        )
    }

    /// 需要数据表满足向量宽度对齐
    pub const fn requires_aligned_table(self) -> bool {
        matches!(
            self,
            Scenario::BasicLoadAligned | Scenario::DynamicLoadAligned | Scenario::LocalLoadAligned
        )
    }

    pub const fn is_dynamic(self) -> bool {
        matches!(
            self,
            Scenario::DynamicUnsafeRead | Scenario::DynamicLoad | Scenario::DynamicLoadAligned
        )
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| format!("unknown scenario '{}'", s))
    }
}

/// 场景被跳过的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// 配置中关闭
    Disabled,
    /// 硬件（或配置覆盖）不支持向量加载
    VectorLoadUnsupported,
    /// 数据表没有对齐到向量宽度
    TableNotAligned,
    /// 动态查找没有找到方法
    MethodNotFound,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Disabled => "disabled by configuration",
            SkipReason::VectorLoadUnsupported => "vector load instructions not supported",
            SkipReason::TableNotAligned => "data table is not aligned to the vector width",
            SkipReason::MethodNotFound => "method could not be resolved",
        };
        f.write_str(text)
    }
}

/// 计划中的一个场景
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedScenario {
    pub scenario: Scenario,
    pub skip: Option<SkipReason>,
}

/// 可按配置关闭单个场景的矩阵
#[derive(Debug, Clone, Default)]
pub struct ScenarioMatrix {
    disabled: HashSet<Scenario>,
}

impl ScenarioMatrix {
    pub fn new(disabled: &[Scenario]) -> Self {
        Self {
            disabled: disabled.iter().copied().collect(),
        }
    }

    pub fn is_enabled(&self, scenario: Scenario) -> bool {
        !self.disabled.contains(&scenario)
    }

    /// 支持状态下的执行计划（按 [`Scenario::ALL`] 顺序）
    pub fn plan(&self, avx: &Avx, table_aligned: bool) -> Vec<PlannedScenario> {
        Scenario::ALL
            .into_iter()
            .map(|scenario| {
                let skip = if !self.is_enabled(scenario) {
                    Some(SkipReason::Disabled)
                } else if scenario.requires_vector_load() && !avx.is_load_supported() {
                    Some(SkipReason::VectorLoadUnsupported)
                } else if scenario.requires_aligned_table() && !table_aligned {
                    Some(SkipReason::TableNotAligned)
                } else {
                    None
                };
                PlannedScenario { scenario, skip }
            })
            .collect()
    }
}
