//! TestZ 验证运行器
//!
//! 按场景矩阵验证 `Avx::test_z`，可选把 JSON 报告写入文件。
//! 配置优先级：默认值 < `--config` 文件 < `TESTZ_*` 环境变量 < 命令行参数。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use vm_simd::LaneKind;
use vm_validation::{Config, ENV_PREFIX, HarnessConfig, HarnessError, RunReport, Scenario, TestZHarness};

#[derive(Debug, Parser)]
#[command(name = "testz_runner", version, about = "Validate Avx::test_z across every operand path")]
struct Cli {
    /// 配置文件（`.json` 或 TOML）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// lane 类型 (u8, i8, u16, i16, u32, i32, u64, i64)
    #[arg(short, long)]
    lane: Option<LaneKind>,

    /// 随机种子
    #[arg(short, long)]
    seed: Option<u64>,

    /// 数据表对齐（字节）
    #[arg(long)]
    alignment: Option<usize>,

    /// 按不支持 TestZ 处理
    #[arg(long)]
    disable_test_z: bool,

    /// 按不支持向量加载处理
    #[arg(long)]
    disable_vector_load: bool,

    /// 使用未对齐的数据表
    #[arg(long)]
    misaligned_table: bool,

    /// 跳过的场景，逗号分隔
    #[arg(long, value_delimiter = ',')]
    skip: Vec<Scenario>,

    /// 运行全部 lane 类型
    #[arg(long)]
    all_lanes: bool,

    /// JSON 报告输出路径
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// 以指定格式打印合并后的配置并退出
    #[arg(long, value_enum)]
    print_config: Option<ConfigFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConfigFormat {
    Toml,
    Json,
}

impl Cli {
    fn overrides(&self) -> HarnessConfig {
        let defaults = HarnessConfig::defaults();
        HarnessConfig {
            lane: self.lane.unwrap_or(defaults.lane),
            seed: self.seed,
            alignment: self.alignment.unwrap_or(defaults.alignment),
            disable_test_z: self.disable_test_z,
            disable_vector_load: self.disable_vector_load,
            misaligned_table: self.misaligned_table,
            skip: self.skip.clone(),
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<HarnessConfig> {
    let mut config = HarnessConfig::defaults();

    if let Some(path) = &cli.config {
        let file = HarnessConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?;
        config = config.merge(&file)?;
    }

    config = config.merge(&HarnessConfig::from_env(ENV_PREFIX)?)?;

    let mut config = config.merge(&cli.overrides())?;
    // 命令行显式给出的值总是生效，包括与默认值相同的值
    if let Some(lane) = cli.lane {
        config.lane = lane;
    }
    if let Some(alignment) = cli.alignment {
        config.alignment = alignment;
    }

    config.validate()?;
    Ok(config)
}

fn write_report(path: &Path, reports: &[RunReport]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(reports)?;
    fs::write(path, json).with_context(|| format!("writing report to {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Some(format) = cli.print_config {
        let text = match format {
            ConfigFormat::Toml => config.to_toml()?,
            ConfigFormat::Json => config.to_json()?,
        };
        println!("{}", text.trim_end());
        return Ok(());
    }

    let lanes = if cli.all_lanes {
        LaneKind::ALL.to_vec()
    } else {
        vec![config.lane]
    };

    let mut reports = Vec::with_capacity(lanes.len());
    for lane in lanes {
        let harness = TestZHarness::new(HarnessConfig {
            lane,
            ..config.clone()
        })?;
        reports.push(harness.execute()?);
    }

    if let Some(path) = &cli.report {
        write_report(path, &reports)?;
    }

    let failed: usize = reports
        .iter()
        .filter(|report| !report.succeeded)
        .map(|report| report.mismatches.len().max(1))
        .sum();
    if failed > 0 {
        return Err(HarnessError::ScenariosFailed { failed }.into());
    }

    info!("All scenarios completed as expected");
    Ok(())
}
