//! 运行配置
//!
//! 配置来源按优先级从低到高：默认值 < TOML 文件 < `TESTZ_*` 环境变量 < 命令行参数。
//! 能力覆盖项只能关闭硬件支持，不能打开。

use std::path::Path;

use serde::{Deserialize, Serialize};
use vm_accel::SimdCapabilities;
use vm_mem::VECTOR256_ALIGNMENT;
use vm_simd::LaneKind;

use crate::scenario::Scenario;

/// 配置接口
pub trait Config: Serialize + serde::de::DeserializeOwned {
    /// 验证配置的有效性
    ///
    /// # 错误
    ///
    /// 配置无效时返回 `ConfigError::Validation`
    fn validate(&self) -> Result<(), ConfigError>;

    fn defaults() -> Self;

    /// 合并两个配置，`other` 优先级更高
    fn merge(&self, other: &Self) -> Result<Self, ConfigError>
    where
        Self: Sized;

    fn from_toml(toml: &str) -> Result<Self, ConfigError>
    where
        Self: Sized,
    {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e)))
    }

    fn from_json(json: &str) -> Result<Self, ConfigError>
    where
        Self: Sized,
    {
        serde_json::from_str(json)
            .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e)))
    }

    fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(format!("TOML serialize error: {}", e)))
    }

    fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(format!("JSON serialize error: {}", e)))
    }

    /// 从环境变量加载配置，格式为 `PREFIX_KEY`；未设置的键取默认值
    fn from_env(prefix: &str) -> Result<Self, ConfigError>
    where
        Self: Sized;

    /// 读取配置文件，`.json` 按 JSON 解析，其余按 TOML 解析
    fn from_file(path: &Path) -> Result<Self, ConfigError>
    where
        Self: Sized,
    {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }
}

/// 配置错误类型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// 环境变量前缀
pub const ENV_PREFIX: &str = "TESTZ";

/// TOML 整数是 i64，种子必须能写回配置文件
pub const MAX_SEED: u64 = i64::MAX as u64;

/// TestZ 验证运行配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// lane 类型
    pub lane: LaneKind,
    /// 随机种子，不超过 [`MAX_SEED`]；为空时从系统熵源取得并记录到日志
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// 数据表对齐（字节）
    pub alignment: usize,
    pub disable_test_z: bool,
    pub disable_vector_load: bool,
    /// 使用故意错开对齐的分配器
    pub misaligned_table: bool,
    /// 关闭的场景
    pub skip: Vec<Scenario>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl HarnessConfig {
    /// 把能力覆盖应用到检测结果上（只会收窄）
    pub fn capabilities(&self, detected: SimdCapabilities) -> SimdCapabilities {
        let mut caps = detected;
        if self.disable_test_z {
            caps = caps.without_test_z();
        }
        if self.disable_vector_load {
            caps = caps.without_vector_load();
        }
        caps
    }

    /// 用 `lookup` 读取 `PREFIX_*` 变量，生成一层以默认值为底的配置，再经 [`Config::merge`] 叠加
    pub fn env_layer<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut layer = Self::defaults();
        let var = |key: &str| lookup(&format!("{}_{}", prefix, key));

        if let Some(value) = var("LANE") {
            layer.lane = value.parse().map_err(ConfigError::Parse)?;
        }
        if let Some(value) = var("SEED") {
            layer.seed = Some(parse_number(prefix, "SEED", &value)?);
        }
        if let Some(value) = var("ALIGNMENT") {
            layer.alignment = parse_number(prefix, "ALIGNMENT", &value)?;
        }
        if let Some(value) = var("DISABLE_TEST_Z") {
            layer.disable_test_z = parse_flag(prefix, "DISABLE_TEST_Z", &value)?;
        }
        if let Some(value) = var("DISABLE_VECTOR_LOAD") {
            layer.disable_vector_load = parse_flag(prefix, "DISABLE_VECTOR_LOAD", &value)?;
        }
        if let Some(value) = var("MISALIGNED_TABLE") {
            layer.misaligned_table = parse_flag(prefix, "MISALIGNED_TABLE", &value)?;
        }
        if let Some(value) = var("SKIP") {
            layer.skip = value
                .split(',')
                .filter(|item| !item.trim().is_empty())
                .map(|item| item.parse::<Scenario>().map_err(ConfigError::Parse))
                .collect::<Result<_, _>>()?;
        }

        Ok(layer)
    }
}

fn parse_number<N: std::str::FromStr>(prefix: &str, key: &str, value: &str) -> Result<N, ConfigError>
where
    N::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::Parse(format!("{}_{}={}: {}", prefix, key, value, e)))
}

fn parse_flag(prefix: &str, key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Parse(format!(
            "{}_{}: expected a boolean, got '{}'",
            prefix, key, other
        ))),
    }
}

impl Config for HarnessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.alignment.is_power_of_two() {
            return Err(ConfigError::Validation(format!(
                "alignment must be a power of two, got {}",
                self.alignment
            )));
        }
        if let Some(seed) = self.seed.filter(|&seed| seed > MAX_SEED) {
            return Err(ConfigError::Validation(format!(
                "seed {} exceeds the largest storable seed {}",
                seed, MAX_SEED
            )));
        }
        if self.alignment < self.lane.size() {
            return Err(ConfigError::Validation(format!(
                "alignment {} is smaller than the {} lane size",
                self.alignment, self.lane
            )));
        }
        Ok(())
    }

    fn defaults() -> Self {
        Self {
            lane: LaneKind::U16,
            seed: None,
            alignment: VECTOR256_ALIGNMENT,
            disable_test_z: false,
            disable_vector_load: false,
            misaligned_table: false,
            skip: Vec::new(),
        }
    }

    fn merge(&self, other: &Self) -> Result<Self, ConfigError> {
        let defaults = Self::defaults();

        let mut skip = self.skip.clone();
        for scenario in &other.skip {
            if !skip.contains(scenario) {
                skip.push(*scenario);
            }
        }

        Ok(Self {
            lane: if other.lane != defaults.lane {
                other.lane
            } else {
                self.lane
            },
            seed: other.seed.or(self.seed),
            alignment: if other.alignment != defaults.alignment {
                other.alignment
            } else {
                self.alignment
            },
            disable_test_z: self.disable_test_z || other.disable_test_z,
            disable_vector_load: self.disable_vector_load || other.disable_vector_load,
            misaligned_table: self.misaligned_table || other.misaligned_table,
            skip,
        })
    }

    fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::env_layer(prefix, |key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = HarnessConfig::default();
        assert_eq!(config.lane, LaneKind::U16);
        assert_eq!(config.alignment, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = HarnessConfig::from_toml(
            r#"
            lane = "i32"
            seed = 42
            disable_vector_load = true
            skip = ["instance_field", "dynamic_load"]
            "#,
        )
        .unwrap();

        assert_eq!(config.lane, LaneKind::I32);
        assert_eq!(config.seed, Some(42));
        assert!(config.disable_vector_load);
        assert_eq!(config.alignment, 32);
        assert_eq!(config.skip, vec![Scenario::InstanceField, Scenario::DynamicLoad]);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = HarnessConfig::from_toml("lanes = \"u8\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = HarnessConfig {
            alignment: 24,
            ..HarnessConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.alignment = 4;
        config.lane = LaneKind::U64;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.lane = LaneKind::U32;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_prefers_other() {
        let file = HarnessConfig {
            lane: LaneKind::U8,
            seed: Some(1),
            disable_test_z: true,
            skip: vec![Scenario::ClassFixture],
            ..HarnessConfig::default()
        };
        let cli = HarnessConfig {
            seed: Some(7),
            skip: vec![Scenario::ClassFixture, Scenario::BasicLoad],
            ..HarnessConfig::default()
        };

        let merged = file.merge(&cli).unwrap();
        assert_eq!(merged.lane, LaneKind::U8);
        assert_eq!(merged.seed, Some(7));
        assert!(merged.disable_test_z);
        assert_eq!(merged.skip, vec![Scenario::ClassFixture, Scenario::BasicLoad]);
    }

    #[test]
    fn test_env_layer() {
        let vars: HashMap<String, String> = [
            ("TESTZ_LANE", "I64"),
            ("TESTZ_SEED", "99"),
            ("TESTZ_MISALIGNED_TABLE", "yes"),
            ("TESTZ_SKIP", "basic_load, local_load"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = HarnessConfig::env_layer(ENV_PREFIX, |key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.lane, LaneKind::I64);
        assert_eq!(config.seed, Some(99));
        assert!(config.misaligned_table);
        assert!(!config.disable_test_z);
        assert_eq!(config.skip, vec![Scenario::BasicLoad, Scenario::LocalLoad]);
    }

    #[test]
    fn test_env_layer_rejects_garbage() {
        let err = HarnessConfig::env_layer("T", |key| {
            (key == "T_DISABLE_TEST_Z").then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = HarnessConfig::env_layer("T", |key| (key == "T_ALIGNMENT").then(|| "wide".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_capability_overrides_only_narrow() {
        let config = HarnessConfig {
            disable_vector_load: true,
            ..HarnessConfig::default()
        };
        let caps = config.capabilities(SimdCapabilities::none());
        assert!(!caps.test_z());
        assert!(!caps.vector_load());

        let detected = SimdCapabilities::detect();
        let caps = config.capabilities(detected);
        assert_eq!(caps.test_z(), detected.test_z());
        assert!(!caps.vector_load());
    }

    #[test]
    fn test_toml_round_trip_keeps_seedless_config() {
        let config = HarnessConfig::default();
        let text = config.to_toml().unwrap();
        assert!(!text.contains("seed"));
        assert_eq!(HarnessConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_env_cannot_reenable_support() {
        let file = HarnessConfig::from_toml("disable_test_z = true").unwrap();
        let env = HarnessConfig::env_layer(ENV_PREFIX, |key| {
            (key == "TESTZ_DISABLE_TEST_Z").then(|| "0".to_string())
        })
        .unwrap();

        let merged = HarnessConfig::defaults().merge(&file).unwrap().merge(&env).unwrap();
        assert!(merged.disable_test_z);
    }

    #[test]
    fn test_from_env_without_variables_is_default() {
        // 前缀不会与任何真实环境变量冲突
        let config = HarnessConfig::from_env("VM_VALIDATION_UNSET_PREFIX").unwrap();
        assert_eq!(config, HarnessConfig::defaults());
    }

    #[test]
    fn test_json_round_trip() {
        let config = HarnessConfig {
            lane: LaneKind::I8,
            seed: Some(MAX_SEED),
            misaligned_table: true,
            skip: vec![Scenario::DynamicLoadAligned],
            ..HarnessConfig::default()
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"dynamic_load_aligned\""));
        assert_eq!(HarnessConfig::from_json(&json).unwrap(), config);

        let err = HarnessConfig::from_json("{\"lane\": \"f32\"}").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let dir = std::env::temp_dir();
        let json_path = dir.join(format!("vm-validation-{}.json", std::process::id()));
        let toml_path = dir.join(format!("vm-validation-{}.toml", std::process::id()));
        std::fs::write(&json_path, r#"{"lane": "u32", "seed": 5}"#).unwrap();
        std::fs::write(&toml_path, "lane = \"u64\"\n").unwrap();

        let from_json = HarnessConfig::from_file(&json_path);
        let from_toml = HarnessConfig::from_file(&toml_path);
        let _ = std::fs::remove_file(&json_path);
        let _ = std::fs::remove_file(&toml_path);

        assert_eq!(from_json.unwrap().lane, LaneKind::U32);
        assert_eq!(from_toml.unwrap().lane, LaneKind::U64);

        let err = HarnessConfig::from_file(&dir.join("vm-validation-missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_seed_must_fit_in_toml() {
        let largest = HarnessConfig {
            seed: Some(MAX_SEED),
            ..HarnessConfig::default()
        };
        assert!(largest.validate().is_ok());
        let text = largest.to_toml().unwrap();
        assert_eq!(HarnessConfig::from_toml(&text).unwrap().seed, Some(MAX_SEED));

        let too_large = HarnessConfig {
            seed: Some(u64::MAX),
            ..HarnessConfig::default()
        };
        assert!(matches!(too_large.validate(), Err(ConfigError::Validation(_))));
    }
}
