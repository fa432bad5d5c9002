use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 运行配置的根结构。加载一次后在整个运行期间保持不变，
/// 由调用方显式传入各个组件。
#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub layers: LayerConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            discovery: DiscoveryConfig::default(),
            layers: LayerConfig::default(),
        }
    }
}

impl MergeConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `DXFMERGE_CONFIG`，
    /// 否则寻找 `./config/default.toml`；文件缺失时返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("DXFMERGE_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 文件发现的匹配规则。模式为 shell 风格通配符（`*`、`?`），
/// 作用于完整路径。
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "DiscoveryConfig::default_search")]
    pub search: Vec<String>,
    #[serde(default = "DiscoveryConfig::default_ignore")]
    pub ignore: Vec<String>,
}

impl DiscoveryConfig {
    fn default_search() -> Vec<String> {
        vec!["*.dxf".to_string()]
    }

    fn default_ignore() -> Vec<String> {
        vec!["*_ignore_*".to_string()]
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            search: Self::default_search(),
            ignore: Self::default_ignore(),
        }
    }
}

/// 图层与颜色分配的配置。
#[derive(Debug, Clone, Deserialize)]
pub struct LayerConfig {
    /// true 时所有文件合并进同一图层。
    #[serde(default)]
    pub single_layer: bool,
    /// true 时按调色板轮转分配颜色；默认只使用首项。
    #[serde(default)]
    pub cycle_colors: bool,
    #[serde(default = "LayerConfig::default_palette")]
    pub palette: Vec<u8>,
}

impl LayerConfig {
    /// 默认的 ACI 调色板：0..=9，之后每 10 取一档直到 240。
    pub fn default_palette() -> Vec<u8> {
        let mut palette: Vec<u8> = (0..10).collect();
        palette.extend((10..250).step_by(10).map(|index| index as u8));
        palette
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            single_layer: false,
            cycle_colors: false,
            palette: Self::default_palette(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
