use crate::error::InitProcessError;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

const LOG_LEVEL_VAR: &str = "TCP_DECODER_LOG_LEVEL";
const LOG_FILE_VAR: &str = "TCP_DECODER_LOG_FILE";
const OUTPUT_VAR: &str = "TCP_DECODER_OUTPUT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub log: LogConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// 未設定なら標準エラー出力
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// セミコロン区切りの1行表現
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = InitProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(InitProcessError::EnvVarParseError(format!(
                "{}の値が無効です: {}",
                OUTPUT_VAR, other
            ))),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InitProcessError> {
        // .envファイルは任意
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, InitProcessError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = match lookup(LOG_LEVEL_VAR) {
            Some(value) => value.trim().parse::<LevelFilter>().map_err(|e| {
                InitProcessError::EnvVarParseError(format!("{}の値が無効です: {} ({})", LOG_LEVEL_VAR, value, e))
            })?,
            None => LevelFilter::Info,
        };

        let file = lookup(LOG_FILE_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let format = match lookup(OUTPUT_VAR) {
            Some(value) => value.parse::<OutputFormat>()?,
            None => OutputFormat::default(),
        };

        Ok(Self {
            log: LogConfig { level, file },
            output: OutputConfig { format },
        })
    }

    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            log: LogConfig {
                level: LevelFilter::Off,
                file: None,
            },
            output: OutputConfig {
                format: OutputFormat::Text,
            },
        }
    }
}
