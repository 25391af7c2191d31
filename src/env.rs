//! 环境变量管理
//!
//! 只有命令行程序读取这些变量，库本身不读取任何环境变量。

use std::env;

use thiserror::Error;
use tracing::Level;

/// 环境变量解析错误
#[derive(Debug, Clone, Error)]
#[error("Environment variable '{variable}': {message}")]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 日志级别
pub struct LogLevel;
impl EnvVar<Level> for LogLevel {
    const NAME: &'static str = "WEBARCHIVE_LOG_LEVEL";
    const DEFAULT: Option<Level> = Some(Level::WARN);
    const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

    fn parse(value: &str) -> EnvResult<Level> {
        value.trim().parse::<Level>().map_err(|_| EnvError {
            variable: Self::NAME.to_string(),
            message: format!(
                "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                value
            ),
        })
    }
}

/// 禁用颜色输出
pub struct NoColor;
impl EnvVar<bool> for NoColor {
    const NAME: &'static str = "NO_COLOR";
    const DEFAULT: Option<bool> = Some(false);
    const DESCRIPTION: &'static str = "Disable colored output when set to any value";

    fn parse(value: &str) -> EnvResult<bool> {
        // NO_COLOR 遵循标准：任何非空值都表示禁用颜色
        Ok(!value.is_empty())
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("Environment variables:\n");
    docs.push_str(&format!(
        "  {}: {} (default: {})\n",
        LogLevel::NAME,
        LogLevel::DESCRIPTION,
        Level::WARN
    ));
    docs.push_str(&format!(
        "  {}: {}\n",
        NoColor::NAME,
        NoColor::DESCRIPTION
    ));
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("debug").unwrap(), Level::DEBUG);
        assert_eq!(LogLevel::parse("WARN").unwrap(), Level::WARN);
        assert!(LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_no_color_parsing() {
        assert!(NoColor::parse("1").unwrap());
        assert!(!NoColor::parse("").unwrap());
    }

    #[test]
    fn test_error_display() {
        let error = LogLevel::parse("loud").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Environment variable 'WEBARCHIVE_LOG_LEVEL': Invalid log level 'loud'. Use: trace, debug, info, warn, error"
        );
    }

    #[test]
    fn test_generate_env_docs() {
        let docs = generate_env_docs();
        assert!(docs.contains(LogLevel::NAME));
        assert!(docs.contains(NoColor::NAME));
    }
}
