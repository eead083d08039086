//! Timer service configuration
//!
//! 환경 변수와 JSON 파일에서 설정을 로드합니다.
//!
//! | Variable             | Meaning                                  |
//! |----------------------|------------------------------------------|
//! | `DTIMER_STORE_PATH`  | sled directory; unset = in-memory store  |
//! | `DTIMER_DURABILITY`  | `full` or `lazy`                         |
//! | `DTIMER_LOG_LEVEL`   | tracing filter used by `logging` helpers |

use crate::error::{TimerError, TimerResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_STORE_PATH: &str = "DTIMER_STORE_PATH";
pub const ENV_DURABILITY: &str = "DTIMER_DURABILITY";
pub const ENV_LOG_LEVEL: &str = "DTIMER_LOG_LEVEL";

/// 영속성 수준 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityLevel {
    /// 모든 변경 작업 후 flush 수행 (최대 안전)
    #[default]
    Full,
    /// flush를 백엔드와 `TimerService::flush()`에 맡김
    Lazy,
}

impl DurabilityLevel {
    /// 문자열에서 파싱
    pub fn parse_level(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Some(DurabilityLevel::Full),
            "lazy" => Some(DurabilityLevel::Lazy),
            _ => None,
        }
    }
}

/// 저장소 위치
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreConfig {
    /// 프로세스 수명 동안만 유지
    #[default]
    InMemory,
    /// sled 디렉토리
    Path(PathBuf),
}

/// 타이머 서비스 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub durability: DurabilityLevel,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            durability: DurabilityLevel::default(),
            log_level: default_log_level(),
        }
    }
}

impl TimerConfig {
    /// 인메모리 설정
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// sled 디렉토리 설정
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            store: StoreConfig::Path(path.into()),
            ..Self::default()
        }
    }

    pub fn with_durability(mut self, durability: DurabilityLevel) -> Self {
        self.durability = durability;
        self
    }

    /// 환경 변수에서 로드 (없는 항목은 기본값)
    pub fn from_env() -> TimerResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// 환경 변수로 덮어쓰기
    pub fn apply_env(&mut self) -> TimerResult<()> {
        if let Ok(path) = env::var(ENV_STORE_PATH)
            && !path.is_empty()
        {
            self.store = StoreConfig::Path(PathBuf::from(path));
        }
        if let Ok(value) = env::var(ENV_DURABILITY) {
            self.durability = DurabilityLevel::parse_level(&value).ok_or_else(|| {
                TimerError::Config(format!("{ENV_DURABILITY}: unknown level '{value}'"))
            })?;
        }
        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        Ok(())
    }

    /// 파일에서 로드
    pub fn load_from_file(path: &Path) -> TimerResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// 파일에 저장
    pub fn save_to_file(&self, path: &Path) -> TimerResult<()> {
        let json = serde_json::to_string_pretty(self)?;

        // 디렉토리 생성
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_in_memory_full() {
        let config = TimerConfig::default();
        assert_eq!(config.store, StoreConfig::InMemory);
        assert_eq!(config.durability, DurabilityLevel::Full);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("timer.json");

        let config = TimerConfig::at_path("/var/lib/dtimer").with_durability(DurabilityLevel::Lazy);
        config.save_to_file(&path).unwrap();

        let loaded = TimerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timer.json");
        fs::write(&path, r#"{"durability":"lazy"}"#).unwrap();

        let loaded = TimerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.store, StoreConfig::InMemory);
        assert_eq!(loaded.durability, DurabilityLevel::Lazy);
        assert_eq!(loaded.log_level, "info");
    }

    #[test]
    fn test_config_env_var() {
        // 환경 변수 설정 (unsafe)
        unsafe {
            env::set_var(ENV_STORE_PATH, "/tmp/dtimer-env-test");
            env::set_var(ENV_DURABILITY, "LAZY");
            env::set_var(ENV_LOG_LEVEL, "debug");
        }

        let config = TimerConfig::from_env();

        // 정리 (unsafe)
        unsafe {
            env::remove_var(ENV_STORE_PATH);
            env::remove_var(ENV_DURABILITY);
            env::remove_var(ENV_LOG_LEVEL);
        }

        let config = config.unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Path(PathBuf::from("/tmp/dtimer-env-test"))
        );
        assert_eq!(config.durability, DurabilityLevel::Lazy);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_durability_parse() {
        assert_eq!(DurabilityLevel::parse_level("full"), Some(DurabilityLevel::Full));
        assert_eq!(DurabilityLevel::parse_level("Lazy"), Some(DurabilityLevel::Lazy));
        assert_eq!(DurabilityLevel::parse_level("sometimes"), None);
    }
}
