//! 에이전트 설정 로드.
//!
//! 우선순위: 기본값 → 설정 파일(`--config`) → 환경변수
//! (`KEYMETRICS_<SECTION>__<KEY>`, 예: `KEYMETRICS_COLLECTOR__BASE_URL`).

use config::{Config, Environment, File};
use keymetrics_core::config::AppConfig;
use keymetrics_core::error::CoreError;
use std::path::Path;

/// 환경변수 접두어
pub const ENV_PREFIX: &str = "KEYMETRICS";

/// 설정 로드 및 검증
pub fn load_settings(path: Option<&Path>) -> Result<AppConfig, CoreError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let settings: AppConfig = builder
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| CoreError::Config(format!("에이전트 설정 로드 실패: {e}")))?;

    validate(&settings)?;
    Ok(settings)
}

/// 설정값 검증
pub fn validate(config: &AppConfig) -> Result<(), CoreError> {
    if config.schedule.usage_report_interval_secs == 0 {
        return Err(CoreError::Config(
            "usage_report_interval_secs는 0보다 커야 합니다".to_string(),
        ));
    }
    if config.schedule.feature_report_interval_secs == 0 {
        return Err(CoreError::Config(
            "feature_report_interval_secs는 0보다 커야 합니다".to_string(),
        ));
    }
    if config.prometheus.query_timeout_ms == 0 {
        return Err(CoreError::Config(
            "query_timeout_ms는 0보다 커야 합니다".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let config = load_settings(None).unwrap();
        assert_eq!(config.schedule.usage_report_interval_secs, 3_600);
        assert_eq!(config.prometheus.base_url, "http://localhost:9090");
    }

    #[test]
    fn file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keymetrics.toml");
        std::fs::write(
            &path,
            r#"
[collector]
base_url = "http://collector.local:8080"
request_timeout_ms = 0

[schedule]
usage_report_interval_secs = 60

[storage]
server_config_path = "/var/lib/keymetrics/server_config.json"
"#,
        )
        .unwrap();

        let config = load_settings(Some(&path)).unwrap();
        assert_eq!(config.collector.base_url, "http://collector.local:8080");
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.schedule.usage_report_interval_secs, 60);
        assert_eq!(config.schedule.feature_report_interval_secs, 86_400);
        assert_eq!(
            config.storage.server_config_path.as_deref(),
            Some(Path::new("/var/lib/keymetrics/server_config.json"))
        );
    }

    #[test]
    fn missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");
        assert!(matches!(load_settings(Some(&path)), Err(CoreError::Config(_))));
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = AppConfig::default_config();
        config.schedule.feature_report_interval_secs = 0;
        assert!(validate(&config).is_err());
    }
}
