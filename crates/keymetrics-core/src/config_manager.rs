//! 영속 서버 설정 파일 관리.
//!
//! JSON 파일로 [`ServerConfig`]를 저장/로드한다. 쓰기는 동기적으로 완료된 후 반환한다.
//! 다른 프로세스가 파일을 수정하면 다음 [`ServerConfigStore::get`] 호출에서 다시 읽는다.

use crate::config::ServerConfig;
use crate::error::CoreError;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// 메모리에 적재된 설정 + 적재 시점의 파일 수정 시각
#[derive(Debug)]
struct Loaded {
    config: ServerConfig,
    modified: Option<SystemTime>,
}

/// 서버 설정 저장소
#[derive(Debug)]
pub struct ServerConfigStore {
    state: RwLock<Loaded>,
    config_path: PathBuf,
}

impl ServerConfigStore {
    /// 지정된 경로로 저장소 생성
    ///
    /// 파일이 없으면 공유 비활성 상태의 기본 설정을 생성하고 저장한다.
    pub fn with_path(config_path: PathBuf) -> Result<Self, CoreError> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).inspect_err(|e| {
                    warn!("설정 디렉토리 생성 실패: {}: {e}", parent.display());
                })?;
                info!("설정 디렉토리 생성: {}", parent.display());
            }
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let created = chrono::Utc::now().timestamp_millis();
            let default_config = ServerConfig::new_default(created);
            Self::save_to_file(&config_path, &default_config)?;
            info!("기본 서버 설정 파일 생성: {}", config_path.display());
            default_config
        };

        let modified = modified_time(&config_path);
        Ok(Self {
            state: RwLock::new(Loaded { config, modified }),
            config_path,
        })
    }

    /// 현재 설정 반환 (복제본)
    ///
    /// 파일이 외부에서 변경되었으면 먼저 다시 읽는다. 다시 읽기에 실패하면
    /// 경고를 남기고 마지막으로 읽은 값을 반환한다.
    pub fn get(&self) -> ServerConfig {
        self.refresh_if_stale();
        self.state.read().config.clone()
    }

    /// 특정 필드만 업데이트하고 파일에 저장
    pub fn update_with<F>(&self, updater: F) -> Result<ServerConfig, CoreError>
    where
        F: FnOnce(&mut ServerConfig),
    {
        self.refresh_if_stale();

        let mut state = self.state.write();
        let mut config = state.config.clone();
        updater(&mut config);

        // 파일 저장이 성공한 경우에만 메모리 반영
        Self::save_to_file(&self.config_path, &config)?;
        state.config = config.clone();
        state.modified = modified_time(&self.config_path);
        debug!("서버 설정 저장 완료: {}", self.config_path.display());

        Ok(config)
    }

    /// 현재 메모리 상태를 파일에 저장
    pub fn write(&self) -> Result<(), CoreError> {
        let mut state = self.state.write();
        Self::save_to_file(&self.config_path, &state.config)?;
        state.modified = modified_time(&self.config_path);
        debug!("서버 설정 저장 완료: {}", self.config_path.display());
        Ok(())
    }

    /// 파일에서 설정 다시 로드
    pub fn reload(&self) -> Result<(), CoreError> {
        let config = Self::load_from_file(&self.config_path)?;
        let mut state = self.state.write();
        state.config = config;
        state.modified = modified_time(&self.config_path);
        debug!("서버 설정 다시 로드 완료");
        Ok(())
    }

    /// 설정 파일 경로 반환
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn refresh_if_stale(&self) {
        let on_disk = modified_time(&self.config_path);
        let stale = on_disk.is_some() && on_disk != self.state.read().modified;
        if stale {
            if let Err(e) = self.reload() {
                warn!("서버 설정 다시 로드 실패, 기존 값 유지: {e}");
            }
        }
    }

    /// 파일에서 설정 로드
    fn load_from_file(path: &Path) -> Result<ServerConfig, CoreError> {
        let content = fs::read_to_string(path)
            .inspect_err(|e| warn!("설정 파일 읽기 실패: {}: {e}", path.display()))?;

        let config: ServerConfig = serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!("설정 파일 파싱 실패: {}: {}", path.display(), e))
        })?;

        debug!("서버 설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 파일에 설정 저장
    fn save_to_file(path: &Path, config: &ServerConfig) -> Result<(), CoreError> {
        let content = serde_json::to_string_pretty(config)
            .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {}", e)))?;

        fs::write(path, content)
            .inspect_err(|e| warn!("설정 파일 저장 실패: {}: {e}", path.display()))?;

        Ok(())
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataLimit;
    use std::time::Duration;
    use tempfile::TempDir;

    /// 파일 수정 시각을 강제로 앞당겨 외부 변경을 흉내낸다
    fn write_externally(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();
    }

    #[test]
    fn create_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("server_config.json");

        let store = ServerConfigStore::with_path(config_path.clone()).unwrap();
        assert!(config_path.exists());

        let config = store.get();
        assert!(!config.metrics_enabled);
        assert!(!config.server_id.is_empty());
        assert!(config.access_key_data_limit.is_none());
    }

    #[test]
    fn update_and_persist_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("server_config.json");

        let store = ServerConfigStore::with_path(config_path.clone()).unwrap();
        let server_id = store.get().server_id;

        store
            .update_with(|c| {
                c.metrics_enabled = true;
                c.access_key_data_limit = Some(DataLimit { bytes: 10_000 });
            })
            .unwrap();

        // 새 저장소로 다시 로드
        let store2 = ServerConfigStore::with_path(config_path).unwrap();
        let config = store2.get();
        assert!(config.metrics_enabled);
        assert_eq!(config.server_id, server_id);
        assert_eq!(config.access_key_data_limit, Some(DataLimit { bytes: 10_000 }));
    }

    #[test]
    fn get_picks_up_external_change() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("server_config.json");
        let store = ServerConfigStore::with_path(config_path.clone()).unwrap();
        assert!(!store.get().metrics_enabled);

        write_externally(&config_path, r#"{"serverId":"srv-x","metricsEnabled":true}"#);

        let config = store.get();
        assert!(config.metrics_enabled);
        assert_eq!(config.server_id, "srv-x");
    }

    #[test]
    fn get_keeps_last_value_on_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("server_config.json");
        let store = ServerConfigStore::with_path(config_path.clone()).unwrap();
        let server_id = store.get().server_id;

        write_externally(&config_path, "{broken");

        assert_eq!(store.get().server_id, server_id);
    }

    #[test]
    fn unwritable_location_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        // 부모 경로가 디렉토리가 아닌 일반 파일
        let blocker = temp_dir.path().join("not_a_dir");
        fs::write(&blocker, "x").unwrap();

        let result = ServerConfigStore::with_path(blocker.join("server_config.json"));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }

    #[test]
    fn corrupt_file_fails_on_open() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("server_config.json");
        fs::write(&config_path, "not json").unwrap();

        let result = ServerConfigStore::with_path(config_path);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }
}
