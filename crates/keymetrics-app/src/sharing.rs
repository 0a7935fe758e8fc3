//! 메트릭 공유 옵트인 제어.
//!
//! 상태는 영속 서버 설정의 `metricsEnabled` 하나뿐이다. 변경은 파일에 동기적으로
//! 기록된 뒤 반환되며, 조회는 매번 저장소에서 새로 읽는다.

use keymetrics_core::config_manager::ServerConfigStore;
use keymetrics_core::error::CoreError;
use std::sync::Arc;
use tracing::info;

/// 옵트인 플래그 제어기
#[derive(Debug, Clone)]
pub struct MetricsSharing {
    store: Arc<ServerConfigStore>,
}

impl MetricsSharing {
    /// 새 제어기 생성
    pub fn new(store: Arc<ServerConfigStore>) -> Self {
        Self { store }
    }

    /// 공유 시작 (설정 저장 후 반환)
    pub fn start_sharing(&self) -> Result<(), CoreError> {
        self.store.update_with(|c| c.metrics_enabled = true)?;
        info!("메트릭 공유 활성화");
        Ok(())
    }

    /// 공유 중지 (설정 저장 후 반환)
    pub fn stop_sharing(&self) -> Result<(), CoreError> {
        self.store.update_with(|c| c.metrics_enabled = false)?;
        info!("메트릭 공유 비활성화");
        Ok(())
    }

    /// 현재 공유 여부
    pub fn is_sharing_enabled(&self) -> bool {
        self.store.get().metrics_enabled
    }

    /// 서버 설정 저장소
    pub fn store(&self) -> &Arc<ServerConfigStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn toggle_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("server_config.json");
        let store = ServerConfigStore::with_path(path.clone()).unwrap();
        let sharing = MetricsSharing::new(Arc::new(store));

        assert!(!sharing.is_sharing_enabled());
        sharing.start_sharing().unwrap();
        assert!(sharing.is_sharing_enabled());

        // 다른 인스턴스에서도 보인다
        let other = ServerConfigStore::with_path(path).unwrap();
        assert!(other.get().metrics_enabled);

        sharing.stop_sharing().unwrap();
        assert!(!sharing.is_sharing_enabled());
    }
}
