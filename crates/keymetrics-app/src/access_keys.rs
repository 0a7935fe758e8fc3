//! 액세스 키 파일 기반 메트릭 ID 매핑.
//!
//! `{"accessKeys": [{"id": "0", "metricsId": "..."}]}` 형식의 JSON 파일을 읽는다.
//! 키는 외부 서버가 런타임에 추가하므로 파일 수정 시각이 바뀌면 다시 읽는다.

use keymetrics_core::error::CoreError;
use keymetrics_core::ports::metrics_id::MetricsIdMapper;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessKeyEntry {
    id: String,
    #[serde(default)]
    metrics_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessKeyFile {
    #[serde(default)]
    access_keys: Vec<AccessKeyEntry>,
}

#[derive(Debug, Default)]
struct Snapshot {
    ids: HashMap<String, String>,
    modified: Option<SystemTime>,
}

/// 액세스 키 → 메트릭 ID 매핑 (파일 기반)
#[derive(Debug)]
pub struct AccessKeyMetricsIds {
    path: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl AccessKeyMetricsIds {
    /// 파일에서 매핑 로드
    ///
    /// 파일이 없으면 빈 매핑으로 시작한다 (모든 행의 ID가 빈 문자열이 된다).
    pub fn open(path: PathBuf) -> Result<Self, CoreError> {
        let snapshot = if path.exists() {
            Snapshot {
                ids: Self::load(&path)?,
                modified: modified_time(&path),
            }
        } else {
            warn!("액세스 키 파일 없음, 빈 매핑 사용: {}", path.display());
            Snapshot::default()
        };

        Ok(Self {
            path,
            snapshot: RwLock::new(snapshot),
        })
    }

    /// 매핑된 키 수
    pub fn len(&self) -> usize {
        self.refresh_if_modified();
        self.snapshot.read().ids.len()
    }

    /// 매핑이 비어 있는지 확인
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn refresh_if_modified(&self) {
        let on_disk = modified_time(&self.path);
        if on_disk.is_none() || on_disk == self.snapshot.read().modified {
            return;
        }

        match Self::load(&self.path) {
            Ok(ids) => {
                debug!("액세스 키 매핑 다시 로드: {}개", ids.len());
                let mut snapshot = self.snapshot.write();
                snapshot.ids = ids;
                snapshot.modified = on_disk;
            }
            Err(e) => warn!("액세스 키 파일 다시 로드 실패, 기존 매핑 유지: {e}"),
        }
    }

    fn load(path: &Path) -> Result<HashMap<String, String>, CoreError> {
        let content = fs::read_to_string(path)
            .inspect_err(|e| warn!("액세스 키 파일 읽기 실패: {}: {e}", path.display()))?;
        let file: AccessKeyFile = serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!("액세스 키 파일 파싱 실패: {}: {}", path.display(), e))
        })?;

        Ok(file
            .access_keys
            .into_iter()
            .filter_map(|k| k.metrics_id.map(|m| (k.id, m)))
            .collect())
    }
}

impl MetricsIdMapper for AccessKeyMetricsIds {
    fn metrics_id(&self, access_key_id: &str) -> Option<String> {
        self.refresh_if_modified();
        self.snapshot.read().ids.get(access_key_id).cloned()
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
