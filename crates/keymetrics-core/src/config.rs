//! 설정 구조체.
//!
//! - [`AppConfig`]: 에이전트 자체 설정 (백엔드 URL, 수집 서버 URL, 보고 주기, 파일 경로).
//!   바이너리에서 `config` crate를 통해 파일/환경변수에서 로드.
//! - [`ServerConfig`]: 외부 협력자가 소유하는 영속 서버 설정 레코드.
//!   옵트인 플래그(`metricsEnabled`)와 서버 식별자의 원본이다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 최상위 에이전트 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 메트릭 백엔드(Prometheus) 설정
    #[serde(default)]
    pub prometheus: PrometheusConfig,
    /// 수집 서버 설정
    #[serde(default)]
    pub collector: CollectorConfig,
    /// 보고 주기 설정
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// 파일 경로 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 시간별 사용량 보고 주기
    pub fn usage_report_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.usage_report_interval_secs)
    }

    /// 일별 기능 보고 주기
    pub fn feature_report_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.feature_report_interval_secs)
    }

    /// 백엔드 조회 타임아웃
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.prometheus.query_timeout_ms)
    }

    /// 수집 서버 요청 타임아웃 (0이면 타임아웃 없음)
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.collector.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

// ============================================================
// 메트릭 백엔드 설정
// ============================================================

/// Prometheus 조회 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Prometheus HTTP API 주소
    #[serde(default = "default_prometheus_url")]
    pub base_url: String,
    /// 조회 타임아웃 (밀리초)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// 키별 전송 바이트 카운터 메트릭 이름
    #[serde(default = "default_data_bytes_metric")]
    pub data_bytes_metric: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            base_url: default_prometheus_url(),
            query_timeout_ms: default_query_timeout_ms(),
            data_bytes_metric: default_data_bytes_metric(),
        }
    }
}

fn default_prometheus_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_query_timeout_ms() -> u64 {
    10_000
}

fn default_data_bytes_metric() -> String {
    "shadowsocks_data_bytes".to_string()
}

// ============================================================
// 수집 서버 설정
// ============================================================

/// 수집 서버 설정: `/connections`, `/features` 경로의 기준 URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// 수집 서버 기준 URL (http 또는 https)
    #[serde(default = "default_collector_url")]
    pub base_url: String,
    /// 요청 타임아웃 (밀리초, 0이면 비활성)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_collector_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_collector_url() -> String {
    "https://metrics.example.com".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

// ============================================================
// 보고 주기 설정
// ============================================================

/// 보고 주기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 시간별 사용량 보고 주기 (초)
    #[serde(default = "default_usage_interval_secs")]
    pub usage_report_interval_secs: u64,
    /// 일별 기능 보고 주기 (초)
    #[serde(default = "default_feature_interval_secs")]
    pub feature_report_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            usage_report_interval_secs: default_usage_interval_secs(),
            feature_report_interval_secs: default_feature_interval_secs(),
        }
    }
}

fn default_usage_interval_secs() -> u64 {
    3_600
}

fn default_feature_interval_secs() -> u64 {
    86_400
}

// ============================================================
// 파일 경로 설정
// ============================================================

/// 파일 경로 설정: None이면 플랫폼별 데이터 디렉토리 사용
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 영속 서버 설정 파일 경로
    #[serde(default)]
    pub server_config_path: Option<PathBuf>,
    /// 액세스 키 파일 경로 (키 ID → 메트릭 ID 매핑)
    #[serde(default)]
    pub access_keys_path: Option<PathBuf>,
}

// ============================================================
// 영속 서버 설정
// ============================================================

/// 키별 데이터 사용 한도
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLimit {
    /// 한도 (바이트)
    pub bytes: u64,
}

/// 영속 서버 설정 레코드 (JSON)
///
/// 알 수 없는 필드는 `extra`에 보존되어 다시 저장할 때 유실되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// 서버 식별자
    pub server_id: String,
    /// 메트릭 공유 옵트인 여부
    #[serde(default)]
    pub metrics_enabled: bool,
    /// 서버 표시 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 생성 시각 (UTC 밀리초)
    #[serde(default)]
    pub created_timestamp_ms: i64,
    /// 전체 키 공통 데이터 한도
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_data_limit: Option<DataLimit>,
    /// 보존용 미지정 필드
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ServerConfig {
    /// 새 서버 설정 생성 (공유 비활성, 무작위 서버 ID)
    pub fn new_default(created_timestamp_ms: i64) -> Self {
        Self {
            server_id: uuid::Uuid::new_v4().to_string(),
            metrics_enabled: false,
            name: None,
            created_timestamp_ms,
            access_key_data_limit: None,
            extra: serde_json::Map::new(),
        }
    }
}
