//! 수집 서버 보고서 모델.
//!
//! `Serialize` 결과가 그대로 요청 본문이 된다.

use serde::{Deserialize, Serialize};

/// 시간별 서버 사용량 보고서
///
/// 보고 구간은 `[start_utc_ms, end_utc_ms)` 반개구간이며,
/// 한 구간의 끝은 다음 구간의 시작이 된다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyServerMetricsReport {
    /// 서버 식별자
    pub server_id: String,
    /// 구간 시작 (UTC 밀리초, 포함)
    pub start_utc_ms: i64,
    /// 구간 끝 (UTC 밀리초, 미포함)
    pub end_utc_ms: i64,
    /// 사용자별 행
    pub user_reports: Vec<HourlyUserMetricsReport>,
}

/// 사용자별 시간 사용량 행
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyUserMetricsReport {
    /// 공개 사용자 식별자 (매핑이 없으면 빈 문자열)
    pub user_id: String,
    /// 국가 코드 목록
    pub countries: Vec<String>,
    /// 전송 바이트 수
    pub bytes_transferred: u64,
}

/// 일별 기능 사용 보고서: 구간 없이 현재 시점 스냅샷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyFeatureMetricsReport {
    /// 서버 식별자
    pub server_id: String,
    /// 서버 버전 문자열
    pub server_version: String,
    /// 스냅샷 시각 (UTC 밀리초)
    pub timestamp_utc_ms: i64,
    /// 데이터 한도 기능 상태
    pub data_limit: DailyDataLimitMetricsReport,
}

/// 데이터 한도 기능 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDataLimitMetricsReport {
    /// 키별 데이터 한도 설정 여부
    pub enabled: bool,
}
