//! 수집 서버 전송 포트.
//!
//! 구현: `keymetrics-network::metrics_collector::RestMetricsCollector`

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::report::{DailyFeatureMetricsReport, HourlyServerMetricsReport};

/// 원격 메트릭 수집기
///
/// 각 호출은 정확히 한 번 요청을 시도한다 (재시도 없음).
#[async_trait]
pub trait MetricsCollector: Send + Sync {
    /// 시간별 사용량 보고서 전송
    async fn collect_server_usage_metrics(
        &self,
        report: &HourlyServerMetricsReport,
    ) -> Result<(), CoreError>;

    /// 일별 기능 보고서 전송
    async fn collect_feature_metrics(
        &self,
        report: &DailyFeatureMetricsReport,
    ) -> Result<(), CoreError>;
}
