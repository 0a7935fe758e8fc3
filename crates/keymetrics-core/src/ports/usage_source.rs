//! 사용량 소스 포트.
//!
//! 구현: `keymetrics-network::usage_metrics::PrometheusUsageMetrics`

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::usage::KeyUsage;

/// 기준 시점 이후의 키별 사용량 제공자
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// 마지막 `reset` 이후 사용량 스냅샷 조회
    ///
    /// 백엔드 조회/전송 실패는 호출자에게 전파된다.
    async fn get_usage(&self) -> Result<Vec<KeyUsage>, CoreError>;

    /// 집계 기준 시점을 현재로 재설정
    fn reset(&self);
}
