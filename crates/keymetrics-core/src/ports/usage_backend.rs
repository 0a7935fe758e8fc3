//! 메트릭 백엔드 조회 포트.
//!
//! 구현: `keymetrics-network` crate (Prometheus HTTP API)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::usage::UsageSample;

/// 원시 카운터를 보유한 메트릭 백엔드
///
/// 카운터의 원본은 항상 백엔드다. 이 포트는 집계 조회만 노출한다.
#[async_trait]
pub trait UsageBackend: Send + Sync {
    /// 최근 `window_secs`초 동안 키/위치별 전송 바이트 조회
    async fn query_bytes_transferred(
        &self,
        window_secs: u64,
    ) -> Result<Vec<UsageSample>, CoreError>;
}
