//! 백엔드 기반 사용량 소스.
//!
//! `UsageSource` 포트 구현. 마지막 `reset` 이후 경과 시간을 조회 구간으로 삼아
//! 백엔드에 집계를 요청하고 결과를 [`KeyUsage`]로 정규화한다.
//! 카운터 자체는 백엔드가 보유하고, 여기서는 기준 시점만 관리한다.

use async_trait::async_trait;
use keymetrics_core::error::CoreError;
use keymetrics_core::models::usage::{KeyUsage, UsageSample};
use keymetrics_core::ports::clock::Clock;
use keymetrics_core::ports::usage_backend::UsageBackend;
use keymetrics_core::ports::usage_source::UsageSource;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Prometheus 사용량 소스
pub struct PrometheusUsageMetrics {
    backend: Arc<dyn UsageBackend>,
    clock: Arc<dyn Clock>,
    /// 집계 기준 시점 (UTC 밀리초)
    reset_time_ms: AtomicI64,
}

impl PrometheusUsageMetrics {
    /// 새 사용량 소스 생성: 기준 시점은 생성 시각
    pub fn new(backend: Arc<dyn UsageBackend>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_ms();
        Self {
            backend,
            clock,
            reset_time_ms: AtomicI64::new(now),
        }
    }

    /// 현재 기준 시점
    pub fn reset_time_ms(&self) -> i64 {
        self.reset_time_ms.load(Ordering::SeqCst)
    }
}

/// 기준 시점부터 현재까지 경과 초 (반올림, 음수는 0)
fn elapsed_window_secs(reset_ms: i64, now_ms: i64) -> u64 {
    let elapsed_ms = now_ms.saturating_sub(reset_ms).max(0);
    (elapsed_ms as f64 / 1000.0).round() as u64
}

/// 쉼표 구분 국가 문자열 → 국가 코드 목록
///
/// 각 항목의 공백을 제거하고 빈 항목은 버린다. 없거나 빈 문자열이면 빈 목록.
pub fn parse_countries(location: Option<&str>) -> Vec<String> {
    location
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// 백엔드 실수값 → 바이트 수 (반올림, 음수/NaN은 0)
fn round_bytes(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 {
        raw.round() as u64
    } else {
        0
    }
}

fn to_key_usage(sample: UsageSample) -> KeyUsage {
    KeyUsage {
        countries: parse_countries(sample.location.as_deref()),
        inbound_bytes: round_bytes(sample.bytes),
        access_key_id: sample.access_key,
    }
}

#[async_trait]
impl UsageSource for PrometheusUsageMetrics {
    async fn get_usage(&self) -> Result<Vec<KeyUsage>, CoreError> {
        let window_secs = elapsed_window_secs(self.reset_time_ms(), self.clock.now_ms());
        if window_secs == 0 {
            // 0초 구간은 백엔드가 거부하므로 조회하지 않는다
            debug!("사용량 조회 생략: 경과 시간 0초");
            return Ok(Vec::new());
        }

        let samples = self.backend.query_bytes_transferred(window_secs).await?;
        Ok(samples.into_iter().map(to_key_usage).collect())
    }

    fn reset(&self) {
        let now = self.clock.now_ms();
        self.reset_time_ms.store(now, Ordering::SeqCst);
        debug!("사용량 기준 시점 재설정: {now}");
    }
}
