//! Prometheus HTTP API 클라이언트.
//!
//! `UsageBackend` 포트 구현. `GET /api/v1/query`로 즉시(instant) 조회를 수행하고
//! 벡터 결과를 키/위치별 바이트 행으로 변환한다.

use async_trait::async_trait;
use keymetrics_core::error::CoreError;
use keymetrics_core::models::usage::UsageSample;
use keymetrics_core::ports::usage_backend::UsageBackend;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// 조회 경로
const QUERY_PATH: &str = "/api/v1/query";

/// 사용자 → 프록시, 프록시 → 대상 방향 (사용자 기준 수신 트래픽)
const INBOUND_DIRECTIONS: &str = "c<p|p>t";

/// 조회 응답 봉투
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    result_type: String,
    #[serde(default)]
    result: Vec<VectorSample>,
}

/// 벡터 결과 한 행: `value`는 `[타임스탬프, "값"]`
#[derive(Debug, Clone, Deserialize)]
pub struct VectorSample {
    /// 레이블
    #[serde(default)]
    pub metric: HashMap<String, String>,
    /// (평가 시각, 문자열 값)
    pub value: (f64, String),
}

/// Prometheus 클라이언트
#[derive(Debug)]
pub struct PrometheusClient {
    client: reqwest::Client,
    base_url: String,
    data_bytes_metric: String,
}

impl PrometheusClient {
    /// 새 Prometheus 클라이언트 생성
    pub fn new(
        base_url: &str,
        data_bytes_metric: &str,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            data_bytes_metric: data_bytes_metric.to_string(),
        })
    }

    /// 키/위치별 수신 바이트 증가량 PromQL
    pub fn bytes_query(&self, window_secs: u64) -> String {
        format!(
            "sum(increase({}{{dir=~\"{}\"}}[{}s])) by (location, access_key)",
            self.data_bytes_metric, INBOUND_DIRECTIONS, window_secs
        )
    }

    /// 즉시 조회 실행: 벡터 결과만 허용
    pub async fn query(&self, promql: &str) -> Result<Vec<VectorSample>, CoreError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, QUERY_PATH))
            .map_err(|e| CoreError::Config(format!("Prometheus URL 파싱 실패: {e}")))?;
        url.query_pairs_mut().append_pair("query", promql);
        debug!("Prometheus 조회: {promql}");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("Prometheus 조회 요청 실패: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("Prometheus 응답 읽기 실패: {e}")))?;

        // 400/422 등도 JSON 에러 봉투를 돌려주므로 본문을 먼저 해석한다
        let parsed: QueryResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(CoreError::Query(format!("Prometheus 응답 파싱 실패: {e}")));
            }
            Err(_) => {
                return Err(CoreError::Query(format!("Prometheus 에러 ({status}): {text}")));
            }
        };

        if parsed.status != "success" || !status.is_success() {
            return Err(CoreError::Query(format!(
                "Prometheus 에러 ({status}) {}: {}",
                parsed.error_type.unwrap_or_default(),
                parsed.error.unwrap_or_default()
            )));
        }

        let data = parsed
            .data
            .ok_or_else(|| CoreError::Query("Prometheus 응답에 data 없음".to_string()))?;
        if data.result_type != "vector" {
            return Err(CoreError::Query(format!(
                "예상하지 못한 결과 타입: {}",
                data.result_type
            )));
        }

        Ok(data.result)
    }
}

#[async_trait]
impl UsageBackend for PrometheusClient {
    async fn query_bytes_transferred(
        &self,
        window_secs: u64,
    ) -> Result<Vec<UsageSample>, CoreError> {
        let samples = self.query(&self.bytes_query(window_secs)).await?;

        let mut rows = Vec::with_capacity(samples.len());
        for sample in samples {
            let Some(access_key) = sample.metric.get("access_key").cloned() else {
                warn!("access_key 레이블 없는 행 무시: {:?}", sample.metric);
                continue;
            };
            let bytes = sample.value.1.parse::<f64>().map_err(|e| {
                CoreError::Query(format!("바이트 값 파싱 실패: {}: {e}", sample.value.1))
            })?;
            rows.push(UsageSample {
                access_key,
                location: sample.metric.get("location").cloned(),
                bytes,
            });
        }

        debug!("Prometheus 사용량 {}행 ({}초 구간)", rows.len(), window_secs);
        Ok(rows)
    }
}
