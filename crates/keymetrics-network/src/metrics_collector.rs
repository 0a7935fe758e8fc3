//! 수집 서버 REST 클라이언트.
//!
//! `MetricsCollector` 포트 구현. 보고서를 JSON으로 직렬화해 한 번만 POST한다.
//! 재시도/백오프는 하지 않는다. 실패한 구간은 다시 보내지 않는다.

use async_trait::async_trait;
use keymetrics_core::error::CoreError;
use keymetrics_core::models::report::{DailyFeatureMetricsReport, HourlyServerMetricsReport};
use keymetrics_core::ports::metrics_collector::MetricsCollector;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// 시간별 사용량 보고서 경로
const CONNECTIONS_PATH: &str = "/connections";

/// 일별 기능 보고서 경로
const FEATURES_PATH: &str = "/features";

/// REST 메트릭 수집기: `MetricsCollector` 포트 구현
///
/// 기준 URL의 스킴(`http`/`https`)에 따라 평문/TLS 연결을 사용한다.
#[derive(Debug)]
pub struct RestMetricsCollector {
    client: reqwest::Client,
    base_url: String,
}

impl RestMetricsCollector {
    /// 새 수집기 생성
    ///
    /// `timeout`이 None이면 요청 타임아웃을 두지 않는다.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, CoreError> {
        let parsed = Url::parse(base_url).map_err(|e| {
            CoreError::Config(format!("수집 서버 URL 파싱 실패: {base_url}: {e}"))
        })?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CoreError::Config(format!("지원하지 않는 스킴: {other}")));
            }
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 보고서를 JSON 본문으로 POST
    ///
    /// 2xx 응답만 성공으로 본다. 전송 직전 목적지와 본문 전체를 로그에 남긴다.
    async fn post_report<T>(&self, path: &str, report: &T) -> Result<(), CoreError>
    where
        T: Serialize + Sync,
    {
        let body = serde_json::to_string(report)?;
        let url = format!("{}{}", self.base_url, path);
        info!("메트릭 전송: POST {url} ({} bytes) {body}", body.len());

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("메트릭 전송 요청 실패: {url}: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            debug!("메트릭 전송 성공: {url} ({status})");
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_else(|e| {
            warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });
        Err(CoreError::Delivery {
            status: status.as_u16(),
            body: text,
        })
    }
}

#[async_trait]
impl MetricsCollector for RestMetricsCollector {
    async fn collect_server_usage_metrics(
        &self,
        report: &HourlyServerMetricsReport,
    ) -> Result<(), CoreError> {
        debug!(
            "사용량 보고서 전송: {}개 행, [{}, {})",
            report.user_reports.len(),
            report.start_utc_ms,
            report.end_utc_ms
        );
        self.post_report(CONNECTIONS_PATH, report).await
    }

    async fn collect_feature_metrics(
        &self,
        report: &DailyFeatureMetricsReport,
    ) -> Result<(), CoreError> {
        debug!("기능 보고서 전송: data_limit={}", report.data_limit.enabled);
        self.post_report(FEATURES_PATH, report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use keymetrics_core::models::report::{DailyDataLimitMetricsReport, HourlyUserMetricsReport};
    use mockito::Matcher;

    fn usage_report() -> HourlyServerMetricsReport {
        HourlyServerMetricsReport {
            server_id: "srv-1".to_string(),
            start_utc_ms: 1_000,
            end_utc_ms: 3_601_000,
            user_reports: vec![HourlyUserMetricsReport {
                user_id: "uid-a".to_string(),
                countries: vec!["US".to_string()],
                bytes_transferred: 1_000,
            }],
        }
    }

    fn feature_report() -> DailyFeatureMetricsReport {
        DailyFeatureMetricsReport {
            server_id: "srv-1".to_string(),
            server_version: "0.1.0".to_string(),
            timestamp_utc_ms: 5_000,
            data_limit: DailyDataLimitMetricsReport { enabled: false },
        }
    }

    #[test]
    fn collector_creation_trims_slash() {
        let collector = RestMetricsCollector::new("https://metrics.example.com/", None).unwrap();
        assert_eq!(collector.base_url, "https://metrics.example.com");
    }

    #[test]
    fn unsupported_scheme_rejected() {
        let result = RestMetricsCollector::new("ftp://metrics.example.com", None);
        assert_matches!(result, Err(CoreError::Config(_)));

        let result = RestMetricsCollector::new("not a url", None);
        assert_matches!(result, Err(CoreError::Config(_)));
    }

    #[tokio::test]
    async fn usage_report_posted_as_json() {
        let mut server = mockito::Server::new_async().await;
        let report = usage_report();
        let body = serde_json::to_string(&report).unwrap();

        let mock = server
            .mock("POST", "/connections")
            .match_header("content-type", "application/json")
            .match_header("content-length", body.len().to_string().as_str())
            .match_body(Matcher::Json(serde_json::json!({
                "serverId": "srv-1",
                "startUtcMs": 1000,
                "endUtcMs": 3601000,
                "userReports": [
                    {"userId": "uid-a", "countries": ["US"], "bytesTransferred": 1000}
                ]
            })))
            .with_status(200)
            .create_async()
            .await;

        let collector =
            RestMetricsCollector::new(&server.url(), Some(Duration::from_secs(5))).unwrap();
        let result = collector.collect_server_usage_metrics(&report).await;
        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn feature_report_posted_to_features_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/features")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "serverId": "srv-1",
                "dataLimit": {"enabled": false}
            })))
            .with_status(204)
            .create_async()
            .await;

        let collector = RestMetricsCollector::new(&server.url(), None).unwrap();
        let result = collector.collect_feature_metrics(&feature_report()).await;
        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn service_unavailable_is_delivery_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/connections")
            .with_status(503)
            .with_body("Service Unavailable")
            .expect(1)
            .create_async()
            .await;

        let collector = RestMetricsCollector::new(&server.url(), None).unwrap();
        let result = collector.collect_server_usage_metrics(&usage_report()).await;
        assert_matches!(
            result,
            Err(CoreError::Delivery { status: 503, ref body }) if body == "Service Unavailable"
        );
        // 재시도 없이 정확히 한 번만 요청
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn redirect_status_is_not_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/features")
            .with_status(304)
            .create_async()
            .await;

        let collector = RestMetricsCollector::new(&server.url(), None).unwrap();
        let result = collector.collect_feature_metrics(&feature_report()).await;
        assert_matches!(result, Err(CoreError::Delivery { status: 304, .. }));
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let collector = RestMetricsCollector::new("http://127.0.0.1:1", None).unwrap();
        let result = collector.collect_feature_metrics(&feature_report()).await;
        assert_matches!(result, Err(CoreError::Network(_)));
    }
}
