//! # keymetrics-network
//!
//! 네트워크 어댑터.
//! 메트릭 백엔드(Prometheus HTTP API) 조회와 수집 서버로의 보고서 전송을 담당한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use keymetrics_network::metrics_collector::RestMetricsCollector;
//! use keymetrics_network::prometheus_client::PrometheusClient;
//! use keymetrics_network::usage_metrics::PrometheusUsageMetrics;
//! ```

pub mod metrics_collector;
pub mod prometheus_client;
pub mod usage_metrics;
