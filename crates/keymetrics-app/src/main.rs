//! # keymetrics
//!
//! keymetrics 에이전트 바이너리 진입점.
//! 설정 로드, 어댑터 와이어링, 보고 스케줄러 실행, 옵트인 명령 처리.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use keymetrics_app::access_keys::AccessKeyMetricsIds;
use keymetrics_app::lifecycle;
use keymetrics_app::publisher::{PublisherConfig, SharedMetricsPublisher};
use keymetrics_app::settings::load_settings;
use keymetrics_app::sharing::MetricsSharing;
use keymetrics_core::config_manager::ServerConfigStore;
use keymetrics_core::ports::clock::{Clock, SystemClock};
use keymetrics_network::metrics_collector::RestMetricsCollector;
use keymetrics_network::prometheus_client::PrometheusClient;
use keymetrics_network::usage_metrics::PrometheusUsageMetrics;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// 서버 설정 파일 이름
const SERVER_CONFIG_FILE: &str = "server_config.json";

/// 액세스 키 파일 이름
const ACCESS_KEYS_FILE: &str = "access_keys.json";

/// keymetrics 에이전트
///
/// 키별 네트워크 사용량을 집계해 옵트인된 경우에만 익명 보고서를 전송한다.
#[derive(Parser, Debug)]
#[command(name = "keymetrics")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 에이전트 설정 파일 (toml/json/yaml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 데이터 디렉토리 (서버 설정/액세스 키 파일 기본 위치)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Prometheus URL 지정
    #[arg(long)]
    prometheus_url: Option<String>,

    /// 수집 서버 URL 지정
    #[arg(long)]
    collector_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 보고 스케줄러 실행 (기본)
    Run,
    /// 메트릭 공유 옵트인 관리
    Sharing {
        #[command(subcommand)]
        action: SharingAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum SharingAction {
    /// 공유 시작
    Enable,
    /// 공유 중지
    Disable,
    /// 현재 상태 출력
    Status,
}

/// 데이터 디렉토리 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/org.keymetrics.agent/`
/// - Windows: `%APPDATA%\keymetrics\agent\data\`
/// - Linux: `~/.local/share/agent/`
fn resolve_data_dir(data_dir: Option<&Path>) -> PathBuf {
    data_dir
        .map(Path::to_path_buf)
        .or_else(|| {
            ProjectDirs::from("org", "keymetrics", "agent").map(|p| p.data_dir().to_path_buf())
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 옵트인 명령 처리
fn handle_sharing(sharing: &MetricsSharing, action: SharingAction) -> Result<()> {
    match action {
        SharingAction::Enable => {
            sharing.start_sharing()?;
            println!("메트릭 공유: 활성화됨");
        }
        SharingAction::Disable => {
            sharing.stop_sharing()?;
            println!("메트릭 공유: 비활성화됨");
        }
        SharingAction::Status => {
            let config = sharing.store().get();
            let state = if config.metrics_enabled {
                "활성화됨"
            } else {
                "비활성화됨"
            };
            println!("메트릭 공유: {state}");
            println!("서버 ID: {}", config.server_id);
            println!("설정 파일: {}", sharing.store().config_path().display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // tracing 초기화
    let log_filter = format!(
        "keymetrics={},keymetrics_app={},keymetrics_core={},keymetrics_network={}",
        args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    // 설정 로드 + CLI 오버라이드
    let mut config =
        load_settings(args.config.as_deref()).map_err(|e| anyhow!("설정 로드 실패: {e}"))?;
    if let Some(ref url) = args.prometheus_url {
        config.prometheus.base_url = url.clone();
    }
    if let Some(ref url) = args.collector_url {
        config.collector.base_url = url.clone();
    }

    let data_dir = resolve_data_dir(args.data_dir.as_deref());
    let server_config_path = config
        .storage
        .server_config_path
        .clone()
        .unwrap_or_else(|| data_dir.join(SERVER_CONFIG_FILE));
    let server_config = Arc::new(ServerConfigStore::with_path(server_config_path)?);
    let sharing = MetricsSharing::new(server_config.clone());

    if let Some(Command::Sharing { action }) = args.command {
        return handle_sharing(&sharing, action);
    }

    info!("keymetrics 에이전트 시작");
    info!("Prometheus: {}", config.prometheus.base_url);
    info!("수집 서버: {}", config.collector.base_url);
    if !sharing.is_sharing_enabled() {
        warn!("메트릭 공유 비활성 상태 (`keymetrics sharing enable`로 활성화)");
    }

    // 어댑터 와이어링
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let prometheus = Arc::new(PrometheusClient::new(
        &config.prometheus.base_url,
        &config.prometheus.data_bytes_metric,
        config.query_timeout(),
    )?);
    let usage_source = Arc::new(PrometheusUsageMetrics::new(prometheus, clock.clone()));
    let collector = Arc::new(RestMetricsCollector::new(
        &config.collector.base_url,
        config.request_timeout(),
    )?);

    let access_keys_path = config
        .storage
        .access_keys_path
        .clone()
        .unwrap_or_else(|| data_dir.join(ACCESS_KEYS_FILE));
    let id_mapper = Arc::new(AccessKeyMetricsIds::open(access_keys_path)?);
    if id_mapper.is_empty() {
        warn!("액세스 키 매핑 없음: 모든 행의 userId가 빈 문자열로 전송됨");
    } else {
        info!("액세스 키 매핑 {}개 로드", id_mapper.len());
    }

    let publisher = Arc::new(SharedMetricsPublisher::new(
        PublisherConfig {
            usage_report_interval: config.usage_report_interval(),
            feature_report_interval: config.feature_report_interval(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        server_config,
        clock,
        usage_source,
        collector,
        id_mapper,
    ));

    // 실행 + 시그널 대기
    lifecycle::run_until(publisher, lifecycle::shutdown_signal()).await?;

    info!("keymetrics 에이전트 종료");
    Ok(())
}
