//! 2-루프 메트릭 보고 스케줄러.
//!
//! 시간별 사용량 보고(1시간), 일별 기능 보고(24시간) 오케스트레이션.
//! 타이머는 옵트인 상태와 무관하게 프로세스 수명 동안 돌고, 각 틱 본문에서
//! 매번 플래그를 새로 읽어 비활성이면 아무것도 하지 않는다.
//!
//! 틱 안에서 발생한 조회/전송 에러는 로그와 [`PublisherEvent`]로만 남기고 삼킨다.
//! 재시도는 다음 틱에서 자연스럽게 일어난다.

use keymetrics_core::config_manager::ServerConfigStore;
use keymetrics_core::error::CoreError;
use keymetrics_core::ports::clock::Clock;
use keymetrics_core::ports::metrics_collector::MetricsCollector;
use keymetrics_core::ports::metrics_id::MetricsIdMapper;
use keymetrics_core::ports::usage_source::UsageSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::report::{build_feature_report, build_hourly_report};
use crate::sharing::MetricsSharing;

/// 스케줄러 설정
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// 시간별 사용량 보고 간격
    pub usage_report_interval: Duration,
    /// 일별 기능 보고 간격
    pub feature_report_interval: Duration,
    /// 기능 보고서에 실리는 서버 버전
    pub server_version: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            usage_report_interval: Duration::from_secs(3_600), // 1시간
            feature_report_interval: Duration::from_secs(86_400), // 24시간
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// 보고 결과 알림 (관찰자/테스트용)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherEvent {
    /// 사용량 보고서 전송 성공
    UsageReported {
        start_utc_ms: i64,
        end_utc_ms: i64,
        user_count: usize,
    },
    /// 남은 행이 없어 전송 생략 (구간은 진행됨)
    UsageReportSkipped { start_utc_ms: i64, end_utc_ms: i64 },
    /// 사용량 조회 또는 전송 실패
    UsageReportFailed { error: String },
    /// 기능 보고서 전송 성공
    FeatureReported { timestamp_utc_ms: i64 },
    /// 기능 보고서 전송 실패
    FeatureReportFailed { error: String },
}

/// 사용량 틱 결과
enum UsageOutcome {
    Delivered {
        start_utc_ms: i64,
        end_utc_ms: i64,
        user_count: usize,
    },
    Empty {
        start_utc_ms: i64,
        end_utc_ms: i64,
    },
}

/// 공유 메트릭 퍼블리셔
pub struct SharedMetricsPublisher {
    config: PublisherConfig,
    sharing: MetricsSharing,
    clock: Arc<dyn Clock>,
    usage_source: Arc<dyn UsageSource>,
    collector: Arc<dyn MetricsCollector>,
    id_mapper: Arc<dyn MetricsIdMapper>,
    /// 보고 구간 시작 커서 (UTC 밀리초)
    ///
    /// 사용량 틱 전체 동안 잠가 같은 구간이 두 번 보고되지 않게 한다.
    report_start_ms: Mutex<i64>,
    /// 보고 결과 브로드캐스트 채널 (옵션)
    event_tx: Option<broadcast::Sender<PublisherEvent>>,
}

impl SharedMetricsPublisher {
    /// 새 퍼블리셔 생성: 보고 구간 커서는 현재 시각에서 시작
    pub fn new(
        config: PublisherConfig,
        server_config: Arc<ServerConfigStore>,
        clock: Arc<dyn Clock>,
        usage_source: Arc<dyn UsageSource>,
        collector: Arc<dyn MetricsCollector>,
        id_mapper: Arc<dyn MetricsIdMapper>,
    ) -> Self {
        let start = clock.now_ms();
        Self {
            config,
            sharing: MetricsSharing::new(server_config),
            clock,
            usage_source,
            collector,
            id_mapper,
            report_start_ms: Mutex::new(start),
            event_tx: None,
        }
    }

    /// 보고 결과 브로드캐스트 채널 설정
    pub fn with_event_tx(mut self, event_tx: broadcast::Sender<PublisherEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// 메트릭 공유 시작
    pub fn start_sharing(&self) -> Result<(), CoreError> {
        self.sharing.start_sharing()
    }

    /// 메트릭 공유 중지
    pub fn stop_sharing(&self) -> Result<(), CoreError> {
        self.sharing.stop_sharing()
    }

    /// 현재 공유 여부 (매번 설정에서 읽음)
    pub fn is_sharing_enabled(&self) -> bool {
        self.sharing.is_sharing_enabled()
    }

    /// 다음 보고 구간의 시작 시각
    pub async fn report_start_ms(&self) -> i64 {
        *self.report_start_ms.lock().await
    }

    /// 두 타이머 루프 시작, 종료 신호까지 대기
    pub async fn run(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        let usage_interval = self.config.usage_report_interval;
        let feature_interval = self.config.feature_report_interval;
        info!(
            "메트릭 스케줄러 시작: 사용량={}s, 기능={}s, 공유={}",
            usage_interval.as_secs(),
            feature_interval.as_secs(),
            self.is_sharing_enabled()
        );

        // ============================================================
        // 1. 사용량 보고 루프 (1시간)
        // ============================================================
        let publisher1 = self.clone();
        let mut shutdown1 = shutdown_rx.clone();

        let usage_task = tokio::spawn(async move {
            // 첫 틱은 한 주기 뒤
            let mut interval =
                tokio::time::interval_at(Instant::now() + usage_interval, usage_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        publisher1.run_usage_tick().await;
                    }
                    _ = shutdown1.changed() => {
                        info!("사용량 보고 루프 종료");
                        break;
                    }
                }
            }
        });

        // ============================================================
        // 2. 기능 보고 루프 (24시간)
        // ============================================================
        let publisher2 = self.clone();
        let mut shutdown2 = shutdown_rx.clone();

        let feature_task = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(Instant::now() + feature_interval, feature_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        publisher2.run_feature_tick().await;
                    }
                    _ = shutdown2.changed() => {
                        info!("기능 보고 루프 종료");
                        break;
                    }
                }
            }
        });

        // ============================================================
        // 종료 대기
        // ============================================================
        let _ = shutdown_rx.changed().await;
        info!("메트릭 스케줄러 종료 신호 수신");

        // 진행 중인 구간은 전송하지 않는다
        usage_task.abort();
        feature_task.abort();
    }

    /// 사용량 틱 한 번 실행
    ///
    /// 에러는 여기서 로그로 남기고 삼킨다.
    pub async fn run_usage_tick(&self) {
        if !self.is_sharing_enabled() {
            debug!("메트릭 공유 비활성, 사용량 보고 생략");
            return;
        }

        match self.report_server_usage().await {
            Ok(UsageOutcome::Delivered {
                start_utc_ms,
                end_utc_ms,
                user_count,
            }) => {
                info!("사용량 보고 완료: {user_count}개 행, [{start_utc_ms}, {end_utc_ms})");
                self.emit(PublisherEvent::UsageReported {
                    start_utc_ms,
                    end_utc_ms,
                    user_count,
                });
            }
            Ok(UsageOutcome::Empty {
                start_utc_ms,
                end_utc_ms,
            }) => {
                debug!("보고할 사용량 없음: [{start_utc_ms}, {end_utc_ms})");
                self.emit(PublisherEvent::UsageReportSkipped {
                    start_utc_ms,
                    end_utc_ms,
                });
            }
            Err(e) => {
                error!("서버 사용량 메트릭 보고 실패: {e}");
                self.emit(PublisherEvent::UsageReportFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    /// 기능 틱 한 번 실행: 공유 중이면 항상 전송
    pub async fn run_feature_tick(&self) {
        if !self.is_sharing_enabled() {
            debug!("메트릭 공유 비활성, 기능 보고 생략");
            return;
        }

        let server_config = self.sharing.store().get();
        let report = build_feature_report(
            &server_config,
            &self.config.server_version,
            self.clock.now_ms(),
        );

        match self.collector.collect_feature_metrics(&report).await {
            Ok(()) => {
                info!("기능 보고 완료: data_limit={}", report.data_limit.enabled);
                self.emit(PublisherEvent::FeatureReported {
                    timestamp_utc_ms: report.timestamp_utc_ms,
                });
            }
            Err(e) => {
                error!("기능 메트릭 보고 실패: {e}");
                self.emit(PublisherEvent::FeatureReportFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    /// 조회 → 기준 시점 재설정 → 보고서 조립 → 커서 전진 → (행이 있으면) 전송
    ///
    /// 조회에 성공하면 전송 결과와 무관하게 커서와 사용량 기준 시점이 함께 전진한다.
    /// 전송에 실패한 구간은 다시 보내지 않는다. 조회에 실패하면 둘 다 그대로 두어
    /// 다음 틱이 더 긴 구간을 보고한다.
    async fn report_server_usage(&self) -> Result<UsageOutcome, CoreError> {
        let mut cursor = self.report_start_ms.lock().await;

        let usage = self.usage_source.get_usage().await?;
        let start_utc_ms = *cursor;
        let end_utc_ms = self.clock.now_ms().max(start_utc_ms);
        self.usage_source.reset();

        let server_id = self.sharing.store().get().server_id;
        let report = build_hourly_report(
            server_id,
            start_utc_ms,
            end_utc_ms,
            &usage,
            self.id_mapper.as_ref(),
        );
        *cursor = end_utc_ms;

        if report.user_reports.is_empty() {
            return Ok(UsageOutcome::Empty {
                start_utc_ms,
                end_utc_ms,
            });
        }

        let user_count = report.user_reports.len();
        self.collector.collect_server_usage_metrics(&report).await?;
        Ok(UsageOutcome::Delivered {
            start_utc_ms,
            end_utc_ms,
            user_count,
        })
    }

    fn emit(&self, event: PublisherEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }
}
