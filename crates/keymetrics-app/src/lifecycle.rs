//! 에이전트 실행 수명.
//!
//! 보고 스케줄러를 띄우고 종료 조건이 충족될 때까지 돌린 뒤 두 루프를 함께 멈춘다.
//! 마지막 보고 이후 쌓인 부분 구간은 전송하지 않고 버린다.

use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::publisher::SharedMetricsPublisher;

/// OS 종료 시그널 대기 (unix: SIGINT/SIGTERM, 그 외: Ctrl+C)
pub async fn shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => info!("SIGINT 수신"),
            _ = sigterm.recv() => info!("SIGTERM 수신"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Ctrl+C 수신");
    }

    Ok(())
}

/// `stop`이 끝날 때까지 퍼블리셔를 실행
///
/// `stop`이 에러로 끝나도 스케줄러는 멈추고, 그 에러를 그대로 돌려준다.
/// 스케줄러 태스크가 완전히 끝난 뒤에 반환한다.
pub async fn run_until<F>(publisher: Arc<SharedMetricsPublisher>, stop: F) -> io::Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(publisher.clone().run(shutdown_rx));

    let stopped = stop.await;
    if let Err(ref e) = stopped {
        error!("종료 조건 대기 실패, 스케줄러 중지: {e}");
    }

    if publisher.is_sharing_enabled() {
        let pending_start = publisher.report_start_ms().await;
        warn!("미전송 부분 구간 폐기: {pending_start}ms 이후 사용량");
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler.await {
        warn!("스케줄러 태스크 종료 에러: {e}");
    }

    info!("보고 스케줄러 정지");
    stopped
}
