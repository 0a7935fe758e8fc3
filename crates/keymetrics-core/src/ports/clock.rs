//! 벽시계 포트.
//!
//! 보고 구간 타임스탬프는 모두 이 포트에서 읽는다. 테스트는 [`ManualClock`]으로
//! 시간을 직접 움직인다.

use std::sync::atomic::{AtomicI64, Ordering};

/// 현재 UTC 시각 제공자
pub trait Clock: Send + Sync {
    /// 현재 시각 (UTC 밀리초)
    fn now_ms(&self) -> i64;
}

/// 시스템 시계
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// 수동 시계: `advance`/`set` 호출로만 움직인다
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// 지정 시각에서 시작하는 시계 생성
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    /// 시계를 `delta_ms`만큼 앞으로 이동
    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// 시계를 특정 시각으로 설정
    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
