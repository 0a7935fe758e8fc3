//! keymetrics 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환한다.
//! 타이머 틱 내부에서 발생한 조회/전송 에러는 틱 경계에서 로그로 남기고 삼킨다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 설정값 오류 (잘못된 설정 파일 내용 포함)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 메트릭 백엔드 조회 실패 (비정상 응답, 파싱 실패)
    #[error("메트릭 조회 실패: {0}")]
    Query(String),

    /// 수집 서버가 2xx 이외의 상태 코드로 응답
    #[error("메트릭 전송 실패 (HTTP {status}): {body}")]
    Delivery {
        /// 응답 상태 코드
        status: u16,
        /// 응답 본문 (진단용)
        body: String,
    },
}
