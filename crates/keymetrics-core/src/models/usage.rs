//! 사용량 스냅샷 모델.

use serde::{Deserialize, Serialize};

/// 키별 사용량 (조회 시점 스냅샷, 저장하지 않음)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyUsage {
    /// 액세스 키 ID (내부 식별자)
    pub access_key_id: String,
    /// 접속 국가 코드 목록 (비어 있을 수 있음)
    pub countries: Vec<String>,
    /// 수신 바이트 수
    pub inbound_bytes: u64,
}

/// 백엔드 조회 결과 한 행
///
/// `location`은 쉼표로 구분된 국가 코드 문자열이며 비어 있을 수 있다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSample {
    /// 액세스 키 ID
    pub access_key: String,
    /// 국가 코드 문자열 (예: "US,CA")
    pub location: Option<String>,
    /// 기간 내 전송 바이트 (백엔드 원시값)
    pub bytes: f64,
}
