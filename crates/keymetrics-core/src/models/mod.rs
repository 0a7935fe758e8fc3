//! keymetrics 도메인 모델.
//!
//! 백엔드 조회 결과(사용량 스냅샷)와 수집 서버로 전송하는 보고서 구조체를 정의한다.
//! 보고서의 JSON 필드 이름은 수집 서버와의 공개 계약이므로 변경하면 호환성이 깨진다.

pub mod report;
pub mod usage;
