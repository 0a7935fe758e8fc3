//! # keymetrics-app
//!
//! keymetrics 에이전트.
//! 사용량 소스 → 필터링/매핑 → 수집 서버 전송으로 이어지는 보고 파이프라인을
//! 두 개의 주기 타이머(시간별 사용량, 일별 기능)로 구동한다.
//!
//! ## 구조
//!
//! - [`publisher`]: 옵트인 게이트가 걸린 보고 스케줄러
//! - [`report`]: 제재 국가/무사용 필터링 정책과 보고서 조립
//! - [`sharing`]: 옵트인 플래그 제어
//! - [`access_keys`]: 액세스 키 → 공개 메트릭 ID 매핑
//! - [`settings`]: 에이전트 설정 로드 (`config` crate)
//! - [`lifecycle`]: 종료 시그널까지 스케줄러 실행

pub mod access_keys;
pub mod lifecycle;
pub mod publisher;
pub mod report;
pub mod settings;
pub mod sharing;
