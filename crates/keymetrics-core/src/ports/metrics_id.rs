//! 공개 식별자 매핑 포트.

/// 액세스 키 ID → 공개 메트릭 ID 매핑
///
/// 순수 조회여야 한다. 보고서에 남는 행마다 한 번씩 호출된다.
pub trait MetricsIdMapper: Send + Sync {
    /// 매핑된 공개 ID, 없으면 `None`
    fn metrics_id(&self, access_key_id: &str) -> Option<String>;
}
