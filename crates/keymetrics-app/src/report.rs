//! 보고서 조립과 필터링 정책.
//!
//! - 전송 바이트가 0인 행은 버린다.
//! - 국가 목록이 비어 있지 않고 모든 국가가 제재 대상이면 버린다.
//!   제재 국가와 비제재 국가가 섞인 행은 보고한다.
//! - 남은 행의 키 ID는 공개 메트릭 ID로 바꾼다 (매핑 없음 → 빈 문자열).

use keymetrics_core::config::ServerConfig;
use keymetrics_core::models::report::{
    DailyDataLimitMetricsReport, DailyFeatureMetricsReport, HourlyServerMetricsReport,
    HourlyUserMetricsReport,
};
use keymetrics_core::models::usage::KeyUsage;
use keymetrics_core::ports::metrics_id::MetricsIdMapper;

/// 제재 대상 국가 코드
pub const SANCTIONED_COUNTRIES: [&str; 4] = ["CU", "IR", "KP", "SY"];

/// 국가 코드가 제재 대상인지 확인 (대소문자 무시)
pub fn is_sanctioned_country(country: &str) -> bool {
    SANCTIONED_COUNTRIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(country))
}

/// 국가 목록 전체가 제재 대상인지 확인: 빈 목록은 false
pub fn is_sanctioned_only(countries: &[String]) -> bool {
    !countries.is_empty() && countries.iter().all(|c| is_sanctioned_country(c))
}

/// 보고 대상 행인지 판정
pub fn is_reportable(usage: &KeyUsage) -> bool {
    usage.inbound_bytes > 0 && !is_sanctioned_only(&usage.countries)
}

/// 시간별 사용량 보고서 조립
///
/// 구간은 `[start_utc_ms, end_utc_ms)`. 남은 행이 없어도 보고서는 만들어지고,
/// 전송 여부는 호출자가 결정한다.
pub fn build_hourly_report(
    server_id: String,
    start_utc_ms: i64,
    end_utc_ms: i64,
    usage: &[KeyUsage],
    id_mapper: &dyn MetricsIdMapper,
) -> HourlyServerMetricsReport {
    let user_reports = usage
        .iter()
        .filter(|u| is_reportable(u))
        .map(|u| HourlyUserMetricsReport {
            user_id: id_mapper.metrics_id(&u.access_key_id).unwrap_or_default(),
            countries: u.countries.clone(),
            bytes_transferred: u.inbound_bytes,
        })
        .collect();

    HourlyServerMetricsReport {
        server_id,
        start_utc_ms,
        end_utc_ms,
        user_reports,
    }
}

/// 일별 기능 보고서 조립
pub fn build_feature_report(
    config: &ServerConfig,
    server_version: &str,
    timestamp_utc_ms: i64,
) -> DailyFeatureMetricsReport {
    DailyFeatureMetricsReport {
        server_id: config.server_id.clone(),
        server_version: server_version.to_string(),
        timestamp_utc_ms,
        data_limit: DailyDataLimitMetricsReport {
            enabled: config.access_key_data_limit.is_some(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keymetrics_core::config::DataLimit;
    use std::collections::HashMap;

    struct MapIds(HashMap<String, String>);

    impl MetricsIdMapper for MapIds {
        fn metrics_id(&self, access_key_id: &str) -> Option<String> {
            self.0.get(access_key_id).cloned()
        }
    }

    fn ids(pairs: &[(&str, &str)]) -> MapIds {
        MapIds(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn usage(id: &str, countries: &[&str], bytes: u64) -> KeyUsage {
        KeyUsage {
            access_key_id: id.to_string(),
            countries: countries.iter().map(|c| c.to_string()).collect(),
            inbound_bytes: bytes,
        }
    }

    #[test]
    fn sanctioned_only_rules() {
        let list = |cs: &[&str]| cs.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        assert!(is_sanctioned_only(&list(&["KP"])));
        assert!(is_sanctioned_only(&list(&["CU", "SY", "IR"])));
        assert!(is_sanctioned_only(&list(&["kp"])));
        assert!(!is_sanctioned_only(&list(&["KP", "US"])));
        assert!(!is_sanctioned_only(&list(&["US"])));
        assert!(!is_sanctioned_only(&[]));
    }

    #[test]
    fn us_kept_kp_dropped() {
        let mapper = ids(&[("a", "uid-a"), ("b", "uid-b")]);
        let report = build_hourly_report(
            "srv".to_string(),
            0,
            3_600_000,
            &[usage("a", &["US"], 1000), usage("b", &["KP"], 500)],
            &mapper,
        );

        assert_eq!(report.user_reports.len(), 1);
        assert_eq!(report.user_reports[0].user_id, "uid-a");
        assert_eq!(report.user_reports[0].bytes_transferred, 1000);
        assert_eq!(report.user_reports[0].countries, vec!["US"]);
    }

    #[test]
    fn zero_bytes_dropped_even_without_countries() {
        let mapper = ids(&[]);
        let report = build_hourly_report(
            "srv".to_string(),
            10,
            20,
            &[usage("c", &[], 0), usage("d", &["US"], 0)],
            &mapper,
        );
        assert!(report.user_reports.is_empty());
        assert_eq!((report.start_utc_ms, report.end_utc_ms), (10, 20));
    }

    #[test]
    fn mixed_and_empty_countries_reported() {
        let mapper = ids(&[("m", "uid-m"), ("e", "uid-e")]);
        let report = build_hourly_report(
            "srv".to_string(),
            0,
            1,
            &[usage("m", &["KP", "CA"], 7), usage("e", &[], 3)],
            &mapper,
        );
        let user_ids: Vec<_> = report.user_reports.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(user_ids, vec!["uid-m", "uid-e"]);
    }

    #[test]
    fn missing_mapping_emits_empty_user_id() {
        let mapper = ids(&[]);
        let report = build_hourly_report(
            "srv".to_string(),
            0,
            1,
            &[usage("unknown", &["DE"], 42)],
            &mapper,
        );
        assert_eq!(report.user_reports.len(), 1);
        assert_eq!(report.user_reports[0].user_id, "");
    }

    #[test]
    fn feature_report_reflects_data_limit() {
        let mut config = ServerConfig::new_default(0);
        let report = build_feature_report(&config, "1.0.0", 99);
        assert!(!report.data_limit.enabled);
        assert_eq!(report.server_id, config.server_id);
        assert_eq!(report.timestamp_utc_ms, 99);

        config.access_key_data_limit = Some(DataLimit { bytes: 1 });
        assert!(build_feature_report(&config, "1.0.0", 99).data_limit.enabled);
    }
}
