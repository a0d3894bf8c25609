//! Visitor analytics.
//!
//! Page views are recorded by a public beacon endpoint and read back for
//! two consumers: the dashboard summary (`summarize`) and the live counter
//! stream (`realtime_snapshot`). Both are plain functions over a slice of
//! [`PageView`]s; storage and transport live in `crate::site`.

pub mod aggregate;
pub mod period;
pub mod visitor;

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

pub use aggregate::{active_visitors, realtime_snapshot, summarize};
pub use period::Period;

/// A single recorded page view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageView {
    pub id: i64,
    #[serde(rename = "halaman")]
    pub page: String,
    pub visitor_id: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Tunables for aggregation, derived from `[analytics]` in `brick.toml`.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsSettings {
    /// Local time zone used for hour and day buckets.
    pub offset: FixedOffset,
    /// A visitor counts as active if seen within this window.
    pub active_window: Duration,
    /// Page views older than this are pruned.
    pub retention: Duration,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            // WIB
            offset: utc_offset(7 * 60),
            active_window: Duration::minutes(5),
            retention: Duration::days(400),
        }
    }
}

/// Fixed offset `minutes` east of UTC; out-of-range values fall back to UTC.
pub fn utc_offset(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopPage {
    #[serde(rename = "halaman")]
    pub page: String,
    pub visits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourlyStat {
    pub hour: u32,
    pub visits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStat {
    #[serde(rename = "tanggal")]
    pub date: String,
    #[serde(rename = "pengunjung_unik")]
    pub unique_visitors: u64,
    #[serde(rename = "total_kunjungan")]
    pub total_visits: u64,
}

/// Dashboard payload for `GET /api/analitik`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub period: Period,
    pub unique_visitors: u64,
    pub total_visits: u64,
    pub top_pages: Vec<TopPage>,
    pub active_visitors: u64,
    pub hourly_stats: Vec<HourlyStat>,
    pub daily_stats: Vec<DailyStat>,
}

/// Live counters pushed over SSE and WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeSnapshot {
    pub active_visitors: u64,
    pub today_visits: u64,
    pub unique_visitors: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_utc_offset_falls_back_to_utc() {
        assert_eq!(utc_offset(420).local_minus_utc(), 7 * 3600);
        assert_eq!(utc_offset(100_000).local_minus_utc(), 0);
    }

    #[test]
    fn test_summary_wire_names() {
        let summary = AnalyticsSummary {
            period: Period::Week,
            unique_visitors: 3,
            total_visits: 5,
            top_pages: vec![TopPage { page: "/".into(), visits: 5 }],
            active_visitors: 1,
            hourly_stats: vec![HourlyStat { hour: 9, visits: 5 }],
            daily_stats: vec![DailyStat {
                date: "2024-06-10".into(),
                unique_visitors: 3,
                total_visits: 5,
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["period"], "week");
        assert_eq!(json["uniqueVisitors"], 3);
        assert_eq!(json["totalVisits"], 5);
        assert_eq!(json["topPages"][0]["halaman"], "/");
        assert_eq!(json["hourlyStats"][0]["hour"], 9);
        assert_eq!(json["dailyStats"][0]["tanggal"], "2024-06-10");
        assert_eq!(json["dailyStats"][0]["pengunjung_unik"], 3);
        assert_eq!(json["dailyStats"][0]["total_kunjungan"], 5);
    }

    #[test]
    fn test_snapshot_wire_names() {
        let snap = RealtimeSnapshot {
            active_visitors: 2,
            today_visits: 10,
            unique_visitors: 4,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 10, 5, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["activeVisitors"], 2);
        assert_eq!(json["todayVisits"], 10);
        assert_eq!(json["uniqueVisitors"], 4);
        assert!(json["timestamp"].as_str().unwrap().starts_with("2024-06-10T05:00:00"));
    }
}
