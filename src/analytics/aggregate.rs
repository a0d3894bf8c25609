//! Rollups over raw page views.
//!
//! All functions take the views already loaded from storage plus an explicit
//! `now`, so the same inputs always yield the same summary.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Days, Duration, FixedOffset, Timelike, Utc};

use super::period::{Period, local_date, local_midnight};
use super::{
    AnalyticsSettings, AnalyticsSummary, DailyStat, HourlyStat, PageView, RealtimeSnapshot,
    TopPage,
};

/// Maximum number of entries in `topPages`.
pub const TOP_PAGES_LIMIT: usize = 10;

/// Build the dashboard summary for `period`.
///
/// Views outside the window are ignored, so callers may pass a superset.
pub fn summarize(
    views: &[PageView],
    period: Period,
    now: DateTime<Utc>,
    settings: &AnalyticsSettings,
) -> AnalyticsSummary {
    let offset = settings.offset;
    let start = period.window_start(now, offset);
    let in_window: Vec<&PageView> = views
        .iter()
        .filter(|v| v.created_at >= start && v.created_at <= now)
        .collect();

    AnalyticsSummary {
        period,
        unique_visitors: count_unique(in_window.iter().copied()),
        total_visits: in_window.len() as u64,
        top_pages: top_pages(&in_window, TOP_PAGES_LIMIT),
        active_visitors: active_visitors(views, now, settings.active_window),
        hourly_stats: hourly_stats(&in_window, offset),
        daily_stats: daily_stats(&in_window, period, now, offset),
    }
}

/// Live counters pushed to the dashboard stream.
pub fn realtime_snapshot(
    views: &[PageView],
    now: DateTime<Utc>,
    settings: &AnalyticsSettings,
) -> RealtimeSnapshot {
    let today_start = local_midnight(local_date(now, settings.offset), settings.offset);
    let today: Vec<&PageView> = views
        .iter()
        .filter(|v| v.created_at >= today_start && v.created_at <= now)
        .collect();

    RealtimeSnapshot {
        active_visitors: active_visitors(views, now, settings.active_window),
        today_visits: today.len() as u64,
        unique_visitors: count_unique(today.iter().copied()),
        timestamp: now,
    }
}

/// Distinct visitors seen within `window` before `now`.
pub fn active_visitors(views: &[PageView], now: DateTime<Utc>, window: Duration) -> u64 {
    let since = now - window;
    count_unique(
        views
            .iter()
            .filter(|v| v.created_at > since && v.created_at <= now),
    )
}

fn count_unique<'a>(views: impl Iterator<Item = &'a PageView>) -> u64 {
    views
        .map(|v| v.visitor_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64
}

fn top_pages(views: &[&PageView], limit: usize) -> Vec<TopPage> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for view in views {
        *counts.entry(view.page.as_str()).or_default() += 1;
    }
    let mut pages: Vec<TopPage> = counts
        .into_iter()
        .map(|(page, visits)| TopPage {
            page: page.to_string(),
            visits,
        })
        .collect();
    pages.sort_by(|a, b| b.visits.cmp(&a.visits).then_with(|| a.page.cmp(&b.page)));
    pages.truncate(limit);
    pages
}

fn hourly_stats(views: &[&PageView], offset: FixedOffset) -> Vec<HourlyStat> {
    let mut buckets = [0u64; 24];
    for view in views {
        let hour = view.created_at.with_timezone(&offset).hour() as usize;
        buckets[hour] += 1;
    }
    buckets
        .iter()
        .enumerate()
        .map(|(hour, visits)| HourlyStat {
            hour: hour as u32,
            visits: *visits,
        })
        .collect()
}

fn daily_stats(
    views: &[&PageView],
    period: Period,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<DailyStat> {
    let first = period.first_day(now, offset);
    let today = local_date(now, offset);

    let mut per_day: BTreeMap<_, (HashSet<&str>, u64)> = BTreeMap::new();
    let mut day = first;
    while day <= today {
        per_day.insert(day, (HashSet::new(), 0));
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }

    for view in views {
        if let Some((visitors, total)) = per_day.get_mut(&local_date(view.created_at, offset)) {
            visitors.insert(view.visitor_id.as_str());
            *total += 1;
        }
    }

    per_day
        .into_iter()
        .map(|(date, (visitors, total))| DailyStat {
            date: date.format("%Y-%m-%d").to_string(),
            unique_visitors: visitors.len() as u64,
            total_visits: total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn settings() -> AnalyticsSettings {
        AnalyticsSettings::default()
    }

    fn view(id: i64, page: &str, visitor: &str, at: DateTime<Utc>) -> PageView {
        PageView {
            id,
            page: page.to_string(),
            visitor_id: visitor.to_string(),
            referrer: None,
            user_agent: None,
            created_at: at,
        }
    }

    // 2024-06-10 05:00 UTC = 12:00 WIB
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 5, 0, 0).unwrap()
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], Period::Week, now(), &settings());
        assert_eq!(summary.unique_visitors, 0);
        assert_eq!(summary.total_visits, 0);
        assert!(summary.top_pages.is_empty());
        assert_eq!(summary.hourly_stats.len(), 24);
        assert_eq!(summary.daily_stats.len(), 7);
        assert!(summary.daily_stats.iter().all(|d| d.total_visits == 0));
    }

    #[test]
    fn test_summarize_counts_unique_and_total() {
        let n = now();
        let views = vec![
            view(1, "/", "a", n - Duration::hours(1)),
            view(2, "/blog", "a", n - Duration::hours(2)),
            view(3, "/", "b", n - Duration::days(2)),
            // Outside the week window
            view(4, "/", "c", n - Duration::days(10)),
        ];
        let summary = summarize(&views, Period::Week, n, &settings());
        assert_eq!(summary.unique_visitors, 2);
        assert_eq!(summary.total_visits, 3);
        assert_eq!(summary.top_pages[0].page, "/");
        assert_eq!(summary.top_pages[0].visits, 2);
        assert_eq!(summary.top_pages[1].page, "/blog");
    }

    #[test]
    fn test_top_pages_tie_break_by_name_and_limit() {
        let n = now();
        let views: Vec<PageView> = (0..12)
            .map(|i| view(i, &format!("/p{:02}", i), "v", n - Duration::minutes(i + 1)))
            .collect();
        let summary = summarize(&views, Period::Day, n, &settings());
        assert_eq!(summary.top_pages.len(), TOP_PAGES_LIMIT);
        assert_eq!(summary.top_pages[0].page, "/p00");
        assert_eq!(summary.top_pages[9].page, "/p09");
    }

    #[test]
    fn test_hourly_stats_use_local_hour() {
        let n = now();
        // 03:30 UTC = 10:30 WIB
        let views = vec![view(1, "/", "a", Utc.with_ymd_and_hms(2024, 6, 10, 3, 30, 0).unwrap())];
        let summary = summarize(&views, Period::Day, n, &settings());
        assert_eq!(summary.hourly_stats[10].visits, 1);
        assert_eq!(summary.hourly_stats.iter().map(|h| h.visits).sum::<u64>(), 1);
    }

    #[test]
    fn test_daily_stats_bucket_by_local_date() {
        let n = now();
        let views = vec![
            // 2024-06-09 18:00 UTC is already 2024-06-10 01:00 WIB
            view(1, "/", "a", Utc.with_ymd_and_hms(2024, 6, 9, 18, 0, 0).unwrap()),
            view(2, "/", "a", Utc.with_ymd_and_hms(2024, 6, 10, 1, 0, 0).unwrap()),
            view(3, "/", "b", Utc.with_ymd_and_hms(2024, 6, 8, 1, 0, 0).unwrap()),
        ];
        let summary = summarize(&views, Period::Week, n, &settings());
        let last = summary.daily_stats.last().unwrap();
        assert_eq!(last.date, "2024-06-10");
        assert_eq!(last.unique_visitors, 1);
        assert_eq!(last.total_visits, 2);
        let june8 = summary
            .daily_stats
            .iter()
            .find(|d| d.date == "2024-06-08")
            .unwrap();
        assert_eq!(june8.total_visits, 1);
        assert_eq!(summary.daily_stats.first().unwrap().date, "2024-06-04");
    }

    #[test]
    fn test_daily_stats_cover_month_and_year() {
        let n = now();
        let views = vec![
            view(1, "/", "a", n - Duration::days(29)),
            view(2, "/", "b", n - Duration::days(300)),
        ];

        let month = summarize(&views, Period::Month, n, &settings());
        assert_eq!(month.daily_stats.len(), 30);
        assert_eq!(month.daily_stats.first().unwrap().date, "2024-05-12");
        assert_eq!(month.daily_stats.last().unwrap().date, "2024-06-10");
        assert_eq!(month.total_visits, 1);

        let year = summarize(&views, Period::Year, n, &settings());
        assert_eq!(year.daily_stats.len(), 365);
        assert_eq!(year.daily_stats.first().unwrap().date, "2023-06-12");
        assert_eq!(year.daily_stats.last().unwrap().date, "2024-06-10");
        assert_eq!(year.total_visits, 2);
        assert_eq!(year.unique_visitors, 2);
    }

    #[test]
    fn test_active_visitors_window() {
        let n = now();
        let views = vec![
            view(1, "/", "a", n - Duration::minutes(1)),
            view(2, "/", "a", n - Duration::minutes(2)),
            view(3, "/", "b", n - Duration::minutes(4)),
            view(4, "/", "c", n - Duration::minutes(6)),
        ];
        assert_eq!(active_visitors(&views, n, Duration::minutes(5)), 2);
    }

    #[test]
    fn test_realtime_snapshot_counts_today_only() {
        let n = now();
        let views = vec![
            view(1, "/", "a", n - Duration::minutes(1)),
            view(2, "/", "b", n - Duration::hours(3)),
            view(3, "/", "b", n - Duration::hours(4)),
            // Yesterday in WIB
            view(4, "/", "c", n - Duration::hours(13)),
        ];
        let snap = realtime_snapshot(&views, n, &settings());
        assert_eq!(snap.active_visitors, 1);
        assert_eq!(snap.today_visits, 3);
        assert_eq!(snap.unique_visitors, 2);
        assert_eq!(snap.timestamp, n);
    }
}
