use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DASHBOARD_WINDOW_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// First day of the window ending on `today`
pub fn window_start(today: NaiveDate, days: u64) -> NaiveDate {
    today
        .checked_sub_days(Days::new(days.saturating_sub(1)))
        .unwrap_or(NaiveDate::MIN)
}

/// One entry per day for the `days` days ending on `today`, oldest first.
/// Days absent from `counts` are reported as zero.
pub fn fill_daily_counts(today: NaiveDate, days: u64, counts: &BTreeMap<NaiveDate, i64>) -> Vec<DailyCount> {
    let start = window_start(today, days);
    start
        .iter_days()
        .take_while(|date| *date <= today)
        .map(|date| DailyCount {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn fills_missing_days_with_zero() {
        let counts = BTreeMap::from([(day(4), 2), (day(7), 5), (day(1), 9)]);
        let series = fill_daily_counts(day(10), DASHBOARD_WINDOW_DAYS, &counts);

        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, day(4));
        assert_eq!(series[6].date, day(10));
        let values: Vec<i64> = series.iter().map(|d| d.count).collect();
        assert_eq!(values, vec![2, 0, 0, 5, 0, 0, 0]);
    }

    #[test]
    fn window_spans_month_boundary() {
        assert_eq!(window_start(day(2), 7), NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
    }
}
