//! Budget period boundaries and usage analytics.
//!
//! Period *k* of a budget starts at `start_date + k * interval` units, always
//! measured from the original start date so month-end anchors don't drift
//! (Jan 31, Feb 29, Mar 31, ...). A period ends the day before the next one
//! starts; `period_end` is inclusive everywhere in this crate.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};

use crate::error::{validation, Result};
use crate::models::BudgetPeriod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::Daily => "daily",
            RecurrenceType::Weekly => "weekly",
            RecurrenceType::Monthly => "monthly",
            RecurrenceType::Yearly => "yearly",
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            RecurrenceType::Daily => "day",
            RecurrenceType::Weekly => "week",
            RecurrenceType::Monthly => "month",
            RecurrenceType::Yearly => "year",
        }
    }
}

impl FromStr for RecurrenceType {
    type Err = crate::error::PocketbookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(RecurrenceType::Daily),
            "weekly" => Ok(RecurrenceType::Weekly),
            "monthly" => Ok(RecurrenceType::Monthly),
            "yearly" => Ok(RecurrenceType::Yearly),
            other => Err(validation(format!(
                "unknown recurrence type '{other}' (expected daily, weekly, monthly or yearly)"
            ))),
        }
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    kind: RecurrenceType,
    interval: u32,
}

impl Recurrence {
    pub fn new(kind: RecurrenceType, interval: u32) -> Result<Self> {
        if interval == 0 {
            return Err(validation("recurrence interval must be at least 1"));
        }
        Ok(Self { kind, interval })
    }

    pub fn kind(&self) -> RecurrenceType {
        self.kind
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Start of the `n`th period counted from `anchor`, or `None` past the
    /// representable calendar.
    pub fn nth_start(&self, anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
        let steps = n.checked_mul(self.interval)?;
        match self.kind {
            RecurrenceType::Daily => anchor.checked_add_days(Days::new(u64::from(steps))),
            RecurrenceType::Weekly => anchor.checked_add_days(Days::new(u64::from(steps) * 7)),
            RecurrenceType::Monthly => anchor.checked_add_months(Months::new(steps)),
            RecurrenceType::Yearly => anchor.checked_add_months(Months::new(steps.checked_mul(12)?)),
        }
    }

    /// "Every month", "Every 2 weeks", ...
    pub fn label(&self) -> String {
        if self.interval == 1 {
            format!("Every {}", self.kind.unit())
        } else {
            format!("Every {} {}s", self.interval, self.kind.unit())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Contiguous periods from `start_date` until the next start would pass
/// `end_date` or `horizon`, whichever comes first. The final period is
/// clamped to `end_date`.
pub fn generate_periods(
    start_date: NaiveDate,
    recurrence: Recurrence,
    end_date: Option<NaiveDate>,
    horizon: NaiveDate,
) -> Vec<PeriodBounds> {
    let limit = end_date.map_or(horizon, |end| end.min(horizon));
    let mut periods = Vec::new();
    let mut n = 0u32;

    while let Some(start) = recurrence.nth_start(start_date, n) {
        if start > limit {
            break;
        }
        let mut end = match n
            .checked_add(1)
            .and_then(|next| recurrence.nth_start(start_date, next))
        {
            Some(next_start) => next_start.pred_opt().unwrap_or(start),
            None => NaiveDate::MAX,
        };
        if let Some(last_day) = end_date {
            end = end.min(last_day);
        }
        periods.push(PeriodBounds { start, end });

        n = match n.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    periods
}

pub fn current_period(periods: &[BudgetPeriod], today: NaiveDate) -> Option<&BudgetPeriod> {
    periods
        .iter()
        .find(|p| p.period_start <= today && today <= p.period_end)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    OnTrack,
    NearLimit,
    OverBudget,
}

impl BudgetStatus {
    pub fn from_percentage(percentage_used: f64) -> Self {
        if percentage_used > 100.0 {
            BudgetStatus::OverBudget
        } else if percentage_used > 80.0 {
            BudgetStatus::NearLimit
        } else {
            BudgetStatus::OnTrack
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BudgetStatus::OnTrack => "On track",
            BudgetStatus::NearLimit => "Near limit",
            BudgetStatus::OverBudget => "Over budget",
        }
    }
}

/// Percent of the budget spent, two decimals; 0 for a non-positive budget.
pub fn percentage_used(budgeted_cents: i64, spent_cents: i64) -> f64 {
    if budgeted_cents <= 0 {
        return 0.0;
    }
    let pct = spent_cents as f64 / budgeted_cents as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

pub fn days_remaining(period_end: NaiveDate, today: NaiveDate) -> i64 {
    (period_end - today).num_days().max(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodUsage {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub budgeted_amount_cents: i64,
    pub spent_amount_cents: i64,
    /// Negative when over budget.
    pub remaining_amount_cents: i64,
    pub percentage_used: f64,
    pub days_remaining: i64,
    pub status: BudgetStatus,
}

pub fn usage(period: &BudgetPeriod, today: NaiveDate) -> PeriodUsage {
    let pct = percentage_used(period.budgeted_amount_cents, period.spent_amount_cents);
    PeriodUsage {
        period_start: period.period_start,
        period_end: period.period_end,
        budgeted_amount_cents: period.budgeted_amount_cents,
        spent_amount_cents: period.spent_amount_cents,
        remaining_amount_cents: period.budgeted_amount_cents - period.spent_amount_cents,
        percentage_used: pct,
        days_remaining: days_remaining(period.period_end, today),
        status: BudgetStatus::from_percentage(pct),
    }
}

/// Usage of every period that finished before `today`, oldest first.
pub fn history(periods: &[BudgetPeriod], today: NaiveDate) -> Vec<PeriodUsage> {
    let mut past: Vec<PeriodUsage> = periods
        .iter()
        .filter(|p| p.period_end < today)
        .map(|p| usage(p, today))
        .collect();
    past.sort_by_key(|u| u.period_start);
    past
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub total_periods: usize,
    pub over_budget_periods: usize,
    pub average_usage: f64,
    /// Sum of `spent - budgeted`; positive means overspent overall.
    pub total_variance_cents: i64,
}

pub fn summarize_history(history: &[PeriodUsage]) -> HistorySummary {
    let total_periods = history.len();
    let over_budget_periods = history
        .iter()
        .filter(|u| u.status == BudgetStatus::OverBudget)
        .count();
    let average_usage = if total_periods == 0 {
        0.0
    } else {
        history.iter().map(|u| u.percentage_used).sum::<f64>() / total_periods as f64
    };
    let total_variance_cents = history
        .iter()
        .map(|u| u.spent_amount_cents - u.budgeted_amount_cents)
        .sum();
    HistorySummary {
        total_periods,
        over_budget_periods,
        average_usage,
        total_variance_cents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn monthly(n: u32) -> Recurrence {
        Recurrence::new(RecurrenceType::Monthly, n).unwrap()
    }

    fn period(start: &str, end: &str, budgeted: i64, spent: i64) -> BudgetPeriod {
        BudgetPeriod {
            id: 0,
            budget_id: 1,
            period_start: d(start),
            period_end: d(end),
            budgeted_amount_cents: budgeted,
            spent_amount_cents: spent,
        }
    }

    #[test]
    fn test_monthly_periods_are_contiguous() {
        let periods = generate_periods(d("2024-01-01"), monthly(1), None, d("2024-12-15"));
        assert_eq!(periods.len(), 12);
        assert_eq!(periods[0], PeriodBounds { start: d("2024-01-01"), end: d("2024-01-31") });
        assert_eq!(periods[1], PeriodBounds { start: d("2024-02-01"), end: d("2024-02-29") });
        assert_eq!(periods[11].end, d("2024-12-31"));
        for pair in periods.windows(2) {
            assert_eq!(pair[0].end.succ_opt().unwrap(), pair[1].start);
        }
    }

    #[test]
    fn test_month_end_anchor_does_not_drift() {
        let periods = generate_periods(d("2024-01-31"), monthly(1), None, d("2024-04-01"));
        let starts: Vec<NaiveDate> = periods.iter().map(|p| p.start).collect();
        assert_eq!(starts, vec![d("2024-01-31"), d("2024-02-29"), d("2024-03-31")]);
        assert_eq!(periods[0].end, d("2024-02-28"));
    }

    #[test]
    fn test_biweekly_periods() {
        let every_two_weeks = Recurrence::new(RecurrenceType::Weekly, 2).unwrap();
        let periods = generate_periods(d("2024-03-04"), every_two_weeks, None, d("2024-04-01"));
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].end, d("2024-03-17"));
        assert_eq!(periods[2].start, d("2024-04-01"));
    }

    #[test]
    fn test_daily_and_yearly_periods() {
        let daily = Recurrence::new(RecurrenceType::Daily, 1).unwrap();
        let periods = generate_periods(d("2024-02-28"), daily, None, d("2024-03-01"));
        assert_eq!(periods.len(), 3);
        assert!(periods.iter().all(|p| p.start == p.end));

        let yearly = Recurrence::new(RecurrenceType::Yearly, 1).unwrap();
        let periods = generate_periods(d("2024-02-29"), yearly, None, d("2025-06-01"));
        assert_eq!(periods[0].end, d("2025-02-27"));
        assert_eq!(periods[1].start, d("2025-02-28"));
    }

    #[test]
    fn test_end_date_clamps_last_period() {
        let periods = generate_periods(
            d("2024-01-01"),
            monthly(1),
            Some(d("2024-03-15")),
            d("2030-01-01"),
        );
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[2], PeriodBounds { start: d("2024-03-01"), end: d("2024-03-15") });
    }

    #[test]
    fn test_end_before_start_yields_nothing() {
        let periods = generate_periods(
            d("2024-05-01"),
            monthly(1),
            Some(d("2024-04-01")),
            d("2030-01-01"),
        );
        assert!(periods.is_empty());
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Recurrence::new(RecurrenceType::Monthly, 0).is_err());
    }

    #[test]
    fn test_recurrence_labels() {
        assert_eq!(monthly(1).label(), "Every month");
        assert_eq!(Recurrence::new(RecurrenceType::Weekly, 2).unwrap().label(), "Every 2 weeks");
        assert_eq!("Yearly".parse::<RecurrenceType>().unwrap(), RecurrenceType::Yearly);
        assert!("fortnightly".parse::<RecurrenceType>().is_err());
    }

    #[test]
    fn test_usage_thresholds() {
        let today = d("2024-01-20");
        let on_track = usage(&period("2024-01-01", "2024-01-31", 10000, 7500), today);
        assert_eq!(on_track.percentage_used, 75.0);
        assert_eq!(on_track.status, BudgetStatus::OnTrack);
        assert_eq!(on_track.remaining_amount_cents, 2500);
        assert_eq!(on_track.days_remaining, 11);

        let near = usage(&period("2024-01-01", "2024-01-31", 10000, 8500), today);
        assert_eq!(near.status, BudgetStatus::NearLimit);

        let over = usage(&period("2024-01-01", "2024-01-31", 10000, 11000), today);
        assert_eq!(over.status, BudgetStatus::OverBudget);
        assert_eq!(over.remaining_amount_cents, -1000);
    }

    #[test]
    fn test_status_boundaries() {
        assert_eq!(BudgetStatus::from_percentage(80.0), BudgetStatus::OnTrack);
        assert_eq!(BudgetStatus::from_percentage(80.01), BudgetStatus::NearLimit);
        assert_eq!(BudgetStatus::from_percentage(100.0), BudgetStatus::NearLimit);
        assert_eq!(BudgetStatus::from_percentage(100.01), BudgetStatus::OverBudget);
    }

    #[test]
    fn test_percentage_rounding_and_zero_budget() {
        assert_eq!(percentage_used(3000, 1000), 33.33);
        assert_eq!(percentage_used(0, 500), 0.0);
        assert_eq!(percentage_used(-100, 500), 0.0);
    }

    #[test]
    fn test_days_remaining_never_negative() {
        assert_eq!(days_remaining(d("2024-01-31"), d("2024-03-01")), 0);
        assert_eq!(days_remaining(d("2024-01-31"), d("2024-01-31")), 0);
        assert_eq!(days_remaining(d("2024-01-31"), d("2024-01-30")), 1);
    }

    #[test]
    fn test_current_period_lookup() {
        let periods = vec![
            period("2024-01-01", "2024-01-31", 100, 0),
            period("2024-02-01", "2024-02-29", 100, 0),
        ];
        assert_eq!(
            current_period(&periods, d("2024-02-29")).unwrap().period_start,
            d("2024-02-01")
        );
        assert_eq!(
            current_period(&periods, d("2024-01-01")).unwrap().period_start,
            d("2024-01-01")
        );
        assert!(current_period(&periods, d("2023-12-31")).is_none());
        assert!(current_period(&periods, d("2024-03-01")).is_none());
    }

    #[test]
    fn test_history_excludes_current_and_future() {
        let periods = vec![
            period("2024-02-01", "2024-02-29", 10000, 12000),
            period("2024-01-01", "2024-01-31", 10000, 5000),
            period("2024-03-01", "2024-03-31", 10000, 100),
        ];
        let past = history(&periods, d("2024-03-10"));
        assert_eq!(past.len(), 2);
        assert_eq!(past[0].period_start, d("2024-01-01"));

        let summary = summarize_history(&past);
        assert_eq!(summary.total_periods, 2);
        assert_eq!(summary.over_budget_periods, 1);
        assert_eq!(summary.average_usage, 85.0);
        assert_eq!(summary.total_variance_cents, -3000);
    }

    #[test]
    fn test_empty_history_summary() {
        let summary = summarize_history(&[]);
        assert_eq!(summary.total_periods, 0);
        assert_eq!(summary.average_usage, 0.0);
    }
}
