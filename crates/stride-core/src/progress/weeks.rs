//! Positional week bucketing and per-week completion counts.
//!
//! Week `k` holds the days at indices `[n*(k-1), n*k)` of the plan, where
//! `n` is the configured days per week. Calendar dates play no part.

use std::num::NonZeroUsize;

use serde::Serialize;

use super::completions::CompletionMap;
use crate::plan::PlanDay;

/// Days per week used when nothing else is configured.
pub const DEFAULT_DAYS_PER_WEEK: usize = 7;

const DEFAULT_WEEK: NonZeroUsize = NonZeroUsize::new(DEFAULT_DAYS_PER_WEEK).unwrap();

/// A run of consecutive plan days with their completion counts.
///
/// Borrowed from the plan it was built from and rebuilt whenever the plan
/// or the completion map changes.
#[derive(Debug, Clone, Serialize)]
pub struct Week<'a> {
    /// 1-based week number.
    pub number: usize,
    /// `"week-{number}"`.
    pub id: String,
    /// `"Week {number}"`.
    pub label: String,
    pub completed: usize,
    pub total: usize,
    pub days: &'a [PlanDay],
}

/// Weeks of a plan plus overall counts.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary<'a> {
    pub weeks: Vec<Week<'a>>,
    /// `true` entries across the whole completion map, including entries
    /// for days that are not part of this plan.
    pub overall_completed: usize,
    /// Number of days in the plan.
    pub plan_total: usize,
}

/// Groups plan days into fixed-size weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekAggregator {
    days_per_week: NonZeroUsize,
}

impl Default for WeekAggregator {
    fn default() -> Self {
        Self {
            days_per_week: DEFAULT_WEEK,
        }
    }
}

impl WeekAggregator {
    pub fn new(days_per_week: NonZeroUsize) -> Self {
        Self { days_per_week }
    }

    /// Number of weeks a plan of `plan_len` days spans.
    pub fn week_count(&self, plan_len: usize) -> usize {
        plan_len.div_ceil(self.days_per_week.get())
    }

    /// Partition the plan into weeks and count completed days in each.
    pub fn weeks<'a>(&self, plan: &'a [PlanDay], completions: &CompletionMap) -> Vec<Week<'a>> {
        plan.chunks(self.days_per_week.get())
            .enumerate()
            .map(|(index, days)| {
                let number = index + 1;
                let completed = days
                    .iter()
                    .filter(|day| completions.is_done(&day.id()))
                    .count();
                Week {
                    number,
                    id: format!("week-{number}"),
                    label: format!("Week {number}"),
                    completed,
                    total: days.len(),
                    days,
                }
            })
            .collect()
    }

    /// Weeks plus overall counts.
    ///
    /// `overall_completed` counts every `true` entry in `completions`, not
    /// only those matching a plan day. A stale entry left from an older
    /// plan file is still counted.
    pub fn summarize<'a>(
        &self,
        plan: &'a [PlanDay],
        completions: &CompletionMap,
    ) -> ProgressSummary<'a> {
        ProgressSummary {
            weeks: self.weeks(plan, completions),
            overall_completed: completions.done_count(),
            plan_total: plan.len(),
        }
    }
}

/// Clamp a selected zero-based week index to the weeks that exist.
///
/// Returns 0 when there are no weeks.
pub fn clamp_week_index(requested: usize, week_count: usize) -> usize {
    requested.min(week_count.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_of(len: usize) -> Vec<PlanDay> {
        (0..len)
            .map(|i| PlanDay {
                date: format!("2026-01-{:02}", i + 1),
                day: format!("D{i}"),
                ..PlanDay::default()
            })
            .collect()
    }

    #[test]
    fn sixteen_days_make_three_weeks() {
        let plan = plan_of(16);
        let weeks = WeekAggregator::default().weeks(&plan, &CompletionMap::new());
        let totals: Vec<usize> = weeks.iter().map(|w| w.total).collect();
        assert_eq!(totals, vec![7, 7, 2]);
    }

    #[test]
    fn weeks_are_labelled_from_one() {
        let plan = plan_of(8);
        let weeks = WeekAggregator::default().weeks(&plan, &CompletionMap::new());
        assert_eq!(weeks[0].id, "week-1");
        assert_eq!(weeks[0].label, "Week 1");
        assert_eq!(weeks[1].id, "week-2");
        assert_eq!(weeks[1].label, "Week 2");
        assert_eq!(weeks[1].number, 2);
    }

    #[test]
    fn bucketing_is_positional() {
        let plan = plan_of(10);
        let weeks = WeekAggregator::default().weeks(&plan, &CompletionMap::new());
        assert_eq!(weeks[1].days[0], plan[7]);
        assert_eq!(weeks[1].days.len(), 3);
    }

    #[test]
    fn counts_completed_days_per_week() {
        let plan = plan_of(7);
        let mut completions = CompletionMap::new();
        for day in &plan[..3] {
            completions.set(day.id(), true);
        }
        completions.set(plan[4].id(), false);

        let weeks = WeekAggregator::default().weeks(&plan, &completions);
        assert_eq!(weeks[0].completed, 3);
        assert_eq!(weeks[0].total, 7);
    }

    #[test]
    fn completed_never_exceeds_total() {
        let plan = plan_of(9);
        let completions: CompletionMap = plan.iter().map(|d| (d.id(), true)).collect();
        for week in WeekAggregator::default().weeks(&plan, &completions) {
            assert!(week.completed <= week.total);
        }
    }

    #[test]
    fn custom_week_size() {
        let plan = plan_of(7);
        let aggregator = WeekAggregator::new(NonZeroUsize::new(3).unwrap());
        let totals: Vec<usize> = aggregator
            .weeks(&plan, &CompletionMap::new())
            .iter()
            .map(|w| w.total)
            .collect();
        assert_eq!(totals, vec![3, 3, 1]);
        assert_eq!(aggregator.week_count(7), 3);
    }

    #[test]
    fn empty_plan_has_no_weeks() {
        let summary = WeekAggregator::default().summarize(&[], &CompletionMap::new());
        assert!(summary.weeks.is_empty());
        assert_eq!(summary.plan_total, 0);
        assert_eq!(summary.overall_completed, 0);
    }

    #[test]
    fn overall_count_includes_entries_outside_the_plan() {
        let plan = plan_of(2);
        let mut completions = CompletionMap::new();
        completions.set(plan[0].id(), true);
        completions.set("2025-12-31-Wed", true);

        let summary = WeekAggregator::default().summarize(&plan, &completions);
        assert_eq!(summary.weeks[0].completed, 1);
        assert_eq!(summary.overall_completed, 2);
        assert_eq!(summary.plan_total, 2);
    }

    #[test]
    fn clamp_week_index_limits_to_last_week() {
        assert_eq!(clamp_week_index(5, 3), 2);
        assert_eq!(clamp_week_index(1, 3), 1);
        assert_eq!(clamp_week_index(4, 0), 0);
    }
}
