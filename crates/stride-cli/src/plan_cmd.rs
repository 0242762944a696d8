//! `stride plan show`: render a plan's weeks as text.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use stride_core::display::{format_main_workout, split_detail_lines};
use stride_core::plan::{PlanDay, load_plan};
use stride_core::progress::{CompletionMap, Week, WeekAggregator, clamp_week_index};

/// Render one week: a heading with counts, then each day with its
/// workout lines indented under it.
pub fn render_week(week: &Week<'_>, completions: &CompletionMap) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}/{} completed)",
        week.label, week.completed, week.total
    );

    for day in week.days {
        let mark = if completions.is_done(&day.id()) { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {} {}  ({})", day.day, day.date, day.id());
        for line in format_main_workout(&day.main_workout) {
            let _ = writeln!(out, "        {line}");
        }
        render_focus(&mut out, "Plank", &day.plank_focus);
        render_focus(&mut out, "Abs", &day.abs_focus);
        render_focus(&mut out, "Lower back", &day.lower_back);
    }
    out
}

fn render_focus(out: &mut String, label: &str, value: &str) {
    let lines = split_detail_lines(value);
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "        {label}: {}", lines.join("; "));
}

/// Render the whole plan: the selected week in full (1-based, clamped to
/// the weeks that exist), or a one-line summary per week when none is
/// selected.
pub fn render_plan(
    plan: &[PlanDay],
    completions: &CompletionMap,
    aggregator: &WeekAggregator,
    week: Option<usize>,
) -> String {
    let summary = aggregator.summarize(plan, completions);
    if summary.weeks.is_empty() {
        return "No workout days found in plan.\n".to_owned();
    }

    let mut out = String::new();
    match week {
        Some(requested) => {
            let count = aggregator.week_count(plan.len());
            let index = clamp_week_index(requested.saturating_sub(1), count);
            out.push_str(&render_week(&summary.weeks[index], completions));
        }
        None => {
            for week in &summary.weeks {
                let _ = writeln!(out, "{}: {}/{}", week.label, week.completed, week.total);
            }
        }
    }
    let _ = writeln!(
        out,
        "Completed {} of {} days",
        summary.overall_completed, summary.plan_total
    );
    out
}

/// A missing or unreadable plan file shows as an empty plan.
pub fn run_plan_show(
    path: &Path,
    completions: &CompletionMap,
    aggregator: &WeekAggregator,
    week: Option<usize>,
) -> Result<()> {
    let plan = load_plan(path);
    print!("{}", render_plan(&plan, completions, aggregator, week));
    Ok(())
}
