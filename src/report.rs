//! Plain-text report
//!
//! Fixed-width numeric columns with a dashed rule under each header. The
//! pooled stimulus table ends with a total line.

use crate::bootstrap::BinReport;
use crate::coordinator::AnalysisRun;
use crate::cross_subject::{CrossSubjectSummary, Spread};
use crate::pipeline::SubjectReport;
use crate::summary::GroupStats;
use std::fmt;

const SESSION_RULE: &str = "------- -------------------- ------- -------- -------- -------- --------";
const GROUP_RULE: &str = "---------- ------- -------- -------- -------- --------";

/// Render a finished run as a human-readable report
pub fn render_text(run: &AnalysisRun) -> String {
    TextReport(run).to_string()
}

/// Display adapter for [`render_text`]
pub struct TextReport<'a>(pub &'a AnalysisRun);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.0;
        if run.outcomes.is_empty() {
            return writeln!(f, "No subjects analyzed.");
        }

        for report in run.reports() {
            write_subject(f, report)?;
            writeln!(f)?;
        }

        if run.reports().count() > 1 {
            write_cross_subject(f, &run.cross_subject)?;
            writeln!(f)?;
        }

        let failures: Vec<_> = run.failures().collect();
        if !failures.is_empty() {
            writeln!(f, "=== Failed subjects ({}) ===", failures.len())?;
            for failure in failures {
                writeln!(f, "{}: {}: {}", failure.subject, failure.kind, failure.message)?;
            }
        }

        Ok(())
    }
}

fn opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

fn write_group_row(f: &mut fmt::Formatter<'_>, label: &str, stats: &GroupStats) -> fmt::Result {
    writeln!(
        f,
        "{:<10} {:>7} {:>8} {:>8} {:>8} {:>8}",
        label,
        stats.total_trials,
        opt(stats.percent_correct, 2),
        opt(stats.percent_failure, 2),
        opt(stats.percent_ignore, 2),
        opt(stats.discriminability, 3)
    )
}

fn write_subject(f: &mut fmt::Formatter<'_>, report: &SubjectReport) -> fmt::Result {
    writeln!(
        f,
        "=== Subject {} ({} sessions, {} trials) ===",
        report.subject,
        report.session_count(),
        report.total_trials()
    )?;

    if report.sessions.is_empty() {
        writeln!(f, "No sessions.")?;
        return Ok(());
    }

    writeln!(f, "session session_id            trials %correct    %fail  %ignore  d-index")?;
    writeln!(f, "{}", SESSION_RULE)?;
    for session in &report.sessions {
        let overall = &session.overall;
        writeln!(
            f,
            "{:>7} {:<20} {:>7} {:>8} {:>8} {:>8} {:>8}",
            session.session_number,
            session.session_id,
            overall.total_trials,
            opt(overall.percent_correct, 2),
            opt(overall.percent_failure, 2),
            opt(overall.percent_ignore, 2),
            opt(overall.discriminability, 3)
        )?;
        if session.excluded_trials > 0 {
            writeln!(
                f,
                "        ({} trials with unrecognized outcomes excluded)",
                session.excluded_trials
            )?;
        }
    }

    let group_by = report.series.group_by.label();
    writeln!(f)?;
    writeln!(f, "{:<10}  trials %correct    %fail  %ignore  d-index", group_by)?;
    writeln!(f, "{}", GROUP_RULE)?;
    for group in &report.pooled_groups {
        let label = group.key.as_ref().map_or("-", |k| k.label.as_str());
        write_group_row(f, label, group)?;
    }
    writeln!(f, "{}", GROUP_RULE)?;
    write_group_row(f, "total", &report.pooled)?;

    if !report.bins.is_empty() {
        writeln!(f)?;
        write_bins(f, &report.bins)?;
    }

    let centred: u64 = report.series.centered_trials.iter().sum();
    if centred > 0 {
        writeln!(f)?;
        writeln!(f, "Centred stimulus trials: {}", centred)?;
    }

    if let Some(reference) = &report.reference {
        writeln!(
            f,
            "Reference condition: {} %correct over {} trials",
            opt(reference.percent_correct, 2),
            reference.total_trials
        )?;
    }

    if let Some(last) = report.range_progress.last() {
        writeln!(
            f,
            "Range tested in the last {} trials: {} to {}",
            last.cumulative_trials, last.min, last.max
        )?;
    }

    Ok(())
}

fn write_bins(f: &mut fmt::Formatter<'_>, bins: &[BinReport]) -> fmt::Result {
    writeln!(f, "Bootstrap discriminability by session bin:")?;
    for bin in bins {
        writeln!(
            f,
            "  bin {} (sessions {}-{})",
            bin.bin_number, bin.first_session, bin.last_session
        )?;
        for stat in &bin.stats {
            writeln!(
                f,
                "    {:<10} observed {:>7}  sd {:>7}  ({} trials)",
                stat.key.label,
                opt(stat.observed, 3),
                opt(stat.std_dev, 3),
                stat.counts.total()
            )?;
        }
    }
    Ok(())
}

fn write_cross_subject(f: &mut fmt::Formatter<'_>, summary: &CrossSubjectSummary) -> fmt::Result {
    writeln!(
        f,
        "=== Across {} subjects (values tested on every subject) ===",
        summary.subjects.len()
    )?;
    if summary.is_empty() {
        writeln!(f, "No values shared by every subject.")?;
    } else {
        writeln!(f, "{:<10}  mean %c       sd      sem  mean n", summary.group_by.label())?;
        for group in &summary.groups {
            write_spread_row(
                f,
                &group.key.label,
                &group.percent_correct,
                Some(&group.total_trials),
            )?;
        }
    }

    if let Some(reference) = &summary.reference {
        writeln!(f)?;
        writeln!(f, "reference    mean %c       sd      sem  mean n")?;
        write_spread_row(
            f,
            "",
            &reference.percent_correct,
            Some(&reference.total_trials),
        )?;
    }

    if !summary.presentation.is_empty() {
        writeln!(f)?;
        writeln!(f, "nth shown   mean %c       sd      sem")?;
        for point in &summary.presentation {
            write_spread_row(f, &point.presentation.to_string(), &point.percent_correct, None)?;
        }
    }
    Ok(())
}

fn write_spread_row(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    percent_correct: &Spread,
    trials: Option<&Spread>,
) -> fmt::Result {
    write!(
        f,
        "{:<10} {:>8} {:>8} {:>8}",
        label,
        opt(percent_correct.mean, 2),
        opt(percent_correct.std_dev, 2),
        opt(percent_correct.sem, 2)
    )?;
    match trials {
        Some(trials) => writeln!(f, " {:>7}", opt(trials.mean, 1)),
        None => writeln!(f),
    }
}
