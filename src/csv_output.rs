//! CSV output format for per-session series
//!
//! One row per subject, session and grouping, ready for spreadsheets and
//! plotting scripts. The overall grouping is written with the group `all`;
//! undefined rates are empty fields.

use crate::series::{MetricSeries, SubjectSeries};

/// CSV formatter for cross-session series
#[derive(Debug, Default)]
pub struct SeriesCsv {
    rows: Vec<String>,
}

impl SeriesCsv {
    pub fn new() -> Self {
        Self::default()
    }

    fn header() -> &'static str {
        "subject,session,session_id,parameter,group,successes,failures,ignores,total_trials,\
         percent_correct,percent_failure,percent_ignore,discriminability"
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn rate(value: Option<f64>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    /// Append every session row of one subject's series
    pub fn add_series(&mut self, series: &SubjectSeries) {
        let parameter = series.group_by.label();
        let groups = std::iter::once(("all", &series.overall)).chain(
            series
                .groups
                .iter()
                .map(|g| (g.key.label.as_str(), &g.metrics)),
        );

        for (label, metrics) in groups {
            for index in 0..series.session_count() {
                self.rows.push(Self::format_row(series, index, parameter, label, metrics));
            }
        }
    }

    fn format_row(
        series: &SubjectSeries,
        index: usize,
        parameter: &str,
        group: &str,
        metrics: &MetricSeries,
    ) -> String {
        [
            Self::escape_field(&series.subject),
            series.session_numbers[index].to_string(),
            Self::escape_field(&series.session_ids[index]),
            parameter.to_string(),
            group.to_string(),
            metrics.successes[index].to_string(),
            metrics.failures[index].to_string(),
            metrics.ignores[index].to_string(),
            metrics.total_trials[index].to_string(),
            Self::rate(metrics.percent_correct[index]),
            Self::rate(metrics.percent_failure[index]),
            Self::rate(metrics.percent_ignore[index]),
            Self::rate(metrics.discriminability[index]),
        ]
        .join(",")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(Self::header());
        output.push('\n');

        for row in &self.rows {
            output.push_str(row);
            output.push('\n');
        }

        output
    }
}
