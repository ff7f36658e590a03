//! Group statistics across subjects
//!
//! Compares subjects on the stimulus values all of them were tested on.
//! A value missing from any subject's pooled stats is left out entirely so
//! every reported mean covers the same subjects. The reference condition and
//! the nth-presentation curve are summarized the same way.

use crate::pipeline::SubjectReport;
use crate::summary::{GroupBy, GroupKey, GroupStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean, sample SD and standard error of one metric across subjects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub mean: Option<f64>,
    /// Sample SD (N-1); `None` with fewer than two subjects
    pub std_dev: Option<f64>,
    pub sem: Option<f64>,
}

impl Spread {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: None,
                std_dev: None,
                sem: None,
            };
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() < 2 {
            None
        } else {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            Some(variance.sqrt())
        };

        Self {
            mean: Some(mean),
            std_dev,
            sem: std_dev.map(|sd| sd / n.sqrt()),
        }
    }
}

/// Cross-subject stats for one stimulus value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSubjectGroup {
    pub key: GroupKey,
    pub percent_correct: Spread,
    pub total_trials: Spread,
}

/// Cross-subject stats for the reference condition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossSubjectReference {
    /// Over subjects with at least one scored reference trial
    pub percent_correct: Spread,
    pub total_trials: Spread,
}

/// Percent correct on the nth showing, across subjects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresentationSpread {
    /// 1-based
    pub presentation: usize,
    pub percent_correct: Spread,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSubjectSummary {
    pub group_by: GroupBy,
    /// Subjects contributing to every group
    pub subjects: Vec<String>,
    pub groups: Vec<CrossSubjectGroup>,
    /// `None` unless the subjects were scored on a reference condition
    pub reference: Option<CrossSubjectReference>,
    /// Up to the fewest presentations any subject reached
    pub presentation: Vec<PresentationSpread>,
}

impl CrossSubjectSummary {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Summarize the values shared by every subject
pub fn summarize_subjects(reports: &[SubjectReport], group_by: GroupBy) -> CrossSubjectSummary {
    // key -> (percent correct, total trials), one entry per subject that has it
    let mut per_key: BTreeMap<GroupKey, (Vec<f64>, Vec<f64>)> = BTreeMap::new();

    for report in reports {
        for group in &report.pooled_groups {
            let (Some(key), Some(pct)) = (&group.key, group.percent_correct) else {
                continue;
            };
            let entry = per_key.entry(key.clone()).or_default();
            entry.0.push(pct);
            entry.1.push(group.total_trials as f64);
        }
    }

    let mut groups: Vec<CrossSubjectGroup> = per_key
        .into_iter()
        .filter(|(_, (pct, _))| pct.len() == reports.len())
        .map(|(key, (pct, totals))| CrossSubjectGroup {
            key,
            percent_correct: Spread::from_values(&pct),
            total_trials: Spread::from_values(&totals),
        })
        .collect();
    if group_by.descending() {
        groups.reverse();
    }

    tracing::debug!(
        "{} values shared by all {} subjects",
        groups.len(),
        reports.len()
    );

    CrossSubjectSummary {
        group_by,
        subjects: reports.iter().map(|r| r.subject.clone()).collect(),
        groups,
        reference: summarize_reference(reports),
        presentation: summarize_presentation(reports),
    }
}

fn summarize_reference(reports: &[SubjectReport]) -> Option<CrossSubjectReference> {
    let scored: Vec<&GroupStats> = reports.iter().filter_map(|r| r.reference.as_ref()).collect();
    if scored.is_empty() {
        return None;
    }

    let percent_correct: Vec<f64> = scored.iter().filter_map(|s| s.percent_correct).collect();
    let totals: Vec<f64> = scored.iter().map(|s| s.total_trials as f64).collect();

    Some(CrossSubjectReference {
        percent_correct: Spread::from_values(&percent_correct),
        total_trials: Spread::from_values(&totals),
    })
}

fn summarize_presentation(reports: &[SubjectReport]) -> Vec<PresentationSpread> {
    let depth = reports
        .iter()
        .map(|r| r.presentation.len())
        .min()
        .unwrap_or(0);

    (0..depth)
        .map(|n| {
            let values: Vec<f64> = reports
                .iter()
                .filter_map(|r| r.presentation[n].percent_correct)
                .collect();
            PresentationSpread {
                presentation: n + 1,
                percent_correct: Spread::from_values(&values),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::PresentationStat;
    use crate::series::build_series;
    use crate::summary::OutcomeCounts;

    fn report(subject: &str, groups: &[(f64, OutcomeCounts)]) -> SubjectReport {
        let pooled_groups: Vec<GroupStats> = groups
            .iter()
            .map(|(value, counts)| GroupStats::from_counts(Some(GroupKey::new(*value)), *counts))
            .collect();
        SubjectReport {
            subject: subject.to_string(),
            sessions: Vec::new(),
            series: build_series(subject, &[], GroupBy::Rotation),
            bins: Vec::new(),
            pooled: GroupStats::empty(None),
            pooled_groups,
            reference: None,
            range_progress: Vec::new(),
            presentation: Vec::new(),
        }
    }

    fn presentation(percent_correct: &[Option<f64>]) -> Vec<PresentationStat> {
        percent_correct
            .iter()
            .enumerate()
            .map(|(i, pct)| PresentationStat {
                presentation: i + 1,
                counts: OutcomeCounts::default(),
                percent_correct: *pct,
            })
            .collect()
    }

    #[test]
    fn test_spread() {
        let spread = Spread::from_values(&[50.0, 70.0]);
        assert_eq!(spread.mean, Some(60.0));
        let sd = spread.std_dev.unwrap();
        assert!((sd - 200.0_f64.sqrt()).abs() < 1e-9);
        assert!((spread.sem.unwrap() - 10.0).abs() < 1e-9);

        let single = Spread::from_values(&[42.0]);
        assert_eq!(single.mean, Some(42.0));
        assert_eq!(single.std_dev, None);
        assert_eq!(single.sem, None);

        assert_eq!(Spread::from_values(&[]).mean, None);
    }

    #[test]
    fn test_only_shared_keys_reported() {
        let reports = vec![
            report(
                "V1",
                &[(0.0, OutcomeCounts::new(5, 5, 0)), (15.0, OutcomeCounts::new(3, 1, 0))],
            ),
            report("V2", &[(0.0, OutcomeCounts::new(7, 3, 0))]),
        ];

        let summary = summarize_subjects(&reports, GroupBy::Rotation);

        assert_eq!(summary.subjects, vec!["V1", "V2"]);
        assert_eq!(summary.groups.len(), 1);
        let group = &summary.groups[0];
        assert_eq!(group.key, GroupKey::new(0.0));
        assert_eq!(group.percent_correct.mean, Some(60.0));
        assert_eq!(group.total_trials.mean, Some(10.0));
        assert_eq!(group.total_trials.std_dev, Some(0.0));
    }

    #[test]
    fn test_size_groups_descending() {
        let reports = vec![report(
            "V1",
            &[(30.0, OutcomeCounts::new(1, 0, 0)), (40.0, OutcomeCounts::new(1, 0, 0))],
        )];

        let summary = summarize_subjects(&reports, GroupBy::Size);
        assert_eq!(summary.groups[0].key, GroupKey::new(40.0));
    }

    #[test]
    fn test_no_subjects() {
        let summary = summarize_subjects(&[], GroupBy::Rotation);
        assert!(summary.is_empty());
        assert!(summary.subjects.is_empty());
        assert!(summary.reference.is_none());
        assert!(summary.presentation.is_empty());
    }

    #[test]
    fn test_reference_across_subjects() {
        let mut v1 = report("V1", &[]);
        v1.reference = Some(GroupStats::from_counts(None, OutcomeCounts::new(8, 2, 0)));
        let mut v2 = report("V2", &[]);
        v2.reference = Some(GroupStats::from_counts(None, OutcomeCounts::new(6, 4, 2)));

        let summary = summarize_subjects(&[v1, v2], GroupBy::Rotation);

        let reference = summary.reference.unwrap();
        assert_eq!(reference.percent_correct.mean, Some(65.0));
        assert!((reference.percent_correct.std_dev.unwrap() - 450.0_f64.sqrt()).abs() < 1e-9);
        assert!((reference.percent_correct.sem.unwrap() - 15.0).abs() < 1e-9);
        assert_eq!(reference.total_trials.mean, Some(11.0));
    }

    #[test]
    fn test_reference_without_trials_excluded_from_percent() {
        let mut v1 = report("V1", &[]);
        v1.reference = Some(GroupStats::from_counts(None, OutcomeCounts::new(3, 1, 0)));
        let mut v2 = report("V2", &[]);
        v2.reference = Some(GroupStats::empty(None));

        let reference = summarize_subjects(&[v1, v2], GroupBy::Rotation)
            .reference
            .unwrap();

        assert_eq!(reference.percent_correct.mean, Some(75.0));
        assert_eq!(reference.percent_correct.std_dev, None);
        assert_eq!(reference.total_trials.mean, Some(2.0));
    }

    #[test]
    fn test_presentation_across_subjects() {
        let mut v1 = report("V1", &[]);
        v1.presentation = presentation(&[Some(50.0), Some(60.0), Some(90.0)]);
        let mut v2 = report("V2", &[]);
        v2.presentation = presentation(&[Some(70.0), Some(80.0)]);

        let summary = summarize_subjects(&[v1, v2], GroupBy::Rotation);

        assert_eq!(summary.presentation.len(), 2);
        let first = summary.presentation[0];
        assert_eq!(first.presentation, 1);
        assert_eq!(first.percent_correct.mean, Some(60.0));
        assert!((first.percent_correct.sem.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(summary.presentation[1].percent_correct.mean, Some(70.0));
    }

    #[test]
    fn test_presentation_empty_when_any_subject_has_none() {
        let mut v1 = report("V1", &[]);
        v1.presentation = presentation(&[Some(50.0)]);
        let v2 = report("V2", &[]);

        let summary = summarize_subjects(&[v1, v2], GroupBy::Rotation);
        assert!(summary.presentation.is_empty());
    }
}
