//! Pass/fail assessment and the analysis report

use crate::error::CoreError;
use crate::publish::RunContext;
use density_health::{DensitySummary, HealthRecord, SummaryRow};
use density_scene::NodeId;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::{self, Display, Formatter, Write as _};

/// Overall verdict of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AssessmentResult {
    Pass,
    Fail,
}

impl Display for AssessmentResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
        })
    }
}

/// Share of records whose aggregate density exceeds the threshold
///
/// Unlike the per-object annotations, this uses aggregate densities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assessment {
    pub threshold: f64,
    /// Tolerated failing share, 0..=1
    pub max_percentage: f64,
    pub record_count: usize,
    pub fail_count: usize,
    /// `fail_count / record_count`, 0 for an empty set
    pub fail_ratio: f64,
    pub result: AssessmentResult,
}

impl Assessment {
    /// Assess `records` against `threshold`
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn assess<'a>(
        records: impl IntoIterator<Item = &'a HealthRecord>,
        threshold: f64,
        max_percentage: f64,
    ) -> Self {
        let (record_count, fail_count) = records.into_iter().fold((0, 0), |(total, failing), record| {
            (total + 1, failing + usize::from(record.aggregate_density() > threshold))
        });
        let fail_ratio = if record_count == 0 {
            0.0
        } else {
            fail_count as f64 / record_count as f64
        };
        let result = if fail_ratio <= max_percentage {
            AssessmentResult::Pass
        } else {
            AssessmentResult::Fail
        };
        Self {
            threshold,
            max_percentage,
            record_count,
            fail_count,
            fail_ratio,
            result,
        }
    }

    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.result == AssessmentResult::Pass
    }

    /// e.g. `"Pass (12.50%)"`
    #[must_use]
    pub fn result_label(&self) -> String {
        format!("{} ({:.2}%)", self.result, self.fail_ratio * 100.0)
    }

    /// Reason reported when the assessment fails
    #[must_use]
    pub fn failure_reason(&self) -> String {
        format!(
            "Too many high-density objects. Allowed: {:.2}%, Found: {:.2}%.",
            self.max_percentage * 100.0,
            self.fail_ratio * 100.0
        )
    }
}

/// One `metric | value` line of the summary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub metric: &'static str,
    pub value: Value,
}

impl SummaryEntry {
    fn new(metric: &'static str, value: Value) -> Self {
        Self { metric, value }
    }
}

/// Summary table describing the analyzed version and the verdict
#[must_use]
pub fn summary_table(run: &RunContext, assessment: &Assessment) -> Vec<SummaryEntry> {
    vec![
        SummaryEntry::new("Server URL", json!(run.server_url)),
        SummaryEntry::new("Project ID", json!(run.project_id)),
        SummaryEntry::new("Version ID", json!(run.version_id)),
        SummaryEntry::new("Threshold", json!(assessment.threshold)),
        SummaryEntry::new(
            "Pass Rate Percentage",
            json!(format!("{:.2}%", assessment.max_percentage * 100.0)),
        ),
        SummaryEntry::new("Assessment Result", json!(assessment.result_label())),
    ]
}

/// Everything a run produces for external reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub summary: Vec<SummaryEntry>,
    pub statistics: Vec<SummaryRow>,
    /// Aggregate density per summarized record
    pub densities: Vec<f64>,
    /// Total bounding volume per summarized record
    pub volume_sums: Vec<f64>,
    pub assessment: Assessment,
    /// Hex colour per record
    pub colors: IndexMap<NodeId, String>,
    /// Records failing the per-representation threshold
    pub failing_ids: Vec<NodeId>,
}

impl AnalysisReport {
    /// Assemble a report
    #[must_use]
    pub fn new(
        run: &RunContext,
        summary: DensitySummary,
        assessment: Assessment,
        colors: IndexMap<NodeId, String>,
        failing_ids: Vec<NodeId>,
    ) -> Self {
        Self {
            summary: summary_table(run, &assessment),
            statistics: summary.rows,
            densities: summary.densities,
            volume_sums: summary.volume_sums,
            assessment,
            colors,
            failing_ids,
        }
    }

    /// Pretty JSON encoding
    ///
    /// # Errors
    /// Returns [`CoreError::Report`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text rendering with the two tables
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let width = self
            .summary
            .iter()
            .map(|entry| entry.metric.len())
            .chain(self.statistics.iter().map(|row| row.metric.len()))
            .max()
            .unwrap_or(0);

        out.push_str("Density Check Summary\n");
        for entry in &self.summary {
            let value = match &entry.value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            let _ = writeln!(out, "  {:width$}  {value}", entry.metric);
        }
        out.push_str("\nDensity Statistics\n");
        for row in &self.statistics {
            let _ = writeln!(out, "  {:width$}  {}", row.metric, row.value);
        }
        if !self.failing_ids.is_empty() {
            let _ = writeln!(out, "\nObjects exceeding the threshold: {}", self.failing_ids.len());
            for id in &self.failing_ids {
                let _ = writeln!(out, "  - {id}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use density_health::summarize;
    use pretty_assertions::assert_eq;

    fn record(id: &str, size: usize) -> HealthRecord {
        let mut record = HealthRecord::new(id);
        record.sizes.insert("m".into(), size);
        record.areas.insert("m".into(), 1.0);
        record.bounding_volumes.insert("m".into(), 1.0);
        record
    }

    fn eight_records(failing: usize) -> Vec<HealthRecord> {
        (0..8)
            .map(|i| record(&format!("n{i}"), if i < failing { 500 } else { 5 }))
            .collect()
    }

    #[test]
    fn one_in_eight_passes_at_twenty_percent() {
        let assessment = Assessment::assess(&eight_records(1), 100.0, 0.2);
        assert_eq!(assessment.fail_count, 1);
        assert!(assessment.passed());
        assert_eq!(assessment.result_label(), "Pass (12.50%)");
    }

    #[test]
    fn ratio_equal_to_limit_passes() {
        let assessment = Assessment::assess(&eight_records(2), 100.0, 0.25);
        assert!(assessment.passed());
    }

    #[test]
    fn too_many_fail() {
        let assessment = Assessment::assess(&eight_records(4), 100.0, 0.1);
        assert_eq!(assessment.result, AssessmentResult::Fail);
        assert_eq!(
            assessment.failure_reason(),
            "Too many high-density objects. Allowed: 10.00%, Found: 50.00%."
        );
    }

    #[test]
    fn empty_set_has_zero_ratio() {
        let assessment = Assessment::assess(&Vec::new(), 1.0, 0.0);
        assert_eq!(assessment.fail_ratio, 0.0);
        assert!(assessment.passed());
    }

    #[test]
    fn summary_table_rows() {
        let run = RunContext::new("https://example.org", "project", "version", "main");
        let assessment = Assessment::assess(&eight_records(1), 100.0, 0.2);
        let table = summary_table(&run, &assessment);
        let metrics: Vec<_> = table.iter().map(|entry| entry.metric).collect();
        assert_eq!(
            metrics,
            [
                "Server URL",
                "Project ID",
                "Version ID",
                "Threshold",
                "Pass Rate Percentage",
                "Assessment Result"
            ]
        );
        assert_eq!(table[3].value, json!(100.0));
        assert_eq!(table[4].value, json!("20.00%"));
    }

    #[test]
    fn report_renders_and_serializes() {
        let records = eight_records(1);
        let run = RunContext::new("https://example.org", "p", "v", "main");
        let report = AnalysisReport::new(
            &run,
            summarize(&records).unwrap(),
            Assessment::assess(&records, 100.0, 0.2),
            IndexMap::new(),
            vec![NodeId::from("n0")],
        );

        let text = report.render_text();
        assert!(text.contains("Assessment Result"));
        assert!(text.contains("Pass (12.50%)"));
        assert!(text.contains("  - n0"));

        let json: Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["assessment"]["result"], "Pass");
        assert_eq!(json["statistics"][0]["value"], 8);
        assert_eq!(json["densities"].as_array().unwrap().len(), 8);
    }
}
