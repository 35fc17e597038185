//! Threshold classification
//!
//! A record fails when any single representation density exceeds the
//! threshold. The aggregate only appears in the passing message.

use crate::record::HealthRecord;
use density_scene::NodeId;
use serde::Serialize;

/// Outcome for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// No representation exceeds the threshold
    Pass {
        /// Total size over total area
        aggregate_density: f64,
    },
    /// Some representations exceed the threshold
    Fail {
        /// Number of exceeding representations
        exceeding: usize,
    },
}

impl Verdict {
    /// Check if the record failed
    #[inline]
    #[must_use]
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

/// Verdict plus the message describing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Classified record
    pub id: NodeId,
    /// Pass or fail
    pub verdict: Verdict,
    /// Annotation text
    pub message: String,
}

/// Both buckets of a classification pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThresholdReport {
    /// Threshold the records were held against
    pub threshold: f64,
    /// One entry per record, in record order
    pub classifications: Vec<Classification>,
}

impl ThresholdReport {
    /// Ids of failing records, in record order
    pub fn failing_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.bucket(true)
    }

    /// Ids of passing records, in record order
    pub fn passing_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.bucket(false)
    }

    /// Failing records
    pub fn failing(&self) -> impl Iterator<Item = &Classification> {
        self.classifications.iter().filter(|c| c.verdict.is_fail())
    }

    /// Passing records
    pub fn passing(&self) -> impl Iterator<Item = &Classification> {
        self.classifications.iter().filter(|c| !c.verdict.is_fail())
    }

    fn bucket(&self, failing: bool) -> impl Iterator<Item = &NodeId> {
        self.classifications
            .iter()
            .filter(move |c| c.verdict.is_fail() == failing)
            .map(|c| &c.id)
    }
}

/// Failure message with singular/plural agreement
#[must_use]
pub fn failure_message(exceeding: usize, threshold: f64) -> String {
    let (noun, verb) = if exceeding == 1 {
        ("mesh", "has")
    } else {
        ("meshes", "have")
    };
    format!(
        "{exceeding} {noun} of this object {verb} a density, that exceeds the threshold of {}.",
        float_repr(threshold)
    )
}

/// Informational message for a passing record
#[must_use]
pub fn pass_message(aggregate_density: f64) -> String {
    format!("This object has an acceptable density of {}.", float_repr(aggregate_density))
}

/// Shortest round-trip rendering that always reads as a float
///
/// Integral values keep a `.0`; exponents carry a sign and at least two
/// digits (`1e-05`, `1.5e+16`).
#[must_use]
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = exponent
                .strip_prefix('-')
                .map_or(("+", exponent), |digits| ("-", digits));
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

/// Classify one record
#[must_use]
pub fn classify(record: &HealthRecord, threshold: f64) -> Classification {
    let exceeding = record
        .densities()
        .values()
        .filter(|&&density| density > threshold)
        .count();
    let (verdict, message) = if exceeding > 0 {
        (Verdict::Fail { exceeding }, failure_message(exceeding, threshold))
    } else {
        let aggregate_density = record.aggregate_density();
        (Verdict::Pass { aggregate_density }, pass_message(aggregate_density))
    };
    Classification {
        id: record.id.clone(),
        verdict,
        message,
    }
}

/// Classify every record
pub fn classify_all<'a>(
    records: impl IntoIterator<Item = &'a HealthRecord>,
    threshold: f64,
) -> ThresholdReport {
    ThresholdReport {
        threshold,
        classifications: records
            .into_iter()
            .map(|record| classify(record, threshold))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, entries: &[(usize, f64)]) -> HealthRecord {
        let mut record = HealthRecord::new(id);
        for (index, &(size, area)) in entries.iter().enumerate() {
            let key = format!("{id}-{index}");
            record.sizes.insert(key.clone().into(), size);
            record.areas.insert(key.into(), area);
        }
        record
    }

    #[test]
    fn plural_message() {
        assert_eq!(
            failure_message(3, 10.0),
            "3 meshes of this object have a density, that exceeds the threshold of 10.0."
        );
    }

    #[test]
    fn singular_message() {
        assert_eq!(
            failure_message(1, 2.5),
            "1 mesh of this object has a density, that exceeds the threshold of 2.5."
        );
    }

    #[test]
    fn float_repr_forms() {
        assert_eq!(float_repr(10.0), "10.0");
        assert_eq!(float_repr(100_000.0), "100000.0");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(0.000_01), "1e-05");
        assert_eq!(float_repr(1.5e16), "1.5e+16");
        assert_eq!(float_repr(1.234e-123), "1.234e-123");
        assert_eq!(float_repr(f64::INFINITY), "inf");
        assert_eq!(float_repr(f64::NAN), "nan");
    }

    #[test]
    fn any_representation_fails_record() {
        // aggregate is 1010 / 11 < 200 but one mesh exceeds
        let classification = classify(&record("a", &[(1000, 1.0), (10, 10.0)]), 200.0);
        assert_eq!(classification.verdict, Verdict::Fail { exceeding: 1 });
    }

    #[test]
    fn equal_to_threshold_passes() {
        let classification = classify(&record("a", &[(100, 1.0)]), 100.0);
        assert_eq!(
            classification.verdict,
            Verdict::Pass {
                aggregate_density: 100.0
            }
        );
        assert_eq!(classification.message, "This object has an acceptable density of 100.0.");
    }

    #[test]
    fn buckets_are_disjoint_and_ordered() {
        let records = [
            record("a", &[(10, 1.0)]),
            record("b", &[(1000, 1.0), (1000, 1.0), (1000, 1.0)]),
            record("c", &[]),
        ];
        let report = classify_all(&records, 50.0);
        let failing: Vec<_> = report.failing_ids().map(NodeId::as_str).collect();
        let passing: Vec<_> = report.passing_ids().map(NodeId::as_str).collect();
        assert_eq!(failing, ["b"]);
        assert_eq!(passing, ["a", "c"]);
        assert!(report.failing().all(|c| c.message.starts_with("3 meshes")));
    }
}
