//! The density check run
//!
//! Phases run strictly in order: flatten, records, threshold annotations,
//! colorization, statistics, assessment, rewrite and publish. Colorization
//! needs the whole record set, so nothing is rewritten before every
//! record is measured.

use crate::annotation::{annotate, emit_gradient_annotations, AnnotationSink};
use crate::config::DensityCheckConfig;
use crate::error::{ConfigError, CoreError};
use crate::publish::{PublishSink, RunContext};
use crate::report::{AnalysisReport, Assessment};
use crate::rewrite::{rewrite_and_publish, PublishOutcome};
use density_health::{
    colorize, create_health_records, summarize, GradientOutput, HealthRecord,
    ThresholdReport,
};
use density_scene::{displayable_nodes, NodeId, SceneNode};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, info_span, warn};

/// Message of a successful run
pub const SUCCESS_MESSAGE: &str = "Analysis complete. High-density objects within acceptable limits.";

/// Terminal state of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded {
        message: String,
        report: Box<AnalysisReport>,
        publish: PublishOutcome,
    },
    Failed {
        reason: String,
        /// Absent when the run failed before a report existed
        report: Option<Box<AnalysisReport>>,
        publish: Option<PublishOutcome>,
    },
}

impl RunOutcome {
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Success message or failure reason
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Succeeded { message, .. } => message,
            Self::Failed { reason, .. } => reason,
        }
    }

    #[must_use]
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Succeeded { report, .. } => Some(report),
            Self::Failed { report, .. } => report.as_deref(),
        }
    }

    #[must_use]
    pub fn publish(&self) -> Option<&PublishOutcome> {
        match self {
            Self::Succeeded { publish, .. } => Some(publish),
            Self::Failed { publish, .. } => publish.as_ref(),
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            report: None,
            publish: None,
        }
    }
}

/// Results of the read-only analysis phases
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: IndexMap<NodeId, HealthRecord>,
    pub threshold: ThresholdReport,
    pub gradient: GradientOutput,
    pub report: AnalysisReport,
}

/// Density check with a validated configuration
#[derive(Debug, Clone)]
pub struct DensityCheck {
    config: DensityCheckConfig,
}

impl DensityCheck {
    /// Create a check
    ///
    /// # Errors
    /// Returns the first invalid configuration field.
    pub fn new(config: DensityCheckConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DensityCheckConfig {
        &self.config
    }

    /// Measure, annotate, colorize and assess without touching the scene
    ///
    /// # Errors
    /// Returns [`CoreError::NoDisplayableNodes`] when nothing can be
    /// analyzed.
    pub fn analyze(
        &self,
        root: &SceneNode,
        run: &RunContext,
        annotations: &mut impl AnnotationSink,
    ) -> Result<Analysis, CoreError> {
        let threshold = self.config.density_level;

        let mut nodes = displayable_nodes(root).peekable();
        if nodes.peek().is_none() {
            return Err(CoreError::NoDisplayableNodes);
        }
        let mut records = create_health_records(nodes);
        info!(records = records.len(), "health records created");

        let classification = annotate(records.values(), threshold, annotations);

        let gradient = colorize(&mut records);
        emit_gradient_annotations(
            records.values().filter_map(|record| {
                gradient
                    .colors
                    .get(&record.id)
                    .map(|color| (&record.id, record.aggregate_density(), color.as_str()))
            }),
            annotations,
        );

        let summary = summarize(records.values())?;
        let assessment = Assessment::assess(
            records.values(),
            threshold,
            self.config.max_percentage_high_density_objects,
        );
        info!(
            fail_count = assessment.fail_count,
            fail_ratio = assessment.fail_ratio,
            result = %assessment.result,
            "density assessed"
        );

        let report = AnalysisReport::new(
            run,
            summary,
            assessment,
            gradient.colors.clone(),
            classification.failing_ids().cloned().collect(),
        );
        Ok(Analysis {
            records,
            threshold: classification,
            gradient,
            report,
        })
    }

    /// Run every phase and conclude with exactly one outcome
    pub fn run(
        &self,
        root: &mut SceneNode,
        run: &RunContext,
        annotations: &mut impl AnnotationSink,
        publisher: &mut impl PublishSink,
    ) -> RunOutcome {
        let _span = info_span!("density_check", project = %run.project_id, version = %run.version_id)
            .entered();

        let analysis = match self.analyze(root, run, annotations) {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(error = %err, "analysis failed");
                return RunOutcome::failed(err.to_string());
            }
        };
        let Analysis {
            records, report, ..
        } = analysis;

        let publish = match rewrite_and_publish(root, &records, run, &self.config, publisher) {
            Ok(publish) => publish,
            Err(err) => {
                warn!(error = %err, "rewrite failed");
                return RunOutcome::Failed {
                    reason: err.to_string(),
                    report: Some(Box::new(report)),
                    publish: None,
                };
            }
        };

        if report.assessment.passed() {
            info!("density check passed");
            RunOutcome::Succeeded {
                message: SUCCESS_MESSAGE.to_string(),
                report: Box::new(report),
                publish,
            }
        } else {
            let reason = report.assessment.failure_reason();
            info!(%reason, "density check failed");
            RunOutcome::Failed {
                reason,
                report: Some(Box::new(report)),
                publish: Some(publish),
            }
        }
    }
}
