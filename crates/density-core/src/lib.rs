//! Density Core
//!
//! Runs the density check over a scene: measures every displayable node,
//! emits annotations, colours records on a gradient, assesses the share of
//! dense objects and publishes the recoloured scene.
//!
//! # Core Concepts
//!
//! - [`DensityCheck`]: Validated configuration plus the phase sequence
//! - [`RunOutcome`]: Exactly one terminal state per run
//! - [`AnnotationSink`] / [`PublishSink`]: Boundaries to the hosting service
//! - [`rewrite`]: Writes materials and densities back onto the original tree
//!
//! # Example
//!
//! ```rust,ignore
//! use density_core::{DensityCheck, DensityCheckConfig, InMemoryAnnotations, InMemoryPublisher, RunContext};
//!
//! let check = DensityCheck::new(DensityCheckConfig::default().with_density_level(5_000.0))?;
//! let outcome = check.run(&mut root, &run, &mut InMemoryAnnotations::new(), &mut InMemoryPublisher::new());
//! println!("{}", outcome.message());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod annotation;
mod config;
mod error;
mod pipeline;
mod publish;
mod report;
mod rewrite;

pub use annotation::{
    annotate, emit_gradient_annotations, emit_threshold_annotations, Annotation, AnnotationLevel,
    AnnotationSink, InMemoryAnnotations, VisualOverride, DENSITY_CHECK_CATEGORY,
    DENSITY_VISUALIZATION_CATEGORY, FAIL_COLOR, PASS_COLOR,
};
pub use config::{DensityCheckConfig, DEFAULT_RECOLOR_BRANCH};
pub use error::{ConfigError, CoreError, PublishError};
pub use pipeline::{Analysis, DensityCheck, RunOutcome, SUCCESS_MESSAGE};
pub use publish::{InMemoryPublisher, PublishSink, PublishedVersion, RunContext, VersionId};
pub use report::{summary_table, AnalysisReport, Assessment, AssessmentResult, SummaryEntry};
pub use rewrite::{recolor_message, rewrite, rewrite_and_publish, PublishOutcome, RewriteStats, SkipReason};

// Analysis entry points, re-exported so callers need a single dependency
pub use density_health::{colorize, create_health_records, summarize, HealthRecord};
pub use density_scene::SceneNode;
