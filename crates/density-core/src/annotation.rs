//! Annotations attached to scene objects
//!
//! The pipeline emits annotations through [`AnnotationSink`]; it never
//! reads them back. [`InMemoryAnnotations`] collects them for callers
//! that render or forward them later.

use density_health::{classify_all, HealthRecord, ThresholdReport, Verdict};
use density_scene::NodeId;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Category of the threshold pass
pub const DENSITY_CHECK_CATEGORY: &str = "Density Check";

/// Category of the gradient pass
pub const DENSITY_VISUALIZATION_CATEGORY: &str = "Density Visualization";

/// Highlight for failing objects
pub const FAIL_COLOR: &str = "#ff0000";

/// Highlight for passing objects
pub const PASS_COLOR: &str = "#00ff00";

/// Severity of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    /// Informational
    Info,
    /// Check failure
    Error,
}

/// Viewer override for annotated objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisualOverride {
    /// `#rrggbb`
    pub color: String,
}

impl VisualOverride {
    #[inline]
    #[must_use]
    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
        }
    }
}

/// One annotation on one or more objects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub level: AnnotationLevel,
    pub category: String,
    pub object_ids: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_override: Option<VisualOverride>,
}

impl Annotation {
    /// Annotation with no message, metadata or override
    #[must_use]
    pub fn new(
        level: AnnotationLevel,
        category: impl Into<String>,
        object_ids: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        Self {
            level,
            category: category.into(),
            object_ids: object_ids.into_iter().collect(),
            message: None,
            metadata: Map::new(),
            visual_override: None,
        }
    }

    /// With message
    #[inline]
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// With metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// With colour override
    #[inline]
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.visual_override = Some(VisualOverride::color(color));
        self
    }
}

/// Receiver of annotations
pub trait AnnotationSink {
    /// Record an annotation
    fn attach(&mut self, annotation: Annotation);
}

impl<S: AnnotationSink + ?Sized> AnnotationSink for &mut S {
    fn attach(&mut self, annotation: Annotation) {
        (**self).attach(annotation);
    }
}

/// Sink that keeps annotations in memory
#[derive(Debug, Clone, Default, Serialize)]
pub struct InMemoryAnnotations {
    annotations: Vec<Annotation>,
}

impl InMemoryAnnotations {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All annotations in emission order
    #[inline]
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Annotations in one category
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations.iter().filter(move |a| a.category == category)
    }

    /// Annotations grouped by category, in first-seen order
    #[must_use]
    pub fn by_category(&self) -> IndexMap<&str, Vec<&Annotation>> {
        let mut groups: IndexMap<&str, Vec<&Annotation>> = IndexMap::new();
        for annotation in &self.annotations {
            groups.entry(annotation.category.as_str()).or_default().push(annotation);
        }
        groups
    }
}

impl AnnotationSink for InMemoryAnnotations {
    fn attach(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }
}

/// Emit one threshold annotation per classified record
pub fn emit_threshold_annotations(report: &ThresholdReport, sink: &mut impl AnnotationSink) {
    for classification in &report.classifications {
        let (level, color) = match classification.verdict {
            Verdict::Fail { .. } => (AnnotationLevel::Error, FAIL_COLOR),
            Verdict::Pass { .. } => (AnnotationLevel::Info, PASS_COLOR),
        };
        sink.attach(
            Annotation::new(level, DENSITY_CHECK_CATEGORY, [classification.id.clone()])
                .with_message(classification.message.clone())
                .with_color(color),
        );
    }
}

/// Classify records against `threshold` and annotate each one
///
/// Returns the classification so callers can reuse the id buckets.
pub fn annotate<'a>(
    records: impl IntoIterator<Item = &'a HealthRecord>,
    threshold: f64,
    sink: &mut impl AnnotationSink,
) -> ThresholdReport {
    let report = classify_all(records, threshold);
    emit_threshold_annotations(&report, sink);
    report
}

/// Emit one gradient annotation per coloured record
pub fn emit_gradient_annotations<'a>(
    colored: impl IntoIterator<Item = (&'a NodeId, f64, &'a str)>,
    sink: &mut impl AnnotationSink,
) {
    for (id, density, color) in colored {
        sink.attach(
            Annotation::new(AnnotationLevel::Info, DENSITY_VISUALIZATION_CATEGORY, [id.clone()])
                .with_metadata("density", json!(density))
                .with_color(color),
        );
    }
}
