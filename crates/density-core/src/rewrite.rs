//! Writing results back onto the scene
//!
//! The rewrite walks the original tree with the rule-based traversal,
//! never the flattening one, and only touches representation materials
//! and the node density stamp. Tree shape is preserved.

use crate::config::DensityCheckConfig;
use crate::error::CoreError;
use crate::publish::{PublishSink, RunContext, VersionId};
use density_health::HealthRecord;
use density_scene::{rewrite_traversal, DensityStamp, DisplayValueSource, NodeId, SceneNode};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Counters from one rewrite pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    /// Nodes the traversal reached
    pub visited: usize,
    /// Nodes that received a material
    pub recolored_nodes: usize,
    /// Representations whose material was replaced
    pub recolored_representations: usize,
}

/// Write record materials and densities onto matching nodes
///
/// Records without a material are ignored.
pub fn rewrite(root: &mut SceneNode, records: &IndexMap<NodeId, HealthRecord>) -> RewriteStats {
    let mut stats = RewriteStats::default();
    rewrite_traversal().traverse_mut(root, |node, _| {
        stats.visited += 1;
        let Some(record) = node.id.as_ref().and_then(|id| records.get(id)) else {
            return;
        };
        let Some(material) = &record.material else {
            return;
        };
        if let Some(representations) = node.display_value_mut() {
            for representation in representations.iter_mut() {
                representation.render_material = Some(material.clone());
            }
            stats.recolored_representations += representations.len();
        }
        node.density = Some(DensityStamp {
            computed: true,
            densities: record.densities(),
        });
        stats.recolored_nodes += 1;
    });
    debug!(
        visited = stats.visited,
        nodes = stats.recolored_nodes,
        representations = stats.recolored_representations,
        "scene rewritten"
    );
    stats
}

/// Why a rewrite was not published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The analyzed version already lives on the recolor branch
    ReservedBranch,
    /// Publishing is turned off
    Disabled,
}

/// Result of the rewrite-and-publish step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published {
        version: VersionId,
        branch: String,
        stats: RewriteStats,
    },
    Skipped {
        reason: SkipReason,
    },
}

impl PublishOutcome {
    /// Published version id, if any
    #[must_use]
    pub fn version(&self) -> Option<&VersionId> {
        match self {
            Self::Published { version, .. } => Some(version),
            Self::Skipped { .. } => None,
        }
    }
}

/// Commit message for a recolored version
#[must_use]
pub fn recolor_message(run: &RunContext) -> String {
    if run.version_id.is_empty() {
        "Density check recolouring".to_string()
    } else {
        format!("Density check recolouring of version {}", run.version_id)
    }
}

/// Rewrite the scene and publish it to the recolor branch
///
/// Skipped entirely when the run already operates on the recolor branch,
/// which would otherwise republish its own output, or when publishing is
/// disabled. `root` only receives the rewrite once the publish succeeded.
///
/// # Errors
/// Returns [`CoreError::PublishFailed`] when the sink creates no version;
/// `root` is left as it was.
pub fn rewrite_and_publish(
    root: &mut SceneNode,
    records: &IndexMap<NodeId, HealthRecord>,
    run: &RunContext,
    config: &DensityCheckConfig,
    publisher: &mut impl PublishSink,
) -> Result<PublishOutcome, CoreError> {
    if run.branch_name == config.recolor_branch {
        info!(branch = %run.branch_name, "run is on the recolor branch, skipping rewrite");
        return Ok(PublishOutcome::Skipped {
            reason: SkipReason::ReservedBranch,
        });
    }
    if !config.publish_recolored {
        debug!("publishing disabled, skipping rewrite");
        return Ok(PublishOutcome::Skipped {
            reason: SkipReason::Disabled,
        });
    }

    let mut recolored = root.clone();
    let stats = rewrite(&mut recolored, records);
    let branch = config.recolor_branch.clone();
    let version = publisher
        .publish(&recolored, &branch, &recolor_message(run))
        .map_err(|source| {
            warn!(branch = %branch, error = %source, "publish failed");
            CoreError::PublishFailed {
                branch: branch.clone(),
                source,
            }
        })?;
    *root = recolored;
    Ok(PublishOutcome::Published {
        version,
        branch,
        stats,
    })
}
