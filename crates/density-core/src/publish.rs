//! Publishing rewritten scenes as new versions
//!
//! [`PublishSink`] is the boundary to whatever stores versions. The
//! in-memory sink derives version ids from a Blake3 hash of the published
//! content, so publishing the same scene to the same branch twice yields
//! the same id.

use crate::error::PublishError;
use density_scene::SceneNode;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use tracing::info;

/// Identifier of a published version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Content-derived id: first 10 bytes of the Blake3 hash, hex encoded
    #[must_use]
    pub fn from_content(branch: &str, content: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(branch.as_bytes());
        hasher.update(&[0]);
        hasher.update(content);
        Self(hex::encode(&hasher.finalize().as_bytes()[..10]))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VersionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the analyzed version came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub server_url: String,
    pub project_id: String,
    pub version_id: String,
    /// Branch the analyzed version lives on
    pub branch_name: String,
}

impl RunContext {
    #[must_use]
    pub fn new(
        server_url: impl Into<String>,
        project_id: impl Into<String>,
        version_id: impl Into<String>,
        branch_name: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            project_id: project_id.into(),
            version_id: version_id.into(),
            branch_name: branch_name.into(),
        }
    }
}

/// Receiver of new versions
pub trait PublishSink {
    /// Publish `root` to `branch`
    ///
    /// # Errors
    /// Returns an error when no version was created.
    fn publish(
        &mut self,
        root: &SceneNode,
        branch: &str,
        message: &str,
    ) -> Result<VersionId, PublishError>;
}

impl<S: PublishSink + ?Sized> PublishSink for &mut S {
    fn publish(
        &mut self,
        root: &SceneNode,
        branch: &str,
        message: &str,
    ) -> Result<VersionId, PublishError> {
        (**self).publish(root, branch, message)
    }
}

/// A version held by [`InMemoryPublisher`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedVersion {
    pub id: VersionId,
    pub branch: String,
    pub message: String,
    pub scene: Value,
}

/// Sink that keeps published versions in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryPublisher {
    versions: Vec<PublishedVersion>,
    reject_with: Option<String>,
}

impl InMemoryPublisher {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that refuses every publish with `reason`
    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            versions: Vec::new(),
            reject_with: Some(reason.into()),
        }
    }

    #[inline]
    #[must_use]
    pub fn versions(&self) -> &[PublishedVersion] {
        &self.versions
    }

    /// Most recent version
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&PublishedVersion> {
        self.versions.last()
    }
}

impl PublishSink for InMemoryPublisher {
    fn publish(
        &mut self,
        root: &SceneNode,
        branch: &str,
        message: &str,
    ) -> Result<VersionId, PublishError> {
        if let Some(reason) = &self.reject_with {
            return Err(PublishError::Rejected(reason.clone()));
        }
        let scene = root.to_json();
        let bytes = serde_json::to_vec(&scene).map_err(|err| PublishError::Rejected(err.to_string()))?;
        let id = VersionId::from_content(branch, &bytes);
        info!(version = %id, branch, bytes = bytes.len(), "version published");
        self.versions.push(PublishedVersion {
            id: id.clone(),
            branch: branch.to_string(),
            message: message.to_string(),
            scene,
        });
        Ok(id)
    }
}
