//! # Artifact Publisher
//!
//! Durable, atomic publication of a cycle's artifact and mapping. This
//! is the crash/consistency boundary between mutation cycles: any
//! concurrent reader observes either the prior complete state or the
//! new complete state, never a half-written file.
//!
//! ## Design
//!
//! Both files are written with a temp-then-rename protocol (write to
//! `<path>.tmp`, then `rename` over the destination, which is atomic
//! on POSIX). The artifact is published strictly before the mapping
//! that references it, so a reader that loads the pair in
//! mapping-then-artifact order can never see a mapping pointing at a
//! not-yet-available artifact.
//!
//! An optional mirror directory receives a convenience copy after the
//! authoritative write. Mirror failures are logged and swallowed; the
//! mirror sits outside every consistency invariant.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{MutatorError, Result};
use crate::models::{Artifact, NamespaceMapping};

/// File name of the published artifact.
pub const ARTIFACT_FILE: &str = "active_routes.json";

/// File name of the published mapping.
pub const MAPPING_FILE: &str = "mutation_state.json";

/// Well-known locations of the published state.
#[derive(Debug, Clone)]
pub struct StatePaths {
    /// Destination of the loadable artifact.
    pub artifact: PathBuf,

    /// Destination of the namespace mapping.
    pub mapping: PathBuf,
}

impl StatePaths {
    /// Derives the standard file locations under a state directory.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            artifact: dir.join(ARTIFACT_FILE),
            mapping: dir.join(MAPPING_FILE),
        }
    }
}

/// Publishes mutation state to its well-known durable locations.
///
/// # Example
///
/// ```rust,no_run
/// use chameleon_mutator::{ArtifactPublisher, StatePaths};
/// use chameleon_mutator::{Method, NamespaceMutator, RouteTemplate};
///
/// let templates = vec![RouteTemplate::new(Method::Get, "/", "root")];
/// let (mapping, artifact) = NamespaceMutator::new().mutate(&templates, 1).unwrap();
///
/// let publisher = ArtifactPublisher::new(StatePaths::in_dir("/var/lib/chameleon"));
/// publisher.publish(&artifact, &mapping).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactPublisher {
    /// Authoritative output locations.
    paths: StatePaths,

    /// Optional best-effort convenience copy directory.
    mirror_dir: Option<PathBuf>,
}

impl ArtifactPublisher {
    /// Creates a publisher for the given locations.
    #[must_use]
    pub fn new(paths: StatePaths) -> Self {
        Self {
            paths,
            mirror_dir: None,
        }
    }

    /// Enables a best-effort mirror copy into `dir`.
    #[must_use]
    pub fn with_mirror_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mirror_dir = Some(dir.into());
        self
    }

    /// Returns the authoritative output locations.
    #[must_use]
    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Durably publishes one cycle's artifact and mapping.
    ///
    /// The artifact is written first so the mapping never references a
    /// missing artifact. Each file is replaced atomically.
    ///
    /// # Errors
    ///
    /// Returns [`MutatorError::Publish`] if either authoritative write
    /// fails; the cycle must then be abandoned and retried next tick.
    pub fn publish(&self, artifact: &Artifact, mapping: &NamespaceMapping) -> Result<()> {
        write_atomic_json(&self.paths.artifact, artifact)?;
        write_atomic_json(&self.paths.mapping, mapping)?;

        info!(
            cycle = mapping.cycle_id,
            artifact = %self.paths.artifact.display(),
            mapping = %self.paths.mapping.display(),
            "mutation state published"
        );

        if let Some(dir) = &self.mirror_dir {
            self.mirror_into(dir);
        }

        Ok(())
    }

    /// Reads back the published artifact.
    pub fn load_artifact(&self) -> Result<Artifact> {
        read_json(&self.paths.artifact)
    }

    /// Reads back the published mapping.
    pub fn load_mapping(&self) -> Result<NamespaceMapping> {
        read_json(&self.paths.mapping)
    }

    /// Reads back the published pair, mapping first.
    ///
    /// Because the publisher writes the artifact before the mapping, a
    /// mapping read here always has its artifact available.
    pub fn load_published(&self) -> Result<(Artifact, NamespaceMapping)> {
        let mapping = self.load_mapping()?;
        let artifact = self.load_artifact()?;
        Ok((artifact, mapping))
    }

    /// Best-effort convenience copy. Never fails the cycle.
    fn mirror_into(&self, dir: &Path) {
        let result = fs::create_dir_all(dir).and_then(|()| {
            for src in [&self.paths.artifact, &self.paths.mapping] {
                if let Some(name) = src.file_name() {
                    fs::copy(src, dir.join(name))?;
                }
            }
            Ok(())
        });

        match result {
            Ok(()) => debug!(dir = %dir.display(), "mirror copy written"),
            Err(e) => warn!(dir = %dir.display(), error = %e, "skipped mirror copy"),
        }
    }
}

/// Serializes `value` and atomically replaces `path` with it.
fn write_atomic_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| MutatorError::Publish {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, &bytes).map_err(|source| MutatorError::Publish {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| MutatorError::Publish {
        path: path.to_path_buf(),
        source,
    })
}

/// Deserializes a published JSON file.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|source| MutatorError::ReadBack {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Sibling temp path used by the rename protocol.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
