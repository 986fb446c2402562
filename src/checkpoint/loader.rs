//! Checkpoint resolution and loading
//!
//! A checkpoint identifier is either a local path or a Hugging Face Hub
//! repository id:
//!
//! - `./gpt2/model.safetensors` → read that file
//! - `./gpt2/` → read `./gpt2/model.safetensors`
//! - `openai-community/gpt2` → download `model.safetensors` through `hf_hub`
//!   (cached under the usual `~/.cache/huggingface/hub` tree)
//!
//! Download failures are surfaced as [`GammaError::Network`] and never retried.

use std::fs;
use std::path::{Path, PathBuf};

use super::SafeTensorsCheckpoint;
use crate::error::{GammaError, GammaResult};

/// File name of single-shard weights on the hub and in local model directories
pub const WEIGHTS_FILENAME: &str = "model.safetensors";

/// Default checkpoint identifier
pub const DEFAULT_MODEL: &str = "openai-community/gpt2";

/// Default hub revision
pub const DEFAULT_REVISION: &str = "main";

/// Where a checkpoint should be read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointSpec {
    /// Local safetensors file
    File(PathBuf),
    /// Hub repository at a revision
    Hub {
        /// Repository id, e.g. `openai-community/gpt2`
        repo_id: String,
        /// Branch, tag or commit
        revision: String,
    },
}

impl CheckpointSpec {
    /// Resolve a user-supplied identifier
    ///
    /// Existing paths win over hub ids. Identifiers that are clearly meant as
    /// paths but do not exist are rejected instead of being sent to the hub.
    ///
    /// # Errors
    ///
    /// Returns [`GammaError::NotFound`] for missing local paths and for
    /// directories without a weights file.
    pub fn resolve(identifier: &str, revision: &str) -> GammaResult<Self> {
        let path = Path::new(identifier);

        if path.is_file() {
            return Ok(Self::File(path.to_path_buf()));
        }

        if path.is_dir() {
            let weights = path.join(WEIGHTS_FILENAME);
            if weights.is_file() {
                return Ok(Self::File(weights));
            }
            return Err(GammaError::NotFound(format!(
                "directory {} has no {WEIGHTS_FILENAME}",
                path.display()
            )));
        }

        if looks_like_path(identifier) {
            return Err(GammaError::NotFound(format!(
                "no such file or directory: {identifier}"
            )));
        }

        Ok(Self::Hub {
            repo_id: identifier.to_string(),
            revision: revision.to_string(),
        })
    }
}

/// Heuristic for identifiers that can only be filesystem paths
fn looks_like_path(identifier: &str) -> bool {
    identifier.is_empty()
        || identifier.starts_with('.')
        || identifier.starts_with('/')
        || identifier.starts_with('~')
        || Path::new(identifier)
            .extension()
            .is_some_and(|ext| ext == "safetensors")
        || identifier.matches('/').count() > 1
}

/// Raw bytes of a safetensors checkpoint
#[derive(Debug)]
pub struct CheckpointFile {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl CheckpointFile {
    /// Read a local safetensors file
    ///
    /// # Errors
    ///
    /// Returns [`GammaError::NotFound`] if the file does not exist, or
    /// [`GammaError::Io`] for other read failures.
    pub fn open(path: impl AsRef<Path>) -> GammaResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GammaError::NotFound(path.display().to_string()),
            _ => GammaError::Io(e),
        })?;
        crate::trace_event!(path = %path.display(), bytes = bytes.len(), "checkpoint read");
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    /// Path the bytes were read from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the checkpoint in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Parse the header and expose the parameters
    ///
    /// # Errors
    ///
    /// Returns [`GammaError::Format`] if the file is not valid safetensors.
    pub fn parameters(&self) -> GammaResult<SafeTensorsCheckpoint<'_>> {
        SafeTensorsCheckpoint::parse(&self.bytes)
    }
}

/// Download `model.safetensors` from the hub, returning the cached path
#[cfg(feature = "hub")]
fn download_weights(repo_id: &str, revision: &str, verbose: bool) -> GammaResult<PathBuf> {
    use hf_hub::api::sync::Api;
    use hf_hub::{Repo, RepoType};

    let _guard = crate::trace_enter!("download_weights");

    if verbose {
        eprintln!("[INFO] Fetching {WEIGHTS_FILENAME} from {repo_id}@{revision}");
    }

    let api = Api::new().map_err(|e| GammaError::Network(e.to_string()))?;
    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    repo.get(WEIGHTS_FILENAME).map_err(|e| {
        GammaError::Network(format!(
            "failed to fetch {WEIGHTS_FILENAME} from {repo_id}@{revision}: {e}"
        ))
    })
}

#[cfg(not(feature = "hub"))]
fn download_weights(repo_id: &str, _revision: &str, _verbose: bool) -> GammaResult<PathBuf> {
    Err(GammaError::NotFound(format!(
        "{repo_id} is not a local path and hub support is disabled (enable the `hub` feature)"
    )))
}

/// Resolve an identifier and read the checkpoint it names
///
/// # Arguments
///
/// * `identifier` - Local path or hub repository id
/// * `revision` - Hub revision (ignored for local paths)
/// * `verbose` - Print `[INFO]` lines to stderr
///
/// # Errors
///
/// Propagates [`GammaError::NotFound`], [`GammaError::Network`] and
/// [`GammaError::Io`] unchanged.
pub fn load_checkpoint(
    identifier: &str,
    revision: &str,
    verbose: bool,
) -> GammaResult<CheckpointFile> {
    let path = match CheckpointSpec::resolve(identifier, revision)? {
        CheckpointSpec::File(path) => path,
        CheckpointSpec::Hub { repo_id, revision } => {
            download_weights(&repo_id, &revision, verbose)?
        }
    };

    if verbose {
        eprintln!("[INFO] Reading checkpoint: {}", path.display());
    }
    CheckpointFile::open(path)
}
