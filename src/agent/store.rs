//! On-disk model layout.
//!
//! A model directory holds two files:
//!
//! - `model-<sha256>.json` — the serialized [`TrainedModel`], named by the
//!   SHA-256 of its bytes
//! - `manifest.json` — format name and version, normalization model, crate
//!   version, creation time and the payload digest
//!
//! Each file is written to a temporary sibling and renamed into place. The
//! manifest is renamed last and is the commit point: until it lands, the old
//! manifest still names the old payload, which is left untouched. Payloads
//! the new manifest does not name are removed only after the commit.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::TrainedModel;
use crate::error::{Result, SieveError};
use crate::normalize::NormalizationModel;

pub const FORMAT: &str = "copyright-sieve-model";
pub const FORMAT_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";

const PAYLOAD_PREFIX: &str = "model-";
const PAYLOAD_SUFFIX: &str = ".json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format: String,
    pub format_version: u32,
    /// Id of the [`NormalizationModel`] the payload was trained with. Kept as
    /// text so an unknown id is reported as a mismatch.
    pub normalization_model: String,
    pub crate_version: String,
    pub created_at: DateTime<Utc>,
    pub examples: usize,
    pub payload_sha256: String,
}

/// File name of the payload with the given digest.
pub fn payload_file(sha256: &str) -> String {
    format!("{}{}{}", PAYLOAD_PREFIX, sha256, PAYLOAD_SUFFIX)
}

pub fn save(model: &TrainedModel, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| SieveError::storage(dir, e))?;

    let payload = serde_json::to_vec(model)
        .map_err(|e| SieveError::storage(dir, std::io::Error::other(e)))?;
    let digest = sha256_hex(&payload);
    let manifest = Manifest {
        format: FORMAT.to_string(),
        format_version: FORMAT_VERSION,
        normalization_model: model.normalization_model.id().to_string(),
        crate_version: env!("CARGO_PKG_VERSION").to_string(),
        created_at: Utc::now(),
        examples: model.counts.total(),
        payload_sha256: digest.clone(),
    };
    let manifest = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| SieveError::storage(dir, std::io::Error::other(e)))?;

    let payload_name = payload_file(&digest);
    write_atomic(dir, &payload_name, &payload)?;
    write_atomic(dir, MANIFEST_FILE, &manifest)?;
    remove_stale_payloads(dir, &payload_name);

    debug!(dir = %dir.display(), bytes = payload.len(), payload = %payload_name, "wrote model artifacts");
    Ok(())
}

/// Read and verify a model directory. Every failure is reported as
/// [`SieveError::ModelLoad`].
pub fn load(dir: &Path, expected: NormalizationModel) -> Result<TrainedModel> {
    let manifest = fs::read(dir.join(MANIFEST_FILE))
        .map_err(|e| SieveError::model_load(dir, format!("reading {}: {}", MANIFEST_FILE, e)))?;
    let manifest: Manifest = serde_json::from_slice(&manifest)
        .map_err(|e| SieveError::model_load(dir, format!("corrupt {}: {}", MANIFEST_FILE, e)))?;

    if manifest.format != FORMAT {
        return Err(SieveError::model_load(
            dir,
            format!("unknown format {:?}", manifest.format),
        ));
    }
    if manifest.format_version != FORMAT_VERSION {
        return Err(SieveError::model_load(
            dir,
            format!(
                "format version {} is not supported (expected {})",
                manifest.format_version, FORMAT_VERSION
            ),
        ));
    }
    if manifest.normalization_model != expected.id() {
        return Err(SieveError::model_load(
            dir,
            format!(
                "model was trained with normalization {} but this agent uses {}",
                manifest.normalization_model, expected
            ),
        ));
    }
    let digest = &manifest.payload_sha256;
    if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SieveError::model_load(dir, "manifest payload digest is malformed"));
    }

    let payload_name = payload_file(digest);
    let payload = fs::read(dir.join(&payload_name))
        .map_err(|e| SieveError::model_load(dir, format!("reading {}: {}", payload_name, e)))?;
    if sha256_hex(&payload) != digest.to_ascii_lowercase() {
        return Err(SieveError::model_load(dir, "payload checksum mismatch"));
    }
    let model: TrainedModel = serde_json::from_slice(&payload)
        .map_err(|e| SieveError::model_load(dir, format!("corrupt {}: {}", payload_name, e)))?;

    if model.normalization_model != expected {
        return Err(SieveError::model_load(
            dir,
            "payload normalization model disagrees with manifest",
        ));
    }
    if !model.is_consistent() {
        return Err(SieveError::model_load(
            dir,
            "payload vocabulary or classifier weights are inconsistent",
        ));
    }

    debug!(
        dir = %dir.display(),
        crate_version = %manifest.crate_version,
        created_at = %manifest.created_at,
        "verified model artifacts"
    );
    Ok(model)
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let target = dir.join(name);
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SieveError::storage(&target, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| SieveError::storage(&target, e))?;
    tmp.persist(&target)
        .map_err(|e| SieveError::storage(&target, e.error))?;
    Ok(())
}

/// Delete payloads other than `keep`. Runs after the commit, so a failure
/// only leaves garbage behind.
fn remove_stale_payloads(dir: &Path, keep: &str) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not list model directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == keep || !name.starts_with(PAYLOAD_PREFIX) || !name.ends_with(PAYLOAD_SUFFIX) {
            continue;
        }
        if let Err(e) = fs::remove_file(entry.path()) {
            warn!(file = name, error = %e, "could not remove stale payload");
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
