//! Content-addressed binary artifact files.
//!
//! Each cache entry is stored as `<cache_dir>/entries/<key>.bin` with a header
//! containing magic bytes, format version, the producing tool version, and a
//! checksum of the payload. Files are written to a temporary name and renamed
//! into place so a reader never sees a partial artifact.

use std::path::{Path, PathBuf};

use minim_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Magic bytes identifying a minim cache artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"MNMC";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Subdirectory holding artifacts.
const ENTRIES_SUBDIR: &str = "entries";

/// File extension for artifacts.
const ARTIFACT_EXT: &str = "bin";

/// Header prepended to every artifact for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"MNMC"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// Tool version that produced this artifact.
    pub tool_version: String,

    /// Content hash of the payload data (for integrity checks).
    pub checksum: ContentHash,
}

/// Reads and writes artifact files under a cache directory.
pub struct ArtifactStore {
    /// Root cache directory.
    cache_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a new artifact store rooted at the given cache directory.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Ensures that the artifact directory exists.
    pub fn ensure_dirs(&self) -> Result<(), CacheError> {
        let dir = self.cache_dir.join(ENTRIES_SUBDIR);
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::Io {
            path: dir,
            source: e,
        })
    }

    /// Returns the file path for an artifact with the given key.
    pub fn artifact_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(ENTRIES_SUBDIR)
            .join(format!("{key}.{ARTIFACT_EXT}"))
    }

    /// Writes an artifact under `key`.
    pub fn write_artifact(
        &self,
        key: &str,
        data: &[u8],
        tool_version: &str,
    ) -> Result<(), CacheError> {
        self.ensure_dirs()?;

        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            tool_version: tool_version.to_string(),
            checksum: ContentHash::from_bytes(data),
        };

        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // Write: 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        let path = self.artifact_path(key);
        let tmp = path.with_extension(format!("{ARTIFACT_EXT}.tmp.{}", std::process::id()));
        std::fs::write(&tmp, &output).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Reads an artifact, validating its header.
    ///
    /// Returns `None` if the file doesn't exist, the header is invalid, the
    /// format or tool version doesn't match, or the checksum doesn't verify.
    pub fn read_artifact(&self, key: &str, tool_version: &str) -> Option<Vec<u8>> {
        let raw = std::fs::read(self.artifact_path(key)).ok()?;

        if raw.len() < 4 {
            return None;
        }

        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let header: ArtifactHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;

        if header.magic != ARTIFACT_MAGIC
            || header.format_version != ARTIFACT_FORMAT_VERSION
            || header.tool_version != tool_version
        {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }

        Some(payload.to_vec())
    }

    /// Removes artifacts whose key is not in `live_keys`.
    ///
    /// Returns the number of files removed.
    pub fn gc(&self, live_keys: &[&str]) -> Result<usize, CacheError> {
        let dir = self.cache_dir.join(ENTRIES_SUBDIR);
        if !dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        let entries = std::fs::read_dir(&dir).map_err(|e| CacheError::Io {
            path: dir.clone(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !live_keys.contains(&stem) {
                    std::fs::remove_file(&path).map_err(|e| CacheError::Io {
                        path: path.clone(),
                        source: e,
                    })?;
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }
}
