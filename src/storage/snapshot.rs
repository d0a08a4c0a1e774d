//! Versioned on-disk index format
//!
//! Layout: the magic bytes `RAIX`, a little-endian `u32` format version, then a
//! gzip stream holding the bincode encoding of [`IndexSnapshot`]. Everything a
//! loader needs to rebuild the index is stored as flat arrays; nothing depends on
//! in-memory object layout.

use crate::config::StoreKind;
use crate::error::{AssistantError, Result};
use crate::text::ChunkMetadata;
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// File magic
pub const MAGIC: &[u8; 4] = b"RAIX";

/// Current format version
pub const FORMAT_VERSION: u32 = 1;

/// Complete persisted state of a vector index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSnapshot {
    pub format_version: u32,
    /// Identity of the model that produced `vectors`
    pub embedding_model: String,
    /// Vector dimension; `None` while the corpus is empty
    pub dimension: Option<usize>,
    /// Search structure to rebuild
    pub store: StoreKind,
    pub created_at: DateTime<Utc>,
    pub texts: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    /// Row-major, `texts.len() * dimension` floats
    pub vectors: Vec<f32>,
}

impl IndexSnapshot {
    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(AssistantError::CorruptState(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if self.texts.len() != self.metadata.len() {
            return Err(AssistantError::CorruptState(format!(
                "{} texts but {} metadata entries",
                self.texts.len(),
                self.metadata.len()
            )));
        }
        match self.dimension {
            None if !self.vectors.is_empty() || !self.texts.is_empty() => {
                Err(AssistantError::CorruptState(
                    "entries present but no vector dimension recorded".to_string(),
                ))
            }
            Some(0) => Err(AssistantError::CorruptState(
                "vector dimension is zero".to_string(),
            )),
            Some(dimension) if self.vectors.len() != dimension * self.texts.len() => {
                Err(AssistantError::CorruptState(format!(
                    "{} floats stored for {} entries of dimension {}",
                    self.vectors.len(),
                    self.texts.len(),
                    dimension
                )))
            }
            _ => Ok(()),
        }
    }

    /// Encode into a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        let mut encoder = GzEncoder::new(writer, Compression::default());
        bincode::serialize_into(&mut encoder, self)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    /// Decode from a reader, validating header and contents
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| AssistantError::CorruptState(format!("truncated header: {}", e)))?;
        if &magic != MAGIC {
            return Err(AssistantError::CorruptState(
                "not a research-assistant index file".to_string(),
            ));
        }

        let mut version = [0u8; 4];
        reader
            .read_exact(&mut version)
            .map_err(|e| AssistantError::CorruptState(format!("truncated header: {}", e)))?;
        let version = u32::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(AssistantError::CorruptState(format!(
                "unsupported format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        let snapshot: IndexSnapshot = bincode::deserialize_from(GzDecoder::new(reader))
            .map_err(|e| AssistantError::CorruptState(format!("undecodable body: {}", e)))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Write to `path` atomically (temp file + rename)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = temp_path_for(path);
        let result = (|| -> Result<()> {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            self.write_to(&mut writer)?;
            let file = writer
                .into_inner()
                .map_err(|e| AssistantError::Io(e.into_error()))?;
            file.sync_all()?;
            std::fs::rename(&tmp_path, path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = std::fs::remove_file(&tmp_path);
        }
        result
    }

    /// Read from `path`; a missing file is [`AssistantError::NotFound`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssistantError::NotFound(format!(
                    "Index file {} not found. Please run 'ingest' first.",
                    path.display()
                )));
            }
            Err(e) => return Err(AssistantError::Io(e)),
        };
        Self::read_from(BufReader::new(file)).map_err(|e| match e {
            AssistantError::CorruptState(msg) => {
                AssistantError::CorruptState(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
