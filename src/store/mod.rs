//! On-disk index bundle.
//!
//! A build is persisted as three bincode artifacts (corpus, TF-IDF model, similarity
//! matrix), each tagged with the build id, plus a JSON manifest carrying the build id
//! and a BLAKE3 checksum per artifact. The manifest is written last and removed first,
//! so an interrupted write reads back as a missing index, never as a partial one.
//!
//! Writers hold an exclusive advisory lock (`.build.lock`) in the index directory
//! for the whole write; `load` holds it shared, so a reader never mixes two builds.

use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Corpus,
    services::{
        corpus::load_corpus, index::IndexBundle, similarity::SimilarityMatrix,
        vectorizer::VectorSpaceModel,
    },
};

pub mod manifest;

use manifest::{
    Artifact, ArtifactEntry, ArtifactRef, Manifest, CORPUS_FILE, FORMAT_VERSION, MANIFEST_FILE,
    SIMILARITY_FILE, TFIDF_FILE,
};

const LOCK_FILE: &str = ".build.lock";

/// Reads and writes the index bundle under one directory
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the persisted bundle
    ///
    /// Fails with `IndexMissing` when the manifest or any artifact is absent and with
    /// `IndexInconsistent` when the artifacts do not belong to the same build.
    pub fn load(&self) -> AppResult<IndexBundle> {
        self.with_read_lock(|| self.load_locked())
    }

    /// Loads assuming the caller holds the build lock, shared or exclusive
    fn load_locked(&self) -> AppResult<IndexBundle> {
        let manifest_path = self.dir.join(MANIFEST_FILE);
        let manifest_bytes = match fs::read(&manifest_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::IndexMissing(manifest_path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let manifest: Manifest = serde_json::from_slice(&manifest_bytes)?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(AppError::IndexInconsistent(format!(
                "format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }

        let corpus: Corpus = self.read_artifact(&manifest, CORPUS_FILE)?;
        let model: VectorSpaceModel = self.read_artifact(&manifest, TFIDF_FILE)?;
        let similarity: SimilarityMatrix = self.read_artifact(&manifest, SIMILARITY_FILE)?;

        if corpus.len() != manifest.documents {
            return Err(AppError::IndexInconsistent(format!(
                "manifest lists {} documents, corpus has {}",
                manifest.documents,
                corpus.len()
            )));
        }

        let bundle = IndexBundle::from_parts(
            manifest.build_id,
            manifest.built_at,
            corpus,
            model,
            similarity,
        )?;

        tracing::info!(
            build_id = %bundle.build_id(),
            documents = bundle.len(),
            dir = %self.dir.display(),
            "Index bundle loaded"
        );

        Ok(bundle)
    }

    /// Persists a bundle, replacing whatever build was there
    pub fn save(&self, bundle: &IndexBundle) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;
        self.with_build_lock(|| self.write_bundle(bundle))
    }

    /// Loads the bundle, building it from `corpus_source` when none is persisted
    ///
    /// An inconsistent index is not rebuilt over; it surfaces as an error.
    pub fn open_or_build(
        &self,
        corpus_source: &Path,
        max_features: usize,
    ) -> AppResult<IndexBundle> {
        match self.load() {
            Ok(bundle) => return Ok(bundle),
            Err(e) if e.is_index_missing() => {
                tracing::info!(reason = %e, "No persisted index, building");
            }
            Err(e) => return Err(e),
        }

        fs::create_dir_all(&self.dir)?;
        self.with_build_lock(|| {
            // Another process may have finished a build while we waited on the lock
            match self.load_locked() {
                Ok(bundle) => return Ok(bundle),
                Err(e) if e.is_index_missing() => {}
                Err(e) => return Err(e),
            }
            self.build_and_write(corpus_source, max_features)
        })
    }

    /// Builds from `corpus_source` and persists, regardless of any existing build
    pub fn rebuild(&self, corpus_source: &Path, max_features: usize) -> AppResult<IndexBundle> {
        fs::create_dir_all(&self.dir)?;
        self.with_build_lock(|| self.build_and_write(corpus_source, max_features))
    }

    fn build_and_write(
        &self,
        corpus_source: &Path,
        max_features: usize,
    ) -> AppResult<IndexBundle> {
        let corpus = load_corpus(corpus_source)?;
        let bundle = IndexBundle::build(corpus, max_features)?;
        self.write_bundle(&bundle)?;
        Ok(bundle)
    }

    /// Runs `f` while holding the exclusive build lock
    fn with_build_lock<T>(&self, f: impl FnOnce() -> AppResult<T>) -> AppResult<T> {
        let mut lock = fd_lock::RwLock::new(self.open_lock_file()?);
        let _guard = lock.write()?;
        tracing::debug!(dir = %self.dir.display(), "Build lock acquired");
        f()
    }

    /// Runs `f` while holding the build lock shared, waiting out any writer
    fn with_read_lock<T>(&self, f: impl FnOnce() -> AppResult<T>) -> AppResult<T> {
        let file = match self.open_lock_file() {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::IndexMissing(self.dir.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let lock = fd_lock::RwLock::new(file);
        let _guard = lock.read()?;
        f()
    }

    fn open_lock_file(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))
    }

    fn write_bundle(&self, bundle: &IndexBundle) -> AppResult<()> {
        let manifest_path = self.dir.join(MANIFEST_FILE);
        match fs::remove_file(&manifest_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let build_id = bundle.build_id();
        let artifacts = vec![
            self.write_artifact(CORPUS_FILE, build_id, bundle.corpus())?,
            self.write_artifact(TFIDF_FILE, build_id, bundle.model())?,
            self.write_artifact(SIMILARITY_FILE, build_id, bundle.similarity())?,
        ];

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            build_id,
            built_at: bundle.built_at(),
            documents: bundle.len(),
            vocabulary_size: bundle.model().vocabulary_size(),
            artifacts,
        };
        write_atomic(&manifest_path, &serde_json::to_vec_pretty(&manifest)?)?;

        tracing::info!(
            build_id = %build_id,
            dir = %self.dir.display(),
            "Index bundle saved"
        );

        Ok(())
    }

    fn write_artifact<T: Serialize>(
        &self,
        file: &str,
        build_id: Uuid,
        payload: &T,
    ) -> AppResult<ArtifactEntry> {
        let bytes = bincode::serialize(&ArtifactRef { build_id, payload })?;
        let entry = ArtifactEntry {
            file: file.to_string(),
            bytes: bytes.len() as u64,
            blake3: blake3::hash(&bytes).to_hex().to_string(),
        };
        write_atomic(&self.dir.join(file), &bytes)?;
        tracing::debug!(file = %file, bytes = entry.bytes, "Artifact written");
        Ok(entry)
    }

    fn read_artifact<T: DeserializeOwned>(&self, manifest: &Manifest, file: &str) -> AppResult<T> {
        let entry = manifest.artifact(file).ok_or_else(|| {
            AppError::IndexInconsistent(format!("manifest does not list {}", file))
        })?;

        let path = self.dir.join(file);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::IndexMissing(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.len() as u64 != entry.bytes {
            return Err(AppError::IndexInconsistent(format!(
                "{} is {} bytes, manifest lists {}",
                file,
                bytes.len(),
                entry.bytes
            )));
        }

        if blake3::hash(&bytes).to_hex().as_str() != entry.blake3 {
            return Err(AppError::IndexInconsistent(format!(
                "checksum mismatch for {}",
                file
            )));
        }

        let artifact: Artifact<T> = bincode::deserialize(&bytes)?;
        if artifact.build_id != manifest.build_id {
            return Err(AppError::IndexInconsistent(format!(
                "{} belongs to build {}, manifest is build {}",
                file, artifact.build_id, manifest.build_id
            )));
        }

        Ok(artifact.payload)
    }
}

/// Writes via a temp file and rename so readers never see a torn file
fn write_atomic(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
