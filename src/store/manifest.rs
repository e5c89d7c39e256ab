use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bumped whenever the on-disk layout of any artifact changes
pub const FORMAT_VERSION: u32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CORPUS_FILE: &str = "corpus.bin";
pub const TFIDF_FILE: &str = "tfidf.bin";
pub const SIMILARITY_FILE: &str = "similarity.bin";

/// Describes one persisted build; written last, so its presence marks a complete index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub format_version: u32,
    pub build_id: Uuid,
    pub built_at: DateTime<Utc>,
    pub documents: usize,
    pub vocabulary_size: usize,
    pub artifacts: Vec<ArtifactEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub file: String,
    pub bytes: u64,
    /// Hex BLAKE3 digest of the file contents
    pub blake3: String,
}

impl Manifest {
    pub fn artifact(&self, file: &str) -> Option<&ArtifactEntry> {
        self.artifacts.iter().find(|a| a.file == file)
    }
}

/// Artifact envelope as written: payload tagged with the build it belongs to
#[derive(Serialize)]
pub(crate) struct ArtifactRef<'a, T> {
    pub build_id: Uuid,
    pub payload: &'a T,
}

/// Artifact envelope as read back
#[derive(Deserialize)]
pub(crate) struct Artifact<T> {
    pub build_id: Uuid,
    pub payload: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_roundtrip_and_lookup() {
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            build_id: Uuid::new_v4(),
            built_at: Utc::now(),
            documents: 3,
            vocabulary_size: 12,
            artifacts: vec![ArtifactEntry {
                file: CORPUS_FILE.to_string(),
                bytes: 128,
                blake3: "ab".repeat(32),
            }],
        };

        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let parsed: Manifest = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, manifest);
        assert_eq!(parsed.artifact(CORPUS_FILE).unwrap().bytes, 128);
        assert!(parsed.artifact(SIMILARITY_FILE).is_none());
    }

    #[test]
    fn test_artifact_envelope_preserves_build_id() {
        let build_id = Uuid::new_v4();
        let payload = vec![1.0f64, 0.5, 0.25];

        let bytes = bincode::serialize(&ArtifactRef {
            build_id,
            payload: &payload,
        })
        .unwrap();
        let artifact: Artifact<Vec<f64>> = bincode::deserialize(&bytes).unwrap();

        assert_eq!(artifact.build_id, build_id);
        assert_eq!(artifact.payload, payload);
    }
}
