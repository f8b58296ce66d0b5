//! The persisted intermediate format (§6): the on-disk document that lets a
//! later run resume from where a previous one left off.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::applier::Behavior;
use crate::block::{Block, BlockStore};
use crate::error::IntermediateError;
use crate::revision::{RevisionLog, RevisionLogEntry};

#[derive(Debug, Serialize, Deserialize)]
struct IntermediateDocument {
    hash_lookup: HashMap<String, String>,
    blocks: HashMap<String, Block>,
    revisions: Vec<(u64, Vec<Behavior>, chrono::DateTime<chrono::Utc>)>,
}

/// Serializes `store` and `log` to the intermediate document format and
/// writes it to `path`.
pub fn save(path: impl AsRef<Path>, store: &BlockStore, log: &RevisionLog) -> Result<(), IntermediateError> {
    let (blocks, alias) = store.to_parts();
    let doc = IntermediateDocument {
        hash_lookup: alias.clone(),
        blocks: blocks.clone(),
        revisions: log
            .entries()
            .iter()
            .map(|e| (e.revision_id, e.behavior.clone(), e.timestamp))
            .collect(),
    };

    let json = serde_json::to_string_pretty(&doc)?;
    let path = path.as_ref();
    std::fs::write(path, json).map_err(|source| IntermediateError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Loads a previously saved intermediate document, reconstituting the block
/// store (with alias chains intact) and the revision log. A malformed
/// document is always fatal — the caller should delete and regenerate it.
pub fn load(path: impl AsRef<Path>) -> Result<(BlockStore, RevisionLog), IntermediateError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| IntermediateError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let doc: IntermediateDocument = serde_json::from_str(&content)?;

    let store = BlockStore::from_parts(doc.blocks, doc.hash_lookup);
    let log = RevisionLog::from_entries(
        doc.revisions
            .into_iter()
            .map(|(revision_id, behavior, timestamp)| RevisionLogEntry {
                revision_id,
                behavior,
                timestamp,
            })
            .collect(),
    );
    Ok((store, log))
}
