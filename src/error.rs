//! Typed errors for the core. Collaborator and CLI glue use `anyhow` at their
//! own edges and convert into these where they cross into the core.

use thiserror::Error;

/// A single diff row the classifier could not place into any known shape.
#[derive(Debug, Error)]
#[error("unclassifiable diff row: {cells:?}")]
pub struct UnclassifiedRow {
    pub cells: Vec<String>,
}

/// Row-level failure surfaced by the applier while walking one revision's
/// diff. The revision loop catches this, tags the revision `error`, and
/// keeps whatever the applier had already committed to the store.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    UnclassifiedRow(#[from] UnclassifiedRow),
}

/// Failures loading a persisted intermediate document. Always fatal to the
/// caller: the document must be deleted and regenerated.
#[derive(Debug, Error)]
pub enum IntermediateError {
    #[error("failed to read intermediate file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed intermediate document: {0}")]
    Malformed(#[from] serde_json::Error),
}
