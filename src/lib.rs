//! Reconstructs threaded talk-page discussions from a wiki's revision
//! history: a content-addressed block store fed by an incremental diff
//! applier, folded into a corpus of reply-linked utterances.

pub mod applier;
pub mod block;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod diffrow;
pub mod error;
pub mod hashing;
pub mod html;
pub mod intermediate;
pub mod pipeline;
pub mod revision;
pub mod segment;
pub mod wiki;
