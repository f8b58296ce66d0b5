//! Top-level glue (§6 "Operations exposed to callers"): fetch-or-resume the
//! intermediate document, sync it against the live wiki, optionally persist,
//! then assemble a corpus from it.

use anyhow::Result;
use tracing::info;

use crate::block::BlockStore;
use crate::config::Config;
use crate::corpus::{assemble_rough, assemble_structured, Corpus};
use crate::intermediate;
use crate::revision::{sync, RevisionLog, RevisionSource};

/// Loads the cached intermediate document for `config.title` (or starts a
/// fresh one), brings it up to date against `source`, and persists it back
/// to disk when `config.persist` is set.
pub async fn get_intermediate<S: RevisionSource>(
    source: &S,
    config: &Config,
) -> Result<(BlockStore, RevisionLog)> {
    let path = config.intermediate_path();
    let (mut store, mut log) = if path.exists() {
        info!(path = %path.display(), "resuming from cached intermediate document");
        intermediate::load(&path)?
    } else {
        (BlockStore::new(), RevisionLog::new())
    };

    sync(source, &config.talk_title(), &mut store, &mut log).await?;

    if config.persist {
        std::fs::create_dir_all(&config.cache_folder)?;
        intermediate::save(&path, &store, &log)?;
        info!(path = %path.display(), "persisted intermediate document");
    }

    Ok((store, log))
}

/// Fetches (or resumes) the intermediate document for `config.title` and
/// assembles it into a corpus, per `config.rough`.
pub async fn get_corpus<S: RevisionSource>(source: &S, config: &Config) -> Result<Corpus> {
    let (mut store, _log) = get_intermediate(source, config).await?;
    Ok(if config.rough {
        assemble_rough(&mut store)
    } else {
        assemble_structured(&mut store)
    })
}
