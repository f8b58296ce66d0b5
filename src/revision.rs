//! The revision driver (§4.4): iterates revision pairs, fetches each diff
//! from a collaborator, and feeds it through the applier.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::applier::{apply_revision, Behavior};
use crate::block::{BlockStore, User};
use crate::diffrow::DiffRow;

/// Metadata for one revision, as returned by [`RevisionSource::list_revisions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionMeta {
    pub id: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub user: User,
}

/// The collaborator boundary (§6): everything the core needs from the wiki,
/// without caring how it gets there. The core consumes parsed diff rows and
/// revision metadata; fetching and tokenizing the HTML is this trait
/// implementor's job, not the applier's.
pub trait RevisionSource {
    /// Revisions for `title` since `since_id` (inclusive), oldest first. A
    /// `None` `since_id` returns the full history from the page's first
    /// revision.
    async fn list_revisions(
        &self,
        title: &str,
        since_id: Option<u64>,
    ) -> anyhow::Result<Vec<RevisionMeta>>;

    /// The classified diff rows between two adjacent revisions.
    async fn fetch_diff(&self, title: &str, from_id: u64, to_id: u64) -> anyhow::Result<Vec<DiffRow>>;

    /// The most recent revision id for `title`, for freshness checks.
    async fn last_revision_id(&self, title: &str) -> anyhow::Result<u64>;
}

/// One entry of the append-only revision log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionLogEntry {
    pub revision_id: u64,
    pub behavior: Vec<Behavior>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// The append-only revision log (§3 "Revision log").
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RevisionLog {
    entries: Vec<RevisionLogEntry>,
}

impl RevisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, revision_id: u64, behavior: Vec<Behavior>, timestamp: chrono::DateTime<chrono::Utc>) {
        self.entries.push(RevisionLogEntry {
            revision_id,
            behavior,
            timestamp,
        });
    }

    pub fn last_revision_id(&self) -> Option<u64> {
        self.entries.last().map(|e| e.revision_id)
    }

    pub fn entries(&self) -> &[RevisionLogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reconstructs a log from its persisted entries (§6).
    pub fn from_entries(entries: Vec<RevisionLogEntry>) -> Self {
        Self { entries }
    }
}

/// Processes every uningested revision of `title` since the log's last
/// entry (or from scratch if the log is empty), applying each pair's diff
/// to `store` and appending to `log`.
///
/// A revision pair is fully applied before the next begins (§5): the store
/// is self-consistent at every revision boundary, and a caller aborting
/// this future between iterations leaves it that way.
pub async fn sync<S: RevisionSource>(
    source: &S,
    title: &str,
    store: &mut BlockStore,
    log: &mut RevisionLog,
) -> anyhow::Result<()> {
    let since_id = log.last_revision_id();
    let revisions = source.list_revisions(title, since_id).await?;

    for pair in revisions.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let rows = source.fetch_diff(title, prev.id, curr.id).await?;
        let behavior = apply_revision(store, prev, curr, &rows);
        info!(revision = curr.id, behavior = ?behavior, "revision synced");
        log.push(curr.id, behavior, curr.timestamp);
    }

    Ok(())
}
