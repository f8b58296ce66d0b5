//! The diff applier (§4.5): the state machine that folds one revision's diff
//! rows into the block store, and the reply-target computation (§4.6) it
//! leans on.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::block::{Block, BlockStore, RevisionId, User};
use crate::diffrow::{classify, DiffRow, RowClass};
use crate::hashing::{depth, fingerprint, is_section_heading};
use crate::revision::RevisionMeta;

/// One tag recorded against a revision's entry in the revision log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    CreateSection,
    AddComment,
    Modify,
    Move,
    Removal,
    Error,
}

/// Per-diff local state, scoped to a single revision pair. None of this
/// survives past the revision it was built for.
struct ApplierState {
    last_hash: Option<String>,
    last_depth: usize,
    last_block_was_ingested: bool,
    curr_section_hash: Option<String>,
    behavior: Vec<Behavior>,
}

impl ApplierState {
    fn new() -> Self {
        Self {
            last_hash: None,
            last_depth: 0,
            last_block_was_ingested: false,
            curr_section_hash: None,
            behavior: Vec::new(),
        }
    }
}

/// Applies one revision's diff rows to `store` in document order. Returns
/// the behavior tags to record against `curr.id` in the revision log.
///
/// A row that fails to classify aborts the rest of this revision's rows
/// (whatever was already applied stays applied) and the revision is tagged
/// solely `[Error]`, matching the source's skip-and-continue-at-the-revision
/// granularity.
pub fn apply_revision(
    store: &mut BlockStore,
    prev: &RevisionMeta,
    curr: &RevisionMeta,
    rows: &[DiffRow],
) -> Vec<Behavior> {
    let mut state = ApplierState::new();

    for row in rows {
        match classify(row) {
            Ok(RowClass::LineNumber) => {}
            Ok(RowClass::Unedited { text }) => apply_unedited(store, &mut state, prev, &text),
            Ok(RowClass::NewContent { added }) => {
                apply_new_content(store, &mut state, curr, &added)
            }
            Ok(RowClass::MovedRight { added, lhs_text }) => {
                apply_moved_right(store, &mut state, curr, &added, &lhs_text)
            }
            Ok(RowClass::Removal { removed }) => apply_removal(store, &removed),
            Ok(RowClass::MovedLeft { .. }) => state.behavior.push(Behavior::Removal),
            Ok(RowClass::Modification { old, new }) => {
                apply_modification(store, &mut state, curr, &old, &new)
            }
            Err(err) => {
                warn!(revision = curr.id, %err, "unclassifiable diff row; aborting revision");
                return vec![Behavior::Error];
            }
        }
    }

    debug!(revision = curr.id, behavior = ?state.behavior, "revision applied");
    state.behavior
}

fn apply_unedited(store: &mut BlockStore, state: &mut ApplierState, prev: &RevisionMeta, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    let h = fingerprint(text);
    let d = depth(text);

    if !store.contains(&h) {
        let mut block = Block {
            text: text.to_string(),
            timestamp: prev.timestamp,
            user: User::Unknown,
            ingested: false,
            revision_ids: vec![RevisionId::Unknown],
            reply_chain: vec![h.clone()],
            is_followed: false,
            is_header: false,
            root_hash: None,
        };
        if is_section_heading(text) {
            block.root_hash = Some(h.clone());
            block.is_header = true;
            state.curr_section_hash = Some(h.clone());
        }
        store.insert(h.clone(), block);
    } else {
        let root = store.get(&h).and_then(|b| b.root_hash.clone());
        state.curr_section_hash = root;
    }

    state.last_hash = Some(h);
    state.last_depth = d;
    state.last_block_was_ingested = false;
}

fn apply_new_content(
    store: &mut BlockStore,
    state: &mut ApplierState,
    curr: &RevisionMeta,
    added: &str,
) {
    if added.trim().is_empty() {
        return;
    }
    let h_new = fingerprint(added);
    let d = depth(added);

    let mut block = Block {
        text: added.to_string(),
        timestamp: curr.timestamp,
        user: curr.user.clone(),
        ingested: true,
        revision_ids: vec![RevisionId::Real(curr.id)],
        reply_chain: Vec::new(),
        is_followed: false,
        is_header: false,
        root_hash: None,
    };

    if is_section_heading(added) {
        state.behavior.push(Behavior::CreateSection);
        block.reply_chain = vec![h_new.clone()];
        block.is_header = true;
        state.curr_section_hash = Some(h_new.clone());
    } else {
        state.behavior.push(Behavior::AddComment);
        block.is_header = false;
        block.reply_chain = reply_chain_for_new(store, state, &h_new, d);
    }
    // A section's own root is itself; set after the branch above so both
    // cases see curr_section_hash updated for this block.
    block.root_hash = state.curr_section_hash.clone();

    store.insert(h_new.clone(), block);
    state.last_hash = Some(h_new);
    state.last_depth = d;
    state.last_block_was_ingested = true;
}

fn apply_moved_right(
    store: &mut BlockStore,
    state: &mut ApplierState,
    curr: &RevisionMeta,
    added: &str,
    lhs_text: &str,
) {
    if added.trim().is_empty() {
        return;
    }
    state.behavior.push(Behavior::Move);
    let h_new = fingerprint(added);
    let d = depth(added);
    let h_old = fingerprint(lhs_text);
    let section = state.curr_section_hash.clone();

    if store.contains(&h_old) {
        store.rekey(&h_old, h_new.clone(), |block| {
            if h_old != h_new {
                block.text = added.to_string();
                block.user = curr.user.clone();
            }
            block.timestamp = curr.timestamp;
            block.revision_ids.push(RevisionId::Real(curr.id));
            block.root_hash = section.clone();
        });
    } else {
        let block = Block {
            text: added.to_string(),
            timestamp: curr.timestamp,
            user: curr.user.clone(),
            ingested: false,
            revision_ids: vec![RevisionId::Unknown, RevisionId::Real(curr.id)],
            reply_chain: vec![h_new.clone()],
            is_followed: false,
            is_header: false,
            root_hash: section,
        };
        store.insert(h_new.clone(), block);
    }

    state.last_hash = Some(h_new);
    state.last_depth = d;
    state.last_block_was_ingested = true;
}

fn apply_removal(store: &mut BlockStore, removed: &str) {
    if removed.is_empty() {
        return;
    }
    let h = fingerprint(removed);
    store.remove(&h);
}

fn apply_modification(
    store: &mut BlockStore,
    state: &mut ApplierState,
    curr: &RevisionMeta,
    old: &str,
    new: &str,
) {
    state.behavior.push(Behavior::Modify);
    let h_old = fingerprint(old);
    let h_new = fingerprint(new);
    let d = depth(new);

    if store.contains(&h_old) {
        let reply_chain = reply_chain_for_new(store, state, &h_new, d);
        store.rekey(&h_old, h_new.clone(), |block| {
            block.text = new.to_string();
            block.timestamp = curr.timestamp;
            block.user = curr.user.clone();
            block.revision_ids.push(RevisionId::Real(curr.id));
            block.ingested = true;
            block.reply_chain = reply_chain;
        });
    } else {
        let section = state.curr_section_hash.clone();
        let block = Block {
            text: new.to_string(),
            timestamp: curr.timestamp,
            user: curr.user.clone(),
            ingested: false,
            revision_ids: vec![RevisionId::Unknown, RevisionId::Real(curr.id)],
            reply_chain: vec![h_new.clone()],
            is_followed: false,
            is_header: false,
            root_hash: section,
        };
        store.insert(h_new.clone(), block);
    }

    state.last_hash = Some(h_new);
    state.last_depth = d;
    state.last_block_was_ingested = true;
}

/// Shared reply-chain computation for a newly added or re-edited comment
/// (§4.5 "Reply chain for a newly added comment").
fn reply_chain_for_new(
    store: &mut BlockStore,
    state: &mut ApplierState,
    h_new: &str,
    d: usize,
) -> Vec<String> {
    if state.last_block_was_ingested {
        if let Some(last_hash) = state.last_hash.clone() {
            let mut chain = store
                .get(&last_hash)
                .map(|b| b.reply_chain.clone())
                .unwrap_or_default();
            chain.push(h_new.to_string());
            if let Some(block) = store.get_mut(&last_hash) {
                block.is_followed = true;
            }
            return chain;
        }
    } else if let Some(last_hash) = state.last_hash.clone()
        && let Some(target) = reply_hash(store, &last_hash, state.last_depth, d)
    {
        let mut chain = store.get(&target).map(|b| b.reply_chain.clone()).unwrap_or_default();
        chain.push(h_new.to_string());
        return chain;
    }
    vec![h_new.to_string()]
}

/// Reply-target computation (§4.6): where does a comment at `this_depth`,
/// following a block at `prev_hash`/`prev_depth`, attach in the thread?
pub fn reply_hash(
    store: &mut BlockStore,
    prev_hash: &str,
    prev_depth: usize,
    this_depth: usize,
) -> Option<String> {
    if this_depth == 0 {
        return None;
    }
    let canon_prev = store.resolve(prev_hash)?;
    if this_depth > prev_depth {
        return Some(canon_prev);
    }

    let mut depth_remaining = prev_depth;
    let mut hash = canon_prev;
    while depth_remaining > this_depth {
        let chain = store.get(&hash)?.reply_chain.clone();
        if chain.len() < 2 {
            return None;
        }
        let parent_raw = chain[chain.len() - 2].clone();
        hash = store.resolve(&parent_raw)?;
        depth_remaining -= 1;
    }
    Some(hash)
}
