//! The corpus assembler (§4.8, §4.9): folding blocks into utterances, either
//! with reply structure derived from segments ("structured") or with replies
//! inferred from chronological order within a section ("rough").

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::block::{BlockStore, RevisionId, User};
use crate::segment::{segment_reply_chain, Segment};

/// One conversational turn: one or more blocks posted by one author in
/// sequence, with a single reply target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub id: String,
    pub user: User,
    pub root: Option<String>,
    pub reply_to: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub text: String,
    pub meta: UtteranceMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtteranceMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constituent_blocks: Option<Vec<String>>,
    pub last_revision: u64,
}

/// The assembled corpus: an unordered set of utterances plus a reverse
/// index from block hash to the utterance it belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    pub utterances: Vec<Utterance>,
    pub reverse_block_index: HashMap<String, String>,
}

fn last_real_revision(revision_ids: &[RevisionId]) -> u64 {
    match revision_ids.last() {
        Some(RevisionId::Real(id)) => *id,
        _ => 0,
    }
}

/// A segment together with the information needed to synthesize its
/// utterance: its position among the segments of the chain it came from,
/// and that chain's full segment list (for reply-target lookups).
struct CompleteUtterance {
    segment: Segment,
    reply_to: Option<String>,
}

/// Computes, for every block, the complete utterances its own reply chain
/// yields (§4.8 first half, shared by both assembly modes).
fn collect_complete_utterances(store: &mut BlockStore) -> Vec<CompleteUtterance> {
    let hashes: Vec<String> = store.iter().map(|(h, _)| h.clone()).collect();
    let mut seen_keys = HashSet::new();
    let mut result = Vec::new();

    for hash in hashes {
        let Some(block) = store.get(&hash) else {
            continue;
        };
        let reply_chain = block.reply_chain.clone();
        let is_header = block.is_header;
        let segments = segment_reply_chain(store, &reply_chain);
        if segments.is_empty() {
            continue;
        }
        let Some(last_segment) = segments.last() else {
            continue;
        };
        let Some(tail_hash) = last_segment.last() else {
            continue;
        };
        if *tail_hash != hash {
            // This block's reply_chain didn't resolve back to itself; the
            // evidence for this thread position is inconsistent, skip it.
            debug!(%hash, "skipping block whose reply chain does not end at itself");
            continue;
        }
        let tail_is_followed = store.get(tail_hash).map(|b| b.is_followed).unwrap_or(false);

        for (i, segment) in segments.iter().enumerate() {
            let is_last = i == segments.len() - 1;
            let complete = !is_last || is_header || !tail_is_followed;
            if !complete {
                continue;
            }
            let key = segment.join(" ");
            if !seen_keys.insert(key) {
                continue;
            }
            let reply_to = if i > 0 {
                segments[i - 1].first().cloned()
            } else {
                None
            };
            result.push(CompleteUtterance {
                segment: segment.clone(),
                reply_to,
            });
        }
    }

    result
}

fn synthesize(
    store: &mut BlockStore,
    complete: CompleteUtterance,
    include_reply_to: bool,
    include_constituents: bool,
) -> Option<(Utterance, Vec<String>)> {
    let id = complete.segment.first()?.clone();
    let first_block = store.get(&id)?;
    let user = first_block.user.clone();
    let timestamp = first_block.timestamp;
    let root = first_block
        .root_hash
        .clone()
        .and_then(|r| store.resolve_ref(&r));
    let last_revision = last_real_revision(&first_block.revision_ids);

    let mut lines = Vec::with_capacity(complete.segment.len());
    for hash in &complete.segment {
        lines.push(store.get(hash)?.text.clone());
    }
    let text = lines.join("\n");

    let utterance = Utterance {
        id: id.clone(),
        user,
        root,
        reply_to: if include_reply_to { complete.reply_to } else { None },
        timestamp,
        text,
        meta: UtteranceMeta {
            constituent_blocks: include_constituents.then(|| complete.segment.clone()),
            last_revision,
        },
    };
    Some((utterance, complete.segment))
}

/// Structured assembly (§4.8): `reply_to` comes straight from the segment
/// structure of each block's own reply chain.
pub fn assemble_structured(store: &mut BlockStore) -> Corpus {
    let complete = collect_complete_utterances(store);
    let mut utterances = Vec::new();
    let mut reverse_block_index = HashMap::new();

    for c in complete {
        match synthesize(store, c, true, true) {
            Some((utterance, hashes)) => {
                for h in hashes {
                    reverse_block_index.insert(h, utterance.id.clone());
                }
                utterances.push(utterance);
            }
            None => warn!("skipping utterance: constituent block missing from store"),
        }
    }

    Corpus {
        utterances,
        reverse_block_index,
    }
}

/// Rough assembly (§4.9): same utterance synthesis, but `reply_to` is
/// discarded and recomputed from chronological order within each section.
pub fn assemble_rough(store: &mut BlockStore) -> Corpus {
    let complete = collect_complete_utterances(store);
    let mut synthesized = Vec::new();
    for c in complete {
        if let Some((utterance, hashes)) = synthesize(store, c, false, false) {
            synthesized.push((utterance, hashes));
        } else {
            warn!("skipping utterance: constituent block missing from store");
        }
    }

    let mut by_root: HashMap<String, Vec<(Utterance, Vec<String>)>> = HashMap::new();
    for (utterance, hashes) in synthesized {
        let Some(root) = utterance.root.clone() else {
            continue; // utterances with no root are discarded
        };
        by_root.entry(root).or_default().push((utterance, hashes));
    }

    let mut utterances = Vec::new();
    let mut reverse_block_index = HashMap::new();

    for (root, mut group) in by_root {
        group.sort_by_key(|(u, _)| u.timestamp);

        let Some(header_pos) = group.iter().position(|(u, _)| u.id == root) else {
            warn!(%root, "skipping section: no header utterance found");
            continue;
        };
        if header_pos > 0 {
            let header = group.remove(header_pos);
            group.insert(0, header);
        }

        let mut added = HashSet::new();
        let (first, first_hashes) = &group[0];
        added.insert(first.id.clone());
        for h in first_hashes {
            reverse_block_index.insert(h.clone(), first.id.clone());
        }
        utterances.push(first.clone());

        let mut i = 0usize;
        let mut j = 1usize;
        while j < group.len() {
            if !added.contains(&group[j].0.id) {
                let prev_id = group[i].0.id.clone();
                group[j].0.reply_to = Some(prev_id);
                added.insert(group[j].0.id.clone());
                for h in &group[j].1 {
                    reverse_block_index.insert(h.clone(), group[j].0.id.clone());
                }
                utterances.push(group[j].0.clone());
                i = j;
            }
            j += 1;
        }
    }

    Corpus {
        utterances,
        reverse_block_index,
    }
}
