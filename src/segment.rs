//! Author-contiguous segmentation (§4.7): splitting a reply chain into the
//! maximal runs of same-author blocks that make up individual utterances.

use crate::block::BlockStore;

/// One maximal run of same-author blocks within a reply chain, given as
/// canonical hashes in chain order.
pub type Segment = Vec<String>;

/// Resolves every hash in `reply_chain` to canonical and partitions the
/// result into segments: maximal runs of blocks sharing the same author.
/// A section heading always starts (and ends) its own segment — it never
/// merges with the block before or after it, even when the same author
/// wrote both.
pub fn segment_reply_chain(store: &mut BlockStore, reply_chain: &[String]) -> Vec<Segment> {
    let canonical: Vec<String> = reply_chain
        .iter()
        .filter_map(|h| store.resolve(h))
        .collect();

    let mut segments: Vec<Segment> = Vec::new();
    let mut current: Segment = Vec::new();
    let mut current_user = None;
    let mut prev_was_header = false;

    for hash in canonical {
        let Some(block) = store.get(&hash) else {
            continue;
        };
        let user = block.user.clone();
        let is_header = block.is_header;
        let boundary = !current.is_empty()
            && (current_user.as_ref() != Some(&user) || is_header || prev_was_header);
        if boundary {
            segments.push(std::mem::take(&mut current));
        }
        current_user = Some(user);
        prev_was_header = is_header;
        current.push(hash);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}
