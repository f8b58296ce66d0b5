//! The content-addressed block store (§3, §4.3).

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Revision identifiers as they come from the wiki, plus the `unknown`
/// sentinel for blocks that pre-date tracking.
///
/// Serializes as a bare number for `Real`, or the string `"unknown"` for the
/// sentinel — `#[serde(untagged)]` over two unit-ish variants would collapse
/// both to JSON `null` and make them indistinguishable on reload, so this is
/// a hand-written tagged mapping instead (§9: sentinels serialize to those
/// strings only at the persistence boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevisionId {
    Unknown,
    Real(u64),
}

impl RevisionId {
    pub fn as_real(&self) -> Option<u64> {
        match self {
            RevisionId::Real(id) => Some(*id),
            RevisionId::Unknown => None,
        }
    }
}

impl Serialize for RevisionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RevisionId::Unknown => serializer.serialize_str("unknown"),
            RevisionId::Real(id) => serializer.serialize_u64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for RevisionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(u64),
            Str(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Num(id) => Ok(RevisionId::Real(id)),
            Repr::Str(s) if s == "unknown" => Ok(RevisionId::Unknown),
            Repr::Str(s) => Err(D::Error::custom(format!("unrecognized revision id {s:?}"))),
        }
    }
}

/// The author of a block's current form.
///
/// Serializes as a plain string: the author's name for `Named`, or the
/// literal sentinel `"userhidden"`/`"unknown"` for the other two — see
/// [`RevisionId`]'s doc comment for why this isn't `#[serde(untagged)]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum User {
    /// The wiki suppressed the revision's author.
    Hidden,
    Named(String),
    /// The block pre-existed tracking; no author is known.
    Unknown,
}

impl User {
    pub fn named(name: impl Into<String>) -> Self {
        User::Named(name.into())
    }
}

impl Serialize for User {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            User::Hidden => serializer.serialize_str("userhidden"),
            User::Unknown => serializer.serialize_str("unknown"),
            User::Named(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "userhidden" => User::Hidden,
            "unknown" => User::Unknown,
            _ => User::Named(s),
        })
    }
}

/// One atomic unit of content: a paragraph, heading, or signed comment line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub text: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub user: User,
    pub ingested: bool,
    pub revision_ids: Vec<RevisionId>,
    pub reply_chain: Vec<String>,
    #[serde(default)]
    pub is_followed: bool,
    #[serde(default)]
    pub is_header: bool,
    pub root_hash: Option<String>,
}

/// Content-addressed mapping from hash to block, plus the hash-alias chain
/// that lets stale references to a rekeyed or moved block find its current
/// key.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BlockStore {
    blocks: HashMap<String, Block>,
    alias: HashMap<String, String>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hash: &str) -> Option<&Block> {
        self.blocks.get(hash)
    }

    pub fn get_mut(&mut self, hash: &str) -> Option<&mut Block> {
        self.blocks.get_mut(hash)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.blocks.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Block)> {
        self.blocks.iter()
    }

    /// Inserts `block` under `hash`. The caller guarantees
    /// `hash == fingerprint(block.text)`.
    pub fn insert(&mut self, hash: impl Into<String>, block: Block) {
        let hash = hash.into();
        self.alias.insert(hash.clone(), hash.clone());
        self.blocks.insert(hash, block);
    }

    /// Removes a block and its alias entry. Stale references resolve to
    /// nothing afterward.
    pub fn remove(&mut self, hash: &str) {
        self.blocks.remove(hash);
        self.alias.remove(hash);
    }

    /// Removes `old`, runs `mutator` over the block to produce its new form,
    /// inserts it under `new`, and points `old` at `new` in the alias map so
    /// dangling references catch up.
    pub fn rekey(&mut self, old: &str, new: impl Into<String>, mutator: impl FnOnce(&mut Block)) {
        let new = new.into();
        if let Some(mut block) = self.blocks.remove(old) {
            mutator(&mut block);
            self.alias.insert(old.to_string(), new.clone());
            self.alias.insert(new.clone(), new.clone());
            self.blocks.insert(new, block);
        }
    }

    /// Walks the alias map to the canonical hash, compressing the path it
    /// walked so future lookups are O(1).
    pub fn resolve(&mut self, hash: &str) -> Option<String> {
        let mut path = Vec::new();
        let mut curr = hash.to_string();
        loop {
            match self.alias.get(&curr) {
                None => return None,
                Some(next) if *next == curr => break,
                Some(next) => {
                    path.push(curr.clone());
                    curr = next.clone();
                }
            }
        }
        for node in path {
            self.alias.insert(node, curr.clone());
        }
        Some(curr)
    }

    /// Read-only canonicalization; does not compress paths (use [`resolve`]
    /// when the caller has `&mut self`).
    pub fn resolve_ref(&self, hash: &str) -> Option<String> {
        let mut curr = hash.to_string();
        let mut seen = std::collections::HashSet::new();
        loop {
            if !seen.insert(curr.clone()) {
                return None; // cycle guard; invariants forbid this in practice
            }
            match self.alias.get(&curr) {
                None => return None,
                Some(next) if *next == curr => return Some(curr),
                Some(next) => curr = next.clone(),
            }
        }
    }

    pub fn canonical_block(&mut self, hash: &str) -> Option<(String, &Block)> {
        let canon = self.resolve(hash)?;
        self.blocks.get(&canon).map(|b| (canon.clone(), b))
    }

    /// Reconstructs a store from its persisted parts (§6 "Persisted
    /// intermediate format"). Used only at the load boundary.
    pub fn from_parts(blocks: HashMap<String, Block>, alias: HashMap<String, String>) -> Self {
        Self { blocks, alias }
    }

    /// Snapshots the store's parts for persistence. Used only at the save
    /// boundary.
    pub fn to_parts(&self) -> (&HashMap<String, Block>, &HashMap<String, String>) {
        (&self.blocks, &self.alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn block(text: &str) -> Block {
        Block {
            text: text.to_string(),
            timestamp: Utc::now(),
            user: User::Unknown,
            ingested: false,
            revision_ids: vec![RevisionId::Unknown],
            reply_chain: vec!["h".to_string()],
            is_followed: false,
            is_header: false,
            root_hash: None,
        }
    }

    #[test]
    fn insert_makes_hash_resolve_to_itself() {
        let mut store = BlockStore::new();
        store.insert("h1", block("hello"));
        assert_eq!(store.resolve("h1").as_deref(), Some("h1"));
    }

    #[test]
    fn rekey_points_old_hash_at_new_one() {
        let mut store = BlockStore::new();
        store.insert("old", block("hello"));
        store.rekey("old", "new", |b| b.text = "hello, world".to_string());
        assert!(!store.contains("old"));
        assert!(store.contains("new"));
        assert_eq!(store.resolve("old").as_deref(), Some("new"));
        assert_eq!(store.resolve("new").as_deref(), Some("new"));
    }

    #[test]
    fn chained_rekeys_compress_to_latest() {
        let mut store = BlockStore::new();
        store.insert("a", block("1"));
        store.rekey("a", "b", |_| {});
        store.rekey("b", "c", |_| {});
        assert_eq!(store.resolve("a").as_deref(), Some("c"));
    }

    #[test]
    fn remove_drops_alias_and_resolution_fails() {
        let mut store = BlockStore::new();
        store.insert("h1", block("hello"));
        store.remove("h1");
        assert_eq!(store.resolve("h1"), None);
    }

    #[test]
    fn resolve_of_unknown_hash_is_none() {
        let mut store = BlockStore::new();
        assert_eq!(store.resolve("nope"), None);
    }

    #[test]
    fn user_sentinels_serialize_to_distinct_strings() {
        assert_eq!(serde_json::to_string(&User::Unknown).unwrap(), "\"unknown\"");
        assert_eq!(serde_json::to_string(&User::Hidden).unwrap(), "\"userhidden\"");
        assert_eq!(
            serde_json::to_string(&User::named("alice")).unwrap(),
            "\"alice\""
        );
    }

    #[test]
    fn user_sentinels_round_trip_without_collapsing() {
        for user in [User::Unknown, User::Hidden, User::named("alice")] {
            let json = serde_json::to_string(&user).unwrap();
            let back: User = serde_json::from_str(&json).unwrap();
            assert_eq!(back, user);
        }
    }

    #[test]
    fn revision_id_sentinel_round_trips_distinct_from_real_ids() {
        for id in [RevisionId::Unknown, RevisionId::Real(42)] {
            let json = serde_json::to_string(&id).unwrap();
            let back: RevisionId = serde_json::from_str(&json).unwrap();
            assert_eq!(back, id);
        }
        assert_eq!(
            serde_json::to_string(&RevisionId::Unknown).unwrap(),
            "\"unknown\""
        );
        assert_eq!(serde_json::to_string(&RevisionId::Real(7)).unwrap(), "7");
    }
}
