//! Persistent world-state snapshots.
//!
//! A [Snapshot] is an immutable map from [Key] to encoded value. Producing a successor
//! never touches the predecessor: each successor is a thin layer of writes pointing at its
//! parent through an [Arc], so snapshots are cheap to clone and safe to keep around for
//! replay and rollback. Chains are flattened into a single base layer once they grow past
//! [MAX_LAYERS] so that reads stay bounded.

use bytes::{Buf, BufMut, Bytes};
use commonware_codec::{Encode, EncodeSize, Error, Read, ReadExt, Write};
use commonware_cryptography::{
    sha256::{Digest, Sha256},
    Hasher,
};
use std::{collections::BTreeMap, sync::Arc};
use worldline_types::{
    address::Address,
    codec::{read_bytes, write_bytes},
    key::{Account, Key},
};

/// Layers kept before a snapshot is flattened.
pub const MAX_LAYERS: usize = 32;

/// Largest value accepted when decoding a [Status].
pub const MAX_VALUE_LEN: usize = 1 << 20;

/// Read access to world state.
pub trait State {
    fn get(&self, key: &Key) -> Option<Bytes>;

    fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Look up `(account, address)` and fall back to the flat legacy key when it is empty.
    fn get_or_legacy(&self, account: Account, address: Address) -> Option<Located> {
        if let Some(value) = self.get(&Key::new(account, address)) {
            return Some(Located::Current(value));
        }
        self.get(&Key::legacy(address)).map(Located::Legacy)
    }
}

/// Where a value was found by [State::get_or_legacy].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Located {
    Current(Bytes),
    Legacy(Bytes),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Update(Bytes),
    Delete,
}

impl Write for Status {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Status::Update(value) => {
                0u8.write(writer);
                write_bytes(value, writer);
            }
            Status::Delete => 1u8.write(writer),
        }
    }
}

impl Read for Status {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Status::Update(Bytes::from(read_bytes(reader, MAX_VALUE_LEN)?))),
            1 => Ok(Status::Delete),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Status {
    fn encode_size(&self) -> usize {
        1 + match self {
            Status::Update(value) => 4 + value.len(),
            Status::Delete => 0,
        }
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<Arc<Node>>,
    writes: BTreeMap<Key, Status>,
    depth: usize,
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    head: Arc<Node>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            head: Arc::new(Node {
                parent: None,
                writes: BTreeMap::new(),
                depth: 0,
            }),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (Key, Bytes)>) -> Self {
        Self::empty().apply(
            entries
                .into_iter()
                .map(|(key, value)| (key, Status::Update(value)))
                .collect(),
        )
    }

    pub fn get(&self, key: &Key) -> Option<Bytes> {
        let mut node = Some(&self.head);
        while let Some(current) = node {
            match current.writes.get(key) {
                Some(Status::Update(value)) => return Some(value.clone()),
                Some(Status::Delete) => return None,
                None => node = current.parent.as_ref(),
            }
        }
        None
    }

    pub fn set(&self, key: Key, value: Bytes) -> Self {
        self.apply(vec![(key, Status::Update(value))])
    }

    /// Apply a writeset atomically, returning the successor snapshot.
    ///
    /// Later entries for the same key win.
    pub fn apply(&self, changes: Vec<(Key, Status)>) -> Self {
        if changes.is_empty() {
            return self.clone();
        }
        let writes: BTreeMap<Key, Status> = changes.into_iter().collect();
        let depth = self.head.depth + 1;
        if depth <= MAX_LAYERS {
            return Self {
                head: Arc::new(Node {
                    parent: Some(self.head.clone()),
                    writes,
                    depth,
                }),
            };
        }

        let mut merged = self.entries();
        for (key, status) in writes {
            match status {
                Status::Update(value) => {
                    merged.insert(key, value);
                }
                Status::Delete => {
                    merged.remove(&key);
                }
            }
        }
        Self {
            head: Arc::new(Node {
                parent: None,
                writes: merged
                    .into_iter()
                    .map(|(key, value)| (key, Status::Update(value)))
                    .collect(),
                depth: 0,
            }),
        }
    }

    /// Every live entry in key order.
    pub fn entries(&self) -> BTreeMap<Key, Bytes> {
        let mut chain = Vec::new();
        let mut node = Some(&self.head);
        while let Some(current) = node {
            chain.push(current);
            node = current.parent.as_ref();
        }

        let mut merged = BTreeMap::new();
        for current in chain.into_iter().rev() {
            for (key, status) in &current.writes {
                match status {
                    Status::Update(value) => {
                        merged.insert(key.clone(), value.clone());
                    }
                    Status::Delete => {
                        merged.remove(key);
                    }
                }
            }
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commitment to the full contents of the snapshot.
    pub fn root(&self) -> Digest {
        let mut hasher = Sha256::new();
        for (key, value) in self.entries() {
            hasher.update(&key.encode());
            let mut encoded = Vec::with_capacity(4 + value.len());
            write_bytes(&value, &mut encoded);
            hasher.update(&encoded);
        }
        hasher.finalize()
    }

    pub fn layers(&self) -> usize {
        self.head.depth
    }
}

impl State for Snapshot {
    fn get(&self, key: &Key) -> Option<Bytes> {
        Snapshot::get(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::DecodeExt;

    fn key(account: Account, byte: u8) -> Key {
        Key::new(account, Address::new([byte; 32]))
    }

    #[test]
    fn successors_leave_predecessors_untouched() {
        let base = Snapshot::empty().set(key(Account::Agent, 1), Bytes::from_static(b"a"));
        let next = base.apply(vec![
            (key(Account::Agent, 1), Status::Delete),
            (key(Account::Agent, 2), Status::Update(Bytes::from_static(b"b"))),
        ]);

        assert_eq!(base.get(&key(Account::Agent, 1)), Some(Bytes::from_static(b"a")));
        assert_eq!(base.get(&key(Account::Agent, 2)), None);
        assert_eq!(next.get(&key(Account::Agent, 1)), None);
        assert_eq!(next.get(&key(Account::Agent, 2)), Some(Bytes::from_static(b"b")));
    }

    #[test]
    fn empty_writeset_is_identity() {
        let base = Snapshot::empty().set(key(Account::Avatar, 1), Bytes::from_static(b"x"));
        let next = base.apply(Vec::new());
        assert_eq!(next.layers(), base.layers());
        assert_eq!(next.root(), base.root());
    }

    #[test]
    fn flattening_preserves_contents_and_history() {
        let mut snapshots = vec![Snapshot::empty()];
        for i in 0..(MAX_LAYERS as u8 * 2) {
            let mut changes = vec![(
                key(Account::Inventory, i),
                Status::Update(Bytes::from(vec![i])),
            )];
            if i % 3 == 0 && i > 0 {
                changes.push((key(Account::Inventory, i - 1), Status::Delete));
            }
            let next = snapshots.last().unwrap().apply(changes);
            snapshots.push(next);
        }

        let last = snapshots.last().unwrap();
        assert!(last.layers() <= MAX_LAYERS);
        assert_eq!(last.get(&key(Account::Inventory, 5)), None);
        assert_eq!(
            last.get(&key(Account::Inventory, 4)),
            Some(Bytes::from(vec![4u8]))
        );

        // Early snapshots still see their own view.
        assert_eq!(snapshots[3].len(), 3);
        assert_eq!(
            snapshots[6].get(&key(Account::Inventory, 2)),
            None,
            "deleted at step 3"
        );
    }

    #[test]
    fn root_depends_only_on_contents() {
        let a = Snapshot::empty()
            .set(key(Account::Agent, 1), Bytes::from_static(b"1"))
            .set(key(Account::Agent, 2), Bytes::from_static(b"2"));
        let b = Snapshot::from_entries(vec![
            (key(Account::Agent, 2), Bytes::from_static(b"2")),
            (key(Account::Agent, 1), Bytes::from_static(b"1")),
        ]);
        assert_eq!(a.root(), b.root());
        assert_eq!(a.entries(), b.entries());

        let c = b.set(key(Account::Agent, 1), Bytes::from_static(b"3"));
        assert_ne!(a.root(), c.root());
    }

    #[test]
    fn get_or_legacy_prefers_current_account() {
        let address = Address::new([9u8; 32]);
        let legacy_only = Snapshot::empty().set(Key::legacy(address), Bytes::from_static(b"old"));
        assert_eq!(
            legacy_only.get_or_legacy(Account::Avatar, address),
            Some(Located::Legacy(Bytes::from_static(b"old")))
        );

        let both = legacy_only.set(Key::new(Account::Avatar, address), Bytes::from_static(b"new"));
        assert_eq!(
            both.get_or_legacy(Account::Avatar, address),
            Some(Located::Current(Bytes::from_static(b"new")))
        );
        assert_eq!(Snapshot::empty().get_or_legacy(Account::Avatar, address), None);
    }

    #[test]
    fn status_codec() {
        for status in [Status::Update(Bytes::from_static(b"value")), Status::Delete] {
            let encoded = status.encode();
            assert_eq!(encoded.len(), status.encode_size());
            assert_eq!(Status::decode(encoded).unwrap(), status);
        }
    }
}
