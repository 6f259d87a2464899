//! Symbol interning.
//!
//! Names are hashed with the runtime's content hash; the 64-bit hash is the
//! key of a [`RobinHoodTable`] (mixed once more with SplitMix64 to pick the
//! slot) whose value is the sequential [`SymbolId`]. Two different names
//! whose content hashes collide are kept apart by probing the next key.
//!
//! Interned names live as long as the table.

use crate::hash::{content_hash, splitmix64};
use crate::table::{Insert, RobinHoodTable};
use crate::{RtResult, RuntimeError};

/// Interned name handle. Ids are dense, starting at 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        SymbolId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn table_hash(self) -> u64 {
        splitmix64(u64::from(self.0))
    }
}

/// Name to id mapping with reverse lookup.
#[derive(Debug)]
pub struct SymbolTable {
    index: RobinHoodTable<u64, SymbolId>,
    names: Vec<Box<str>>,
    seed: u64,
}

impl SymbolTable {
    pub fn new(seed: u64) -> Self {
        SymbolTable {
            index: RobinHoodTable::new(),
            names: Vec::new(),
            seed,
        }
    }

    /// Id of `name`, interning it on first sight.
    pub fn intern(&mut self, name: &str) -> RtResult<SymbolId> {
        let key = match self.probe(name) {
            Ok(id) => return Ok(id),
            Err(free_key) => free_key,
        };

        let count = self.names.len();
        let id = u32::try_from(count).map_err(|_| RuntimeError::SymbolTableFull { count })?;
        let id = SymbolId(id);
        let inserted = self.index.insert(splitmix64(key), key, id, |a, b| a == b);
        debug_assert!(matches!(inserted, Insert::Inserted));
        self.names.push(name.into());

        tracing::trace!(symbol = name, id = id.0, "interned");
        Ok(id)
    }

    /// Id of `name` if already interned.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.probe(name).ok()
    }

    /// Walk the key chain for `name`: the id if found, else the first free key.
    fn probe(&self, name: &str) -> Result<SymbolId, u64> {
        #[expect(clippy::cast_sign_loss, reason = "hash bit pattern")]
        let mut key = content_hash(self.seed, name.as_bytes()) as u64;
        loop {
            match self.index.get(splitmix64(key), |k| *k == key) {
                Some(&id) if *self.names[id.0 as usize] == *name => return Ok(id),
                Some(_) => key = key.wrapping_add(1),
                None => return Err(key),
            }
        }
    }

    /// Name behind `id`.
    pub fn resolve(&self, id: SymbolId) -> Option<&str> {
        self.names.get(id.0 as usize).map(|name| &**name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn intern_with_key(&mut self, name: &str, key: u64) -> SymbolId {
        let id = SymbolId(self.names.len() as u32);
        self.index.insert(splitmix64(key), key, id, |a, b| a == b);
        self.names.push(name.into());
        id
    }
}
