//! Per-statement read and write accesses.

use crate::extent::Extents;
use crate::ids::AccessId;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};

/// Access map keyed by ID, iterated in first-recorded order.
pub type AccessMap = IndexMap<AccessId, Extents, FxBuildHasher>;

/// Read and write extents of a single statement.
///
/// Repeated accesses to the same ID within a statement fold into one entry
/// via [`Extents::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accesses {
    reads: AccessMap,
    writes: AccessMap,
}

impl Accesses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&mut self, id: AccessId, extents: Extents) {
        record(&mut self.reads, id, extents);
    }

    pub fn record_write(&mut self, id: AccessId, extents: Extents) {
        record(&mut self.writes, id, extents);
    }

    pub fn read_accesses(&self) -> &AccessMap {
        &self.reads
    }

    pub fn write_accesses(&self) -> &AccessMap {
        &self.writes
    }

    pub fn read_access(&self, id: AccessId) -> Option<&Extents> {
        self.reads.get(&id)
    }

    pub fn write_access(&self, id: AccessId) -> Option<&Extents> {
        self.writes.get(&id)
    }

    pub fn has_read_access(&self, id: AccessId) -> bool {
        self.reads.contains_key(&id)
    }

    pub fn has_write_access(&self, id: AccessId) -> bool {
        self.writes.contains_key(&id)
    }

    pub fn has_access(&self, id: AccessId) -> bool {
        self.has_read_access(id) || self.has_write_access(id)
    }

    /// Envelope of the read and write extents of `id`, if accessed at all.
    pub fn access_extents(&self, id: AccessId) -> Option<Extents> {
        match (self.reads.get(&id), self.writes.get(&id)) {
            (Some(r), Some(w)) => Some(r.merged(w)),
            (Some(e), None) | (None, Some(e)) => Some(*e),
            (None, None) => None,
        }
    }

    /// Folds all accesses of `other` into `self`.
    pub fn merge(&mut self, other: &Accesses) {
        for (id, extents) in &other.reads {
            self.record_read(*id, *extents);
        }
        for (id, extents) in &other.writes {
            self.record_write(*id, *extents);
        }
    }

    /// Re-keys every access whose ID appears in `mapping`, keeping order.
    pub fn rename(&mut self, mapping: &FxHashMap<AccessId, AccessId>) {
        self.reads = renamed(&self.reads, mapping);
        self.writes = renamed(&self.writes, mapping);
    }

    pub fn clear(&mut self) {
        self.reads.clear();
        self.writes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }
}

fn record(map: &mut AccessMap, id: AccessId, extents: Extents) {
    map.entry(id)
        .and_modify(|existing| existing.merge(&extents))
        .or_insert(extents);
}

fn renamed(map: &AccessMap, mapping: &FxHashMap<AccessId, AccessId>) -> AccessMap {
    let mut out = AccessMap::default();
    for (id, extents) in map {
        record(&mut out, mapping.get(id).copied().unwrap_or(*id), *extents);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_reads_fold_into_envelope() {
        let mut acc = Accesses::new();
        let u = AccessId(1);
        acc.record_read(u, Extents::from_offset([1, 0, 0]));
        acc.record_read(u, Extents::from_offset([-1, 0, 0]));
        assert_eq!(acc.read_accesses().len(), 1);
        assert_eq!(
            acc.read_access(u),
            Some(&Extents::new((-1, 1), (0, 0), (0, 0)))
        );
    }

    #[test]
    fn test_reads_and_writes_are_separate() {
        let mut acc = Accesses::new();
        let u = AccessId(1);
        acc.record_write(u, Extents::zero());
        assert!(acc.has_write_access(u));
        assert!(!acc.has_read_access(u));
        acc.record_read(u, Extents::from_offset([0, 0, 1]));
        assert_eq!(
            acc.access_extents(u),
            Some(Extents::new((0, 0), (0, 0), (0, 1)))
        );
        assert_eq!(acc.access_extents(AccessId(2)), None);
    }

    #[test]
    fn test_merge() {
        let mut a = Accesses::new();
        a.record_read(AccessId(1), Extents::zero());
        let mut b = Accesses::new();
        b.record_read(AccessId(1), Extents::from_offset([0, 2, 0]));
        b.record_write(AccessId(2), Extents::zero());
        a.merge(&b);
        assert_eq!(
            a.read_access(AccessId(1)),
            Some(&Extents::new((0, 0), (0, 2), (0, 0)))
        );
        assert!(a.has_write_access(AccessId(2)));
    }

    #[test]
    fn test_rename_rekeys_mapped_ids_only() {
        let mut acc = Accesses::new();
        acc.record_read(AccessId(-3), Extents::zero());
        acc.record_read(AccessId(1), Extents::from_offset([0, 0, 1]));
        acc.record_write(AccessId(4), Extents::zero());

        let mapping = FxHashMap::from_iter([(AccessId(-3), AccessId(-9)), (AccessId(4), AccessId(7))]);
        acc.rename(&mapping);

        assert!(acc.has_read_access(AccessId(-9)));
        assert!(!acc.has_read_access(AccessId(-3)));
        assert_eq!(acc.read_access(AccessId(1)), Some(&Extents::from_offset([0, 0, 1])));
        assert!(acc.has_write_access(AccessId(7)));
        assert!(!acc.has_write_access(AccessId(4)));
    }
}
