//! Access ID registry: allocation and classification of every named entity
//! referenced by the statements of a stencil.
//!
//! Classification is kept in a single table keyed by [`AccessId`], so the
//! partitions (literals, fields, variables, temporaries) are mutually
//! exclusive by construction. Literals are additionally recognisable by
//! their strictly negative IDs; every literal *occurrence* gets its own ID.
//!
//! Field multi-versioning (renaming a reassigned field to break loop-carried
//! dependencies) is tracked separately in [`VariableVersions`].

use crate::error::{IirError, Result};
use crate::ids::{AccessId, IdGenerator};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::sync::Arc;

/// Kind of entity an access ID refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldAccessType {
    /// A global variable (not a field with grid dimensionality).
    GlobalVariable,
    /// A literal that is not stored in memory.
    Literal,
    LocalVariable,
    StencilTemporary,
    InterStencilTemporary,
    Field,
    APIField,
}

impl FieldAccessType {
    /// Fields declared by the user or the API.
    pub fn is_user_field(self) -> bool {
        matches!(self, FieldAccessType::Field | FieldAccessType::APIField)
    }

    pub fn is_temporary(self) -> bool {
        matches!(
            self,
            FieldAccessType::StencilTemporary | FieldAccessType::InterStencilTemporary
        )
    }

    /// Anything backed by a storage with grid dimensionality.
    pub fn is_field_like(self) -> bool {
        self.is_user_field() || self.is_temporary()
    }
}

impl std::fmt::Display for FieldAccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldAccessType::GlobalVariable => "GlobalVariable",
            FieldAccessType::Literal => "Literal",
            FieldAccessType::LocalVariable => "LocalVariable",
            FieldAccessType::StencilTemporary => "StencilTemporary",
            FieldAccessType::InterStencilTemporary => "InterStencilTemporary",
            FieldAccessType::Field => "Field",
            FieldAccessType::APIField => "APIField",
        };
        f.write_str(name)
    }
}

/// Resolves access IDs to human readable names for dumps.
pub trait AccessNameResolver {
    fn access_name(&self, id: AccessId) -> Option<&str>;
}

/// Version lists of multi-versioned fields and variables.
///
/// The index of an ID inside its version list is its version number.
#[derive(Debug, Clone, Default)]
pub struct VariableVersions {
    versions: FxHashMap<AccessId, Vec<AccessId>>,
    version_to_original: FxHashMap<AccessId, AccessId>,
}

impl VariableVersions {
    pub fn insert(&mut self, original: AccessId, versions: Vec<AccessId>) -> Result<()> {
        if self.version_to_original.contains_key(&original) {
            return Err(IirError::VersionConflict(original));
        }
        for version in &versions {
            let taken = *version == original
                || self
                    .version_to_original
                    .get(version)
                    .is_some_and(|owner| *owner != original);
            if taken {
                return Err(IirError::VersionConflict(*version));
            }
        }
        for version in &versions {
            self.version_to_original.insert(*version, original);
        }
        self.versions.entry(original).or_default().extend(versions);
        Ok(())
    }

    pub fn has_multiple_versions(&self, id: AccessId) -> bool {
        self.versions.contains_key(&id)
    }

    pub fn versions_of(&self, id: AccessId) -> Option<&[AccessId]> {
        self.versions.get(&id).map(|v| v.as_slice())
    }

    pub fn is_version(&self, id: AccessId) -> bool {
        self.version_to_original.contains_key(&id)
    }

    pub fn original_of(&self, id: AccessId) -> Result<AccessId> {
        self.version_to_original
            .get(&id)
            .copied()
            .ok_or(IirError::NotAVersion(id))
    }

    pub fn version_ids(&self) -> impl Iterator<Item = AccessId> + '_ {
        self.version_to_original.keys().copied()
    }

    fn remove(&mut self, id: AccessId) {
        if let Some(versions) = self.versions.remove(&id) {
            for version in versions {
                self.version_to_original.remove(&version);
            }
        }
        if let Some(original) = self.version_to_original.remove(&id) {
            if let Some(list) = self.versions.get_mut(&original) {
                list.retain(|v| *v != id);
            }
        }
    }
}

/// Registry of every access ID of one compilation unit.
#[derive(Debug)]
pub struct AccessMetadata {
    ids: Arc<IdGenerator>,
    kinds: FxHashMap<AccessId, FieldAccessType>,
    /// Names of all entities. For literals this is the textual value.
    names: FxHashMap<AccessId, String>,
    /// Ordered IDs of the fields of the user API call.
    api_field_ids: Vec<AccessId>,
    versions: VariableVersions,
    /// Temporaries whose last referencing do-method may have been destroyed.
    flagged_temporaries: FxHashSet<AccessId>,
}

impl AccessMetadata {
    pub fn new(ids: Arc<IdGenerator>) -> Self {
        AccessMetadata {
            ids,
            kinds: FxHashMap::default(),
            names: FxHashMap::default(),
            api_field_ids: Vec::new(),
            versions: VariableVersions::default(),
            flagged_temporaries: FxHashSet::default(),
        }
    }

    pub fn id_generator(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    /// Allocates and classifies a fresh access ID. Only `Literal` receives a
    /// negative ID.
    pub fn new_access_id(&mut self, kind: FieldAccessType, name: impl Into<String>) -> AccessId {
        let id = match kind {
            FieldAccessType::Literal => self.ids.next_literal_id(),
            _ => self.ids.next_access_id(),
        };
        self.kinds.insert(id, kind);
        self.names.insert(id, name.into());
        if kind == FieldAccessType::APIField {
            self.api_field_ids.push(id);
        }
        id
    }

    pub fn classify(&self, id: AccessId) -> Result<FieldAccessType> {
        self.kinds
            .get(&id)
            .copied()
            .ok_or(IirError::UnknownAccessId(id))
    }

    pub fn is_access_type(&self, kind: FieldAccessType, id: AccessId) -> bool {
        self.kinds.get(&id) == Some(&kind)
    }

    pub fn is_registered(&self, id: AccessId) -> bool {
        self.kinds.contains_key(&id)
    }

    /// Whether `id` takes part in do-method field accumulation.
    pub fn is_accumulated_field(&self, id: AccessId, include_temporaries: bool) -> bool {
        match self.kinds.get(&id) {
            Some(kind) if kind.is_user_field() => true,
            Some(kind) => include_temporaries && kind.is_temporary(),
            None => false,
        }
    }

    pub fn name_of(&self, id: AccessId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// First registered ID of the given kind carrying `name`.
    pub fn lookup(&self, kind: FieldAccessType, name: &str) -> Option<AccessId> {
        self.names
            .iter()
            .filter(|(id, n)| n.as_str() == name && self.kinds.get(*id) == Some(&kind))
            .map(|(id, _)| *id)
            .min()
    }

    pub fn api_field_ids(&self) -> &[AccessId] {
        &self.api_field_ids
    }

    /// All IDs of a given kind, sorted.
    pub fn ids_of_kind(&self, kind: FieldAccessType) -> Vec<AccessId> {
        let mut ids: Vec<_> = self
            .kinds
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn register_versions(&mut self, original: AccessId, versions: Vec<AccessId>) -> Result<()> {
        self.versions.insert(original, versions)
    }

    pub fn is_version(&self, id: AccessId) -> bool {
        self.versions.is_version(id)
    }

    pub fn original_version_of(&self, id: AccessId) -> Result<AccessId> {
        self.versions.original_of(id)
    }

    pub fn versions(&self) -> &VariableVersions {
        &self.versions
    }

    /// Removes a literal occurrence. Returns false if `id` is not a literal.
    pub fn remove_literal(&mut self, id: AccessId) -> bool {
        if !self.is_access_type(FieldAccessType::Literal, id) {
            return false;
        }
        self.kinds.remove(&id);
        self.names.remove(&id);
        true
    }

    /// Removes any access ID together with its version bookkeeping.
    pub fn remove_access_id(&mut self, id: AccessId) -> bool {
        let Some(kind) = self.kinds.remove(&id) else {
            return false;
        };
        self.names.remove(&id);
        if kind == FieldAccessType::APIField {
            self.api_field_ids.retain(|api| *api != id);
        }
        self.versions.remove(id);
        self.flagged_temporaries.remove(&id);
        true
    }

    pub fn flag_temporary(&mut self, id: AccessId) {
        self.flagged_temporaries.insert(id);
    }

    pub fn flagged_temporaries(&self) -> &FxHashSet<AccessId> {
        &self.flagged_temporaries
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl AccessNameResolver for AccessMetadata {
    fn access_name(&self, id: AccessId) -> Option<&str> {
        self.name_of(id)
    }
}
