//! Derived per-field usage of a do-method.
//!
//! Intent classification is a small state machine:
//!
//! ```text
//!   Input ---write--+
//!                   +--> InputOutput   (absorbing)
//!   Output --read---+
//! ```
//!
//! The first access decides between `Input` (read) and `Output` (write).

use crate::extent::Extents;
use crate::ids::AccessId;
use crate::interval::Interval;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldIntent {
    Input,
    Output,
    InputOutput,
}

impl FieldIntent {
    /// Least upper bound of two intents.
    pub fn join(self, other: FieldIntent) -> FieldIntent {
        if self == other {
            self
        } else {
            FieldIntent::InputOutput
        }
    }
}

impl std::fmt::Display for FieldIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldIntent::Input => f.write_str("input"),
            FieldIntent::Output => f.write_str("output"),
            FieldIntent::InputOutput => f.write_str("inputoutput"),
        }
    }
}

/// Usage of one field inside a do-method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    access_id: AccessId,
    intent: FieldIntent,
    read_extents: Option<Extents>,
    write_extents: Option<Extents>,
    interval: Interval,
}

impl Field {
    pub fn new(access_id: AccessId, intent: FieldIntent, interval: Interval) -> Self {
        Field {
            access_id,
            intent,
            read_extents: None,
            write_extents: None,
            interval,
        }
    }

    pub fn access_id(&self) -> AccessId {
        self.access_id
    }

    pub fn intent(&self) -> FieldIntent {
        self.intent
    }

    pub fn set_intent(&mut self, intent: FieldIntent) {
        self.intent = intent;
    }

    pub fn read_extents(&self) -> Option<&Extents> {
        self.read_extents.as_ref()
    }

    pub fn write_extents(&self) -> Option<&Extents> {
        self.write_extents.as_ref()
    }

    /// Envelope of read and write extents.
    pub fn extents(&self) -> Option<Extents> {
        match (&self.read_extents, &self.write_extents) {
            (Some(r), Some(w)) => Some(r.merged(w)),
            (Some(e), None) | (None, Some(e)) => Some(*e),
            (None, None) => None,
        }
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn merge_read_extents(&mut self, extents: &Extents) {
        merge_optional(&mut self.read_extents, extents);
    }

    pub fn merge_write_extents(&mut self, extents: &Extents) {
        merge_optional(&mut self.write_extents, extents);
    }

    /// Folds another usage of the same field into this one.
    pub fn merge(&mut self, other: &Field) {
        self.intent = self.intent.join(other.intent);
        if let Some(r) = &other.read_extents {
            self.merge_read_extents(r);
        }
        if let Some(w) = &other.write_extents {
            self.merge_write_extents(w);
        }
        self.interval.merge(&other.interval);
    }

    pub fn to_json(&self) -> Value {
        json!({
            "accessID": self.access_id.0,
            "intent": self.intent.to_string(),
            "readExtents": self.read_extents.map(|e| e.to_string()),
            "writeExtents": self.write_extents.map(|e| e.to_string()),
            "interval": self.interval.to_string(),
        })
    }
}

fn merge_optional(slot: &mut Option<Extents>, extents: &Extents) {
    match slot {
        Some(existing) => existing.merge(extents),
        None => *slot = Some(*extents),
    }
}

/// Field maps are keyed by access ID.
pub type FieldMap = FxHashMap<AccessId, Field>;

/// Records a write of `id`: unseen becomes `Output`, `Input` becomes
/// `InputOutput`.
pub fn record_write_access(
    fields: &mut FieldMap,
    id: AccessId,
    extents: &Extents,
    interval: &Interval,
) {
    let field = fields
        .entry(id)
        .or_insert_with(|| Field::new(id, FieldIntent::Output, *interval));
    if field.intent == FieldIntent::Input {
        field.intent = FieldIntent::InputOutput;
    }
    field.merge_write_extents(extents);
}

/// Records a read of `id`: unseen becomes `Input`, `Output` becomes
/// `InputOutput`.
pub fn record_read_access(
    fields: &mut FieldMap,
    id: AccessId,
    extents: &Extents,
    interval: &Interval,
) {
    let field = fields
        .entry(id)
        .or_insert_with(|| Field::new(id, FieldIntent::Input, *interval));
    if field.intent == FieldIntent::Output {
        field.intent = FieldIntent::InputOutput;
    }
    field.merge_read_extents(extents);
}

/// Combines the field maps of several do-methods into `into`.
pub fn merge_fields(into: &mut FieldMap, from: &FieldMap) {
    for (id, field) in from {
        into.entry(*id)
            .and_modify(|existing| existing.merge(field))
            .or_insert_with(|| field.clone());
    }
}
