//! The id-indexed table of model type entries.
//!
//! Model identifiers are small dense integers assigned by the external
//! generator, so the store is a plain slot array sized for the whole id
//! space: lookups are direct indexing, and an empty slot means "not
//! defined". Entries are created once while scanning and only their name
//! and reference count change afterwards.

use std::fmt;

use crate::model::name;

/// Largest valid model identifier.
pub const MAX_MODEL_ID: u32 = 0x3FFF;

/// Offset added to a model identifier to form the data-set code of a
/// user-defined entry.
pub const USER_CODE_OFFSET: u32 = 1000;

/// Character budget for data-set names.
pub const DATASET_NAME_LEN: usize = 30;

/// A model identifier in `1..=MAX_MODEL_ID`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(u16);

impl ModelId {
    pub fn new(raw: i64) -> Option<ModelId> {
        if (1..=MAX_MODEL_ID as i64).contains(&raw) {
            Some(ModelId(raw as u16))
        } else {
            None
        }
    }

    pub fn get(self) -> u32 {
        u32::from(self.0)
    }

    fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.0)
    }
}

/// What an entry denotes, as a closed union: the source format's
/// sign-and-magnitude encoding is not carried over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A base type of the target protocol.
    Primitive,
    /// An array of, or a named alias for, another entry; `len` is zero for
    /// plain aliases and the element count for arrays.
    Alias { target: ModelId, len: u32 },
    /// A structure with an owned, ordered field list. Field entries are
    /// aliases defined at their own identifiers.
    Struct { fields: Vec<ModelId> },
}

#[derive(Clone, Debug)]
pub struct Entry {
    /// Canonical protocol identifier: the base-type name for primitives,
    /// the decimal data-set code for user-defined entries.
    pub dataset_id: String,
    /// Numeric code behind `dataset_id`.
    pub dataset_code: u32,
    pub shape: Shape,
    /// Display name; data-set names are propagated later from `type`
    /// declarations, field names are recorded at definition time.
    pub name: Option<String>,
    ref_count: u32,
}

impl Entry {
    pub fn primitive(dataset_id: impl Into<String>, dataset_code: u32) -> Entry {
        Entry {
            dataset_id: dataset_id.into(),
            dataset_code,
            shape: Shape::Primitive,
            name: None,
            ref_count: 0,
        }
    }

    /// A user-defined entry at `id`; its data-set code is synthesized from
    /// the identifier.
    pub fn user(id: ModelId, shape: Shape, name: Option<String>) -> Entry {
        let code = USER_CODE_OFFSET + id.get();
        Entry {
            dataset_id: code.to_string(),
            dataset_code: code,
            shape,
            name,
            ref_count: 0,
        }
    }

    /// How many times this entry was found reachable from an operator's
    /// interface.
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum DefineError {
    AlreadyDefined,
}

#[derive(Debug, PartialEq, Eq)]
pub enum NameError {
    NotDefined,
    Conflict { existing: String },
}

pub struct Store {
    slots: Vec<Option<Entry>>,
}

impl Store {
    /// An empty store covering the whole identifier space.
    pub fn new() -> Store {
        Store {
            slots: vec![None; MAX_MODEL_ID as usize + 1],
        }
    }

    /// Insert a new entry. The first definition of an identifier wins;
    /// a second attempt is rejected.
    pub fn define(&mut self, id: ModelId, entry: Entry) -> Result<(), DefineError> {
        let slot = &mut self.slots[id.index()];
        if slot.is_some() {
            return Err(DefineError::AlreadyDefined);
        }
        *slot = Some(entry);
        Ok(())
    }

    pub fn get(&self, id: ModelId) -> Option<&Entry> {
        self.slots[id.index()].as_ref()
    }

    pub(crate) fn bump_ref(&mut self, id: ModelId) {
        if let Some(entry) = self.slots[id.index()].as_mut() {
            entry.ref_count += 1;
        }
    }

    /// Attach a display name to the structure at `id`, stitching the
    /// namespace prefix onto the proposed name and truncating to the
    /// data-set name budget. Non-structures are ignored (`Ok(false)`);
    /// renaming an already-named structure is a conflict.
    pub fn propagate_name(
        &mut self,
        id: ModelId,
        proposed: &str,
        prefix: Option<&str>,
    ) -> Result<bool, NameError> {
        let entry = self.slots[id.index()].as_mut().ok_or(NameError::NotDefined)?;
        match &entry.shape {
            Shape::Struct { fields } if !fields.is_empty() => match &entry.name {
                Some(existing) => Err(NameError::Conflict {
                    existing: existing.clone(),
                }),
                None => {
                    entry.name = Some(name::stitch(prefix, proposed, DATASET_NAME_LEN));
                    Ok(true)
                }
            },
            _ => Ok(false),
        }
    }

    /// Defined entries in identifier order.
    pub fn entries(&self) -> impl Iterator<Item = (ModelId, &Entry)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let entry = slot.as_ref()?;
            Some((ModelId(index as u16), entry))
        })
    }
}

impl Default for Store {
    fn default() -> Store {
        Store::new()
    }
}
