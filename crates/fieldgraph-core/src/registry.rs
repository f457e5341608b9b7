//! Field registry
//!
//! Per-engine catalogue of fields: input path, output path, type, enabled
//! flag and an open property bag, each kept in its own table keyed by
//! [`FieldId`]. No two enabled fields ever share an input or output path.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::error::{Result, ValidationError};
use crate::field::{FieldId, FieldType};
use crate::path::{self, Path};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRegistry {
    pub(crate) next_id: u64,
    pub(crate) input_paths: BTreeMap<FieldId, Path>,
    pub(crate) output_paths: BTreeMap<FieldId, Path>,
    pub(crate) types: BTreeMap<FieldId, FieldType>,
    pub(crate) enabled: BTreeMap<FieldId, bool>,
    pub(crate) props: BTreeMap<FieldId, Map<String, Value>>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next registered field will receive
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.input_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_paths.is_empty()
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.input_paths.contains_key(&id)
    }

    /// All field ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.input_paths.keys().copied()
    }

    pub fn input_path(&self, id: FieldId) -> Option<&Path> {
        self.input_paths.get(&id)
    }

    pub fn output_path(&self, id: FieldId) -> Option<&Path> {
        self.output_paths.get(&id)
    }

    pub fn field_type(&self, id: FieldId) -> Option<FieldType> {
        self.types.get(&id).copied()
    }

    pub fn is_enabled(&self, id: FieldId) -> bool {
        self.enabled.get(&id).copied().unwrap_or(false)
    }

    pub fn props(&self, id: FieldId) -> Option<&Map<String, Value>> {
        self.props.get(&id)
    }

    /// Enabled field whose output path is `path`
    pub fn enabled_output_owner(&self, path: &Path) -> Option<FieldId> {
        self.output_paths
            .iter()
            .find(|(id, p)| *p == path && self.is_enabled(**id))
            .map(|(id, _)| *id)
    }

    /// Enabled field whose input path is `path`
    pub fn enabled_input_owner(&self, path: &Path) -> Option<FieldId> {
        self.input_paths
            .iter()
            .find(|(id, p)| *p == path && self.is_enabled(**id))
            .map(|(id, _)| *id)
    }

    /// Field with this output path, preferring enabled fields
    pub fn output_owner(&self, path: &Path) -> Option<FieldId> {
        self.enabled_output_owner(path).or_else(|| {
            self.output_paths
                .iter()
                .find(|(_, p)| *p == path)
                .map(|(id, _)| *id)
        })
    }

    /// Field with this input path, preferring enabled fields
    pub fn input_owner(&self, path: &Path) -> Option<FieldId> {
        self.enabled_input_owner(path).or_else(|| {
            self.input_paths
                .iter()
                .find(|(_, p)| *p == path)
                .map(|(id, _)| *id)
        })
    }

    /// Register a new field. Both paths must be free of enabled owners.
    pub fn insert(
        &mut self,
        input_path: Path,
        output_path: Path,
        field_type: FieldType,
    ) -> std::result::Result<FieldId, ValidationError> {
        self.insert_with(input_path, output_path, field_type, true, Map::new())
    }

    /// Register a field with an explicit enabled flag and property bag.
    /// A disabled field may share its paths with other fields.
    pub(crate) fn insert_with(
        &mut self,
        input_path: Path,
        output_path: Path,
        field_type: FieldType,
        enabled: bool,
        props: Map<String, Value>,
    ) -> std::result::Result<FieldId, ValidationError> {
        if enabled {
            if let Some(owner) = self
                .enabled_input_owner(&input_path)
                .or_else(|| self.enabled_output_owner(&output_path))
            {
                return Err(ValidationError::AmbiguousAddress {
                    path: input_path,
                    owner,
                });
            }
        }

        let id = FieldId(self.next_id);
        self.next_id += 1;
        self.input_paths.insert(id, input_path);
        self.output_paths.insert(id, output_path);
        self.types.insert(id, field_type);
        self.enabled.insert(id, enabled);
        self.props.insert(id, props);
        Ok(id)
    }

    pub(crate) fn set_output_path(&mut self, id: FieldId, path: Path) {
        if let Some(slot) = self.output_paths.get_mut(&id) {
            *slot = path;
        }
    }

    pub fn set_type(&mut self, id: FieldId, field_type: FieldType) -> std::result::Result<(), ValidationError> {
        let slot = self
            .types
            .get_mut(&id)
            .ok_or(ValidationError::UnknownField(id))?;
        *slot = field_type;
        Ok(())
    }

    /// Enable or disable a field. Enabling is refused while another enabled
    /// field holds the same output path.
    pub fn set_enabled(&mut self, id: FieldId, enabled: bool) -> std::result::Result<(), ValidationError> {
        let output = self
            .output_paths
            .get(&id)
            .ok_or(ValidationError::UnknownField(id))?;
        if enabled {
            if let Some(owner) = self.enabled_output_owner(output).filter(|owner| *owner != id) {
                return Err(ValidationError::Collision {
                    field: id,
                    path: output.clone(),
                    owner,
                });
            }
        }
        self.enabled.insert(id, enabled);
        Ok(())
    }

    pub fn set_props(&mut self, id: FieldId, props: Map<String, Value>) -> std::result::Result<(), ValidationError> {
        let slot = self
            .props
            .get_mut(&id)
            .ok_or(ValidationError::UnknownField(id))?;
        *slot = props;
        Ok(())
    }

    /// Property addressed by a key path inside the field's property bag
    pub fn prop(&self, id: FieldId, key: &Path) -> Option<&Value> {
        let (head, rest) = key.waypoints().split_first()?;
        let first = self.props.get(&id)?.get(&head.to_string())?;
        path::get(first, &Path::new(rest.to_vec()))
    }

    /// Set a property by key path, creating intermediate objects
    pub fn set_prop(&mut self, id: FieldId, key: &Path, value: Value) -> Result<()> {
        if key.is_root() {
            return Err(ValidationError::EmptyPropertyKey.into());
        }
        let props = self
            .props
            .get_mut(&id)
            .ok_or(ValidationError::UnknownField(id))?;
        let mut bag = Value::Object(std::mem::take(props));
        let written = path::set(&mut bag, key, &value);
        if let Value::Object(map) = bag {
            *props = map;
        }
        written?;
        Ok(())
    }

    /// Drop every table entry of a field
    pub(crate) fn remove(&mut self, id: FieldId) {
        self.input_paths.remove(&id);
        self.output_paths.remove(&id);
        self.types.remove(&id);
        self.enabled.remove(&id);
        self.props.remove(&id);
    }
}
