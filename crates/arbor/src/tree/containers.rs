//! Container mutators. Each one is a single pass through the owning
//! container's mutation pipeline.

use super::node::{Child, Container, Input, NodeId};
use super::Tree;
use crate::error::{Error, Result};
use crate::types::array::{self, ArrayChange};
use crate::types::keyed::{self, KeyedChange};

impl Tree {
    fn expect_container(
        &self,
        id: NodeId,
        expected: &'static str,
        accept: fn(&Container) -> bool,
    ) -> Result<()> {
        let container = self.container(id)?;
        if accept(container) {
            return Ok(());
        }
        Err(Error::WrongContainer {
            path: self.get_path(id)?,
            expected,
            actual: container.kind(),
        })
    }

    // ── Arrays ─────────────────────────────────────────────────────────────

    pub fn array_len(&self, id: NodeId) -> Result<usize> {
        Ok(array::items(self, id)?.len())
    }

    pub fn array_get(&self, id: NodeId, index: usize) -> Result<Child> {
        let items = array::items(self, id)?;
        items.get(index).cloned().ok_or(Error::IndexOutOfBounds {
            index,
            len: items.len(),
        })
    }

    /// Overwrite one slot. Assigning the same node or an equal plain value
    /// is a no-op.
    pub fn array_set(&mut self, id: NodeId, index: usize, value: impl Into<Input>) -> Result<()> {
        let change = ArrayChange::Update {
            index,
            new_value: value.into(),
        };
        array::mutate(self, id, change).map(|_| ())
    }

    /// Remove `removed_count` slots at `index` and insert `added` in their
    /// place. Out of range positions are clamped. Returns the removed slots;
    /// removed nodes stay alive, detached.
    pub fn array_splice(
        &mut self,
        id: NodeId,
        index: usize,
        removed_count: usize,
        added: Vec<Input>,
    ) -> Result<Vec<Child>> {
        let change = ArrayChange::Splice {
            index,
            removed_count,
            added,
        };
        Ok(array::mutate(self, id, change)?
            .map(|record| record.removed())
            .unwrap_or_default())
    }

    pub fn array_push(&mut self, id: NodeId, value: impl Into<Input>) -> Result<()> {
        let len = self.array_len(id)?;
        self.array_splice(id, len, 0, vec![value.into()]).map(|_| ())
    }

    pub fn array_insert(&mut self, id: NodeId, index: usize, value: impl Into<Input>) -> Result<()> {
        let len = self.array_len(id)?;
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        self.array_splice(id, index, 0, vec![value.into()]).map(|_| ())
    }

    pub fn array_remove(&mut self, id: NodeId, index: usize) -> Result<Child> {
        let len = self.array_len(id)?;
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        self.array_splice(id, index, 1, Vec::new())?
            .pop()
            .ok_or(Error::IndexOutOfBounds { index, len })
    }

    /// Replace the whole content. Nodes that keep their position at either
    /// end are left in place.
    pub fn array_replace(&mut self, id: NodeId, values: Vec<Input>) -> Result<Vec<Child>> {
        array::replace(self, id, values)
    }

    // ── Maps ───────────────────────────────────────────────────────────────

    /// Set `key`. Returns the previous slot content.
    pub fn map_set(&mut self, id: NodeId, key: &str, value: impl Into<Input>) -> Result<Option<Child>> {
        self.expect_container(id, "a map", |c| matches!(c, Container::Map(_)))?;
        let change = KeyedChange::Set {
            key: key.to_string(),
            value: value.into(),
        };
        keyed::mutate(self, id, change)
    }

    /// Delete `key`. Deleting a missing key is a no-op returning `None`.
    pub fn map_delete(&mut self, id: NodeId, key: &str) -> Result<Option<Child>> {
        self.expect_container(id, "a map", |c| matches!(c, Container::Map(_)))?;
        keyed::mutate(
            self,
            id,
            KeyedChange::Delete {
                key: key.to_string(),
            },
        )
    }

    pub fn map_get(&self, id: NodeId, key: &str) -> Result<Option<Child>> {
        self.expect_container(id, "a map", |c| matches!(c, Container::Map(_)))?;
        Ok(keyed::entries(self, id)?.get(key).cloned())
    }

    pub fn map_keys(&self, id: NodeId) -> Result<Vec<String>> {
        self.expect_container(id, "a map", |c| matches!(c, Container::Map(_)))?;
        Ok(keyed::entries(self, id)?.keys().cloned().collect())
    }

    // ── Models ─────────────────────────────────────────────────────────────

    pub fn model_set(&mut self, id: NodeId, key: &str, value: impl Into<Input>) -> Result<()> {
        self.expect_container(id, "a model", |c| matches!(c, Container::Model(_)))?;
        let factory = self.get_factory(id)?;
        let model = factory
            .as_model()
            .ok_or_else(|| Error::NotComplex(factory.name()))?;
        model.set(self, id, key, value.into())
    }

    pub fn model_get(&self, id: NodeId, key: &str) -> Result<Child> {
        self.expect_container(id, "a model", |c| matches!(c, Container::Model(_)))?;
        let factory = self.get_factory(id)?;
        let model = factory
            .as_model()
            .ok_or_else(|| Error::NotComplex(factory.name()))?;
        model.get(self, id, key)
    }
}
