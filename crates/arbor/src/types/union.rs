//! Unions of types. A union never owns a node: instances are created by, and
//! belong to, the concrete member that accepts the snapshot.

use serde_json::Value;

use super::{Factory, TypeDef};

#[derive(Debug, Clone)]
pub struct UnionType {
    members: Vec<Factory>,
}

impl UnionType {
    pub(crate) fn new(members: Vec<Factory>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[Factory] {
        &self.members
    }

    pub(crate) fn name(&self) -> String {
        self.members
            .iter()
            .map(Factory::name)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub(crate) fn describe(&self) -> String {
        let inner = self
            .members
            .iter()
            .map(Factory::describe)
            .collect::<Vec<_>>()
            .join(" | ");
        format!("({inner})")
    }

    pub(crate) fn is(&self, value: &Value) -> bool {
        self.members.iter().any(|m| m.is(value))
    }

    pub(crate) fn dispatch(&self, snapshot: &Value) -> Option<Factory> {
        self.members.iter().find_map(|m| m.dispatch(snapshot))
    }

    pub(crate) fn default_snapshot(&self) -> Option<Value> {
        self.members.iter().find_map(Factory::default_snapshot)
    }

    /// Shared identifier attribute of the complex members, if they all
    /// declare the same one.
    pub(crate) fn identifier_attribute(&self) -> Option<&str> {
        let mut found: Option<&str> = None;
        let keyed = |m: &&Factory| m.is_complex() || matches!(m.def(), TypeDef::Union(_));
        for member in self.members.iter().filter(keyed) {
            match (found, member.identifier_attribute()) {
                (_, None) => return None,
                (None, Some(attr)) => found = Some(attr),
                (Some(prev), Some(attr)) if prev == attr => {}
                (Some(_), Some(_)) => return None,
            }
        }
        found
    }
}
