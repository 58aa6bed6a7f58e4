//! Battle setup input: who fights and where they start.

use serde::{Deserialize, Serialize};

use crate::types::DVec2;

/// One team and the spawn points of its characters, in turn order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSetup {
    pub name: String,
    pub spawns: Vec<DVec2>,
    /// Character names, matched to spawns by index. Missing entries are
    /// generated from the team name.
    #[serde(default)]
    pub character_names: Vec<String>,
}

impl TeamSetup {
    pub fn new(name: impl Into<String>, spawns: Vec<DVec2>) -> Self {
        Self {
            name: name.into(),
            spawns,
            character_names: Vec::new(),
        }
    }

    /// Name of the `index`-th character.
    pub fn character_name(&self, index: usize) -> String {
        self.character_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("{} {}", self.name, index + 1))
    }
}
