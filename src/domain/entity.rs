//! Canonical county identity and display-label lookup

use crate::domain::errors::PipelineError;
use crate::domain::types::{CountyName, StateName};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Separator between county and state in a display label
pub const LABEL_SEPARATOR: &str = ", ";

/// Canonical (county, state) pair identifying one US county
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[display("{county}, {state}")]
pub struct EntityKey {
    county: CountyName,
    state: StateName,
}

impl EntityKey {
    pub fn new(county: CountyName, state: StateName) -> Self {
        Self { county, state }
    }

    /// Build a key from raw cells, or `None` when either name is blank
    pub fn from_cells(county: &str, state: &str) -> Option<Self> {
        let county = CountyName::try_new(county).ok()?;
        let state = StateName::try_new(state).ok()?;
        Some(Self::new(county, state))
    }

    /// Map a "County, State" display label back to its canonical key
    pub fn from_label(label: &str) -> Result<Self, PipelineError> {
        label
            .split_once(LABEL_SEPARATOR)
            .and_then(|(county, state)| Self::from_cells(county, state))
            .ok_or_else(|| PipelineError::entity_not_found(label))
    }

    /// Display label in "County, State" form
    pub fn label(&self) -> String {
        self.to_string()
    }

    pub fn county(&self) -> &CountyName {
        &self.county
    }

    pub fn state(&self) -> &StateName {
        &self.state
    }
}
