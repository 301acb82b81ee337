//! Faction identifiers.
//!
//! Factions are small interned ids handed out by a [`FactionRoster`] built
//! from configuration. The engine compares ids only; names exist for
//! persistence records and display.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub u16);

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "faction#{}", self.0)
    }
}

/// Ordered list of faction names; a faction's id is its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactionRoster {
    names: Vec<String>,
}

impl FactionRoster {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roster = FactionRoster::default();
        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(EngineError::ConfigError(
                    "faction names must not be empty".to_string(),
                ));
            }
            if roster.id(&name).is_some() {
                return Err(EngineError::ConfigError(format!(
                    "duplicate faction name: {}",
                    name
                )));
            }
            if roster.names.len() >= u16::MAX as usize {
                return Err(EngineError::ConfigError("too many factions".to_string()));
            }
            roster.names.push(name);
        }
        Ok(roster)
    }

    pub fn id(&self, name: &str) -> Option<FactionId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| FactionId(i as u16))
    }

    /// Like [`id`](Self::id) but fails with `UnknownFaction`.
    pub fn require(&self, name: &str) -> Result<FactionId> {
        self.id(name)
            .ok_or_else(|| EngineError::UnknownFaction(name.to_string()))
    }

    pub fn name(&self, id: FactionId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = FactionId> + '_ {
        (0..self.names.len()).map(|i| FactionId(i as u16))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_interns_in_order() {
        let roster = FactionRoster::new(["red", "blue", "green"]).unwrap();
        assert_eq!(roster.id("red"), Some(FactionId(0)));
        assert_eq!(roster.id("green"), Some(FactionId(2)));
        assert_eq!(roster.name(FactionId(1)), Some("blue"));
        assert_eq!(roster.id("purple"), None);
        assert_eq!(roster.ids().count(), 3);
    }

    #[test]
    fn test_roster_rejects_duplicates_and_blanks() {
        assert!(FactionRoster::new(["red", "red"]).is_err());
        assert!(FactionRoster::new(["red", " "]).is_err());
    }

    #[test]
    fn test_require_unknown_faction() {
        let roster = FactionRoster::new(["red"]).unwrap();
        assert_eq!(
            roster.require("blue"),
            Err(EngineError::UnknownFaction("blue".to_string()))
        );
    }
}
