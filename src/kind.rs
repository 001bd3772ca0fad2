/*
 * Agent Kind Module
 *
 * The closed set of fish species. Agents only flock with their own kind,
 * but collision correction applies across all kinds.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    BlueGoldfish,
    Piranha,
    CoralGrouper,
    Sunfish,
}

impl AgentKind {
    pub const ALL: [AgentKind; 4] = [
        AgentKind::BlueGoldfish,
        AgentKind::Piranha,
        AgentKind::CoralGrouper,
        AgentKind::Sunfish,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AgentKind::BlueGoldfish => "BlueGoldfish",
            AgentKind::Piranha => "Piranha",
            AgentKind::CoralGrouper => "CoralGrouper",
            AgentKind::Sunfish => "Sunfish",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AgentKind {
    type Err = SimulationError;

    // Case-insensitive so CLI input like `piranha` works
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SimulationError::UnknownKind(s.to_string()))
    }
}
