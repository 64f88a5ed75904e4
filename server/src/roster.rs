//! Static roster seed data and startup validation.
//!
//! The roster is read exactly once, at startup, to populate the world store.
//! A malformed roster (empty, or two entries resolving to the same player id)
//! is fatal: the process must not start with an inconsistent world.

use shared::{PlayerRole, Team};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

/// One seed entry: identity plus formation coordinates.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub team: Team,
    pub name: &'static str,
    pub role: PlayerRole,
    pub number: u32,
    pub x: f32,
    pub y: f32,
}

impl RosterEntry {
    /// Stable player id derived from team and jersey number.
    pub fn player_id(&self) -> String {
        format!("{}_{}", self.team.key(), self.number)
    }
}

/// Startup roster validation failure. Fatal: the server refuses to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    Empty,
    DuplicateId(String),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::Empty => write!(f, "roster contains no players"),
            RosterError::DuplicateId(id) => write!(f, "duplicate player id in roster: {}", id),
        }
    }
}

impl Error for RosterError {}

/// Checks the startup contract: non-empty, ids unique.
pub fn validate(roster: &[RosterEntry]) -> Result<(), RosterError> {
    if roster.is_empty() {
        return Err(RosterError::Empty);
    }

    let mut seen = HashSet::new();
    for entry in roster {
        let id = entry.player_id();
        if !seen.insert(id.clone()) {
            return Err(RosterError::DuplicateId(id));
        }
    }

    Ok(())
}

/// The default two-team formation: eight players a side in a 1-2-3-2 on a
/// 800x520 pitch, mirrored around the halfway line.
pub fn default_roster() -> Vec<RosterEntry> {
    use PlayerRole::*;
    use Team::*;

    vec![
        RosterEntry { team: Home, name: "Silva", role: Goalkeeper, number: 1, x: 80.0, y: 260.0 },
        RosterEntry { team: Home, name: "Santos", role: Defender, number: 2, x: 180.0, y: 180.0 },
        RosterEntry { team: Home, name: "Costa", role: Defender, number: 3, x: 180.0, y: 340.0 },
        RosterEntry { team: Home, name: "Lima", role: Midfielder, number: 4, x: 280.0, y: 130.0 },
        RosterEntry { team: Home, name: "Ferreira", role: Midfielder, number: 5, x: 280.0, y: 260.0 },
        RosterEntry { team: Home, name: "Rodrigues", role: Midfielder, number: 6, x: 280.0, y: 390.0 },
        RosterEntry { team: Home, name: "Barbosa", role: Forward, number: 7, x: 380.0, y: 200.0 },
        RosterEntry { team: Home, name: "Martins", role: Forward, number: 8, x: 380.0, y: 320.0 },
        RosterEntry { team: Away, name: "Johnson", role: Goalkeeper, number: 1, x: 720.0, y: 260.0 },
        RosterEntry { team: Away, name: "Williams", role: Defender, number: 2, x: 620.0, y: 180.0 },
        RosterEntry { team: Away, name: "Brown", role: Defender, number: 3, x: 620.0, y: 340.0 },
        RosterEntry { team: Away, name: "Miller", role: Midfielder, number: 4, x: 520.0, y: 130.0 },
        RosterEntry { team: Away, name: "Davis", role: Midfielder, number: 5, x: 520.0, y: 260.0 },
        RosterEntry { team: Away, name: "Wilson", role: Midfielder, number: 6, x: 520.0, y: 390.0 },
        RosterEntry { team: Away, name: "Taylor", role: Forward, number: 7, x: 420.0, y: 200.0 },
        RosterEntry { team: Away, name: "Anderson", role: Forward, number: 8, x: 420.0, y: 320.0 },
    ]
}
