use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Protocol version expected in `Packet::Connect`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Default pitch dimensions in pixels.
pub const DEFAULT_FIELD_WIDTH: f32 = 800.0;
pub const DEFAULT_FIELD_HEIGHT: f32 = 520.0;

/// Inset of the playable band from each touchline. Autonomous targets and
/// positions are always clamped into `[margin, dim - margin]`.
pub const FIELD_MARGIN: f32 = 20.0;

/// Edge length of one heatmap grid cell.
pub const CELL_SIZE: f32 = 20.0;

/// Distance an autonomous player covers per axis per tick.
pub const WALK_STEP: f32 = 1.0;

/// Displacement applied by one directional command in controlled mode.
pub const COMMAND_STEP: f32 = 5.0;

/// Per-tick probability that an autonomous player picks a new target.
pub const RESAMPLE_CHANCE: f64 = 0.30;

/// Per-tick probability that a player's stat bundle is re-measured.
pub const STATS_REFRESH_CHANCE: f64 = 0.05;

/// Default simulation cadences in milliseconds.
pub const MOTION_INTERVAL_MS: u64 = 200;
pub const HEATMAP_INTERVAL_MS: u64 = 3000;

/// Immutable pitch bounds, set once at startup and announced to every
/// observer on connect.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct FieldConfig {
    pub width: f32,
    pub height: f32,
}

impl FieldConfig {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Clamps an x coordinate into the playable band.
    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(FIELD_MARGIN, self.width - FIELD_MARGIN)
    }

    /// Clamps a y coordinate into the playable band.
    pub fn clamp_y(&self, y: f32) -> f32 {
        y.clamp(FIELD_MARGIN, self.height - FIELD_MARGIN)
    }

    /// True if the point lies inside the playable band.
    pub fn in_bounds(&self, x: f32, y: f32) -> bool {
        (FIELD_MARGIN..=self.width - FIELD_MARGIN).contains(&x)
            && (FIELD_MARGIN..=self.height - FIELD_MARGIN).contains(&y)
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FIELD_WIDTH, DEFAULT_FIELD_HEIGHT)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Home,
    Away,
}

impl Team {
    /// Stable lowercase key used in player ids.
    pub fn key(&self) -> &'static str {
        match self {
            Team::Home => "home",
            Team::Away => "away",
        }
    }

    /// Kit color broadcast with every player.
    pub fn color(&self) -> Rgb {
        match self {
            Team::Home => Rgb::new(0x42, 0x85, 0xF4),
            Team::Away => Rgb::new(0xEA, 0x43, 0x35),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PlayerRole {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl PlayerRole {
    /// Radius of the band a new wander target is drawn from. Keepers stay
    /// near goal, forwards roam widest.
    pub fn movement_radius(&self) -> f32 {
        match self {
            PlayerRole::Goalkeeper => 25.0,
            PlayerRole::Forward => 70.0,
            _ => 50.0,
        }
    }
}

/// Live physiological / performance readings for one player.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PlayerStats {
    /// Beats per minute, 120-180.
    pub heart_rate: u32,
    /// km/h, 5-30.
    pub speed: f32,
    /// Percent, 0-100.
    pub stamina: u32,
    /// Meters covered this session, 0-3000.
    pub distance_covered: f32,
    /// Body temperature in Celsius, 36-41.
    pub temperature: f32,
}

/// What drives a player's position each tick.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MotionSource {
    /// Wanders toward a role-biased target under the simulation tick.
    Autonomous,
    /// Displaced only by commands from the owning observer connection.
    Controlled(u32),
}

/// One simulated player. Identity fields never change after creation; only
/// position, target and stats mutate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub team: Team,
    pub role: PlayerRole,
    pub name: String,
    pub number: u32,
    pub color: Rgb,
    pub stats: PlayerStats,
    pub motion: MotionSource,
}

impl PlayerState {
    pub fn is_autonomous(&self) -> bool {
        matches!(self.motion, MotionSource::Autonomous)
    }
}

/// One occupancy bucket of the heatmap grid. `x`/`y` are the cell midpoint,
/// fixed when the cell is first observed; `intensity` counts visits and
/// never decreases.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct HeatmapCell {
    pub x: f32,
    pub y: f32,
    pub intensity: u64,
}

/// Grid coordinate of the cell containing a point.
pub fn cell_key(x: f32, y: f32) -> (i32, i32) {
    ((x / CELL_SIZE).floor() as i32, (y / CELL_SIZE).floor() as i32)
}

/// Midpoint of a grid cell.
pub fn cell_center(gx: i32, gy: i32) -> (f32, f32) {
    (
        gx as f32 * CELL_SIZE + CELL_SIZE / 2.0,
        gy as f32 * CELL_SIZE + CELL_SIZE / 2.0,
    )
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// How a connecting client participates in the session.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ObserverMode {
    /// Receives broadcasts, never mutates state.
    Monitor,
    /// Additionally owns one controlled player for the connection's lifetime.
    Participant,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        client_version: u32,
        mode: ObserverMode,
    },
    Heartbeat {
        timestamp: u64,
    },
    Move {
        direction: Direction,
    },
    Disconnect,

    Connected {
        observer_id: u32,
        /// Id of the controlled player spawned for a participant.
        player_id: Option<String>,
    },
    Disconnected {
        reason: String,
    },
    FieldConfig {
        width: f32,
        height: f32,
    },
    GameUpdate {
        tick: u64,
        players: HashMap<String, PlayerState>,
    },
    HeatmapUpdate {
        cells: HashMap<(i32, i32), HeatmapCell>,
    },
    PlayerMoved {
        id: String,
        x: f32,
        y: f32,
    },
    PlayerDisconnected {
        id: String,
    },
}
