//! Authoritative world store and the per-tick simulation pass.
//!
//! Exactly one task owns the store and mutates it; everything else sees
//! detached snapshots taken at pass boundaries, so no reader can observe a
//! world where some players reflect tick N and others tick N-1.

use crate::heatmap::HeatmapGrid;
use crate::motion::{self, MotionConfig};
use crate::roster::{self, RosterEntry, RosterError};
use crate::stats::generate_stats;
use log::{info, warn};
use rand::Rng;
use shared::{FieldConfig, MotionSource, PlayerRole, PlayerState, Team, STATS_REFRESH_CHANCE};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct WorldStore {
    tick: u64,
    players: HashMap<String, PlayerState>,
}

impl WorldStore {
    /// Builds the world from roster seed data. Each player starts with
    /// `target == position` and a fresh stat bundle. Fails fast on a
    /// malformed roster; the server must not start in that case.
    pub fn from_roster(entries: &[RosterEntry], rng: &mut impl Rng) -> Result<Self, RosterError> {
        roster::validate(entries)?;

        let mut players = HashMap::new();
        for entry in entries {
            let id = entry.player_id();
            players.insert(
                id.clone(),
                PlayerState {
                    id,
                    x: entry.x,
                    y: entry.y,
                    target_x: entry.x,
                    target_y: entry.y,
                    team: entry.team,
                    role: entry.role,
                    name: entry.name.to_string(),
                    number: entry.number,
                    color: entry.team.color(),
                    stats: generate_stats(rng),
                    motion: MotionSource::Autonomous,
                },
            );
        }

        info!("World initialized with {} players", players.len());
        Ok(Self { tick: 0, players })
    }

    /// Completed motion passes since startup.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Detached copy of every player, safe to hand to the dispatcher.
    pub fn snapshot(&self) -> HashMap<String, PlayerState> {
        self.players.clone()
    }

    /// Applies a transform to exactly one player. Unknown ids are a logged
    /// no-op; players are never removed mid-session, so this mostly guards
    /// commands racing a guest teardown.
    pub fn mutate<F>(&mut self, id: &str, transform: F) -> bool
    where
        F: FnOnce(&mut PlayerState),
    {
        if let Some(player) = self.players.get_mut(id) {
            transform(player);
            true
        } else {
            warn!("Mutation for unknown player {} dropped", id);
            false
        }
    }

    /// Id of the controlled player owned by an observer connection.
    pub fn guest_id(observer_id: u32) -> String {
        format!("guest_{}", observer_id)
    }

    /// Spawns a controlled player for a participant observer at midfield.
    /// Guests alternate sides by observer id and are excluded from the
    /// autonomous policy for their whole lifetime.
    pub fn spawn_guest(
        &mut self,
        observer_id: u32,
        field: &FieldConfig,
        rng: &mut impl Rng,
    ) -> String {
        let id = Self::guest_id(observer_id);
        let team = if observer_id % 2 == 0 {
            Team::Away
        } else {
            Team::Home
        };
        let (x, y) = (field.width / 2.0, field.height / 2.0);

        self.players.insert(
            id.clone(),
            PlayerState {
                id: id.clone(),
                x,
                y,
                target_x: x,
                target_y: y,
                team,
                role: PlayerRole::Midfielder,
                name: format!("Guest {}", observer_id),
                number: 100 + observer_id,
                color: team.color(),
                stats: generate_stats(rng),
                motion: MotionSource::Controlled(observer_id),
            },
        );

        info!("Guest player {} joined at midfield", id);
        id
    }

    /// Removes a player. Only guest teardown reaches this; roster players
    /// live for the whole session.
    pub fn remove_player(&mut self, id: &str) -> bool {
        if self.players.remove(id).is_some() {
            info!("Player {} removed", id);
            true
        } else {
            false
        }
    }

    /// One full motion pass: autonomous players wander, every player may
    /// have its stats re-measured, and every player contributes exactly one
    /// heatmap sample. A player with a non-finite position is skipped and
    /// logged; the pass continues for all others.
    pub fn advance(
        &mut self,
        field: &FieldConfig,
        config: &MotionConfig,
        heatmap: &mut HeatmapGrid,
        rng: &mut impl Rng,
    ) {
        // Stable iteration order keeps seeded sessions reproducible
        let mut ids: Vec<String> = self.players.keys().cloned().collect();
        ids.sort();

        for id in &ids {
            if let Some(player) = self.players.get_mut(id) {
                if !player.x.is_finite() || !player.y.is_finite() {
                    warn!("Skipping player {} with non-finite position", id);
                    continue;
                }

                if player.is_autonomous() {
                    motion::maybe_resample_target(player, field, config, rng);
                    motion::step_toward_target(player, config);
                }

                if rng.gen_bool(STATS_REFRESH_CHANCE) {
                    player.stats = generate_stats(rng);
                }

                heatmap.record_visit(player.x, player.y);
            }
        }

        self.tick += 1;
    }
}
