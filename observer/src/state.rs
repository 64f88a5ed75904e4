//! Local mirror of the server's broadcast state.
//!
//! Every update is a full snapshot, so application is replacement: the last
//! snapshot wins. Point events (`PlayerMoved`, `PlayerDisconnected`) patch
//! the mirror between snapshots; anything they get wrong is corrected by the
//! next full update.

use log::debug;
use shared::{FieldConfig, HeatmapCell, PlayerState};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct ObserverState {
    field: Option<FieldConfig>,
    tick: u64,
    players: HashMap<String, PlayerState>,
    cells: HashMap<(i32, i32), HeatmapCell>,
}

impl ObserverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self) -> Option<FieldConfig> {
        self.field
    }

    /// Tick of the most recent world snapshot applied.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn players(&self) -> &HashMap<String, PlayerState> {
        &self.players
    }

    pub fn cells(&self) -> &HashMap<(i32, i32), HeatmapCell> {
        &self.cells
    }

    pub fn total_intensity(&self) -> u64 {
        self.cells.values().map(|c| c.intensity).sum()
    }

    pub fn apply_field_config(&mut self, width: f32, height: f32) {
        self.field = Some(FieldConfig::new(width, height));
    }

    /// Replaces the player mirror with a full snapshot. Datagrams can
    /// reorder, so a snapshot older than the current one is dropped.
    pub fn apply_game_update(&mut self, tick: u64, players: HashMap<String, PlayerState>) {
        if tick < self.tick {
            debug!("Dropping stale world snapshot (tick {} < {})", tick, self.tick);
            return;
        }
        self.tick = tick;
        self.players = players;
    }

    /// Replaces the heatmap mirror. Intensities are monotone server-side,
    /// so staleness shows up as lower totals and is overwritten by the next
    /// broadcast either way.
    pub fn apply_heatmap_update(&mut self, cells: HashMap<(i32, i32), HeatmapCell>) {
        self.cells = cells;
    }

    /// Patches one player's position between snapshots. An unknown id means
    /// the spawn snapshot has not arrived yet; the patch is skipped and the
    /// next full update carries the player anyway.
    pub fn apply_player_moved(&mut self, id: &str, x: f32, y: f32) {
        if let Some(player) = self.players.get_mut(id) {
            player.x = x;
            player.y = y;
            player.target_x = x;
            player.target_y = y;
        } else {
            debug!("Position patch for unknown player {} skipped", id);
        }
    }

    pub fn apply_player_disconnected(&mut self, id: &str) {
        self.players.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{MotionSource, PlayerRole, PlayerStats, Team};

    fn sample_player(id: &str, x: f32) -> PlayerState {
        PlayerState {
            id: id.to_string(),
            x,
            y: 100.0,
            target_x: x,
            target_y: 100.0,
            team: Team::Home,
            role: PlayerRole::Midfielder,
            name: "Lima".to_string(),
            number: 4,
            color: Team::Home.color(),
            stats: PlayerStats {
                heart_rate: 140,
                speed: 10.0,
                stamina: 50,
                distance_covered: 100.0,
                temperature: 37.0,
            },
            motion: MotionSource::Autonomous,
        }
    }

    fn snapshot_of(players: &[PlayerState]) -> HashMap<String, PlayerState> {
        players.iter().map(|p| (p.id.clone(), p.clone())).collect()
    }

    #[test]
    fn test_starts_empty() {
        let state = ObserverState::new();

        assert!(state.field().is_none());
        assert_eq!(state.tick(), 0);
        assert!(state.players().is_empty());
        assert!(state.cells().is_empty());
    }

    #[test]
    fn test_field_config_applied() {
        let mut state = ObserverState::new();
        state.apply_field_config(800.0, 520.0);

        assert_eq!(state.field(), Some(FieldConfig::new(800.0, 520.0)));
    }

    #[test]
    fn test_game_update_replaces_wholesale() {
        let mut state = ObserverState::new();

        state.apply_game_update(1, snapshot_of(&[sample_player("home_4", 100.0)]));
        state.apply_game_update(
            2,
            snapshot_of(&[sample_player("home_5", 200.0), sample_player("home_6", 300.0)]),
        );

        assert_eq!(state.tick(), 2);
        assert_eq!(state.players().len(), 2);
        // The player only present in the first snapshot is gone
        assert!(!state.players().contains_key("home_4"));
    }

    #[test]
    fn test_stale_game_update_dropped() {
        let mut state = ObserverState::new();

        state.apply_game_update(10, snapshot_of(&[sample_player("home_4", 150.0)]));
        state.apply_game_update(9, snapshot_of(&[sample_player("home_4", 999.0)]));

        assert_eq!(state.tick(), 10);
        assert_approx_eq!(state.players()["home_4"].x, 150.0);
    }

    #[test]
    fn test_heatmap_update_replaces_cells() {
        let mut state = ObserverState::new();

        let mut first = HashMap::new();
        first.insert((0, 0), HeatmapCell { x: 10.0, y: 10.0, intensity: 1 });
        state.apply_heatmap_update(first);

        let mut second = HashMap::new();
        second.insert((0, 0), HeatmapCell { x: 10.0, y: 10.0, intensity: 5 });
        second.insert((1, 0), HeatmapCell { x: 30.0, y: 10.0, intensity: 2 });
        state.apply_heatmap_update(second);

        assert_eq!(state.cells().len(), 2);
        assert_eq!(state.total_intensity(), 7);
    }

    #[test]
    fn test_player_moved_patch() {
        let mut state = ObserverState::new();
        state.apply_game_update(1, snapshot_of(&[sample_player("guest_1", 400.0)]));

        state.apply_player_moved("guest_1", 405.0, 260.0);

        let patched = &state.players()["guest_1"];
        assert_approx_eq!(patched.x, 405.0);
        assert_approx_eq!(patched.y, 260.0);
    }

    #[test]
    fn test_player_moved_unknown_id_skipped() {
        let mut state = ObserverState::new();
        state.apply_player_moved("guest_9", 405.0, 260.0);

        assert!(state.players().is_empty());
    }

    #[test]
    fn test_player_disconnected_removes() {
        let mut state = ObserverState::new();
        state.apply_game_update(
            1,
            snapshot_of(&[sample_player("home_4", 100.0), sample_player("guest_1", 400.0)]),
        );

        state.apply_player_disconnected("guest_1");

        assert_eq!(state.players().len(), 1);
        assert!(state.players().contains_key("home_4"));
    }
}
