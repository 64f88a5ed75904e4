//! Property tests for the simulation core, plus throughput checks for the
//! hot per-tick paths.

use assert_approx_eq::assert_approx_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::heatmap::HeatmapGrid;
use server::motion::MotionConfig;
use server::roster::{default_roster, RosterEntry};
use server::world::WorldStore;
use shared::{FieldConfig, PlayerRole, Team, WALK_STEP};
use std::collections::HashMap;

/// The two-player scenario roster: one keeper, one forward.
fn scenario_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry {
            team: Team::Home,
            name: "Silva",
            role: PlayerRole::Goalkeeper,
            number: 1,
            x: 100.0,
            y: 100.0,
        },
        RosterEntry {
            team: Team::Away,
            name: "Taylor",
            role: PlayerRole::Forward,
            number: 7,
            x: 200.0,
            y: 200.0,
        },
    ]
}

fn pinned_config() -> MotionConfig {
    MotionConfig {
        resample_chance: 0.0,
        step: WALK_STEP,
    }
}

/// AUTONOMOUS MOTION PROPERTIES
mod motion_properties {
    use super::*;

    /// Positions never leave the playable band, no matter how long the
    /// simulation runs with the production policy.
    #[test]
    fn bounds_invariant_over_long_run() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut world = WorldStore::from_roster(&default_roster(), &mut rng).unwrap();
        let field = FieldConfig::default();
        let config = MotionConfig::default();
        let mut heatmap = HeatmapGrid::new();

        for _ in 0..500 {
            world.advance(&field, &config, &mut heatmap, &mut rng);
            for player in world.snapshot().values() {
                assert!(
                    field.in_bounds(player.x, player.y),
                    "{} left the band at ({}, {})",
                    player.id,
                    player.x,
                    player.y
                );
            }
        }
    }

    /// Each axis moves by exactly 0 or ±1 per tick, never more. Targets
    /// jump around, positions do not.
    #[test]
    fn per_axis_step_is_zero_or_unit() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut world = WorldStore::from_roster(&default_roster(), &mut rng).unwrap();
        let field = FieldConfig::default();
        let config = MotionConfig::default();
        let mut heatmap = HeatmapGrid::new();

        let mut before = world.snapshot();
        for _ in 0..200 {
            world.advance(&field, &config, &mut heatmap, &mut rng);
            let after = world.snapshot();

            for (id, player) in &after {
                let prev = &before[id];
                for delta in [player.x - prev.x, player.y - prev.y] {
                    let is_zero = delta.abs() < 1e-6;
                    let is_unit = (delta.abs() - WALK_STEP).abs() < 1e-6;
                    assert!(
                        is_zero || is_unit,
                        "{} moved {} in one tick",
                        id,
                        delta
                    );
                }
            }

            before = after;
        }
    }

    /// With resampling disabled and targets on top of positions, nothing
    /// moves for any number of ticks.
    #[test]
    fn stationary_when_resampling_disabled() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut world = WorldStore::from_roster(&scenario_roster(), &mut rng).unwrap();
        let field = FieldConfig::new(400.0, 300.0);
        let mut heatmap = HeatmapGrid::new();

        for _ in 0..100 {
            world.advance(&field, &pinned_config(), &mut heatmap, &mut rng);
        }

        let keeper = world.get("home_1").unwrap();
        assert_approx_eq!(keeper.x, 100.0);
        assert_approx_eq!(keeper.y, 100.0);

        let forward = world.get("away_7").unwrap();
        assert_approx_eq!(forward.x, 200.0);
        assert_approx_eq!(forward.y, 200.0);
    }

    /// A 50 px target offset is covered in exactly 50 ticks of monotone
    /// 1 px/tick convergence, then holds.
    #[test]
    fn converges_in_exactly_fifty_ticks() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut world = WorldStore::from_roster(&scenario_roster(), &mut rng).unwrap();
        let field = FieldConfig::new(400.0, 300.0);
        let config = pinned_config();
        let mut heatmap = HeatmapGrid::new();

        world.mutate("home_1", |p| {
            p.target_x = 150.0;
            p.target_y = 100.0;
        });

        for _ in 0..49 {
            world.advance(&field, &config, &mut heatmap, &mut rng);
        }
        assert_approx_eq!(world.get("home_1").unwrap().x, 149.0);

        world.advance(&field, &config, &mut heatmap, &mut rng);
        let keeper = world.get("home_1").unwrap();
        assert_approx_eq!(keeper.x, 150.0);
        assert_approx_eq!(keeper.y, 100.0);

        // Converged: further ticks change nothing
        for _ in 0..10 {
            world.advance(&field, &config, &mut heatmap, &mut rng);
        }
        assert_approx_eq!(world.get("home_1").unwrap().x, 150.0);
    }

    /// The same seed replays the same session.
    #[test]
    fn seeded_sessions_reproducible() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut world = WorldStore::from_roster(&default_roster(), &mut rng).unwrap();
            let field = FieldConfig::default();
            let config = MotionConfig::default();
            let mut heatmap = HeatmapGrid::new();
            for _ in 0..100 {
                world.advance(&field, &config, &mut heatmap, &mut rng);
            }
            world.snapshot()
        };

        let first = run(1234);
        let second = run(1234);

        assert_eq!(first.len(), second.len());
        for (id, player) in &first {
            assert_eq!(player, &second[id], "{} diverged between replays", id);
        }
    }
}

/// HEATMAP AGGREGATION PROPERTIES
mod heatmap_properties {
    use super::*;

    /// Every player contributes exactly one visit per tick: the total
    /// intensity after N ticks is N x players.
    #[test]
    fn total_intensity_is_ticks_times_players() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut world = WorldStore::from_roster(&default_roster(), &mut rng).unwrap();
        let field = FieldConfig::default();
        let config = MotionConfig::default();
        let mut heatmap = HeatmapGrid::new();

        for tick in 1..=250u64 {
            world.advance(&field, &config, &mut heatmap, &mut rng);
            assert_eq!(heatmap.total_intensity(), tick * 16);
        }
    }

    /// Per-cell intensity never decreases across a running simulation.
    #[test]
    fn per_cell_intensity_monotone() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut world = WorldStore::from_roster(&default_roster(), &mut rng).unwrap();
        let field = FieldConfig::default();
        let config = MotionConfig::default();
        let mut heatmap = HeatmapGrid::new();

        let mut seen: HashMap<(i32, i32), u64> = HashMap::new();

        for _ in 0..300 {
            world.advance(&field, &config, &mut heatmap, &mut rng);

            for (key, cell) in heatmap.snapshot() {
                let previous = seen.insert(key, cell.intensity).unwrap_or(0);
                assert!(
                    cell.intensity >= previous,
                    "cell {:?} intensity shrank",
                    key
                );
            }
        }
    }

    /// Cell midpoints are fixed at first observation and survive any number
    /// of later visits from different points in the cell.
    #[test]
    fn cell_centers_never_drift() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut world = WorldStore::from_roster(&default_roster(), &mut rng).unwrap();
        let field = FieldConfig::default();
        let config = MotionConfig::default();
        let mut heatmap = HeatmapGrid::new();

        let mut centers: HashMap<(i32, i32), (f32, f32)> = HashMap::new();

        for _ in 0..300 {
            world.advance(&field, &config, &mut heatmap, &mut rng);

            for (key, cell) in heatmap.snapshot() {
                let center = centers.entry(key).or_insert((cell.x, cell.y));
                assert_eq!(*center, (cell.x, cell.y), "cell {:?} center moved", key);
            }
        }
    }
}

/// THROUGHPUT CHECKS
mod throughput {
    use super::*;
    use std::time::Instant;

    /// Benchmarks the full per-tick pass over the default roster.
    #[test]
    fn benchmark_tick_pass() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = WorldStore::from_roster(&default_roster(), &mut rng).unwrap();
        let field = FieldConfig::default();
        let config = MotionConfig::default();
        let mut heatmap = HeatmapGrid::new();

        let iterations = 10_000;
        let start = Instant::now();

        for _ in 0..iterations {
            world.advance(&field, &config, &mut heatmap, &mut rng);
        }

        let duration = start.elapsed();
        println!(
            "Tick pass: {} iterations x 16 players in {:?} ({:.2} µs/tick)",
            iterations,
            duration,
            duration.as_micros() as f64 / iterations as f64
        );

        // A 200ms cadence leaves enormous headroom; 10k passes should take
        // well under 5 seconds even on slow CI
        assert!(duration.as_millis() < 5000);
    }

    /// Benchmarks snapshot serialization, the per-broadcast hot path.
    #[test]
    fn benchmark_snapshot_serialization() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = WorldStore::from_roster(&default_roster(), &mut rng).unwrap();
        let field = FieldConfig::default();
        let config = MotionConfig::default();
        let mut heatmap = HeatmapGrid::new();

        // Populate some history so the heatmap payload is realistic
        for _ in 0..100 {
            world.advance(&field, &config, &mut heatmap, &mut rng);
        }

        let iterations = 1_000;
        let start = Instant::now();

        for _ in 0..iterations {
            let world_payload = bincode::serialize(&shared::Packet::GameUpdate {
                tick: world.tick(),
                players: world.snapshot(),
            })
            .unwrap();
            let heatmap_payload = bincode::serialize(&shared::Packet::HeatmapUpdate {
                cells: heatmap.snapshot(),
            })
            .unwrap();

            assert!(!world_payload.is_empty());
            assert!(!heatmap_payload.is_empty());
        }

        let duration = start.elapsed();
        println!(
            "Snapshot serialization: {} iterations in {:?} ({:.2} µs/iter)",
            iterations,
            duration,
            duration.as_micros() as f64 / iterations as f64
        );

        assert!(duration.as_millis() < 5000);
    }
}
