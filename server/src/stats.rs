//! Randomized physiological / performance stat bundles.

use rand::Rng;
use shared::PlayerStats;

/// Draws a fresh stat bundle. Every field is an independent uniform sample;
/// successive draws for the same player have no continuity (each refresh
/// models a full re-measurement, not a walk).
pub fn generate_stats(rng: &mut impl Rng) -> PlayerStats {
    PlayerStats {
        heart_rate: rng.gen_range(120..=180),          // bpm
        speed: rng.gen_range(5.0..30.0),               // km/h
        stamina: rng.gen_range(0..=100),               // percent
        distance_covered: rng.gen_range(0.0..3000.0),  // meters
        temperature: rng.gen_range(36.0..41.0),        // Celsius
    }
}
