//! # Pitch Telemetry Server Library
//!
//! This library provides the authoritative simulation server for the pitch
//! telemetry monitor. It owns the canonical world model (positions, roles
//! and live stats of a fixed roster of players on a bounded 2-D pitch),
//! advances it on a fixed cadence, accumulates a session-lifetime occupancy
//! heatmap, and keeps any number of passive observer connections
//! synchronized through full-snapshot broadcasts.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the only copy of the world that matters. Autonomous
//! players wander toward role-biased targets one step per tick; controlled
//! players move only when their owning connection commands it. Observers
//! receive state, they never compute it.
//!
//! ### Observer Management
//! Handles the complete lifecycle of observer connections:
//! - Connection handshake with a consistent full starting snapshot
//! - Heartbeat-based liveness and timeout reaping
//! - Participant mode, where a connection owns one controlled player
//! - Disconnection cleanup, including controlled-player teardown
//!
//! ### State Broadcasting
//! Every completed motion pass is broadcast as a full world snapshot; the
//! heatmap goes out on its own, slower cadence. There is no delta encoding
//! and no retry; a reconnecting observer simply receives a fresh snapshot.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Run Loop
//! One `tokio::select!` loop owns the world store and the heatmap. Inbound
//! packets, the motion tick and the heatmap tick are arms of that loop, so
//! mutation and snapshotting can never interleave: a snapshot always
//! reflects a completed pass. Receiver, sender and timeout-reaper tasks talk
//! to the loop over channels and never touch simulation state.
//!
//! ### UDP-Based Communication
//! Datagrams with explicit connect/heartbeat/disconnect lifecycle packets.
//! Broadcast is fire-and-forget per observer: a slow or dead observer
//! cannot stall the tick or other observers' delivery.
//!
//! ## Module Organization
//!
//! - [`roster`]: static seed data and startup validation (the only fatal
//!   error path in the system)
//! - [`world`]: the authoritative store and the per-tick simulation pass
//! - [`motion`]: wander policy and directional commands
//! - [`stats`]: randomized physiological stat bundles
//! - [`heatmap`]: sparse monotone occupancy grid
//! - [`observers`]: connection bookkeeping
//! - [`network`]: UDP transport, broadcast dispatch and the run loop

pub mod heatmap;
pub mod motion;
pub mod network;
pub mod observers;
pub mod roster;
pub mod stats;
pub mod world;
