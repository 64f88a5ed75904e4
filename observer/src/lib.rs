//! # Observer Client Library
//!
//! Headless client for the pitch telemetry server. It connects over UDP,
//! mirrors the server's full-snapshot broadcasts into a local
//! [`state::ObserverState`], proves liveness with heartbeats, and in
//! participant mode owns one controlled player it can move with directional
//! commands.
//!
//! The client holds no simulation logic of its own: whatever the server
//! last broadcast is the truth, and a missed datagram is simply healed by
//! the next snapshot. Rendering, charting and input capture are external
//! concerns layered on top of [`state::ObserverState`].

pub mod network;
pub mod state;
