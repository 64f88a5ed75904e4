//! UDP connection to the simulation server.

use crate::state::ObserverState;
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::{Direction, ObserverMode, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::time::interval;

/// How often the observer proves liveness to the server. Must stay well
/// under the server's 5 second reaping threshold.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Cadence of the one-line session summary in the monitor binary.
const SUMMARY_INTERVAL: Duration = Duration::from_secs(5);

pub struct ObserverClient {
    socket: UdpSocket,
    server_addr: SocketAddr,
    mode: ObserverMode,
    observer_id: Option<u32>,
    player_id: Option<String>,
    connected: bool,
    state: ObserverState,
}

impl ObserverClient {
    pub async fn new(
        server_addr: &str,
        mode: ObserverMode,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(ObserverClient {
            socket,
            server_addr,
            mode,
            observer_id: None,
            player_id: None,
            connected: false,
            state: ObserverState::new(),
        })
    }

    /// Mirror of the server's most recent broadcasts.
    pub fn state(&self) -> &ObserverState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Id assigned by the server during the handshake.
    pub fn observer_id(&self) -> Option<u32> {
        self.observer_id
    }

    /// Id of the controlled player owned by this connection, if any.
    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    async fn connect(&self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server at {}...", self.server_addr);

        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
            mode: self.mode,
        };
        self.send_packet(&packet).await?;

        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    /// Sends one directional command for the owned player. A monitor-mode
    /// connection owns no player and the command would be refused
    /// server-side, so it is rejected here first.
    pub async fn send_move(&self, direction: Direction) -> Result<(), Box<dyn std::error::Error>> {
        if self.player_id.is_none() {
            return Err("connection owns no controlled player".into());
        }

        self.send_packet(&Packet::Move { direction }).await
    }

    fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Connected {
                observer_id,
                player_id,
            } => {
                info!("Connected as observer {}", observer_id);
                if let Some(id) = &player_id {
                    info!("Controlling player {}", id);
                }
                self.observer_id = Some(observer_id);
                self.player_id = player_id;
                self.connected = true;
            }

            Packet::Disconnected { reason } => {
                warn!("Disconnected by server: {}", reason);
                self.connected = false;
                self.observer_id = None;
                self.player_id = None;
            }

            Packet::FieldConfig { width, height } => {
                self.state.apply_field_config(width, height);
            }

            Packet::GameUpdate { tick, players } => {
                self.state.apply_game_update(tick, players);
            }

            Packet::HeatmapUpdate { cells } => {
                self.state.apply_heatmap_update(cells);
            }

            Packet::PlayerMoved { id, x, y } => {
                self.state.apply_player_moved(&id, x, y);
            }

            Packet::PlayerDisconnected { id } => {
                self.state.apply_player_disconnected(&id);
            }

            _ => {
                warn!("Unexpected packet type");
            }
        }
    }

    fn log_summary(&self) {
        if let Some(field) = self.state.field() {
            info!(
                "Tick {}: {} players on {}x{} pitch, {} heatmap cells ({} samples)",
                self.state.tick(),
                self.state.players().len(),
                field.width,
                field.height,
                self.state.cells().len(),
                self.state.total_intensity()
            );
        }
    }

    /// Drives the connection until Ctrl+C: receives broadcasts, heartbeats,
    /// and periodically logs a session summary.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut heartbeat_interval = interval(HEARTBEAT_INTERVAL);
        let mut summary_interval = interval(SUMMARY_INTERVAL);

        let mut buffer = [0u8; 65536];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                                self.handle_packet(packet);
                            } else {
                                warn!("Failed to deserialize packet from server");
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = heartbeat_interval.tick() => {
                    if self.connected {
                        let packet = Packet::Heartbeat { timestamp: now_millis() };
                        if let Err(e) = self.send_packet(&packet).await {
                            error!("Error sending heartbeat: {}", e);
                        }
                    }
                },

                _ = summary_interval.tick() => {
                    if self.connected {
                        self.log_summary();
                    }
                },

                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, disconnecting...");
                    break;
                },
            }
        }

        if self.connected {
            let _ = self.send_packet(&Packet::Disconnect).await;
        }

        Ok(())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}
