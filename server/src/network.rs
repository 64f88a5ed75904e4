//! Server network layer handling UDP communications and tick coordination.
//!
//! One receiver task feeds inbound packets into the run loop over a channel;
//! the run loop is the sole owner of the world store and heatmap; a sender
//! task drains the outbound queue so the simulation never blocks on observer
//! I/O. A slow or dead observer costs nothing but its own delivery.

use crate::heatmap::HeatmapGrid;
use crate::motion::{self, MotionConfig};
use crate::observers::ObserverManager;
use crate::roster::RosterEntry;
use crate::world::WorldStore;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    FieldConfig, ObserverMode, Packet, HEATMAP_INTERVAL_MS, MOTION_INTERVAL_MS, PROTOCOL_VERSION,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to the main run loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    /// An observer vanished (heartbeat lapse or dead transport). Carries the
    /// controlled player to tear down, if the observer owned one.
    ObserverLost {
        observer_id: u32,
        player_id: Option<String>,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the run loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
    BroadcastPacket { packet: Packet },
}

/// Startup configuration for the simulation server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub field: FieldConfig,
    pub motion_interval: Duration,
    pub heatmap_interval: Duration,
    /// Fixed RNG seed for reproducible sessions; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            motion_interval: Duration::from_millis(MOTION_INTERVAL_MS),
            heatmap_interval: Duration::from_millis(HEATMAP_INTERVAL_MS),
            seed: None,
        }
    }
}

/// Main server coordinating networking and the simulation tick.
pub struct Server {
    socket: Arc<UdpSocket>,
    observers: Arc<RwLock<ObserverManager>>,
    world: WorldStore,
    heatmap: HeatmapGrid,
    field: FieldConfig,
    motion: MotionConfig,
    motion_interval: Duration,
    heatmap_interval: Duration,
    rng: StdRng,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        roster: &[RosterEntry],
        config: ServerConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let world = WorldStore::from_roster(roster, &mut rng)?;

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            observers: Arc::new(RwLock::new(ObserverManager::new())),
            world,
            heatmap: HeatmapGrid::new(),
            field: config.field,
            motion: MotionConfig::default(),
            motion_interval: config.motion_interval,
            heatmap_interval: config.heatmap_interval,
            rng,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Address the server socket is bound to. Needed when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 65536];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes the outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let observers = Arc::clone(&self.observers);
        let server_tx = self.server_tx.clone();
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                            Self::drop_dead_observer(&observers, &server_tx, addr).await;
                        }
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        let observer_addrs = {
                            let observers_guard = observers.read().await;
                            observers_guard.addrs()
                        };

                        for (observer_id, addr) in observer_addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to observer {}: {}", observer_id, e);
                                Self::drop_dead_observer(&observers, &server_tx, addr).await;
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that reaps observers whose heartbeat lapsed
    async fn spawn_timeout_checker(&self) {
        let observers = Arc::clone(&self.observers);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut check_interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                check_interval.tick().await;

                let reaped = {
                    let mut observers_guard = observers.write().await;
                    observers_guard.check_timeouts()
                };

                for observer in reaped {
                    if server_tx
                        .send(ServerMessage::ObserverLost {
                            observer_id: observer.id,
                            player_id: observer.player_id,
                        })
                        .is_err()
                    {
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    /// A failed send means a dead peer: drop only that observer and let the
    /// run loop tear down any controlled player it owned.
    async fn drop_dead_observer(
        observers: &Arc<RwLock<ObserverManager>>,
        server_tx: &mpsc::UnboundedSender<ServerMessage>,
        addr: SocketAddr,
    ) {
        let removed = {
            let mut observers_guard = observers.write().await;
            observers_guard.remove_by_addr(addr)
        };

        if let Some(observer) = removed {
            let _ = server_tx.send(ServerMessage::ObserverLost {
                observer_id: observer.id,
                player_id: observer.player_id,
            });
        }
    }

    async fn send_packet(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket {
            packet: packet.clone(),
            addr,
        }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    async fn broadcast_packet(&self, packet: &Packet) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket {
            packet: packet.clone(),
        }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Processes one inbound packet.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect {
                client_version,
                mode,
            } => {
                info!(
                    "Observer connecting from {} (version: {}, mode: {:?})",
                    addr, client_version, mode
                );
                if client_version != PROTOCOL_VERSION {
                    warn!(
                        "Observer at {} speaks protocol {}, server speaks {}",
                        addr, client_version, PROTOCOL_VERSION
                    );
                }

                // A reconnect from the same address replaces the stale session
                let stale = {
                    let mut observers = self.observers.write().await;
                    observers.remove_by_addr(addr)
                };
                if let Some(observer) = stale {
                    info!("Replacing stale session of observer {}", observer.id);
                    self.teardown_player(observer.player_id).await;
                }

                let observer_id = {
                    let mut observers = self.observers.write().await;
                    observers.register(addr, mode, None)
                };

                let player_id = match mode {
                    ObserverMode::Participant => {
                        let id = self.world.spawn_guest(observer_id, &self.field, &mut self.rng);
                        let mut observers = self.observers.write().await;
                        observers.link_player(observer_id, id.clone());
                        Some(id)
                    }
                    ObserverMode::Monitor => None,
                };

                // Handshake: ack, then the full picture in a fixed order so
                // a late joiner starts exactly where everyone else already is
                self.send_packet(
                    &Packet::Connected {
                        observer_id,
                        player_id,
                    },
                    addr,
                )
                .await;
                self.send_packet(
                    &Packet::FieldConfig {
                        width: self.field.width,
                        height: self.field.height,
                    },
                    addr,
                )
                .await;
                self.send_packet(
                    &Packet::GameUpdate {
                        tick: self.world.tick(),
                        players: self.world.snapshot(),
                    },
                    addr,
                )
                .await;
                self.send_packet(
                    &Packet::HeatmapUpdate {
                        cells: self.heatmap.snapshot(),
                    },
                    addr,
                )
                .await;
            }

            Packet::Heartbeat { .. } => {
                let known = {
                    let mut observers = self.observers.write().await;
                    observers.touch_by_addr(addr)
                };
                if !known {
                    debug!("Heartbeat from unregistered address {}", addr);
                }
            }

            Packet::Move { direction } => {
                let player_id = {
                    let mut observers = self.observers.write().await;
                    observers.touch_by_addr(addr);
                    observers.player_owned_by_addr(addr)
                };

                match player_id {
                    Some(id) => {
                        let applied = self
                            .world
                            .mutate(&id, |player| motion::apply_command(player, direction));

                        if applied {
                            if let Some(player) = self.world.get(&id) {
                                let packet = Packet::PlayerMoved {
                                    id: id.clone(),
                                    x: player.x,
                                    y: player.y,
                                };
                                self.broadcast_packet(&packet).await;
                            }
                        }
                    }
                    None => warn!("Move command from non-participant at {}", addr),
                }
            }

            Packet::Disconnect => {
                let removed = {
                    let mut observers = self.observers.write().await;
                    observers.remove_by_addr(addr)
                };
                if let Some(observer) = removed {
                    self.teardown_player(observer.player_id).await;
                }
            }

            _ => {
                warn!("Unexpected packet type from {}", addr);
            }
        }
    }

    /// Removes a departing participant's controlled player and announces it.
    async fn teardown_player(&mut self, player_id: Option<String>) {
        if let Some(id) = player_id {
            if self.world.remove_player(&id) {
                self.broadcast_packet(&Packet::PlayerDisconnected { id }).await;
            }
        }
    }

    /// Broadcasts the post-pass world snapshot to all connected observers
    async fn broadcast_game_state(&self) {
        let observer_count = {
            let observers = self.observers.read().await;
            observers.len()
        };
        if observer_count == 0 {
            return;
        }

        let packet = Packet::GameUpdate {
            tick: self.world.tick(),
            players: self.world.snapshot(),
        };
        self.broadcast_packet(&packet).await;
    }

    /// Broadcasts the current heatmap snapshot to all connected observers
    async fn broadcast_heatmap(&self) {
        let observer_count = {
            let observers = self.observers.read().await;
            observers.len()
        };
        if observer_count == 0 {
            return;
        }

        let packet = Packet::HeatmapUpdate {
            cells: self.heatmap.snapshot(),
        };
        self.broadcast_packet(&packet).await;
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        // Initialize concurrent tasks
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut motion_interval = interval(self.motion_interval);
        motion_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut heatmap_interval = interval(self.heatmap_interval);
        heatmap_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick of each interval since it fires immediately;
        // the first pass lands one full period after startup
        motion_interval.tick().await;
        heatmap_interval.tick().await;

        info!(
            "Simulation started: {} players, motion tick {:?}, heatmap tick {:?}",
            self.world.len(),
            self.motion_interval,
            self.heatmap_interval
        );

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ObserverLost { observer_id, player_id }) => {
                            debug!("Observer {} lost", observer_id);
                            self.teardown_player(player_id).await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Motion tick: advance every player, then broadcast the
                // completed pass, never a half-applied one
                _ = motion_interval.tick() => {
                    self.world.advance(&self.field, &self.motion, &mut self.heatmap, &mut self.rng);
                    self.broadcast_game_state().await;

                    // Periodic diagnostics, every ~20s at the default cadence
                    if self.world.tick() % 100 == 0 {
                        let observer_count = {
                            let observers = self.observers.read().await;
                            observers.len()
                        };
                        debug!(
                            "Tick {}: {} observers, {} heatmap cells, {} samples",
                            self.world.tick(),
                            observer_count,
                            self.heatmap.len(),
                            self.heatmap.total_intensity()
                        );
                    }
                },

                // Heatmap cadence is independent of the motion tick
                _ = heatmap_interval.tick() => {
                    self.broadcast_heatmap().await;
                },
            }
        }

        Ok(())
    }
}
