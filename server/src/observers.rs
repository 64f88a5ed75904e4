//! Observer connection management for the broadcast server.
//!
//! This module handles the server-side bookkeeping of connected observers:
//! - Connection lifecycle (connect, disconnect, heartbeat timeout)
//! - Address tracking for datagram routing
//! - Ownership link between a participant observer and its controlled player
//!
//! Observers are passive with respect to simulation state: the registry owns
//! connection records only, never world data, so dropping an observer can
//! never corrupt a tick.

use log::info;
use shared::ObserverMode;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Heartbeat silence after which an observer is presumed gone.
pub const OBSERVER_TIMEOUT: Duration = Duration::from_secs(5);

/// One connected observer.
///
/// Tracks connection metadata (id, address, last activity) and, for
/// participants, the id of the controlled player owned by this connection.
#[derive(Debug, Clone)]
pub struct Observer {
    /// Unique observer identifier assigned by the server
    pub id: u32,
    /// Network address for routing broadcasts
    pub addr: SocketAddr,
    /// Last time any packet arrived from this observer
    pub last_seen: Instant,
    /// Monitor or participant
    pub mode: ObserverMode,
    /// Controlled player owned by this connection, if any
    pub player_id: Option<String>,
}

impl Observer {
    pub fn new(id: u32, addr: SocketAddr, mode: ObserverMode, player_id: Option<String>) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            mode,
            player_id,
        }
    }

    /// Marks the observer as recently active.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// True if no packet has arrived within `timeout`.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Registry of all connected observers.
///
/// There is no capacity limit: the session supports any number of passive
/// observers, and each costs one bookkeeping record plus one datagram per
/// broadcast. Ids start from 1 and increment per connection.
#[derive(Debug, Default)]
pub struct ObserverManager {
    observers: HashMap<u32, Observer>,
    next_observer_id: u32,
}

impl ObserverManager {
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
            next_observer_id: 1,
        }
    }

    /// Registers a new observer and returns its id.
    pub fn register(
        &mut self,
        addr: SocketAddr,
        mode: ObserverMode,
        player_id: Option<String>,
    ) -> u32 {
        let observer_id = self.next_observer_id;
        self.next_observer_id += 1;

        let observer = Observer::new(observer_id, addr, mode, player_id);
        info!("Observer {} connected from {} ({:?})", observer_id, addr, mode);
        self.observers.insert(observer_id, observer);

        observer_id
    }

    /// Removes an observer, returning its record so the caller can tear
    /// down any controlled player it owned.
    pub fn remove(&mut self, observer_id: u32) -> Option<Observer> {
        let removed = self.observers.remove(&observer_id);
        if let Some(observer) = &removed {
            info!("Observer {} disconnected", observer.id);
        }
        removed
    }

    /// Removes an observer by its network address. Used when the transport
    /// reports a dead peer before any explicit disconnect arrived.
    pub fn remove_by_addr(&mut self, addr: SocketAddr) -> Option<Observer> {
        let observer_id = self.find_by_addr(addr)?;
        self.remove(observer_id)
    }

    /// Records the controlled player spawned for an observer. Guest ids
    /// derive from the observer id, so the link is set right after
    /// registration. Returns false for an unknown observer.
    pub fn link_player(&mut self, observer_id: u32, player_id: String) -> bool {
        if let Some(observer) = self.observers.get_mut(&observer_id) {
            observer.player_id = Some(player_id);
            true
        } else {
            false
        }
    }

    /// Looks up the observer connected from an address.
    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.observers
            .iter()
            .find(|(_, observer)| observer.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Refreshes the liveness timestamp for the observer at an address.
    /// Returns false if no observer is connected from there.
    pub fn touch_by_addr(&mut self, addr: SocketAddr) -> bool {
        if let Some(id) = self.find_by_addr(addr) {
            if let Some(observer) = self.observers.get_mut(&id) {
                observer.touch();
                return true;
            }
        }
        false
    }

    /// Controlled player owned by the observer at an address, if any.
    pub fn player_owned_by_addr(&self, addr: SocketAddr) -> Option<String> {
        self.find_by_addr(addr)
            .and_then(|id| self.observers.get(&id))
            .and_then(|observer| observer.player_id.clone())
    }

    /// Removes and returns every observer whose heartbeat lapsed. The
    /// caller tears down owned players for the returned records.
    pub fn check_timeouts(&mut self) -> Vec<Observer> {
        let timed_out: Vec<u32> = self
            .observers
            .iter()
            .filter(|(_, observer)| observer.is_timed_out(OBSERVER_TIMEOUT))
            .map(|(id, _)| *id)
            .collect();

        timed_out
            .into_iter()
            .filter_map(|id| self.remove(id))
            .collect()
    }

    /// All observer ids and addresses, for broadcast fan-out.
    pub fn addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.observers
            .iter()
            .map(|(id, observer)| (*id, observer.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
