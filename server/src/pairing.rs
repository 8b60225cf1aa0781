//! Lobby and matchmaking
//!
//! Players who completed the handshake wait here in arrival order. As soon as
//! two are waiting, the two oldest leave the queue together and a
//! [`MatchSession`] is started for them.
//!
//! All queue operations happen under one lock, so a player is either still
//! waiting or already seated in exactly one match, never both.

use crate::session::{MatchSession, SessionCommand};
use log::info;
use shared::{Color, ServerMessage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot, Mutex};

pub type PlayerId = u64;

/// Handed to a waiting connection once it has a seat in a match
#[derive(Debug, Clone)]
pub struct SessionLink {
    pub match_id: u64,
    pub color: Color,
    pub commands: mpsc::UnboundedSender<SessionCommand>,
}

/// A connection that has joined and is waiting for an opponent
#[derive(Debug)]
pub struct WaitingPlayer {
    pub id: PlayerId,
    pub name: String,
    /// Messages for this player's connection task
    pub outbox: mpsc::UnboundedSender<ServerMessage>,
    /// Fires once when the player is seated
    pub link: oneshot::Sender<SessionLink>,
}

/// FIFO of waiting players
#[derive(Debug, Default)]
pub struct PairingQueue {
    waiting: VecDeque<WaitingPlayer>,
}

impl PairingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player and pops the two oldest players once a pair exists
    ///
    /// The first of the returned pair has waited longest.
    pub fn enqueue(&mut self, player: WaitingPlayer) -> Option<(WaitingPlayer, WaitingPlayer)> {
        self.waiting.push_back(player);
        if self.waiting.len() < 2 {
            return None;
        }
        let first = self.waiting.pop_front()?;
        let second = self.waiting.pop_front()?;
        Some((first, second))
    }

    /// Takes a player out of the queue; false if they were not waiting
    pub fn remove(&mut self, id: PlayerId) -> bool {
        match self.waiting.iter().position(|player| player.id == id) {
            Some(index) => {
                self.waiting.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns `requested`, or `requested_2`, `requested_3`, ... if someone
    /// already waiting uses that name
    pub fn unique_name(&self, requested: &str) -> String {
        let taken = |name: &str| self.waiting.iter().any(|player| player.name == name);
        if !taken(requested) {
            return requested.to_string();
        }
        (2..)
            .map(|suffix| format!("{}_{}", requested, suffix))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| requested.to_string())
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}

/// Shared matchmaking service used by every connection task
#[derive(Debug)]
pub struct PairingService {
    queue: Mutex<PairingQueue>,
    next_match_id: AtomicU64,
    random_colors: bool,
}

impl PairingService {
    pub fn new(random_colors: bool) -> Self {
        Self {
            queue: Mutex::new(PairingQueue::new()),
            next_match_id: AtomicU64::new(1),
            random_colors,
        }
    }

    /// Puts a player in the queue and returns the display name they got
    ///
    /// The player is told their queue position first. If this completes a
    /// pair, the match is started before the lock is released.
    pub async fn enqueue(
        &self,
        id: PlayerId,
        requested_name: &str,
        outbox: mpsc::UnboundedSender<ServerMessage>,
        link: oneshot::Sender<SessionLink>,
    ) -> String {
        let mut queue = self.queue.lock().await;
        let name = queue.unique_name(requested_name);

        let _ = outbox.send(ServerMessage::Queued {
            position: queue.len() + 1,
        });
        info!("{} is waiting for an opponent", name);

        let player = WaitingPlayer {
            id,
            name: name.clone(),
            outbox,
            link,
        };
        if let Some((first, second)) = queue.enqueue(player) {
            let match_id = self.next_match_id.fetch_add(1, Ordering::Relaxed);
            let (white, black) = if self.random_colors && rand::random::<bool>() {
                (second, first)
            } else {
                (first, second)
            };
            MatchSession::start(match_id, white, black);
        }

        name
    }

    /// Takes a player out of the queue when they leave before being paired
    ///
    /// Returns false if the player was already seated in a match.
    pub async fn remove(&self, id: PlayerId) -> bool {
        let removed = self.queue.lock().await.remove(id);
        if removed {
            info!("Player {} left the queue", id);
        }
        removed
    }

    pub async fn waiting(&self) -> usize {
        self.queue.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: PlayerId, name: &str) -> WaitingPlayer {
        let (outbox, _) = mpsc::unbounded_channel();
        let (link, _) = oneshot::channel();
        WaitingPlayer {
            id,
            name: name.to_string(),
            outbox,
            link,
        }
    }

    #[test]
    fn test_pairs_in_arrival_order() {
        let mut queue = PairingQueue::new();
        assert!(queue.enqueue(player(1, "a")).is_none());
        assert_eq!(queue.len(), 1);

        let (first, second) = queue.enqueue(player(2, "b")).unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert!(queue.is_empty());

        assert!(queue.enqueue(player(3, "c")).is_none());
        let (first, second) = queue.enqueue(player(4, "d")).unwrap();
        assert_eq!((first.id, second.id), (3, 4));
    }

    #[test]
    fn test_remove_waiting_player() {
        let mut queue = PairingQueue::new();
        queue.enqueue(player(1, "a"));

        assert!(queue.remove(1));
        assert!(!queue.remove(1));
        assert_eq!(queue.len(), 0);

        // A leaver never gets paired
        assert!(queue.enqueue(player(2, "b")).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_unique_names() {
        let mut queue = PairingQueue::new();
        assert_eq!(queue.unique_name("alice"), "alice");

        queue.waiting.push_back(player(1, "alice"));
        assert_eq!(queue.unique_name("alice"), "alice_2");

        queue.waiting.push_back(player(2, "alice_2"));
        assert_eq!(queue.unique_name("alice"), "alice_3");
        assert_eq!(queue.unique_name("bob"), "bob");
    }

    #[tokio::test]
    async fn test_service_queues_then_seats_two_players() {
        let service = PairingService::new(false);

        let (outbox_a, mut rx_a) = mpsc::unbounded_channel();
        let (link_a, link_rx_a) = oneshot::channel();
        let name = service.enqueue(1, "alice", outbox_a, link_a).await;
        assert_eq!(name, "alice");
        assert_eq!(rx_a.recv().await, Some(ServerMessage::Queued { position: 1 }));
        assert_eq!(service.waiting().await, 1);

        let (outbox_b, mut rx_b) = mpsc::unbounded_channel();
        let (link_b, link_rx_b) = oneshot::channel();
        let name = service.enqueue(2, "alice", outbox_b, link_b).await;
        assert_eq!(name, "alice_2");
        assert_eq!(rx_b.recv().await, Some(ServerMessage::Queued { position: 2 }));
        assert_eq!(service.waiting().await, 0);

        let link_a = link_rx_a.await.unwrap();
        let link_b = link_rx_b.await.unwrap();
        assert_eq!(link_a.color, Color::White);
        assert_eq!(link_b.color, Color::Black);
        assert_eq!(link_a.match_id, link_b.match_id);

        assert_eq!(
            rx_a.recv().await,
            Some(ServerMessage::Paired {
                opponent: "alice_2".to_string(),
                color: Color::White
            })
        );
        assert!(!service.remove(1).await);
    }

    #[tokio::test]
    async fn test_random_colors_still_seats_both() {
        let service = PairingService::new(true);
        let (outbox_a, _rx_a) = mpsc::unbounded_channel();
        let (link_a, link_rx_a) = oneshot::channel();
        let (outbox_b, _rx_b) = mpsc::unbounded_channel();
        let (link_b, link_rx_b) = oneshot::channel();

        service.enqueue(1, "a", outbox_a, link_a).await;
        service.enqueue(2, "b", outbox_b, link_b).await;

        let a = link_rx_a.await.unwrap();
        let b = link_rx_b.await.unwrap();
        assert_eq!(a.color.opposite(), b.color);
    }
}
