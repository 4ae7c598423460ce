//! Live connections and the player record attached to each of them.
//!
//! Players are kept in join order; that order drives turn rotation and the
//! round-robin color assignment. The rest of the core addresses players by
//! [`PlayerId`] only, the connection handle never leaves this module.

use std::collections::HashMap;

use indexmap::IndexMap;
use rand::Rng;
use tracing::info;

use crate::{
    error::JoinError,
    state::game::{Color, ConnectionId, Player, PlayerId, random_player_id},
};

/// A player removed from the registry along with the seat they occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Join-order position the player held before removal.
    pub position: usize,
    /// The removed record.
    pub player: Player,
}

/// Bidirectional association between connection handles and players.
#[derive(Debug)]
pub struct ConnectionRegistry {
    players: IndexMap<PlayerId, Player>,
    connections: HashMap<ConnectionId, PlayerId>,
    capacity: usize,
}

impl ConnectionRegistry {
    /// Empty registry admitting at most `capacity` simultaneous players.
    pub fn new(capacity: usize) -> Self {
        Self {
            players: IndexMap::new(),
            connections: HashMap::new(),
            capacity,
        }
    }

    /// Admit a new connection and mint its player record.
    ///
    /// Capacity is checked before the busy flag so a full lobby always reports
    /// [`JoinError::CapacityExceeded`].
    pub fn register<R: Rng + ?Sized>(
        &mut self,
        connection: ConnectionId,
        round_in_progress: bool,
        rng: &mut R,
    ) -> Result<PlayerId, JoinError> {
        if self.players.len() >= self.capacity {
            return Err(JoinError::CapacityExceeded);
        }
        if round_in_progress {
            return Err(JoinError::SessionBusy);
        }

        let id = loop {
            let candidate = random_player_id(rng);
            if !self.players.contains_key(&candidate) {
                break candidate;
            }
        };

        self.players.insert(id.clone(), Player::new(id.clone()));
        self.connections.insert(connection, id.clone());
        info!(%connection, player = %id, count = self.players.len(), "player registered");
        Ok(id)
    }

    /// Forget a connection. Calling this twice for the same handle is a no-op.
    pub fn unregister(&mut self, connection: &ConnectionId) -> Option<Departure> {
        let id = self.connections.remove(connection)?;
        let (position, _, player) = self.players.shift_remove_full(&id)?;
        info!(%connection, player = %id, count = self.players.len(), "player unregistered");
        Some(Departure { position, player })
    }

    /// Resolve a connection handle to its player record.
    pub fn lookup(&self, connection: &ConnectionId) -> Option<&Player> {
        self.connections
            .get(connection)
            .and_then(|id| self.players.get(id))
    }

    /// Player by id.
    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.get(id)
    }

    /// Mutable access to a player by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// Number of connected players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// `true` when nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Connected player ids in join order.
    pub fn ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.keys()
    }

    /// Hand out pad colors round-robin in join order.
    pub fn assign_colors(&mut self) {
        for (index, player) in self.players.values_mut().enumerate() {
            player.color = Some(Color::ALL[index % Color::ALL.len()]);
        }
    }

    /// Set `is_turn` on the player at `turn` and clear it everywhere else.
    pub fn mark_turn(&mut self, turn: Option<usize>) {
        for (index, player) in self.players.values_mut().enumerate() {
            player.is_turn = Some(index) == turn;
        }
    }

    /// Clear ready, turn and restart flags on every player.
    pub fn reset_flags(&mut self) {
        for player in self.players.values_mut() {
            player.ready = false;
            player.is_turn = false;
            player.voted_restart = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use uuid::Uuid;

    use super::*;

    fn registry_with(count: usize) -> (ConnectionRegistry, Vec<ConnectionId>) {
        let mut registry = ConnectionRegistry::new(4);
        let mut rng = StdRng::seed_from_u64(11);
        let connections = (0..count)
            .map(|_| {
                let connection = Uuid::new_v4();
                registry.register(connection, false, &mut rng).unwrap();
                connection
            })
            .collect();
        (registry, connections)
    }

    #[test]
    fn fifth_player_is_rejected() {
        let (mut registry, _) = registry_with(4);
        let mut rng = StdRng::seed_from_u64(0);
        let err = registry
            .register(Uuid::new_v4(), false, &mut rng)
            .unwrap_err();
        assert_eq!(err, JoinError::CapacityExceeded);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn busy_session_rejects_join() {
        let (mut registry, _) = registry_with(2);
        let mut rng = StdRng::seed_from_u64(0);
        let err = registry
            .register(Uuid::new_v4(), true, &mut rng)
            .unwrap_err();
        assert_eq!(err, JoinError::SessionBusy);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unregister_is_idempotent() {
        let (mut registry, connections) = registry_with(3);
        let departure = registry.unregister(&connections[1]).unwrap();
        assert_eq!(departure.position, 1);
        assert!(registry.unregister(&connections[1]).is_none());
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup(&connections[1]).is_none());
    }

    #[test]
    fn removal_preserves_join_order() {
        let (mut registry, connections) = registry_with(3);
        let first = registry.lookup(&connections[0]).unwrap().id.clone();
        let last = registry.lookup(&connections[2]).unwrap().id.clone();
        registry.unregister(&connections[1]);
        let ids: Vec<_> = registry.ids().cloned().collect();
        assert_eq!(ids, vec![first, last]);
    }

    #[test]
    fn colors_assigned_round_robin() {
        let (mut registry, _) = registry_with(4);
        registry.assign_colors();
        let colors: Vec<_> = registry.players().map(|player| player.color).collect();
        assert_eq!(
            colors,
            Color::ALL.iter().copied().map(Some).collect::<Vec<_>>()
        );
    }

    #[test]
    fn mark_turn_sets_exactly_one_flag() {
        let (mut registry, _) = registry_with(3);
        registry.mark_turn(Some(2));
        let flags: Vec<_> = registry.players().map(|player| player.is_turn).collect();
        assert_eq!(flags, vec![false, false, true]);
        registry.mark_turn(None);
        assert!(registry.players().all(|player| !player.is_turn));
    }
}
