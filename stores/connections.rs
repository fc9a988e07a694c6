/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Connection store: user-drawn edges between cards.
//!
//! Deliberately blind to card lifecycle. Edges referencing tombstoned
//! cards stay until the card cleanup pass calls
//! [`ConnectionStore::retain_endpoints`].

use uuid::Uuid;

use crate::model::{CardId, Connection, ConnectionId};

#[derive(Debug, Default)]
pub struct ConnectionStore {
    connections: Vec<Connection>,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, source_id: CardId, target_id: CardId) -> Connection {
        let connection = Connection {
            id: Uuid::new_v4(),
            source_id,
            target_id,
        };
        self.connections.push(connection.clone());
        connection
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub(crate) fn remove(&mut self, id: ConnectionId) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c.id != id);
        before != self.connections.len()
    }

    /// Drop every connection with an endpoint the predicate rejects.
    /// Returns the number of dropped edges.
    pub(crate) fn retain_endpoints(&mut self, keep: impl Fn(&CardId) -> bool) -> usize {
        let before = self.connections.len();
        self.connections
            .retain(|c| keep(&c.source_id) && keep(&c.target_id));
        before - self.connections.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub fn export_state(&self) -> Vec<Connection> {
        self.connections.clone()
    }

    pub(crate) fn import_state(&mut self, connections: Vec<Connection>) {
        self.connections = connections;
    }

    pub(crate) fn clear(&mut self) {
        self.connections.clear();
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
