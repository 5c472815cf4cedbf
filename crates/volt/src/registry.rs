//! Connection registry
//!
//! Owns the clients of an application, keyed by [`ConnectionKey`]. Whoever
//! manages client lifecycles holds the registry and passes it by reference.

use log::info;
use std::collections::HashMap;

use crate::client::{Client, TimeoutPolicy};
use crate::models::{ConnectionKey, Endpoint};

/// Clients keyed by server, port, admin flag and user
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionKey, Client>,
    timeouts: TimeoutPolicy,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose new HTTP clients use `timeouts`
    pub fn with_timeouts(timeouts: TimeoutPolicy) -> Self {
        Self {
            connections: HashMap::new(),
            timeouts,
        }
    }

    /// Return the client for `endpoint`, creating an HTTP client if needed
    pub fn get_or_connect(&mut self, endpoint: Endpoint) -> Client {
        let key = endpoint.key();
        let timeouts = self.timeouts;
        self.connections
            .entry(key)
            .or_insert_with_key(|key| {
                info!("Registering connection {}", key);
                Client::with_timeouts(endpoint, timeouts)
            })
            .clone()
    }

    /// Register an existing client, replacing any client with the same key
    pub fn insert(&mut self, client: Client) -> Option<Client> {
        self.connections.insert(client.endpoint().key(), client)
    }

    pub fn get(&self, key: &ConnectionKey) -> Option<&Client> {
        self.connections.get(key)
    }

    pub fn remove(&mut self, key: &ConnectionKey) -> Option<Client> {
        self.connections.remove(key)
    }

    pub fn contains(&self, key: &ConnectionKey) -> bool {
        self.connections.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> Vec<&ConnectionKey> {
        let mut keys: Vec<&ConnectionKey> = self.connections.keys().collect();
        keys.sort();
        keys
    }
}
