//! Caller-owned map of engine instances, one per logical connection.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};

/// Identity of one logical database connection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId {
    pub backend: String,
    /// Host:port, socket or file path.
    pub location: String,
    pub database: Option<String>,
    pub user: Option<String>,
}

impl ConnectionId {
    pub fn new(backend: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            location: location.into(),
            database: None,
            user: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

pub struct EngineRegistry<E> {
    engines: HashMap<ConnectionId, E>,
}

impl<E> Default for EngineRegistry<E> {
    fn default() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }
}

impl<E> EngineRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the engine for `id`, building it with `make` on first use.
    pub fn get_or_try_insert_with<F, Err>(&mut self, id: &ConnectionId, make: F) -> Result<&mut E, Err>
    where
        F: FnOnce() -> Result<E, Err>,
    {
        match self.engines.entry(id.clone()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => Ok(e.insert(make()?)),
        }
    }

    pub fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut E> {
        self.engines.get_mut(id)
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<E> {
        self.engines.remove(id)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
