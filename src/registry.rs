use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

/// A rental unit owned by a host. Referenced by jobs, never deleted in scope.
#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub id: u64,
    pub host: u64,
    pub name: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Owns `Property` records. Hosts only ever see their own properties; no
/// update or delete exists (deliberate scope, not an oversight).
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    properties: HashMap<u64, Property>,
    // Insertion order per host, so listings are deterministic
    by_host: HashMap<u64, Vec<u64>>,
    next_id: u64,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, host: u64, name: String, address: String) -> &Property {
        self.next_id += 1;
        let id = self.next_id;
        let property = Property {
            id,
            host,
            name,
            address,
            created_at: Utc::now(),
        };
        self.by_host.entry(host).or_default().push(id);
        self.properties.insert(id, property);
        tracing::info!(property_id = id, host_id = host, "Property created");
        &self.properties[&id]
    }

    pub fn get(&self, id: u64) -> Result<&Property> {
        self.properties
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("property {}", id)))
    }

    /// Properties owned by `host`, in insertion order.
    pub fn list_for_host(&self, host: u64) -> Vec<&Property> {
        self.by_host
            .get(&host)
            .map(|ids| ids.iter().filter_map(|id| self.properties.get(id)).collect())
            .unwrap_or_default()
    }

    /// Every property, in creation order. Admin-only listing.
    pub fn list_all(&self) -> Vec<&Property> {
        let mut all: Vec<&Property> = self.properties.values().collect();
        all.sort_by_key(|p| p.id);
        all
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
