use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AstraError, Result};

/// Shard id as supplied in loosely-typed sharding lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShardIdInput {
    Number(u64),
    Text(String),
}

impl ShardIdInput {
    /// Normalize to an integer shard id. Text is parsed as base-10.
    pub fn parse(&self) -> Result<u32> {
        match self {
            ShardIdInput::Number(n) => u32::try_from(*n)
                .map_err(|_| AstraError::MalformedConfig(format!("shard id {} out of range", n))),
            ShardIdInput::Text(s) => s.trim().parse::<u32>().map_err(|e| {
                AstraError::MalformedConfig(format!("invalid shard id '{}': {}", s, e))
            }),
        }
    }
}

impl From<u32> for ShardIdInput {
    fn from(value: u32) -> Self {
        ShardIdInput::Number(value as u64)
    }
}

impl From<&str> for ShardIdInput {
    fn from(value: &str) -> Self {
        ShardIdInput::Text(value.to_string())
    }
}

/// One entry of a sharding structure list, as handed over by a node or a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardingItem {
    #[serde(rename = "shardID")]
    pub shard_id: ShardIdInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws: Option<String>,
}

impl ShardingItem {
    pub fn new(shard_id: impl Into<ShardIdInput>) -> Self {
        Self {
            shard_id: shard_id.into(),
            current: None,
            http: None,
            ws: None,
        }
    }

    pub fn current(mut self, current: bool) -> Self {
        self.current = Some(current);
        self
    }

    pub fn http(mut self, url: &str) -> Self {
        self.http = Some(url.to_string());
        self
    }

    pub fn ws(mut self, url: &str) -> Self {
        self.ws = Some(url.to_string());
        self
    }
}

/// Validated shard endpoint descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardDescriptor {
    #[serde(rename = "shardID")]
    pub shard_id: u32,
    pub http_endpoint: Option<String>,
    pub ws_endpoint: Option<String>,
    pub is_current: bool,
}

impl TryFrom<&ShardingItem> for ShardDescriptor {
    type Error = AstraError;

    fn try_from(item: &ShardingItem) -> Result<Self> {
        Ok(ShardDescriptor {
            shard_id: item.shard_id.parse()?,
            http_endpoint: item.http.clone(),
            ws_endpoint: item.ws.clone(),
            is_current: item.current.unwrap_or(false),
        })
    }
}

/// Shard id to endpoint mapping. At most one descriptor is current.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShardTable {
    shards: HashMap<u32, ShardDescriptor>,
}

impl ShardTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a whole sharding list without touching the table.
    pub fn validate(items: &[ShardingItem]) -> Result<Vec<ShardDescriptor>> {
        let descriptors = items
            .iter()
            .map(ShardDescriptor::try_from)
            .collect::<Result<Vec<_>>>()?;

        let current: Vec<u32> = descriptors
            .iter()
            .filter(|d| d.is_current)
            .map(|d| d.shard_id)
            .collect();
        if current.len() > 1 {
            return Err(AstraError::MalformedConfig(format!(
                "more than one shard flagged current: {:?}",
                current
            )));
        }

        Ok(descriptors)
    }

    /// Insert or replace a descriptor. A current descriptor demotes any other.
    pub fn upsert(&mut self, descriptor: ShardDescriptor) {
        if descriptor.is_current {
            for other in self.shards.values_mut() {
                if other.shard_id != descriptor.shard_id {
                    other.is_current = false;
                }
            }
        }
        debug!(
            "Shard {} -> http={:?}, ws={:?}, current={}",
            descriptor.shard_id, descriptor.http_endpoint, descriptor.ws_endpoint, descriptor.is_current
        );
        self.shards.insert(descriptor.shard_id, descriptor);
    }

    /// Validate and upsert every item. Nothing is applied when any item is malformed.
    pub fn apply(&mut self, items: &[ShardingItem]) -> Result<()> {
        for descriptor in Self::validate(items)? {
            self.upsert(descriptor);
        }
        Ok(())
    }

    pub fn get(&self, shard_id: u32) -> Option<&ShardDescriptor> {
        self.shards.get(&shard_id)
    }

    pub fn current(&self) -> Option<&ShardDescriptor> {
        self.shards.values().find(|d| d.is_current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShardDescriptor> {
        self.shards.values()
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}
