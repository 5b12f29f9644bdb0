//! Catalog - what a discovery script has published
//!
//! Scripts add nodes (folders) and items (playable entries) through the
//! `sd.*` bridge. Ids are handed out from one counter and never reused.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// A folder-like grouping of items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arturl: Option<String>,
}

/// A playable entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: u32,
    pub path: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arturl: Option<String>,
    /// Duration in seconds, if the script knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Parent node id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<u32>,
}

/// Everything published by one instance
#[derive(Debug, Default, Serialize)]
pub struct Catalog {
    pub nodes: BTreeMap<u32, Node>,
    pub items: BTreeMap<u32, Item>,
    #[serde(skip)]
    next_id: u32,
}

/// Catalog shared between the bridge closures and the host
pub type SharedCatalog = Arc<Mutex<Catalog>>;

impl Catalog {
    pub fn shared() -> SharedCatalog {
        Arc::new(Mutex::new(Catalog::default()))
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_node(&mut self, title: String, arturl: Option<String>) -> u32 {
        let id = self.allocate_id();
        self.nodes.insert(id, Node { id, title, arturl });
        id
    }

    /// Add an item; fails when `node` names no existing node
    pub fn add_item(
        &mut self,
        path: String,
        title: Option<String>,
        arturl: Option<String>,
        duration: Option<f64>,
        node: Option<u32>,
    ) -> Result<u32, String> {
        if let Some(parent) = node {
            if !self.nodes.contains_key(&parent) {
                return Err(format!("unknown node id {}", parent));
            }
        }

        let id = self.allocate_id();
        let title = title.unwrap_or_else(|| path.clone());
        self.items.insert(
            id,
            Item {
                id,
                path,
                title,
                arturl,
                duration,
                node,
            },
        );
        Ok(id)
    }

    pub fn remove_item(&mut self, id: u32) -> bool {
        self.items.remove(&id).is_some()
    }

    /// Remove a node together with the items filed under it
    pub fn remove_node(&mut self, id: u32) -> bool {
        if self.nodes.remove(&id).is_none() {
            return false;
        }
        self.items.retain(|_, item| item.node != Some(id));
        true
    }

    /// Items in publication order
    pub fn items_in_order(&self) -> Vec<&Item> {
        self.items.values().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.items.is_empty()
    }
}
