//! Read-through menu cache keyed by `restaurant_id` (spec §4.11).
//!
//! Many-readers, writer-on-import discipline: any number of turns can read
//! concurrently, and an import event (or TTL expiry) is the only thing that
//! evicts an entry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use drivethru_core::order::Inventory;
use drivethru_core::{Ingredient, MenuItem};
use tracing::debug;

use crate::error::Result;
use crate::repository::MenuRepository;

const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CachedMenu {
    items: Vec<MenuItem>,
    fetched_at: Instant,
}

pub struct MenuCache {
    repository: Arc<dyn MenuRepository>,
    entries: DashMap<String, CachedMenu>,
    ttl: Duration,
}

impl MenuCache {
    pub fn new(repository: Arc<dyn MenuRepository>) -> Self {
        Self::with_ttl(repository, DEFAULT_TTL)
    }

    pub fn with_ttl(repository: Arc<dyn MenuRepository>, ttl: Duration) -> Self {
        Self {
            repository,
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Explicit eviction on a menu-import event (spec §4.11).
    pub fn invalidate(&self, restaurant_id: &str) {
        self.entries.remove(restaurant_id);
    }

    async fn menu_for(&self, restaurant_id: &str) -> Result<Vec<MenuItem>> {
        if let Some(cached) = self.entries.get(restaurant_id) {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.items.clone());
            }
        }

        debug!(restaurant_id, "menu cache miss, fetching from repository");
        let items = self.repository.fetch_menu(restaurant_id).await?;
        self.entries.insert(
            restaurant_id.to_string(),
            CachedMenu {
                items: items.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(items)
    }

    pub async fn get_available_items(&self, restaurant_id: &str) -> Result<Vec<MenuItem>> {
        let items = self.menu_for(restaurant_id).await?;
        Ok(items.into_iter().filter(|item| item.is_available).collect())
    }

    /// Full menu including unavailable items, so a caller can tell
    /// `ITEM_NOT_FOUND` apart from `ITEM_UNAVAILABLE` (spec §7).
    pub async fn get_menu_item_by_id(&self, restaurant_id: &str, menu_item_id: &str) -> Result<Option<MenuItem>> {
        let items = self.menu_for(restaurant_id).await?;
        Ok(items.into_iter().find(|item| item.id == menu_item_id))
    }

    /// Case-insensitive substring match over item names (spec §4.4.1's
    /// `search_menu_items(query)` tool).
    pub async fn search_menu_items(&self, restaurant_id: &str, query: &str) -> Result<Vec<MenuItem>> {
        let needle = query.trim().to_lowercase();
        let items = self.menu_for(restaurant_id).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.is_available && item.name.to_lowercase().contains(&needle))
            .collect())
    }

    pub async fn get_menu_item_by_name(&self, restaurant_id: &str, name: &str) -> Result<Option<MenuItem>> {
        let items = self.menu_for(restaurant_id).await?;
        Ok(items
            .into_iter()
            .find(|item| item.name.eq_ignore_ascii_case(name.trim())))
    }

    /// Ingredient list for a menu item, for the `get_menu_item_details` tool
    /// (spec §4.4.1).
    pub async fn get_menu_item_ingredients(
        &self,
        restaurant_id: &str,
        menu_item_id: &str,
    ) -> Result<Vec<Ingredient>> {
        self.repository.fetch_ingredients(restaurant_id, menu_item_id).await
    }

    /// Not cached: inventory changes far more often than the menu itself, so
    /// every call goes straight to the repository.
    pub async fn get_inventory(&self, restaurant_id: &str, ingredient_id: &str) -> Result<Option<Inventory>> {
        self.repository.fetch_inventory(restaurant_id, ingredient_id).await
    }
}
