//! The write side of the menu database (spec §4.11: "writes never go
//! through this path"). Implementations live in `drivethru-store`; this
//! crate only ever reads through [`crate::cache::MenuCache`].

use async_trait::async_trait;
use drivethru_core::order::Inventory;
use drivethru_core::{Ingredient, MenuItem};

use crate::error::Result;

#[async_trait]
pub trait MenuRepository: Send + Sync + 'static {
    async fn fetch_menu(&self, restaurant_id: &str) -> Result<Vec<MenuItem>>;

    async fn fetch_ingredients(&self, restaurant_id: &str, menu_item_id: &str) -> Result<Vec<Ingredient>>;

    /// Stock level for one ingredient (spec §3.1). `None` means the
    /// restaurant doesn't track inventory for that ingredient at all, which
    /// callers treat as "untracked" rather than "out of stock". Defaulted so
    /// implementors that predate inventory tracking don't have to care.
    async fn fetch_inventory(&self, _restaurant_id: &str, _ingredient_id: &str) -> Result<Option<Inventory>> {
        Ok(None)
    }
}
