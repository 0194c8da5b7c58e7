//! Order, line item, and menu entities (spec §3.1).

use serde::{Deserialize, Serialize};

/// A menu item as seen by the conversation core. Immutable within a turn —
/// the menu read model (`drivethru-menu`) hands out snapshots, never
/// mutable references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub category_id: String,
    pub name: String,
    pub price: f64,
    pub is_available: bool,
    #[serde(default)]
    pub ingredients: Vec<IngredientRef>,
    /// Sizes this item can be ordered in (e.g. `["small", "medium", "large"]`).
    /// Empty means the item isn't size-differentiated, so any requested size
    /// (including none) is accepted.
    #[serde(default)]
    pub available_sizes: Vec<String>,
}

impl MenuItem {
    pub fn accepts_size(&self, size: &str) -> bool {
        self.available_sizes.is_empty() || self.available_sizes.iter().any(|s| s.eq_ignore_ascii_case(size))
    }
}

/// An ingredient as it relates to a menu item: whether it is required or an
/// optional add-on, and the extra charge for adding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientRef {
    pub ingredient_id: String,
    pub name: String,
    pub required: bool,
    #[serde(default)]
    pub additional_cost: f64,
}

/// A stocked ingredient, independent of which menu items use it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub unit_cost: f64,
}

/// Inventory record paired one-to-one with an `Ingredient`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub ingredient_id: String,
    pub current_stock: f64,
    pub min_stock_level: f64,
}

impl Inventory {
    /// "Low stock" per spec §3.1: `current_stock <= min_stock_level`.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock_level
    }

    pub fn has_stock_for(&self, quantity: f64) -> bool {
        self.current_stock >= quantity
    }
}

/// A named modifier applied to a line item (e.g. "no onions", "extra cheese").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    /// True for an addition ("extra cheese"), false for a removal ("no onions").
    pub is_addition: bool,
    #[serde(default)]
    pub additional_cost: f64,
}

/// One line within an order. `id` is stable within the order for the
/// lifetime of the session — it is how `REMOVE_ITEM`/`MODIFY_ITEM` address a
/// specific line without relying on position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub menu_item_id: String,
    pub name: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub unit_price: f64,
    pub total_price: f64,
}

impl LineItem {
    pub fn new(
        id: impl Into<String>,
        menu_item_id: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: f64,
    ) -> Self {
        let mut item = Self {
            id: id.into(),
            menu_item_id: menu_item_id.into(),
            name: name.into(),
            quantity: quantity.max(1),
            size: None,
            modifiers: Vec::new(),
            special_instructions: None,
            unit_price,
            total_price: 0.0,
        };
        item.recompute_total();
        item
    }

    /// Invariant from spec §3.1: `total_price = quantity * unit_price`, plus
    /// the extra cost of any addition modifiers.
    pub fn recompute_total(&mut self) {
        let modifier_cost: f64 = self
            .modifiers
            .iter()
            .filter(|m| m.is_addition)
            .map(|m| m.additional_cost)
            .sum();
        self.total_price = (self.unit_price + modifier_cost) * self.quantity as f64;
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
        self.recompute_total();
    }
}

/// An in-progress order: a sequence of line items plus the anaphora pointer
/// used to resolve "no onions on that" / "make it two" without a named item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Index of the last-mentioned line item, cleared when that line is
    /// removed (spec §9, "Anaphora resolution").
    #[serde(default)]
    pub last_mentioned_item_ref: Option<String>,
}

impl Order {
    pub fn total(&self) -> f64 {
        self.line_items.iter().map(|i| i.total_price).sum()
    }

    pub fn item_count(&self) -> usize {
        self.line_items.iter().map(|i| i.quantity as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    pub fn find(&self, line_item_id: &str) -> Option<&LineItem> {
        self.line_items.iter().find(|i| i.id == line_item_id)
    }

    pub fn find_mut(&mut self, line_item_id: &str) -> Option<&mut LineItem> {
        self.line_items.iter_mut().find(|i| i.id == line_item_id)
    }

    pub fn add(&mut self, item: LineItem) {
        self.last_mentioned_item_ref = Some(item.id.clone());
        self.line_items.push(item);
    }

    /// Remove a line by id. Clears the anaphora pointer if it pointed at the
    /// removed line (spec §9).
    pub fn remove(&mut self, line_item_id: &str) -> Option<LineItem> {
        let idx = self.line_items.iter().position(|i| i.id == line_item_id)?;
        let removed = self.line_items.remove(idx);
        if self.last_mentioned_item_ref.as_deref() == Some(line_item_id) {
            self.last_mentioned_item_ref = None;
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.line_items.clear();
        self.last_mentioned_item_ref = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_item_total_tracks_quantity_and_modifiers() {
        let mut item = LineItem::new("li-1", "mi-42", "Big Mac", 2, 4.5);
        assert_eq!(item.total_price, 9.0);
        item.modifiers.push(Modifier {
            name: "extra cheese".into(),
            is_addition: true,
            additional_cost: 0.5,
        });
        item.recompute_total();
        assert_eq!(item.total_price, 10.0);
    }

    #[test]
    fn removing_last_mentioned_line_clears_the_pointer() {
        let mut order = Order::default();
        order.add(LineItem::new("li-1", "mi-1", "Fries", 1, 2.0));
        assert_eq!(order.last_mentioned_item_ref.as_deref(), Some("li-1"));
        order.remove("li-1");
        assert!(order.last_mentioned_item_ref.is_none());
    }

    #[test]
    fn inventory_low_stock_boundary() {
        let inv = Inventory {
            ingredient_id: "ing-1".into(),
            current_stock: 5.0,
            min_stock_level: 5.0,
        };
        assert!(inv.is_low_stock());
    }
}
