//! Validates `Modifier` additions/removals against a menu item's own
//! ingredient links and the restaurant's stocked-ingredient list, and prices
//! additions (spec §4.6 step 1).
//!
//! Grounded on `customization_validation_service.py`'s `validate_remove_ingredient`
//! / `validate_add_ingredient` / `calculate_extra_cost`, adapted from that
//! service's raw "no X" / "extra X" string parsing to the already-typed
//! `Modifier{name, is_addition, additional_cost}` the parser hands back here.

use drivethru_core::error::ErrorCode;
use drivethru_core::order::{Ingredient, IngredientRef, MenuItem};

#[derive(Clone, Copy, Default)]
pub struct CustomizationValidator;

impl CustomizationValidator {
    /// Whether `name` can be removed from `menu_item`, and if it can't, why.
    /// A `required` ingredient link can't be removed at all (`OPTION_REQUIRED_MISSING`);
    /// an ingredient absent from the item's own list was never there to
    /// remove (`MODIFIER_REMOVE_NOT_PRESENT`).
    pub fn validate_remove(&self, menu_item: &MenuItem, name: &str) -> Result<(), (ErrorCode, String)> {
        match Self::find_ref(menu_item, name) {
            None => Err((ErrorCode::ModifierRemoveNotPresent, format!("{name} wasn't on that item."))),
            Some(ingredient) if ingredient.required => {
                Err((ErrorCode::OptionRequiredMissing, format!("{name} is required on {} and can't be removed.", menu_item.name)))
            }
            Some(_) => Ok(()),
        }
    }

    /// Whether `name` can be added to `menu_item`, and the extra cost to
    /// charge if so. An ingredient already linked to the item uses that
    /// link's `additional_cost`; one the restaurant merely stocks falls back
    /// to its `unit_cost`; anything else is `MODIFIER_ADD_NOT_ALLOWED`.
    pub fn validate_add(&self, menu_item: &MenuItem, stocked: &[Ingredient], name: &str) -> Result<f64, (ErrorCode, String)> {
        if let Some(ingredient) = Self::find_ref(menu_item, name) {
            return Ok(ingredient.additional_cost);
        }
        match stocked.iter().find(|i| i.name.eq_ignore_ascii_case(name)) {
            Some(ingredient) => Ok(ingredient.unit_cost),
            None => Err((ErrorCode::ModifierAddNotAllowed, format!("Sorry, we can't add {name} to {}.", menu_item.name))),
        }
    }

    fn find_ref<'a>(menu_item: &'a MenuItem, name: &str) -> Option<&'a IngredientRef> {
        menu_item.ingredients.iter().find(|i| i.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> MenuItem {
        MenuItem {
            id: "42".into(),
            restaurant_id: "r1".into(),
            category_id: "burgers".into(),
            name: "Big Mac".into(),
            price: 5.99,
            is_available: true,
            ingredients: vec![
                IngredientRef { ingredient_id: "ing-bun".into(), name: "bun".into(), required: true, additional_cost: 0.0 },
                IngredientRef { ingredient_id: "ing-onions".into(), name: "onions".into(), required: false, additional_cost: 0.0 },
            ],
            available_sizes: vec![],
        }
    }

    #[test]
    fn removing_a_required_ingredient_is_rejected() {
        let err = CustomizationValidator.validate_remove(&item(), "bun").unwrap_err();
        assert_eq!(err.0, ErrorCode::OptionRequiredMissing);
    }

    #[test]
    fn removing_an_optional_ingredient_is_allowed() {
        assert!(CustomizationValidator.validate_remove(&item(), "onions").is_ok());
    }

    #[test]
    fn removing_an_absent_ingredient_is_rejected() {
        let err = CustomizationValidator.validate_remove(&item(), "ketchup").unwrap_err();
        assert_eq!(err.0, ErrorCode::ModifierRemoveNotPresent);
    }

    #[test]
    fn adding_an_item_linked_ingredient_uses_its_additional_cost() {
        let mut menu_item = item();
        menu_item.ingredients[1].additional_cost = 0.3;
        let cost = CustomizationValidator.validate_add(&menu_item, &[], "onions").unwrap();
        assert_eq!(cost, 0.3);
    }

    #[test]
    fn adding_a_restaurant_stocked_ingredient_falls_back_to_unit_cost() {
        let stocked = vec![Ingredient { id: "ing-bacon".into(), restaurant_id: "r1".into(), name: "bacon".into(), unit_cost: 1.5 }];
        let cost = CustomizationValidator.validate_add(&item(), &stocked, "bacon").unwrap();
        assert_eq!(cost, 1.5);
    }

    #[test]
    fn adding_an_unknown_ingredient_is_rejected() {
        let err = CustomizationValidator.validate_add(&item(), &[], "truffle oil").unwrap_err();
        assert_eq!(err.0, ErrorCode::ModifierAddNotAllowed);
    }
}
