//! Command execution against an in-progress order (spec §4.6).
//!
//! The "shared database handle" and "unit of work" of the source system are,
//! in this crate, the `Order` the caller passes in by value: the executor
//! runs the whole batch against an owned working copy and only ever hands
//! back a mutated copy on success. The orchestrator (`drivethru-pipeline`,
//! not built in this crate) is the actual unit-of-work boundary — it is the
//! one deciding whether to persist the returned order or discard it.

use drivethru_core::error::{ErrorCategory, ErrorCode};
use drivethru_core::order::{IngredientRef, LineItem, Modifier};
use drivethru_core::{Command, CommandBatchResult, CommandDict, MenuItem, Order, OrderResult};

use crate::context::CommandContext;
use crate::factory::build_command;
use crate::validator::CommandDataValidator;
use crate::{batch, CommandsError};

pub struct CommandExecutor;

impl CommandExecutor {
    /// Runs one turn's batch to completion (spec §4.6 steps 1-6) and returns
    /// the resulting order alongside the `CommandBatchResult`. Continue on
    /// failure: one command's error never stops the rest of the batch.
    pub async fn execute_batch(
        dicts: Vec<CommandDict>,
        ctx: &CommandContext,
        mut order: Order,
    ) -> (CommandBatchResult, Order) {
        let mut results: Vec<OrderResult> = Vec::with_capacity(dicts.len());
        let mut commands: Vec<Command> = Vec::with_capacity(dicts.len());
        let mut command_slots: Vec<Option<usize>> = Vec::with_capacity(dicts.len());

        for dict in &dicts {
            match CommandDataValidator::validate(dict, &ctx.limits) {
                Ok(()) => {
                    command_slots.push(Some(commands.len()));
                    commands.push(build_command(dict));
                    results.push(OrderResult::success(""));
                }
                Err(errors) => {
                    command_slots.push(None);
                    results.push(validation_failure_result(&errors));
                }
            }
        }

        if commands.is_empty() {
            let degenerate = OrderResult::error(ErrorCategory::Validation, None, "No commands generated");
            let batch_result = batch::analyze(&[degenerate.clone()], &[]);
            return (batch_result, order);
        }

        let mut command_results = Vec::with_capacity(commands.len());
        for command in &commands {
            let result = Self::execute_one(command, ctx, &mut order).await;
            command_results.push(result);
        }

        let mut command_result_iter = command_results.into_iter();
        for (slot, result) in command_slots.iter().zip(results.iter_mut()) {
            if slot.is_some() {
                *result = command_result_iter.next().expect("one result per materialized command");
            }
        }

        let batch_result = batch::analyze(&results, &commands);
        (batch_result, order)
    }

    async fn execute_one(command: &Command, ctx: &CommandContext, order: &mut Order) -> OrderResult {
        match command {
            Command::AddItem { menu_item_id, quantity, size, modifiers, special_instructions } => {
                Self::add_item(ctx, order, menu_item_id, *quantity, size.clone(), modifiers.clone(), special_instructions.clone()).await
            }
            Command::RemoveItem { order_item_id, target_ref } => {
                Self::remove_item(order, order_item_id.as_deref(), target_ref.as_deref())
            }
            Command::ModifyItem { order_item_id, target_ref, add_modifiers, remove_modifiers, set_quantity, set_size } => {
                Self::modify_item(
                    ctx,
                    order,
                    order_item_id.as_deref(),
                    target_ref.as_deref(),
                    add_modifiers,
                    remove_modifiers,
                    *set_quantity,
                    set_size.clone(),
                )
                .await
            }
            Command::SetQuantity { order_item_id, target_ref, quantity } => {
                Self::set_quantity(ctx, order, order_item_id.as_deref(), target_ref.as_deref(), *quantity)
            }
            Command::ClearOrder => Self::clear_order(order),
            Command::ConfirmOrder => OrderResult::success(format!("Your order total is ${:.2}.", order.total())),
            Command::Repeat => OrderResult::success(Self::order_summary_text(order)),
            Command::Question { text } => OrderResult::success(text.clone()),
            Command::SmallTalk { text } => OrderResult::success(text.clone()),
            Command::ClarificationNeeded { ambiguous_item, suggested_options, clarification_question } => {
                OrderResult::success_with_data(
                    clarification_question.clone(),
                    serde_json::json!({
                        "response_type": "clarification_needed",
                        "ambiguous_item": ambiguous_item,
                        "suggested_options": suggested_options,
                    }),
                )
            }
            Command::ItemUnavailable { requested_item, message } => OrderResult::business_error(
                ErrorCode::ItemUnavailable,
                message.clone(),
            )
            .with_data(serde_json::json!({ "requested_item": requested_item })),
            Command::Unknown => OrderResult::validation_error(ErrorCode::InvalidInputFormat, "unrecognized request"),
        }
    }

    async fn add_item(
        ctx: &CommandContext,
        order: &mut Order,
        menu_item_id: &str,
        quantity: u32,
        size: Option<String>,
        mut modifiers: Vec<Modifier>,
        special_instructions: Option<String>,
    ) -> OrderResult {
        let menu_item = match Self::lookup_menu_item(ctx, menu_item_id).await {
            Ok(Some(item)) if item.is_available => item,
            Ok(Some(item)) => {
                return OrderResult::business_error(
                    ErrorCode::ItemUnavailable,
                    format!("Sorry, {} is currently unavailable.", item.name),
                )
            }
            Ok(None) => {
                return OrderResult::business_error(
                    ErrorCode::ItemNotFound,
                    format!("Sorry, we don't have that item (id {menu_item_id})."),
                )
            }
            Err(e) => return OrderResult::system_error(e.to_string()),
        };

        if order.line_items.len() + 1 > ctx.limits.max_items_per_order as usize {
            return OrderResult::business_error(
                ErrorCode::QuantityExceedsLimit,
                format!("Sorry, an order can't have more than {} items.", ctx.limits.max_items_per_order),
            );
        }

        if let Some(size) = &size {
            if !menu_item.accepts_size(size) {
                return OrderResult::business_error(
                    ErrorCode::SizeNotAvailable,
                    format!("Sorry, {} doesn't come in {size}.", menu_item.name),
                );
            }
        }

        if let Err(result) = Self::validate_modifiers(ctx, &menu_item, &mut modifiers).await {
            return result;
        }

        let inventory_warnings = match Self::check_inventory(ctx, &menu_item, quantity).await {
            Ok(warnings) => warnings,
            Err(result) => return result,
        };

        let mut line = LineItem::new(uuid::Uuid::new_v4().to_string(), menu_item.id.clone(), menu_item.name.clone(), quantity, menu_item.price);
        line.size = size;
        line.modifiers = modifiers;
        line.special_instructions = special_instructions;
        line.recompute_total();

        if order.total() + line.total_price > ctx.limits.max_order_total {
            return OrderResult::business_error(
                ErrorCode::QuantityExceedsLimit,
                format!("Sorry, that would put the order over our ${:.2} limit.", ctx.limits.max_order_total),
            );
        }

        let message = format!("Added {} x {}.", line.quantity, line.name);
        order.add(line);
        if inventory_warnings.is_empty() {
            OrderResult::success(message)
        } else {
            OrderResult::partial_success(message, inventory_warnings)
        }
    }

    async fn lookup_menu_item(ctx: &CommandContext, menu_item_id: &str) -> Result<Option<MenuItem>, CommandsError> {
        Ok(ctx.menu.get_menu_item_by_id(&ctx.restaurant_id, menu_item_id).await?)
    }

    /// Validates each modifier against `menu_item`'s own ingredient links and
    /// the restaurant's stocked-ingredient list (spec §4.6 step 1), pricing
    /// additions from the authoritative source rather than whatever cost the
    /// parser guessed. A no-op when `enable_customization_validation` is off
    /// (spec §6.4).
    async fn validate_modifiers(ctx: &CommandContext, menu_item: &MenuItem, modifiers: &mut [Modifier]) -> Result<(), OrderResult> {
        if !ctx.features.enable_customization_validation {
            return Ok(());
        }
        let stocked = ctx
            .menu
            .get_menu_item_ingredients(&ctx.restaurant_id, &menu_item.id)
            .await
            .map_err(|e| OrderResult::system_error(e.to_string()))?;

        for m in modifiers.iter_mut() {
            if m.is_addition {
                match ctx.customization.validate_add(menu_item, &stocked, &m.name) {
                    Ok(cost) => m.additional_cost = cost,
                    Err((code, message)) => return Err(OrderResult::business_error(code, message)),
                }
            } else if let Err((code, message)) = ctx.customization.validate_remove(menu_item, &m.name) {
                return Err(OrderResult::business_error(code, message));
            }
        }
        Ok(())
    }

    /// Consults stock for `menu_item`'s required ingredients (spec §3.1):
    /// a shortage is a hard failure unless `allow_negative_inventory` demotes
    /// it to a warning, and plain low stock is always a warning. An
    /// untracked ingredient (no inventory row at all) is treated as
    /// unmanaged rather than out of stock. A no-op when
    /// `enable_inventory_checking` is off (spec §6.4).
    async fn check_inventory(ctx: &CommandContext, menu_item: &MenuItem, quantity: u32) -> Result<Vec<String>, OrderResult> {
        if !ctx.features.enable_inventory_checking {
            return Ok(Vec::new());
        }

        let mut warnings = Vec::new();
        for ingredient in menu_item.ingredients.iter().filter(|i| i.required) {
            let Some(inventory) = ctx
                .menu
                .get_inventory(&ctx.restaurant_id, &ingredient.ingredient_id)
                .await
                .map_err(|e| OrderResult::system_error(e.to_string()))?
            else {
                continue;
            };

            if !inventory.has_stock_for(quantity as f64) {
                if ctx.features.allow_negative_inventory {
                    warnings.push(format!("Low inventory for {}: only {:.0} left.", ingredient.name, inventory.current_stock));
                } else {
                    return Err(OrderResult::business_error(
                        ErrorCode::InventoryShortage,
                        format!("Sorry, we're out of {} for {}.", ingredient.name, menu_item.name),
                    ));
                }
            } else if inventory.is_low_stock() {
                warnings.push(format!("{} is running low ({:.0} left).", ingredient.name, inventory.current_stock));
            }
        }
        Ok(warnings)
    }

    fn resolve_target<'o>(order: &'o Order, order_item_id: Option<&'o str>, target_ref: Option<&str>) -> Option<&'o str> {
        if let Some(id) = order_item_id {
            return Some(id);
        }
        if target_ref.is_some() {
            return order.last_mentioned_item_ref.as_deref();
        }
        None
    }

    fn remove_item(order: &mut Order, order_item_id: Option<&str>, target_ref: Option<&str>) -> OrderResult {
        let Some(id) = Self::resolve_target(order, order_item_id, target_ref).map(str::to_string) else {
            return OrderResult::business_error(ErrorCode::ItemNotFound, "I'm not sure which item you mean.");
        };
        match order.remove(&id) {
            Some(removed) => OrderResult::success(format!("I've removed {} from your order.", removed.name)),
            None => OrderResult::business_error(ErrorCode::ItemNotFound, "I couldn't find that item in your order."),
        }
    }

    async fn modify_item(
        ctx: &CommandContext,
        order: &mut Order,
        order_item_id: Option<&str>,
        target_ref: Option<&str>,
        add_modifiers: &[Modifier],
        remove_modifiers: &[String],
        set_quantity: Option<u32>,
        set_size: Option<String>,
    ) -> OrderResult {
        let Some(id) = Self::resolve_target(order, order_item_id, target_ref).map(str::to_string) else {
            return OrderResult::business_error(ErrorCode::ItemNotFound, "I'm not sure which item you mean.");
        };

        if let Some(q) = set_quantity {
            if q > ctx.limits.max_quantity_per_item {
                return OrderResult::business_error(
                    ErrorCode::QuantityExceedsLimit,
                    format!("quantity {q} exceeds the maximum of {} per item", ctx.limits.max_quantity_per_item),
                );
            }
        }

        let Some(menu_item_id) = order.find(&id).map(|line| line.menu_item_id.clone()) else {
            return OrderResult::business_error(ErrorCode::ItemNotFound, "I couldn't find that item in your order.");
        };
        let menu_item = match Self::lookup_menu_item(ctx, &menu_item_id).await {
            Ok(Some(item)) => item,
            Ok(None) => return OrderResult::system_error(format!("menu item {menu_item_id} vanished from the menu mid-order")),
            Err(e) => return OrderResult::system_error(e.to_string()),
        };

        if let Some(size) = &set_size {
            if !menu_item.accepts_size(size) {
                return OrderResult::business_error(
                    ErrorCode::SizeNotAvailable,
                    format!("Sorry, {} doesn't come in {size}.", menu_item.name),
                );
            }
        }

        let mut add_modifiers = add_modifiers.to_vec();
        if let Err(result) = Self::validate_modifiers(ctx, &menu_item, &mut add_modifiers).await {
            return result;
        }

        let inventory_warnings = match Self::check_inventory(ctx, &menu_item, set_quantity.unwrap_or(1)).await {
            Ok(warnings) => warnings,
            Err(result) => return result,
        };

        let Some(line) = order.find_mut(&id) else {
            return OrderResult::business_error(ErrorCode::ItemNotFound, "I couldn't find that item in your order.");
        };

        let conflicts: Vec<String> = add_modifiers
            .iter()
            .filter(|m| line.modifiers.iter().any(|existing| existing.name.eq_ignore_ascii_case(&m.name) && existing.is_addition != m.is_addition))
            .map(|m| m.name.clone())
            .collect();
        if !conflicts.is_empty() {
            return OrderResult::business_error(
                ErrorCode::ModifierConflict,
                format!("{} conflicts with an existing modifier on that item.", conflicts.join(", ")),
            );
        }

        let mut missing_removals = Vec::new();
        for name in remove_modifiers {
            let before = line.modifiers.len();
            line.modifiers.retain(|m| !m.name.eq_ignore_ascii_case(name));
            if line.modifiers.len() == before {
                missing_removals.push(name.clone());
            }
        }
        line.modifiers.extend(add_modifiers.iter().cloned());
        if let Some(q) = set_quantity {
            line.set_quantity(q);
        }
        if let Some(size) = set_size {
            line.size = Some(size);
        }
        line.recompute_total();

        if !missing_removals.is_empty() {
            return OrderResult::business_error(
                ErrorCode::ModifierRemoveNotPresent,
                format!("{} wasn't on that item.", missing_removals.join(", ")),
            );
        }

        let message = format!("I've updated your {}.", line.name);
        if inventory_warnings.is_empty() {
            OrderResult::success(message)
        } else {
            OrderResult::partial_success(message, inventory_warnings)
        }
    }

    fn set_quantity(ctx: &CommandContext, order: &mut Order, order_item_id: Option<&str>, target_ref: Option<&str>, quantity: u32) -> OrderResult {
        let Some(id) = Self::resolve_target(order, order_item_id, target_ref).map(str::to_string) else {
            return OrderResult::business_error(ErrorCode::ItemNotFound, "I'm not sure which item you mean.");
        };
        if quantity > ctx.limits.max_quantity_per_item {
            return OrderResult::business_error(
                ErrorCode::QuantityExceedsLimit,
                format!("quantity {quantity} exceeds the maximum of {} per item", ctx.limits.max_quantity_per_item),
            );
        }
        match order.find_mut(&id) {
            Some(line) => {
                line.set_quantity(quantity);
                OrderResult::success(format!("Updated {} to {}.", line.name, line.quantity))
            }
            None => OrderResult::business_error(ErrorCode::ItemNotFound, "I couldn't find that item in your order."),
        }
    }

    fn clear_order(order: &mut Order) -> OrderResult {
        if order.is_empty() {
            return OrderResult::warning("Your order was already empty.");
        }
        order.clear();
        OrderResult::success("Your order has been cleared.")
    }

    fn order_summary_text(order: &Order) -> String {
        if order.is_empty() {
            return "Your order is empty.".to_string();
        }
        let items: Vec<String> = order.line_items.iter().map(|i| format!("{} {}", i.quantity, i.name)).collect();
        format!("You have {}. Total is ${:.2}.", items.join(", "), order.total())
    }
}

fn validation_failure_result(errors: &[crate::validator::ValidationError]) -> OrderResult {
    let first = &errors[0];
    let message = errors.iter().map(|e| e.message.clone()).collect::<Vec<_>>().join("; ");
    match first.category() {
        ErrorCategory::Validation => OrderResult::validation_error(first.code, message),
        ErrorCategory::Business => OrderResult::business_error(first.code, message),
        ErrorCategory::System => OrderResult::system_error(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use drivethru_config::{FeatureFlags, OrderLimits};
    use drivethru_core::order::Inventory;
    use drivethru_core::{BatchOutcome, FollowUpAction, Ingredient};
    use drivethru_menu::repository::MenuRepository;
    use std::sync::Arc;

    struct FixedMenu;

    #[async_trait]
    impl MenuRepository for FixedMenu {
        async fn fetch_menu(&self, _restaurant_id: &str) -> drivethru_menu::Result<Vec<MenuItem>> {
            Ok(vec![
                MenuItem {
                    id: "42".into(),
                    restaurant_id: "r1".into(),
                    category_id: "burgers".into(),
                    name: "Big Mac".into(),
                    price: 5.99,
                    is_available: true,
                    ingredients: vec![
                        IngredientRef {
                            ingredient_id: "ing-bun".into(),
                            name: "bun".into(),
                            required: true,
                            additional_cost: 0.0,
                        },
                        IngredientRef {
                            ingredient_id: "ing-onions".into(),
                            name: "onions".into(),
                            required: false,
                            additional_cost: 0.0,
                        },
                    ],
                    available_sizes: vec![],
                },
                MenuItem {
                    id: "7".into(),
                    restaurant_id: "r1".into(),
                    category_id: "sides".into(),
                    name: "Onion Rings".into(),
                    price: 3.49,
                    is_available: false,
                    ingredients: vec![],
                    available_sizes: vec!["small".into(), "large".into()],
                },
                MenuItem {
                    id: "9".into(),
                    restaurant_id: "r1".into(),
                    category_id: "sides".into(),
                    name: "Fries".into(),
                    price: 2.99,
                    is_available: true,
                    ingredients: vec![],
                    available_sizes: vec!["small".into(), "medium".into(), "large".into()],
                },
            ])
        }

        async fn fetch_ingredients(&self, _restaurant_id: &str, _menu_item_id: &str) -> drivethru_menu::Result<Vec<Ingredient>> {
            Ok(vec![])
        }
    }

    fn ctx() -> CommandContext {
        CommandContext::new(
            "sess-1",
            "r1",
            Arc::new(drivethru_menu::MenuCache::new(Arc::new(FixedMenu))),
            OrderLimits::default(),
            FeatureFlags::default(),
        )
    }

    #[tokio::test]
    async fn add_item_success_then_remove_by_anaphora() {
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(2))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx(), Order::default()).await;
        assert_eq!(batch.batch_outcome, BatchOutcome::AllSuccess);
        assert_eq!(order.line_items.len(), 1);
        assert_eq!(order.line_items[0].total_price, 11.98);

        let dicts = vec![CommandDict::new("REMOVE_ITEM").with_slot("target_ref", serde_json::json!("last"))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx(), order).await;
        assert_eq!(batch.batch_outcome, BatchOutcome::AllSuccess);
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn unavailable_item_is_a_business_failure_not_a_panic() {
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("7"))
            .with_slot("quantity", serde_json::json!(1))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx(), Order::default()).await;
        assert_eq!(batch.batch_outcome, BatchOutcome::AllFailed);
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn mixed_batch_continues_after_a_failure() {
        let dicts = vec![
            CommandDict::new("ADD_ITEM").with_slot("menu_item_id", serde_json::json!("42")).with_slot("quantity", serde_json::json!(1)),
            CommandDict::new("ADD_ITEM").with_slot("menu_item_id", serde_json::json!("999")).with_slot("quantity", serde_json::json!(1)),
        ];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx(), Order::default()).await;
        assert_eq!(batch.total_commands, 2);
        assert_eq!(batch.successful_commands, 1);
        assert_eq!(batch.failed_commands, 1);
        assert_eq!(batch.batch_outcome, BatchOutcome::PartialSuccessAsk);
        assert_eq!(order.line_items.len(), 1);
    }

    #[tokio::test]
    async fn quantity_over_cap_is_rejected_by_validation_before_execution() {
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(11))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx(), Order::default()).await;
        assert_eq!(batch.batch_outcome, BatchOutcome::AllFailed);
        assert_eq!(batch.first_error_code, Some(ErrorCode::QuantityExceedsLimit));
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn repeated_clear_on_empty_order_is_a_warning_not_an_error() {
        let (batch, order) = CommandExecutor::execute_batch(vec![CommandDict::new("CLEAR_ORDER")], &ctx(), Order::default()).await;
        assert_eq!(batch.failed_commands, 0);
        assert_eq!(batch.follow_up_action, FollowUpAction::Continue);
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn conflicting_modifier_addition_is_rejected() {
        let add = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(1))
            .with_slot("modifiers", serde_json::json!([{"name": "onions", "is_addition": false, "additional_cost": 0.0}]))];
        let (_batch, order) = CommandExecutor::execute_batch(add, &ctx(), Order::default()).await;

        let modify = vec![CommandDict::new("MODIFY_ITEM")
            .with_slot("target_ref", serde_json::json!("last"))
            .with_slot("add_modifiers", serde_json::json!([{"name": "onions", "is_addition": true, "additional_cost": 0.3}]))];
        let (batch, order) = CommandExecutor::execute_batch(modify, &ctx(), order).await;
        assert_eq!(batch.first_error_code, Some(ErrorCode::ModifierConflict));
        assert_eq!(order.line_items[0].modifiers.len(), 1);
    }

    #[tokio::test]
    async fn empty_dict_list_synthesizes_a_degenerate_failure() {
        let (batch, _order) = CommandExecutor::execute_batch(vec![], &ctx(), Order::default()).await;
        assert_eq!(batch.total_commands, 1);
        assert_eq!(batch.failed_commands, 1);
        assert_eq!(batch.results[0].message, "No commands generated");
    }

    #[tokio::test]
    async fn unsupported_size_is_rejected() {
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("9"))
            .with_slot("quantity", serde_json::json!(1))
            .with_slot("size", serde_json::json!("extra-large"))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx(), Order::default()).await;
        assert_eq!(batch.first_error_code, Some(ErrorCode::SizeNotAvailable));
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn adding_an_unlinked_ingredient_is_rejected() {
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(1))
            .with_slot("modifiers", serde_json::json!([{"name": "truffle oil", "is_addition": true, "additional_cost": 0.0}]))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx(), Order::default()).await;
        assert_eq!(batch.first_error_code, Some(ErrorCode::ModifierAddNotAllowed));
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn removing_a_required_ingredient_is_rejected() {
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(1))
            .with_slot("modifiers", serde_json::json!([{"name": "bun", "is_addition": false, "additional_cost": 0.0}]))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx(), Order::default()).await;
        assert_eq!(batch.first_error_code, Some(ErrorCode::OptionRequiredMissing));
        assert!(order.is_empty());
    }

    struct OutOfStockMenu;

    #[async_trait]
    impl MenuRepository for OutOfStockMenu {
        async fn fetch_menu(&self, restaurant_id: &str) -> drivethru_menu::Result<Vec<MenuItem>> {
            FixedMenu.fetch_menu(restaurant_id).await
        }

        async fn fetch_ingredients(&self, restaurant_id: &str, menu_item_id: &str) -> drivethru_menu::Result<Vec<Ingredient>> {
            FixedMenu.fetch_ingredients(restaurant_id, menu_item_id).await
        }

        async fn fetch_inventory(&self, _restaurant_id: &str, ingredient_id: &str) -> drivethru_menu::Result<Option<Inventory>> {
            Ok(Some(Inventory {
                ingredient_id: ingredient_id.to_string(),
                current_stock: 0.0,
                min_stock_level: 10.0,
            }))
        }
    }

    fn ctx_with_out_of_stock_bun() -> CommandContext {
        CommandContext::new(
            "sess-1",
            "r1",
            Arc::new(drivethru_menu::MenuCache::new(Arc::new(OutOfStockMenu))),
            OrderLimits::default(),
            FeatureFlags::default(),
        )
    }

    #[tokio::test]
    async fn exhausted_required_ingredient_blocks_the_add() {
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(1))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx_with_out_of_stock_bun(), Order::default()).await;
        assert_eq!(batch.first_error_code, Some(ErrorCode::InventoryShortage));
        assert!(order.is_empty());
    }

    #[tokio::test]
    async fn allow_negative_inventory_downgrades_shortage_to_a_warning() {
        let mut ctx = ctx_with_out_of_stock_bun();
        ctx.features.allow_negative_inventory = true;
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(1))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx, Order::default()).await;
        assert_eq!(batch.batch_outcome, BatchOutcome::AllSuccess);
        assert_eq!(order.line_items.len(), 1);
        assert!(!batch.results[0].warnings.is_empty());
    }

    #[tokio::test]
    async fn disabling_inventory_checking_skips_the_stock_lookup_entirely() {
        let mut ctx = ctx_with_out_of_stock_bun();
        ctx.features.enable_inventory_checking = false;
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(1))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx, Order::default()).await;
        assert_eq!(batch.batch_outcome, BatchOutcome::AllSuccess);
        assert_eq!(order.line_items.len(), 1);
    }

    #[tokio::test]
    async fn disabling_customization_validation_lets_any_modifier_through() {
        let mut ctx = ctx();
        ctx.features.enable_customization_validation = false;
        let dicts = vec![CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(1))
            .with_slot("modifiers", serde_json::json!([{"name": "truffle oil", "is_addition": true, "additional_cost": 2.0}]))];
        let (batch, order) = CommandExecutor::execute_batch(dicts, &ctx, Order::default()).await;
        assert_eq!(batch.batch_outcome, BatchOutcome::AllSuccess);
        assert_eq!(order.line_items[0].modifiers[0].additional_cost, 2.0);
    }
}
