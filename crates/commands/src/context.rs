//! Per-turn execution context (spec §4.6 step 1, §9: "a context record
//! passed per turn").

use std::sync::Arc;

use drivethru_config::{FeatureFlags, OrderLimits};
use drivethru_menu::MenuCache;

use crate::customization::CustomizationValidator;

#[derive(Clone)]
pub struct CommandContext {
    pub session_id: String,
    pub restaurant_id: String,
    pub menu: Arc<MenuCache>,
    pub limits: OrderLimits,
    pub features: FeatureFlags,
    pub customization: CustomizationValidator,
}

impl CommandContext {
    pub fn new(session_id: impl Into<String>, restaurant_id: impl Into<String>, menu: Arc<MenuCache>, limits: OrderLimits, features: FeatureFlags) -> Self {
        Self {
            session_id: session_id.into(),
            restaurant_id: restaurant_id.into(),
            menu,
            limits,
            features,
            customization: CustomizationValidator,
        }
    }

    /// `order_id == session_id` always (spec §3.2).
    pub fn order_id(&self) -> &str {
        &self.session_id
    }
}
