//! Leaf error type for this crate. Validation failures are not modeled as
//! `Err` — they flow through `ValidationError` into an `OrderResult` instead
//! (spec §7: "Commands return `OrderResult`s; they do not raise").

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandsError {
    #[error("menu lookup failed: {0}")]
    Menu(#[from] drivethru_menu::MenuError),
}
