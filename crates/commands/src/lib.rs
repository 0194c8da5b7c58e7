//! Command validation, materialization, and batch execution (spec §4.5,
//! §4.6, §4.7). `drivethru-pipeline`'s `ParserRouter` produces `CommandDict`s;
//! this crate turns them into `Command`s, runs them against an order, and
//! derives the `CommandBatchResult` the response aggregator reads.

pub mod batch;
pub mod context;
pub mod customization;
pub mod error;
pub mod executor;
pub mod factory;
pub mod validator;

pub use context::CommandContext;
pub use customization::CustomizationValidator;
pub use error::CommandsError;
pub use executor::CommandExecutor;
pub use factory::build_command;
pub use validator::{CommandDataValidator, ValidationError};
