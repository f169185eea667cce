pub mod action;
pub mod actions;
pub mod dispatcher;
pub mod keys;

pub use action::{ActionContext, RuleAction, Trigger};
pub use dispatcher::{ActionDispatcher, ActionServices, Dispatched};
pub use keys::{KeyPresser, KeyToken, LoggingKeyPresser, default_key_presser};
