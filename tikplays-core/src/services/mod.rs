pub mod dispatch;

pub use dispatch::{ActionDispatcher, ActionServices, Dispatched, Trigger};
