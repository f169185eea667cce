pub mod countdown_tick;

pub use countdown_tick::{CountdownTick, TickSource};
