// File: tikplays-core/src/lib.rs

pub mod engine;
pub mod eventbus;
pub mod http;
pub mod normalizer;
pub mod persistence;
pub mod profiles;
pub mod rules;
pub mod services;
pub mod subsystems;
pub mod tasks;

pub use tikplays_common::Error;

pub use engine::{Engine, EngineConfig, EngineHandle};
pub use eventbus::EventBus;
