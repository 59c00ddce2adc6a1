pub mod config;
pub mod error;
pub mod hardware;
pub mod kernel;
pub mod services;

pub use kernel::engine::DialogueEngine;
