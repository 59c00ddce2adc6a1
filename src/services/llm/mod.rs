pub mod client;

pub use client::{ChatService, CHAT_APOLOGY, SYSTEM_PROMPT};
