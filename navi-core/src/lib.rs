//! A chat-command engine: middleware, typed argument resolution, permission and cooldown gating,
//! and interactive dialogs, over an abstract chat platform.

pub mod command;
pub mod gateway_handler;
pub mod middleware;
pub mod navi;
pub mod platform;
pub mod responder;
pub mod settings;

#[cfg(test)]
mod test_util;

pub use navi::{Navi, ThreadSafeNavi};
