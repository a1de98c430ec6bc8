//! Utilities shared by the Swarmchat server binary and its tests.

pub mod logger;
pub mod time;
