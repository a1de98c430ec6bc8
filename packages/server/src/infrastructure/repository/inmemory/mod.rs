//! In-memory repositories.

pub mod client;

pub use client::InMemoryClientRepository;
