//! Subcommand implementations.

pub mod applications;
pub mod auth;
pub mod demo;
pub mod notifications;
pub mod profile;
pub mod vacancies;

/// Moderation screens exist but nothing behind them is persisted yet.
pub fn moderation() {
    println!("Admin moderation is not yet connected to persistence.");
}
