//! Request handlers

pub mod account;
pub mod auth;
pub mod coins;
pub mod health;
pub mod merch;
