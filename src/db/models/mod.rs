//! Database query methods, one file per table

pub mod chat;
pub mod delegation;
pub mod message;
pub mod swap_transaction;
pub mod user;
