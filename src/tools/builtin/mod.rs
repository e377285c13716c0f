//! Built-in tool adapters, one per 1inch API surface

pub mod balance;
pub mod chart;
pub mod domains;
pub mod gas_price;
pub mod history;
pub mod nft;
pub mod portfolio;
pub mod price;
pub mod swap_quote;
pub mod token_info;
