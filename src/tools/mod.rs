//! Tool system: registry, shared types, and the 1inch tool adapters

pub mod builtin;
pub mod chains;
pub mod oneinch;
pub mod registry;
pub mod types;

pub use registry::{Tool, ToolRegistry};
pub use types::{PropertySchema, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult};

use std::sync::Arc;

/// Build the registry with every built-in tool adapter
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(builtin::balance::BalanceTool::new()));
    registry.register(Arc::new(builtin::chart::ChartTool::new()));
    registry.register(Arc::new(builtin::domains::DomainsTool::new()));
    registry.register(Arc::new(builtin::gas_price::GasPriceTool::new()));
    registry.register(Arc::new(builtin::history::HistoryTool::new()));
    registry.register(Arc::new(builtin::nft::NftTool::new()));
    registry.register(Arc::new(builtin::portfolio::PortfolioTool::new()));
    registry.register(Arc::new(builtin::price::PriceTool::new()));
    registry.register(Arc::new(builtin::swap_quote::SwapQuoteTool::new()));
    registry.register(Arc::new(builtin::token_info::TokenInfoTool::new()));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_contains_all_adapters() {
        let registry = create_default_registry();
        assert_eq!(registry.len(), 10);

        for name in [
            "token_balances",
            "chart_data",
            "domain_operations",
            "gas_prices",
            "transaction_history",
            "nft_operations",
            "portfolio_analysis",
            "token_prices",
            "oneinch_fusion_swap",
            "get_token_info",
        ] {
            assert!(registry.get(name).is_some(), "missing tool {}", name);
        }
    }
}
