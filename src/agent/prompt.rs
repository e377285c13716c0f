//! System prompt composition
//!
//! Built fresh per request: the personalization block depends on the
//! resolved user, which varies per chat.

use crate::models::User;
use crate::tools::ToolRegistry;

/// Per-request user context resolved from the chat owner
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub id: String,
    pub wallet_address: Option<String>,
    pub email: Option<String>,
}

impl UserContext {
    pub fn from_user(user: &User) -> Self {
        UserContext {
            id: user.id.clone(),
            wallet_address: user.wallet_address.clone(),
            email: user.email.clone(),
        }
    }
}

/// Build the system prompt describing the available tools and behavioral
/// rules, optionally personalized with the requesting user's wallet.
pub fn build_system_prompt(registry: &ToolRegistry, user: Option<&UserContext>) -> String {
    let mut prompt = String::from(
        "You are DeFi Pilot, a helpful AI assistant for decentralized finance. \
         You have access to real-time DeFi tools backed by the 1inch APIs:\n\n",
    );

    for (i, def) in registry.definitions().iter().enumerate() {
        prompt.push_str(&format!("{}. **{}**: {}\n", i + 1, def.name, def.description));
    }

    prompt.push_str(
        "\nTool selection examples:\n\
         - \"What's my ETH balance?\" → token_balances (not token_prices)\n\
         - \"How much is ETH worth?\" → token_prices\n\
         - \"What is my portfolio worth?\" → token_balances first, then token_prices for the held tokens\n\
         - \"Show me an ETH/USDC chart\" → chart_data\n\
         - \"Who is vitalik.eth?\" → domain_operations\n\
         - \"Quote 1 ETH to USDC\" → oneinch_fusion_swap\n\n\
         Guidelines:\n\
         - Always be polite and professional\n\
         - Check balances before prices when the user asks about the value of their own holdings\n\
         - Always render image URLs as markdown images so the client can display them\n\
         - When a previous tool call returned an address, reuse that exact address in follow-up calls; never truncate or re-derive it\n\
         - Provide clear explanations of swap quotes and rates, including slippage and gas estimates\n\
         - Warn users that quotes are informational and execution requires wallet interaction\n\
         - If you can't help with something, explain what you can do instead\n",
    );

    if let Some(user) = user {
        if let Some(wallet) = &user.wallet_address {
            prompt.push_str(&format!(
                "\nThe current user's wallet address is {}. When the user says \"my balance\", \
                 \"my NFTs\", \"my portfolio\" or similar without naming an address, use this \
                 wallet address.\n",
                wallet
            ));
        }
        if let Some(email) = &user.email {
            prompt.push_str(&format!("The current user's email is {}.\n", email));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::create_default_registry;

    #[test]
    fn prompt_lists_every_tool() {
        let registry = create_default_registry();
        let prompt = build_system_prompt(&registry, None);

        for def in registry.definitions() {
            assert!(prompt.contains(&def.name), "prompt missing {}", def.name);
        }
        assert!(prompt.contains("markdown images"));
    }

    #[test]
    fn prompt_is_personalized_with_wallet() {
        let registry = create_default_registry();
        let ctx = UserContext {
            id: "u-1".to_string(),
            wallet_address: Some("0xabc0000000000000000000000000000000000001".to_string()),
            email: Some("user@example.com".to_string()),
        };

        let prompt = build_system_prompt(&registry, Some(&ctx));
        assert!(prompt.contains("0xabc0000000000000000000000000000000000001"));
        assert!(prompt.contains("user@example.com"));

        let anonymous = build_system_prompt(&registry, None);
        assert!(!anonymous.contains("0xabc"));
    }
}
