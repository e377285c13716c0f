//! Chain tables and token helpers shared by the 1inch tool adapters

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Networks the aggregation APIs cover, keyed by the names the model uses
pub static SUPPORTED_CHAINS: &[(&str, u64)] = &[
    ("ethereum", 1),
    ("bsc", 56),
    ("polygon", 137),
    ("arbitrum", 42161),
    ("optimism", 10),
    ("avalanche", 43114),
    ("gnosis", 100),
    ("base", 8453),
    ("zksync", 324),
    ("linea", 59144),
];

/// Well-known token addresses per chain, used to resolve symbols the model
/// sends instead of addresses
pub static COMMON_TOKENS: Lazy<HashMap<u64, HashMap<&'static str, &'static str>>> =
    Lazy::new(|| {
        let mut chains = HashMap::new();

        let mut eth = HashMap::new();
        eth.insert("ETH", "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"); // WETH
        eth.insert("WETH", "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        eth.insert("USDC", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        eth.insert("USDT", "0xdac17f958d2ee523a2206206994597c13d831ec7");
        eth.insert("DAI", "0x6b175474e89094c44da98b954eedeac495271d0f");
        eth.insert("WBTC", "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599");
        eth.insert("UNI", "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984");
        eth.insert("LINK", "0x514910771af9ca656af840dff83e8264ecf986ca");
        chains.insert(1, eth);

        let mut polygon = HashMap::new();
        polygon.insert("MATIC", "0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270"); // WMATIC
        polygon.insert("WMATIC", "0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270");
        polygon.insert("USDC", "0x2791bca1f2de4661ed88a30c99a7a9449aa84174");
        polygon.insert("USDT", "0xc2132d05d31c914a87c6611c10748aeb04b58e8f");
        polygon.insert("DAI", "0x8f3cf7ad23cd3cadbd9735aff958023239c6a063");
        polygon.insert("WETH", "0x7ceb23fd6bc0add59e62ac25578270cff1b9f619");
        polygon.insert("WBTC", "0x1bfd67037b42cf73acf2047067bd4f2c47d9bfd6");
        chains.insert(137, polygon);

        let mut bsc = HashMap::new();
        bsc.insert("BNB", "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c"); // WBNB
        bsc.insert("WBNB", "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c");
        bsc.insert("USDC", "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d");
        bsc.insert("USDT", "0x55d398326f99059ff775485246999027b3197955");
        bsc.insert("BUSD", "0xe9e7cea3dedca5984780bafc599bd69add087d56");
        bsc.insert("ETH", "0x2170ed0880ac9a755fd29b2688956bd959f933f8");
        chains.insert(56, bsc);

        let mut arbitrum = HashMap::new();
        arbitrum.insert("ETH", "0x82af49447d8a07e3bd95bd0d56f35241523fbab1"); // WETH
        arbitrum.insert("WETH", "0x82af49447d8a07e3bd95bd0d56f35241523fbab1");
        arbitrum.insert("USDC", "0xff970a61a04b1ca14834a43f5de4533ebddb5cc8");
        arbitrum.insert("USDT", "0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9");
        arbitrum.insert("DAI", "0xda10009cbd5d07dd0cecc66161fc93d7c9000da1");
        arbitrum.insert("ARB", "0x912ce59144191c1204e64559fe8253a0e49e6548");
        chains.insert(42161, arbitrum);

        chains
    });

/// Native-asset sentinel address used by the balance and price APIs
pub const NATIVE_TOKEN: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

pub fn chain_id(chain: &str) -> Option<u64> {
    let needle = chain.trim().to_lowercase();
    SUPPORTED_CHAINS
        .iter()
        .find(|(name, _)| *name == needle)
        .map(|(_, id)| *id)
}

pub fn chain_name(chain_id: u64) -> String {
    SUPPORTED_CHAINS
        .iter()
        .find(|(_, id)| *id == chain_id)
        .map(|(name, _)| {
            let mut c = name.chars();
            match c.next() {
                Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
                None => String::new(),
            }
        })
        .unwrap_or_else(|| format!("Chain {}", chain_id))
}

pub fn supported_chain_names() -> String {
    SUPPORTED_CHAINS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn is_valid_address(address: &str) -> bool {
    let addr = address.trim();
    addr.len() == 42
        && addr.starts_with("0x")
        && addr[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Resolve a token reference (address or symbol) to a lowercase address.
/// Returns None when the symbol is unknown on that chain.
pub fn resolve_token(token: &str, chain_id: u64) -> Option<String> {
    let trimmed = token.trim();
    if is_valid_address(trimmed) {
        return Some(trimmed.to_lowercase());
    }
    COMMON_TOKENS
        .get(&chain_id)?
        .get(trimmed.to_uppercase().as_str())
        .map(|addr| addr.to_string())
}

pub fn known_symbols(chain_id: u64) -> String {
    COMMON_TOKENS
        .get(&chain_id)
        .map(|tokens| {
            let mut symbols: Vec<&str> = tokens.keys().copied().collect();
            symbols.sort_unstable();
            symbols.join(", ")
        })
        .unwrap_or_else(|| "none available".to_string())
}

/// Render a raw integer amount in token units, trimming noise digits
pub fn format_token_amount(raw: &str, decimals: u32) -> String {
    let value: f64 = match raw.parse::<f64>() {
        Ok(v) => v / 10f64.powi(decimals as i32),
        Err(_) => return raw.to_string(),
    };
    if value == 0.0 {
        "0".to_string()
    } else if value < 0.000001 {
        format!("{:e}", value)
    } else if value < 1.0 {
        format!("{:.6}", value)
    } else if value < 1000.0 {
        format!("{:.4}", value)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_lookup_is_case_insensitive() {
        assert_eq!(chain_id("Ethereum"), Some(1));
        assert_eq!(chain_id(" polygon "), Some(137));
        assert_eq!(chain_id("solana"), None);
        assert_eq!(chain_name(42161), "Arbitrum");
        assert_eq!(chain_name(999), "Chain 999");
    }

    #[test]
    fn resolve_token_accepts_addresses_and_symbols() {
        let weth = resolve_token("WETH", 1).unwrap();
        assert_eq!(weth, "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

        // Symbol lookup is case-insensitive
        assert_eq!(resolve_token("usdc", 137), resolve_token("USDC", 137));

        // Addresses pass through lowercased, regardless of chain tables
        let addr = resolve_token("0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48", 999).unwrap();
        assert_eq!(addr, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

        assert!(resolve_token("DOGE", 1).is_none());
    }

    #[test]
    fn address_validation() {
        assert!(is_valid_address("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        assert!(!is_valid_address("0x123"));
        assert!(!is_valid_address("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        assert!(!is_valid_address("0xZZZaaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
    }

    #[test]
    fn token_amount_formatting() {
        assert_eq!(format_token_amount("0", 18), "0");
        assert_eq!(format_token_amount("1000000000000000000", 18), "1.0000");
        assert_eq!(format_token_amount("2500000", 6), "2.5000");
        assert_eq!(format_token_amount("not-a-number", 18), "not-a-number");
    }
}
