//! Display helpers for wallet values.

use super::handle::DEFAULT_NETWORK_ID;

const LOVELACE_PER_ADA: f64 = 1_000_000.0;

/// Lovelace string to `"{ada} ADA"` with six decimals. Unparsable input reads as zero.
pub fn format_balance(lovelace: &str) -> String {
    let amount = lovelace.trim().parse::<u64>().unwrap_or(0);
    format!("{:.6} ADA", amount as f64 / LOVELACE_PER_ADA)
}

pub fn network_label(network_id: u8) -> &'static str {
    if network_id == DEFAULT_NETWORK_ID { "Mainnet" } else { "Testnet" }
}
