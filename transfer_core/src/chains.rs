/// Display name for a chain id, falling back to "Chain {id}" for networks
/// the table does not know about.
pub fn chain_display_name(chain_id: i64) -> String {
    match chain_id {
        1 => "Ethereum".to_string(),
        10 => "Optimism".to_string(),
        25 => "Cronos".to_string(),
        56 => "BSC".to_string(),
        66 => "OKC".to_string(),
        100 => "Gnosis".to_string(),
        128 => "HECO".to_string(),
        137 => "Polygon".to_string(),
        250 => "Fantom".to_string(),
        592 => "Astar".to_string(),
        999 => "HyperEVM".to_string(),
        1284 => "Moonbeam".to_string(),
        1285 => "Moonriver".to_string(),
        5000 => "Mantle".to_string(),
        7700 => "Canto".to_string(),
        8453 => "Base".to_string(),
        42161 => "Arbitrum".to_string(),
        42220 => "Celo".to_string(),
        43114 => "Avalanche".to_string(),
        57073 => "Ink".to_string(),
        747474 => "Katana".to_string(),
        1313161554 => "Aurora".to_string(),
        other => format!("Chain {}", other),
    }
}
