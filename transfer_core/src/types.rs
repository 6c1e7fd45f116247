use serde::{Deserialize, Serialize};

/// Internal fee-collection step that must never be attributed as a route
pub const FEE_COLLECTION_TOOL: &str = "feeCollection";

/// Fallback route name when neither the steps nor the top-level tool name one
pub const UNKNOWN_ROUTE: &str = "Unknown";

/// Fallback integrator name when metadata carries none
pub const UNKNOWN_INTEGRATOR: &str = "unknown";

/// One completed cross-chain swap/bridge operation from the transfer feed.
///
/// Deserialization is deliberately lenient: the feed occasionally omits token
/// metadata or the top-level tool, and a single odd record must not fail a
/// whole page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    #[serde(default)]
    pub transaction_id: String,
    pub sending: TransferLeg,
    pub receiving: TransferLeg,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub metadata: Option<TransferMetadata>,
    #[serde(default)]
    pub lifi_explorer_link: Option<String>,
}

/// Sending or receiving side of a transfer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferLeg {
    #[serde(default)]
    pub token: Option<TokenInfo>,
    #[serde(default)]
    pub chain_id: i64,
    #[serde(default, rename = "amountUSD")]
    pub amount_usd: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub included_steps: Vec<IncludedStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenInfo {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, rename = "logoURI")]
    pub logo_uri: Option<String>,
}

/// One execution step of the sending leg; only the tool name is relevant here
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncludedStep {
    #[serde(default)]
    pub tool: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferMetadata {
    #[serde(default)]
    pub integrator: Option<String>,
}

impl TransferRecord {
    /// USD volume of the transfer. The sending side is authoritative; an
    /// absent or unparseable amount counts as zero rather than failing.
    pub fn volume_usd(&self) -> f64 {
        self.sending
            .amount_usd
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    /// Resolve the route (swap/bridge tool) that executed this transfer.
    ///
    /// Scans `sending.includedSteps` in order and takes the first step whose
    /// tool is present and not the internal fee-collection marker, then falls
    /// back to the top-level tool, then to "Unknown".
    pub fn resolve_route(&self) -> String {
        for step in &self.sending.included_steps {
            if let Some(tool) = step.tool.as_deref() {
                if !tool.is_empty() && tool != FEE_COLLECTION_TOOL {
                    return tool.to_string();
                }
            }
        }

        self.tool
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_ROUTE)
            .to_string()
    }

    /// Integrator that originated the transfer, defaulting to "unknown"
    pub fn integrator(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(|m| m.integrator.as_deref())
            .filter(|i| !i.is_empty())
            .unwrap_or(UNKNOWN_INTEGRATOR)
            .to_string()
    }

    /// Whether both legs carry token metadata; records without it cannot be
    /// attributed to a pair and are skipped during aggregation.
    pub fn has_token_info(&self) -> bool {
        self.sending.token.is_some() && self.receiving.token.is_some()
    }

    /// Timestamp of the transfer, preferring the sending leg
    pub fn timestamp(&self) -> Option<i64> {
        self.sending.timestamp.or(self.receiving.timestamp)
    }
}
