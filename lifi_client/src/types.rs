use retry_utils::RetryPolicy;
use serde::{Deserialize, Serialize};
use transfer_core::TransferRecord;

/// Configuration for the LI.FI transfer-analytics client
#[derive(Debug, Clone)]
pub struct LifiConfig {
    pub api_base_url: String,
    pub timeout_seconds: u64,
    /// Records requested per page
    pub page_limit: u32,
    pub retry: RetryPolicy,
}

impl Default for LifiConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://li.quest/v2/analytics/transfers".to_string(),
            timeout_seconds: 30,
            page_limit: 1000,
            retry: RetryPolicy::default(),
        }
    }
}

/// One page of the transfer feed.
///
/// An empty `data` array or `hasNext != true` signals the end of pagination;
/// `next` is the opaque cursor for the following page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransfersPage {
    #[serde(default)]
    pub data: Vec<TransferRecord>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub previous: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_envelope_wire_format() {
        let json = r#"{
            "data": [
                {
                    "transactionId": "0x1",
                    "sending": {
                        "token": {"symbol": "WBTC", "logoURI": "https://example.com/wbtc.png"},
                        "chainId": 1,
                        "amountUSD": "250.75",
                        "includedSteps": [{"tool": "relay"}]
                    },
                    "receiving": {
                        "token": {"symbol": "BTC"},
                        "chainId": 56
                    },
                    "tool": "relay"
                }
            ],
            "next": "eyJvZmZzZXQiOjEwMDB9",
            "hasNext": true,
            "previous": null
        }"#;

        let page: TransfersPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].resolve_route(), "relay");
        assert_eq!(page.next.as_deref(), Some("eyJvZmZzZXQiOjEwMDB9"));
        assert_eq!(page.has_next, Some(true));
        assert_eq!(page.previous, None);
    }

    #[test]
    fn test_final_page_omits_cursor_fields() {
        let page: TransfersPage = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.next, None);
        assert_eq!(page.has_next, None);
    }
}
