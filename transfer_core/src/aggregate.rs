use crate::chains::chain_display_name;
use crate::types::{TokenInfo, TransferRecord};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Ranking list length for the top-transaction view
pub const TOP_TRANSACTIONS_LIMIT: usize = 20;

/// Running volume/count accumulator for a route or integrator
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RouteStats {
    pub volume: f64,
    pub count: u64,
}

impl RouteStats {
    fn record(&mut self, volume: f64) {
        self.volume += volume;
        self.count += 1;
    }
}

/// Accumulated stats for one canonical token/chain pair.
///
/// The side1/side2 identity is frozen when the pair is first observed; it
/// records whichever composed "symbol (chain)" string sorts first, not which
/// leg happened to be the sender.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PairAggregate {
    pub volume: f64,
    pub count: u64,
    pub side1_token: String,
    pub side1_chain: String,
    pub side1_icon: Option<String>,
    pub side2_token: String,
    pub side2_chain: String,
    pub side2_icon: Option<String>,
    pub routes: BTreeMap<String, RouteStats>,
    pub integrators: BTreeMap<String, RouteStats>,
}

/// Denormalized per-record projection used only for the volume ranking
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopTransactionEntry {
    pub transaction_id: String,
    pub volume: f64,
    /// Exact decimal string as reported by the feed
    pub raw_volume: String,
    pub from_symbol: String,
    pub to_symbol: String,
    pub from_chain: String,
    pub to_chain: String,
    pub from_icon: Option<String>,
    pub to_icon: Option<String>,
    pub route: String,
    pub integrator: String,
    pub explorer_link: Option<String>,
    pub timestamp: Option<i64>,
}

/// Output of one aggregation pass. Immutable once produced; a filter toggle
/// or a new fetch cycle always rebuilds it from scratch.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Aggregate {
    pub pair_volumes: BTreeMap<String, PairAggregate>,
    pub chain_volumes: BTreeMap<String, f64>,
    pub route_volumes: BTreeMap<String, RouteStats>,
    pub total_volume: f64,
    pub total_txs: u64,
    pub top_transactions: Vec<TopTransactionEntry>,
    /// Records dropped because a leg carried no token metadata
    pub skipped_records: u64,
}

struct PairSide<'a> {
    label: String,
    token: &'a TokenInfo,
    chain: String,
}

/// Fold a (filtered) record set into the aggregate views.
///
/// Single synchronous pass; the only cross-record ordering dependency is the
/// stable tie-break of the final top-transaction sort, which preserves input
/// order for equal volumes.
pub fn aggregate_transfers<'a, I>(records: I) -> Aggregate
where
    I: IntoIterator<Item = &'a TransferRecord>,
{
    let mut aggregate = Aggregate::default();
    let mut candidates: Vec<TopTransactionEntry> = Vec::new();

    for record in records {
        aggregate.total_txs += 1;

        let (from_token, to_token) = match (&record.sending.token, &record.receiving.token) {
            (Some(from), Some(to)) => (from, to),
            _ => {
                aggregate.skipped_records += 1;
                continue;
            }
        };

        let from_chain = chain_display_name(record.sending.chain_id);
        let to_chain = chain_display_name(record.receiving.chain_id);

        let from_side = PairSide {
            label: format!("{} ({})", from_token.symbol, from_chain),
            token: from_token,
            chain: from_chain.clone(),
        };
        let to_side = PairSide {
            label: format!("{} ({})", to_token.symbol, to_chain),
            token: to_token,
            chain: to_chain.clone(),
        };

        // Canonical direction-independent pair: order the two composed
        // "symbol (chain)" strings lexicographically.
        let (side1, side2) = if from_side.label < to_side.label {
            (&from_side, &to_side)
        } else {
            (&to_side, &from_side)
        };
        let pair_key = format!("{} ↔ {}", side1.label, side2.label);

        let volume = record.volume_usd();
        let route = record.resolve_route();
        let integrator = record.integrator();

        let pair = aggregate
            .pair_volumes
            .entry(pair_key)
            .or_insert_with(|| PairAggregate {
                volume: 0.0,
                count: 0,
                side1_token: side1.token.symbol.clone(),
                side1_chain: side1.chain.clone(),
                side1_icon: side1.token.logo_uri.clone(),
                side2_token: side2.token.symbol.clone(),
                side2_chain: side2.chain.clone(),
                side2_icon: side2.token.logo_uri.clone(),
                routes: BTreeMap::new(),
                integrators: BTreeMap::new(),
            });
        pair.volume += volume;
        pair.count += 1;
        pair.routes.entry(route.clone()).or_default().record(volume);
        pair.integrators
            .entry(integrator.clone())
            .or_default()
            .record(volume);

        aggregate.total_volume += volume;
        *aggregate.chain_volumes.entry(from_chain.clone()).or_insert(0.0) += volume;
        aggregate
            .route_volumes
            .entry(route.clone())
            .or_default()
            .record(volume);

        candidates.push(TopTransactionEntry {
            transaction_id: record.transaction_id.clone(),
            volume,
            raw_volume: record
                .sending
                .amount_usd
                .clone()
                .unwrap_or_else(|| "0".to_string()),
            from_symbol: from_token.symbol.clone(),
            to_symbol: to_token.symbol.clone(),
            from_chain,
            to_chain,
            from_icon: from_token.logo_uri.clone(),
            to_icon: to_token.logo_uri.clone(),
            route,
            integrator,
            explorer_link: record.lifi_explorer_link.clone(),
            timestamp: record.timestamp(),
        });
    }

    // Stable sort keeps input order for equal volumes
    candidates.sort_by(|a, b| b.volume.partial_cmp(&a.volume).unwrap_or(Ordering::Equal));
    candidates.truncate(TOP_TRANSACTIONS_LIMIT);
    aggregate.top_transactions = candidates;

    if aggregate.skipped_records > 0 {
        debug!(
            "Skipped {} of {} records with missing token metadata",
            aggregate.skipped_records, aggregate.total_txs
        );
    }

    aggregate
}
