use crate::config::GoodsValuation;
use crate::record::{DisbursementKind, UnifiedDisbursement};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_monetary: f64,
    pub total_goods: f64,
    pub total_operational: f64,
    pub grand_total: f64,
    /// Distinct beneficiaries; unattributed records are not counted.
    pub total_recipients: usize,
    /// (monetary + goods) per distinct beneficiary. Operational spend has no
    /// beneficiary and stays out of the numerator.
    pub average_per_recipient: f64,
    pub transaction_count: usize,
    pub by_category: BTreeMap<String, f64>,
}

pub fn summarize(records: &[UnifiedDisbursement], valuation: GoodsValuation) -> SummaryStatistics {
    let mut stats = SummaryStatistics::default();
    let mut recipients: HashSet<&str> = HashSet::new();

    for record in records {
        let value = record.monetary_value(valuation);
        match record.kind {
            DisbursementKind::Monetary => stats.total_monetary += value,
            DisbursementKind::Goods => stats.total_goods += value,
            DisbursementKind::Operational => stats.total_operational += value,
        }
        *stats.by_category.entry(record.category.clone()).or_insert(0.0) += value;

        if let Some(id) = record.recipient_id() {
            recipients.insert(id);
        }
    }

    stats.grand_total = stats.total_monetary + stats.total_goods + stats.total_operational;
    stats.total_recipients = recipients.len();
    stats.average_per_recipient = if stats.total_recipients > 0 {
        (stats.total_monetary + stats.total_goods) / stats.total_recipients as f64
    } else {
        0.0
    };
    stats.transaction_count = records.len();

    stats
}
