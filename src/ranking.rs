use crate::config::GoodsValuation;
use crate::record::{DisbursementKind, UnifiedDisbursement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientTotal {
    pub recipient_id: String,
    pub recipient_name: String,
    pub external_code: Option<String>,
    pub total_monetary: f64,
    pub total_goods: f64,
    pub total_combined: f64,
    pub transaction_count: usize,
}

/// Beneficiaries ranked by combined monetary and goods value, largest first.
///
/// Operational and unattributed records are skipped, as are beneficiaries with
/// no name on any of their records. Equal totals keep the order in which the
/// beneficiaries first appear in `records`.
pub fn top_recipients(
    records: &[UnifiedDisbursement],
    limit: usize,
    valuation: GoodsValuation,
) -> Vec<RecipientTotal> {
    let mut order: Vec<RecipientTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        if record.kind == DisbursementKind::Operational {
            continue;
        }
        let Some(recipient) = &record.recipient else {
            continue;
        };

        let position = *index.entry(recipient.id.as_str()).or_insert_with(|| {
            order.push(RecipientTotal {
                recipient_id: recipient.id.clone(),
                recipient_name: String::new(),
                external_code: None,
                total_monetary: 0.0,
                total_goods: 0.0,
                total_combined: 0.0,
                transaction_count: 0,
            });
            order.len() - 1
        });

        let total = &mut order[position];
        if total.recipient_name.is_empty() {
            if let Some(name) = &recipient.name {
                total.recipient_name = name.clone();
            }
        }
        if total.external_code.is_none() {
            total.external_code = recipient.external_code.clone();
        }

        let value = record.monetary_value(valuation);
        match record.kind {
            DisbursementKind::Monetary => total.total_monetary += value,
            DisbursementKind::Goods => total.total_goods += value,
            DisbursementKind::Operational => {}
        }
        total.total_combined = total.total_monetary + total.total_goods;
        total.transaction_count += 1;
    }

    order.retain(|t| !t.recipient_name.is_empty());
    // Stable sort keeps first-seen order among ties.
    order.sort_by(|a, b| b.total_combined.total_cmp(&a.total_combined));
    order.truncate(limit);
    order
}
