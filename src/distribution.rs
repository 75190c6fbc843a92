use crate::category::OTHER;
use crate::config::{GoodsValuation, HeadlineCategory};
use crate::record::UnifiedDisbursement;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub category: String,
    pub amount: f64,
    pub count: usize,
    pub color: String,
}

/// Splits the records over the headline categories plus one "Other" slice.
///
/// Every record lands in exactly one slice. Slices that absorbed no record are
/// left out, so an inactive headline category never shows up. Ordered by amount,
/// largest first; equal amounts keep headline order with "Other" last.
pub fn category_distribution(
    records: &[UnifiedDisbursement],
    headlines: &[HeadlineCategory],
    other_color: &str,
    valuation: GoodsValuation,
) -> Vec<CategorySlice> {
    let mut slices: Vec<CategorySlice> = headlines
        .iter()
        .map(|h| CategorySlice {
            category: h.name.clone(),
            amount: 0.0,
            count: 0,
            color: h.color.clone(),
        })
        .collect();
    slices.push(CategorySlice {
        category: OTHER.to_string(),
        amount: 0.0,
        count: 0,
        color: other_color.to_string(),
    });
    let other_index = slices.len() - 1;

    for record in records {
        let index = headlines
            .iter()
            .position(|h| h.name == record.category)
            .unwrap_or(other_index);
        let slice = &mut slices[index];
        slice.amount += record.monetary_value(valuation);
        slice.count += 1;
    }

    slices.retain(|s| s.count > 0);
    slices.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    slices
}
