use crate::distribution::CategorySlice;
use crate::error::{LedgerError, Result};
use crate::statistics::SummaryStatistics;

/// Checks the component-sum invariants between the statistics and the
/// distribution computed from the same records:
///
/// - per-kind totals add up to the grand total,
/// - the statistics category map adds up to the grand total,
/// - the distribution slices add up to the grand total.
pub fn verify_category_totals(
    stats: &SummaryStatistics,
    slices: &[CategorySlice],
    tolerance: f64,
) -> Result<()> {
    let kind_total = stats.total_monetary + stats.total_goods + stats.total_operational;
    check("kind totals", kind_total, stats.grand_total, tolerance)?;

    let category_total: f64 = stats.by_category.values().sum();
    check("statistics categories", category_total, stats.grand_total, tolerance)?;

    let slice_total: f64 = slices.iter().map(|s| s.amount).sum();
    check("distribution slices", slice_total, stats.grand_total, tolerance)?;

    Ok(())
}

fn check(against: &str, category_total: f64, expected: f64, tolerance: f64) -> Result<()> {
    let difference = (category_total - expected).abs();
    if difference > tolerance {
        return Err(LedgerError::TotalsMismatch {
            against: format!("grand total via {}", against),
            category_total,
            expected,
            difference,
        });
    }
    Ok(())
}
