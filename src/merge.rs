use crate::error::MalformedRow;
use crate::filter::DisbursementFilter;
use crate::normalizer::Normalizer;
use crate::record::{OriginSource, Provenance, UnifiedDisbursement};
use crate::schema::{AllocationRow, GoodsDistributionRow, OperationalExpenseRow, RawRow};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Raw rows as returned by the three adapters for one query.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub allocations: Vec<AllocationRow>,
    pub expenses: Vec<OperationalExpenseRow>,
    pub goods: Vec<GoodsDistributionRow>,
}

/// Bookkeeping of what happened to the rows of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub rows_seen: usize,
    pub malformed: usize,
    pub duplicates: usize,
    /// Unattributed ledger entries replaced by their per-beneficiary shares.
    pub superseded: usize,
    pub filtered_out: usize,
    pub kept: usize,
}

impl SourceBatch {
    /// Every row as a tagged [`RawRow`], ledger rows first so the posted
    /// expense wins over an allocation reporting the same share.
    pub fn into_raw_rows(self) -> impl Iterator<Item = RawRow> {
        self.expenses
            .into_iter()
            .map(RawRow::OperationalExpense)
            .chain(self.allocations.into_iter().map(RawRow::Allocation))
            .chain(self.goods.into_iter().map(RawRow::GoodsDistribution))
    }
}

pub fn merge_sources(
    batch: SourceBatch,
    filter: &DisbursementFilter,
    normalizer: &Normalizer<'_>,
) -> (Vec<UnifiedDisbursement>, MergeOutcome) {
    let mut outcome = MergeOutcome {
        rows_seen: batch.allocations.len() + batch.expenses.len() + batch.goods.len(),
        ..Default::default()
    };

    // Ledger entries that the allocation ledger splits across beneficiaries.
    let mut split_entries: HashSet<String> = HashSet::new();
    let mut normalized = Vec::with_capacity(outcome.rows_seen);
    for row in batch.into_raw_rows() {
        let Some(record) = accept(normalizer.normalize(&row), &mut outcome) else {
            continue;
        };
        if let RawRow::Allocation(allocation) = &row {
            if let (Some(entry), Some(_)) = (allocation.linked_entry(), &record.recipient) {
                split_entries.insert(entry.id.trim().to_string());
            }
        }
        normalized.push(record);
    }

    let mut visited: HashSet<Provenance> = HashSet::new();
    let mut records = Vec::with_capacity(normalized.len());
    for record in normalized {
        if is_split_parent(&record, &split_entries) {
            debug!(
                "Ledger entry '{}' is replaced by its allocated shares",
                record.provenance.record_id
            );
            outcome.superseded += 1;
            continue;
        }
        if !visited.insert(record.provenance.clone()) {
            debug!(
                "Skipping duplicate {} record '{}'",
                record.provenance.source.as_str(),
                record.provenance.record_id
            );
            outcome.duplicates += 1;
            continue;
        }
        push_filtered(record, filter, &mut records, &mut outcome);
    }

    sort_by_date_desc(&mut records);
    outcome.kept = records.len();

    debug!(
        "Merged {} rows: kept {}, malformed {}, duplicates {}, superseded {}, filtered out {}",
        outcome.rows_seen,
        outcome.kept,
        outcome.malformed,
        outcome.duplicates,
        outcome.superseded,
        outcome.filtered_out
    );

    (records, outcome)
}

/// An unattributed ledger record whose entry also appears split per beneficiary.
fn is_split_parent(record: &UnifiedDisbursement, split_entries: &HashSet<String>) -> bool {
    record.recipient.is_none()
        && record.provenance.source == OriginSource::FinanceLedger
        && split_entries.contains(&record.provenance.record_id)
}

/// Newest first. Records on the same date keep their merge order.
pub fn sort_by_date_desc(records: &mut [UnifiedDisbursement]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

fn accept(
    normalized: Result<UnifiedDisbursement, MalformedRow>,
    outcome: &mut MergeOutcome,
) -> Option<UnifiedDisbursement> {
    match normalized {
        Ok(record) => Some(record),
        Err(malformed) => {
            warn!("Data quality: dropping row ({})", malformed);
            outcome.malformed += 1;
            None
        }
    }
}

fn push_filtered(
    record: UnifiedDisbursement,
    filter: &DisbursementFilter,
    records: &mut Vec<UnifiedDisbursement>,
    outcome: &mut MergeOutcome,
) {
    if filter.matches(&record) {
        records.push(record);
    } else {
        outcome.filtered_out += 1;
    }
}
