//! Maps one raw row of any source shape into one [`UnifiedDisbursement`].

use crate::category::{is_foundation_operations, resolve_category, CategoryHints};
use crate::error::MalformedRow;
use crate::record::{
    DisbursementKind, Measure, OriginSource, Provenance, Recipient, UnifiedDisbursement,
};
use crate::schema::{
    AllocationRow, GoodsDistributionRow, OperationalExpenseRow, RawRow, RecipientRef,
};

pub const ALLOCATION_SOURCE: &str = "allocation";
pub const OPERATIONAL_EXPENSE_SOURCE: &str = "operational_expense";
pub const GOODS_DISTRIBUTION_SOURCE: &str = "goods_distribution";

pub struct Normalizer<'a> {
    default_unit: &'a str,
}

impl<'a> Normalizer<'a> {
    pub fn new(default_unit: &'a str) -> Self {
        Self { default_unit }
    }

    pub fn normalize(&self, row: &RawRow) -> Result<UnifiedDisbursement, MalformedRow> {
        match row {
            RawRow::Allocation(row) => self.normalize_allocation(row),
            RawRow::OperationalExpense(row) => self.normalize_operational_expense(row),
            RawRow::GoodsDistribution(row) => self.normalize_goods(row),
        }
    }

    pub fn normalize_allocation(
        &self,
        row: &AllocationRow,
    ) -> Result<UnifiedDisbursement, MalformedRow> {
        let id = require_id(ALLOCATION_SOURCE, &row.id)?;
        let ledger = row.linked_entry();
        let date = row
            .effective_date()
            .ok_or_else(|| MalformedRow::MissingDate {
                source_name: ALLOCATION_SOURCE,
                record_id: id.to_string(),
            })?;

        let category = resolve_category(&CategoryHints {
            financial_category: ledger.and_then(|e| e.category.as_deref()),
            allocation_target: row.allocation_target.as_deref(),
            ..Default::default()
        });

        let recipient = to_recipient(row.recipient.as_ref());
        let provenance = match ledger {
            Some(entry) => finance_provenance(&entry.id, recipient.as_ref()),
            None => Provenance::new(OriginSource::AllocationLedger, id),
        };

        let detail = first_text(&[
            row.note.as_deref(),
            ledger.and_then(|e| e.sub_category.as_deref()),
            row.aid_type.as_deref(),
            Some(category.as_str()),
        ]);

        Ok(UnifiedDisbursement {
            id: id.to_string(),
            date,
            recipient,
            kind: DisbursementKind::Monetary,
            category,
            detail,
            measure: Measure::Amount {
                amount: row.amount.unwrap_or(0.0),
            },
            provenance,
        })
    }

    pub fn normalize_operational_expense(
        &self,
        row: &OperationalExpenseRow,
    ) -> Result<UnifiedDisbursement, MalformedRow> {
        let id = require_id(OPERATIONAL_EXPENSE_SOURCE, &row.id)?;
        let date = row.date.ok_or_else(|| MalformedRow::MissingDate {
            source_name: OPERATIONAL_EXPENSE_SOURCE,
            record_id: id.to_string(),
        })?;

        let is_operational = row.category.as_deref().is_some_and(is_foundation_operations);
        let kind = if is_operational {
            DisbursementKind::Operational
        } else {
            DisbursementKind::Monetary
        };

        let category = resolve_category(&CategoryHints {
            financial_category: row.category.as_deref(),
            operational_category: row.category.as_deref(),
            ..Default::default()
        });

        // Facility spend is never attributed, whatever the ledger recorded.
        let recipient = if is_operational {
            None
        } else {
            to_recipient(row.recipient.as_ref())
        };

        let detail = first_text(&[
            row.description.as_deref(),
            row.sub_category.as_deref(),
            Some(category.as_str()),
        ]);

        Ok(UnifiedDisbursement {
            id: id.to_string(),
            date,
            provenance: finance_provenance(id, recipient.as_ref()),
            recipient,
            kind,
            category,
            detail,
            measure: Measure::Amount {
                amount: row.amount.unwrap_or(0.0),
            },
        })
    }

    pub fn normalize_goods(
        &self,
        row: &GoodsDistributionRow,
    ) -> Result<UnifiedDisbursement, MalformedRow> {
        let id = require_id(GOODS_DISTRIBUTION_SOURCE, &row.id)?;
        let date = row.date.ok_or_else(|| MalformedRow::MissingDate {
            source_name: GOODS_DISTRIBUTION_SOURCE,
            record_id: id.to_string(),
        })?;

        let item = row.item.as_ref();
        let category = resolve_category(&CategoryHints {
            item_category: item.and_then(|i| i.category.as_deref()),
            ..Default::default()
        });

        let unit = item
            .and_then(|i| i.unit.as_deref())
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(self.default_unit)
            .to_string();

        let detail = first_text(&[
            item.and_then(|i| i.name.as_deref()),
            row.note.as_deref(),
            Some(category.as_str()),
        ]);

        Ok(UnifiedDisbursement {
            id: id.to_string(),
            date,
            recipient: to_recipient(row.recipient.as_ref()),
            kind: DisbursementKind::Goods,
            category,
            detail,
            measure: Measure::Quantity {
                quantity: row.quantity.unwrap_or(0.0),
                unit,
                unit_value: item.and_then(|i| i.unit_value),
            },
            provenance: Provenance::new(OriginSource::InventoryLog, id),
        })
    }
}

fn require_id<'r>(source_name: &'static str, id: &'r str) -> Result<&'r str, MalformedRow> {
    let id = id.trim();
    if id.is_empty() {
        return Err(MalformedRow::MissingId { source_name });
    }
    Ok(id)
}

/// Finance-ledger rows are keyed by entry id, and by beneficiary when one is
/// attributed, so a split entry keeps one record per beneficiary.
fn finance_provenance(entry_id: &str, recipient: Option<&Recipient>) -> Provenance {
    let entry_id = entry_id.trim();
    let record_id = match recipient {
        Some(r) => format!("{}#{}", entry_id, r.id),
        None => entry_id.to_string(),
    };
    Provenance::new(OriginSource::FinanceLedger, record_id)
}

fn to_recipient(recipient: Option<&RecipientRef>) -> Option<Recipient> {
    let recipient = recipient?;
    let id = recipient.id.trim();
    if id.is_empty() {
        return None;
    }
    Some(Recipient {
        id: id.to_string(),
        name: non_blank(recipient.name.as_deref()),
        external_code: non_blank(recipient.external_code.as_deref()),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_text(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .find_map(|c| non_blank(*c))
        .unwrap_or_default()
}
