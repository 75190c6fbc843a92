use crate::config::GoodsValuation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DisbursementKind {
    /// Money allocated to a beneficiary.
    Monetary,
    /// Physical goods handed to a beneficiary.
    Goods,
    /// Facility spend with no beneficiary.
    Operational,
}

/// Ledger a record was read from. Together with the record id it forms the
/// provenance key used for de-duplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginSource {
    /// Posted entries of the general finance ledger, reachable through both the
    /// allocation and the operational-expense adapters.
    FinanceLedger,
    /// Manual allocations with no finance-ledger link.
    AllocationLedger,
    InventoryLog,
}

impl OriginSource {
    pub fn as_str(self) -> &'static str {
        match self {
            OriginSource::FinanceLedger => "finance_ledger",
            OriginSource::AllocationLedger => "allocation_ledger",
            OriginSource::InventoryLog => "inventory_log",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Provenance {
    pub source: OriginSource,
    pub record_id: String,
}

impl Provenance {
    pub fn new(source: OriginSource, record_id: impl Into<String>) -> Self {
        Self {
            source,
            record_id: record_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub name: Option<String>,
    pub external_code: Option<String>,
}

/// What was disbursed: an amount of money, or a quantity of goods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "measure", rename_all = "snake_case")]
pub enum Measure {
    Amount {
        amount: f64,
    },
    Quantity {
        quantity: f64,
        unit: String,
        unit_value: Option<f64>,
    },
}

/// The canonical record every source row is normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedDisbursement {
    pub id: String,
    pub date: NaiveDate,
    pub recipient: Option<Recipient>,
    pub kind: DisbursementKind,
    pub category: String,
    pub detail: String,
    pub measure: Measure,
    pub provenance: Provenance,
}

impl UnifiedDisbursement {
    pub fn amount(&self) -> Option<f64> {
        match self.measure {
            Measure::Amount { amount } => Some(amount),
            Measure::Quantity { .. } => None,
        }
    }

    pub fn quantity(&self) -> Option<(f64, &str)> {
        match &self.measure {
            Measure::Quantity { quantity, unit, .. } => Some((*quantity, unit.as_str())),
            Measure::Amount { .. } => None,
        }
    }

    pub fn recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|r| r.id.as_str())
    }

    /// Monetary equivalent used by every aggregate. Amounts count as posted;
    /// goods are priced by `valuation`.
    pub fn monetary_value(&self, valuation: GoodsValuation) -> f64 {
        match (&self.measure, valuation) {
            (Measure::Amount { amount }, _) => *amount,
            (Measure::Quantity { .. }, GoodsValuation::Zero) => 0.0,
            (
                Measure::Quantity {
                    quantity,
                    unit_value,
                    ..
                },
                GoodsValuation::UnitValue,
            ) => unit_value.map(|v| v * quantity).unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goods(quantity: f64, unit_value: Option<f64>) -> UnifiedDisbursement {
        UnifiedDisbursement {
            id: "g-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            recipient: None,
            kind: DisbursementKind::Goods,
            category: "Groceries".to_string(),
            detail: "Rice".to_string(),
            measure: Measure::Quantity {
                quantity,
                unit: "kg".to_string(),
                unit_value,
            },
            provenance: Provenance::new(OriginSource::InventoryLog, "g-1"),
        }
    }

    #[test]
    fn test_goods_valuation() {
        let record = goods(10.0, Some(15000.0));
        assert_eq!(record.monetary_value(GoodsValuation::Zero), 0.0);
        assert!((record.monetary_value(GoodsValuation::UnitValue) - 150000.0).abs() < 1e-9);
        assert_eq!(goods(10.0, None).monetary_value(GoodsValuation::UnitValue), 0.0);
        assert_eq!(record.amount(), None);
        assert_eq!(record.quantity(), Some((10.0, "kg")));
    }
}
