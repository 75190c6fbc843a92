use crate::normalizer::{ALLOCATION_SOURCE, GOODS_DISTRIBUTION_SOURCE, OPERATIONAL_EXPENSE_SOURCE};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct RecipientRef {
    #[schemars(description = "Stable identifier of the beneficiary (student) record")]
    pub id: String,

    #[serde(default)]
    #[schemars(description = "Full name of the beneficiary as stored in the student registry")]
    pub name: Option<String>,

    #[serde(default)]
    #[schemars(description = "External registry code of the beneficiary (national student number)")]
    pub external_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct LedgerEntryRef {
    #[schemars(description = "Identifier of the posted entry in the general finance ledger")]
    pub id: String,

    #[serde(default)]
    #[schemars(description = "Posting date of the ledger entry (YYYY-MM-DD)")]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(
        description = "Category the finance team assigned to the ledger entry, e.g. 'Formal Education'"
    )]
    pub category: Option<String>,

    #[serde(default)]
    pub sub_category: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// One row of the manual expense-allocation ledger: a share of a posted expense
/// allocated to a single beneficiary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AllocationRow {
    #[schemars(description = "Identifier of the allocation row")]
    pub id: String,

    #[serde(default)]
    pub recipient: Option<RecipientRef>,

    #[serde(default)]
    #[schemars(description = "Allocated amount in the ledger currency. Missing amounts count as zero.")]
    pub amount: Option<f64>,

    #[serde(default)]
    #[schemars(
        description = "Allocation target tag: 'formal', 'boarding', 'dormitory-consumption' or 'direct-aid'"
    )]
    pub allocation_target: Option<String>,

    #[serde(default)]
    #[schemars(description = "The finance ledger entry this allocation was split from, if linked")]
    pub ledger_entry: Option<LedgerEntryRef>,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default)]
    #[schemars(description = "Free-text aid type recorded by the allocating clerk")]
    pub aid_type: Option<String>,

    #[serde(default)]
    #[schemars(description = "Date the allocation row was created. Used when no ledger entry date exists.")]
    pub created_on: Option<NaiveDate>,
}

/// One posted outflow from the general operational-expense ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct OperationalExpenseRow {
    #[schemars(description = "Identifier of the ledger entry")]
    pub id: String,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(
        description = "Ledger category. 'Foundation Operations' marks facility spend that is never attributed to a beneficiary."
    )]
    pub category: Option<String>,

    #[serde(default)]
    pub sub_category: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub amount: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Beneficiary the expense was posted for, when the ledger records one directly")]
    pub recipient: Option<RecipientRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct InventoryItemRef {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    #[schemars(description = "Inventory category of the item, e.g. 'Groceries' or 'Stationery'")]
    pub category: Option<String>,

    #[serde(default)]
    #[schemars(description = "Unit of measure, e.g. 'kg' or 'pcs'")]
    pub unit: Option<String>,

    #[serde(default)]
    #[schemars(description = "Monetary value of one unit, when the inventory module tracks it")]
    pub unit_value: Option<f64>,
}

/// One outbound movement of the physical-goods distribution log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct GoodsDistributionRow {
    #[schemars(description = "Identifier of the inventory transaction")]
    pub id: String,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub quantity: Option<f64>,

    #[serde(default)]
    pub recipient: Option<RecipientRef>,

    #[serde(default)]
    pub item: Option<InventoryItemRef>,

    #[serde(default)]
    pub note: Option<String>,
}

impl AllocationRow {
    /// The finance-ledger entry this row splits. A link with a blank id is no link.
    pub fn linked_entry(&self) -> Option<&LedgerEntryRef> {
        self.ledger_entry
            .as_ref()
            .filter(|entry| !entry.id.trim().is_empty())
    }

    /// Posting date of the linked entry, else the row's own creation date.
    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.linked_entry()
            .and_then(|entry| entry.date)
            .or(self.created_on)
    }
}

/// A raw row tagged with the source shape it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RawRow {
    Allocation(AllocationRow),
    OperationalExpense(OperationalExpenseRow),
    GoodsDistribution(GoodsDistributionRow),
}

impl RawRow {
    pub fn source_name(&self) -> &'static str {
        match self {
            RawRow::Allocation(_) => ALLOCATION_SOURCE,
            RawRow::OperationalExpense(_) => OPERATIONAL_EXPENSE_SOURCE,
            RawRow::GoodsDistribution(_) => GOODS_DISTRIBUTION_SOURCE,
        }
    }
}

/// JSON schemas of the three row shapes, for adapter authors.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SourceRowSchemas {
    pub allocation: AllocationRow,
    pub operational_expense: OperationalExpenseRow,
    pub goods_distribution: GoodsDistributionRow,
}

impl SourceRowSchemas {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SourceRowSchemas)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = SourceRowSchemas::schema_as_json().unwrap();
        assert!(schema_json.contains("allocation_target"));
        assert!(schema_json.contains("ledger_entry"));
        assert!(schema_json.contains("unit_value"));
    }

    #[test]
    fn test_sparse_rows_deserialize() {
        let json = r#"{ "id": "g-1", "quantity": 4, "item": { "name": "Rice" } }"#;
        let row: GoodsDistributionRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, "g-1");
        assert!(row.date.is_none());
        assert_eq!(row.item.unwrap().name.as_deref(), Some("Rice"));

        let tagged = r#"{ "source": "operational_expense", "id": "e-1", "amount": 12.5 }"#;
        let raw: RawRow = serde_json::from_str(tagged).unwrap();
        assert_eq!(raw.source_name(), "operational_expense");
    }
}
