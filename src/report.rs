use crate::distribution::CategorySlice;
use crate::error::{LedgerError, Result};
use crate::filter::DisbursementFilter;
use crate::merge::MergeOutcome;
use crate::ranking::RecipientTotal;
use crate::record::{DisbursementKind, Measure, UnifiedDisbursement};
use crate::statistics::SummaryStatistics;
use crate::trend::MonthlyTrendPoint;
use serde::{Deserialize, Serialize};

/// Every view of one query, computed from a single fetch so they agree with
/// each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisbursementReport {
    pub filter: DisbursementFilter,
    pub history: Vec<UnifiedDisbursement>,
    pub statistics: SummaryStatistics,
    pub monthly_trend: Vec<MonthlyTrendPoint>,
    pub category_distribution: Vec<CategorySlice>,
    pub top_recipients: Vec<RecipientTotal>,
    pub merge: MergeOutcome,
}

impl DisbursementReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The unified history as CSV, one row per record.
    pub fn to_csv(&self) -> Result<String> {
        history_to_csv(&self.history)
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        let stats = &self.statistics;

        output.push_str("# Disbursement Report\n\n");
        output.push_str(&format!("**Period:** {}\n\n", describe_period(&self.filter)));

        output.push_str("## Summary\n\n");
        output.push_str("| Measure | Value |\n|---|---:|\n");
        output.push_str(&format!("| Monetary | {:.2} |\n", stats.total_monetary));
        output.push_str(&format!("| Goods | {:.2} |\n", stats.total_goods));
        output.push_str(&format!("| Operational | {:.2} |\n", stats.total_operational));
        output.push_str(&format!("| Grand total | {:.2} |\n", stats.grand_total));
        output.push_str(&format!("| Recipients | {} |\n", stats.total_recipients));
        output.push_str(&format!(
            "| Average per recipient | {:.2} |\n",
            stats.average_per_recipient
        ));
        output.push_str(&format!("| Transactions | {} |\n\n", stats.transaction_count));

        output.push_str("## Category Distribution\n\n");
        if self.category_distribution.is_empty() {
            output.push_str("_No disbursements._\n\n");
        } else {
            output.push_str("| Category | Amount | Count |\n|---|---:|---:|\n");
            for slice in &self.category_distribution {
                output.push_str(&format!(
                    "| {} | {:.2} | {} |\n",
                    slice.category, slice.amount, slice.count
                ));
            }
            output.push('\n');
        }

        output.push_str("## Monthly Trend\n\n");
        output.push_str("| Month | Monetary | Goods | Total |\n|---|---:|---:|---:|\n");
        for point in &self.monthly_trend {
            output.push_str(&format!(
                "| {} | {:.2} | {:.2} | {:.2} |\n",
                point.label, point.monetary, point.goods, point.total
            ));
        }
        output.push('\n');

        output.push_str("## Top Recipients\n\n");
        if self.top_recipients.is_empty() {
            output.push_str("_No attributed disbursements._\n");
        } else {
            output.push_str("| # | Recipient | Code | Monetary | Goods | Total |\n");
            output.push_str("|---:|---|---|---:|---:|---:|\n");
            for (rank, recipient) in self.top_recipients.iter().enumerate() {
                output.push_str(&format!(
                    "| {} | {} | {} | {:.2} | {:.2} | {:.2} |\n",
                    rank + 1,
                    recipient.recipient_name,
                    recipient.external_code.as_deref().unwrap_or("-"),
                    recipient.total_monetary,
                    recipient.total_goods,
                    recipient.total_combined
                ));
            }
        }

        output
    }
}

pub fn history_to_csv(records: &[UnifiedDisbursement]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "date",
        "id",
        "kind",
        "category",
        "recipient_id",
        "recipient_name",
        "external_code",
        "amount",
        "quantity",
        "unit",
        "detail",
        "origin_source",
        "origin_record_id",
    ])?;

    for record in records {
        let recipient = record.recipient.as_ref();
        let (amount, quantity, unit) = match &record.measure {
            Measure::Amount { amount } => (format!("{:.2}", amount), String::new(), String::new()),
            Measure::Quantity { quantity, unit, .. } => {
                (String::new(), quantity.to_string(), unit.clone())
            }
        };

        writer.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            record.id.clone(),
            kind_label(record.kind).to_string(),
            record.category.clone(),
            recipient.map(|r| r.id.clone()).unwrap_or_default(),
            recipient.and_then(|r| r.name.clone()).unwrap_or_default(),
            recipient.and_then(|r| r.external_code.clone()).unwrap_or_default(),
            amount,
            quantity,
            unit,
            record.detail.clone(),
            record.provenance.source.as_str().to_string(),
            record.provenance.record_id.clone(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LedgerError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| LedgerError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn kind_label(kind: DisbursementKind) -> &'static str {
    match kind {
        DisbursementKind::Monetary => "Monetary",
        DisbursementKind::Goods => "Goods",
        DisbursementKind::Operational => "Operational",
    }
}

fn describe_period(filter: &DisbursementFilter) -> String {
    match (filter.date_from, filter.date_to) {
        (Some(from), Some(to)) => format!("{} to {}", from, to),
        (Some(from), None) => format!("from {}", from),
        (None, Some(to)) => format!("up to {}", to),
        (None, None) => "all recorded disbursements".to_string(),
    }
}
