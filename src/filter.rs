use crate::error::{LedgerError, Result};
use crate::record::{DisbursementKind, UnifiedDisbursement};
use crate::source::SourceQuery;
use crate::utils::parse_period_string;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum KindFilter {
    #[default]
    All,
    Monetary,
    Goods,
    Operational,
}

impl KindFilter {
    pub fn matches(self, kind: DisbursementKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Monetary => kind == DisbursementKind::Monetary,
            KindFilter::Goods => kind == DisbursementKind::Goods,
            KindFilter::Operational => kind == DisbursementKind::Operational,
        }
    }
}

/// Caller-facing query. Every field is optional; the date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisbursementFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub kind: KindFilter,
    pub recipient_id: Option<String>,
    pub category: Option<String>,
}

impl DisbursementFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter covering whole calendar months, from "YYYY-MM" or "YYYY-MM:YYYY-MM".
    pub fn for_period(period: &str) -> Result<Self> {
        let (start, end) = parse_period_string(period)?;
        Ok(Self::new().between(start, end))
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn with_kind(mut self, kind: KindFilter) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_recipient(mut self, recipient_id: impl Into<String>) -> Self {
        self.recipient_id = Some(recipient_id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if to < from {
                return Err(LedgerError::InvalidFilter(format!(
                    "date_to {} is before date_from {}",
                    to, from
                )));
            }
        }
        Ok(())
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.date_from.map_or(true, |from| date >= from) && self.date_to.map_or(true, |to| date <= to)
    }

    /// Post-normalization predicate: date window, kind, recipient and category.
    pub fn matches(&self, record: &UnifiedDisbursement) -> bool {
        if !self.contains_date(record.date) || !self.kind.matches(record.kind) {
            return false;
        }
        if let Some(recipient_id) = &self.recipient_id {
            if record.recipient_id() != Some(recipient_id.as_str()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &record.category != category {
                return false;
            }
        }
        true
    }

    /// The subset pushed down to adapters.
    pub fn source_query(&self) -> SourceQuery {
        SourceQuery {
            date_from: self.date_from,
            date_to: self.date_to,
            recipient_id: self.recipient_id.clone(),
            category: self.category.clone(),
        }
    }
}
