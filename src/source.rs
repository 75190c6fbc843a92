//! The contract the engine consumes from the three bookkeeping sources.
//!
//! Adapters receive the pushed-down [`SourceQuery`] as a hint only; the merge
//! stage re-applies every bound, so an adapter that over-fetches is still
//! correct. Retries, timeouts and connection handling belong to the adapter.

use crate::error::AdapterError;
use crate::schema::{AllocationRow, GoodsDistributionRow, OperationalExpenseRow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub recipient_id: Option<String>,
    pub category: Option<String>,
}

impl SourceQuery {
    /// Whether a row passes the date window and recipient pushdown. Rows with
    /// no date are kept so the normalizer can report them.
    pub fn admits<R: SourceRow>(&self, row: &R) -> bool {
        if let Some(date) = row.row_date() {
            if self.date_from.is_some_and(|from| date < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| date > to) {
                return false;
            }
        }
        match &self.recipient_id {
            Some(wanted) => row.row_recipient_id() == Some(wanted.as_str()),
            None => true,
        }
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Row: Send;

    fn name(&self) -> &str;

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<Self::Row>, AdapterError>;
}

/// Fields an adapter can filter on before normalization.
pub trait SourceRow {
    fn row_date(&self) -> Option<NaiveDate>;
    fn row_recipient_id(&self) -> Option<&str>;
}

impl SourceRow for AllocationRow {
    fn row_date(&self) -> Option<NaiveDate> {
        self.effective_date()
    }

    fn row_recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|r| r.id.as_str())
    }
}

impl SourceRow for OperationalExpenseRow {
    fn row_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn row_recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|r| r.id.as_str())
    }
}

impl SourceRow for GoodsDistributionRow {
    fn row_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn row_recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|r| r.id.as_str())
    }
}

/// Vector-backed adapter. Honours the date window and recipient pushdown.
#[derive(Debug, Clone)]
pub struct InMemorySource<R> {
    name: String,
    rows: Vec<R>,
}

impl<R> InMemorySource<R> {
    pub fn new(name: impl Into<String>, rows: Vec<R>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

#[async_trait]
impl<R> SourceAdapter for InMemorySource<R>
where
    R: SourceRow + Clone + Send + Sync,
{
    type Row = R;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<R>, AdapterError> {
        Ok(self
            .rows
            .iter()
            .filter(|row| query.admits(*row))
            .cloned()
            .collect())
    }
}
