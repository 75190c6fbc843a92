//! # Disbursement Ledger
//!
//! A library for reconciling a foundation's three bookkeeping sources into one
//! de-duplicated, chronologically ordered disbursement history, with the
//! aggregate views used for compliance reporting.
//!
//! ## Core Concepts
//!
//! - **Sources**: the allocation ledger, the operational-expense ledger and the
//!   goods-distribution log, each reached through a [`SourceAdapter`]
//! - **Unified record**: every row becomes one [`UnifiedDisbursement`] carrying
//!   either a money amount or a goods quantity, never both
//! - **Category precedence**: explicit ledger category, then allocation tag,
//!   then operational tag, then the inventory item's category, else "Other"
//! - **Provenance**: the (origin source, origin id) pair used to drop rows that
//!   two sources report for the same ledger entry
//! - **Views**: statistics, gap-filled monthly trend, headline category
//!   distribution and top-N beneficiaries, all recomputed on every call
//!
//! ## Example
//!
//! ```rust,ignore
//! use disbursement_ledger::*;
//!
//! let engine = DisbursementEngine::new(
//!     JsonSnapshotSource::<AllocationRow>::new("allocations", "allocations.json"),
//!     JsonSnapshotSource::<OperationalExpenseRow>::new("expenses", "expenses.json"),
//!     JsonSnapshotSource::<GoodsDistributionRow>::new("goods", "goods.json"),
//! );
//!
//! let filter = DisbursementFilter::for_period("2024-01:2024-12")?;
//! let report = engine.report(&filter, Some(5)).await?;
//! println!("{}", report.to_markdown());
//! ```

pub mod category;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod filter;
pub mod ingestion;
pub mod merge;
pub mod normalizer;
pub mod ranking;
pub mod record;
pub mod report;
pub mod schema;
pub mod source;
pub mod statistics;
pub mod trend;
pub mod utils;
pub mod verification;

pub use category::{resolve_category, CanonicalCategory, CategoryHints, CATEGORY_RULES};
pub use config::{EngineConfig, GoodsValuation, HeadlineCategory};
pub use distribution::{category_distribution, CategorySlice};
pub use engine::DisbursementEngine;
pub use error::{AdapterError, LedgerError, MalformedRow, Result};
pub use filter::{DisbursementFilter, KindFilter};
pub use ingestion::{load_rows, JsonSnapshotSource};
pub use merge::{merge_sources, MergeOutcome, SourceBatch};
pub use normalizer::Normalizer;
pub use ranking::{top_recipients, RecipientTotal};
pub use record::{
    DisbursementKind, Measure, OriginSource, Provenance, Recipient, UnifiedDisbursement,
};
pub use report::{history_to_csv, DisbursementReport};
pub use schema::{
    AllocationRow, GoodsDistributionRow, InventoryItemRef, LedgerEntryRef, OperationalExpenseRow,
    RawRow, RecipientRef, SourceRowSchemas,
};
pub use source::{InMemorySource, SourceAdapter, SourceQuery, SourceRow};
pub use statistics::{summarize, SummaryStatistics};
pub use trend::{monthly_trend, MonthlyTrendPoint};
pub use verification::verify_category_totals;
