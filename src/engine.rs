use crate::config::EngineConfig;
use crate::distribution::{category_distribution, CategorySlice};
use crate::error::{AdapterError, LedgerError, Result};
use crate::filter::DisbursementFilter;
use crate::merge::{merge_sources, MergeOutcome, SourceBatch};
use crate::normalizer::Normalizer;
use crate::ranking::{top_recipients, RecipientTotal};
use crate::record::UnifiedDisbursement;
use crate::report::DisbursementReport;
use crate::schema::{AllocationRow, GoodsDistributionRow, OperationalExpenseRow};
use crate::source::{SourceAdapter, SourceQuery};
use crate::statistics::{summarize, SummaryStatistics};
use crate::trend::{monthly_trend, MonthlyTrendPoint};
use crate::verification::verify_category_totals;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};

/// Reconciles the three disbursement sources on every call.
///
/// Holds no state between calls beyond its adapters and configuration: each
/// query fetches from all three sources, normalizes, merges and aggregates
/// from scratch.
pub struct DisbursementEngine<A, O, G> {
    allocations: A,
    expenses: O,
    goods: G,
    config: EngineConfig,
    fixed_today: Option<NaiveDate>,
}

impl<A, O, G> DisbursementEngine<A, O, G>
where
    A: SourceAdapter<Row = AllocationRow>,
    O: SourceAdapter<Row = OperationalExpenseRow>,
    G: SourceAdapter<Row = GoodsDistributionRow>,
{
    pub fn new(allocations: A, expenses: O, goods: G) -> Self {
        Self {
            allocations,
            expenses,
            goods,
            config: EngineConfig::default(),
            fixed_today: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Pins the date used when the trend has to default to "this year".
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Unified, de-duplicated records, newest first.
    pub async fn unified_history(
        &self,
        filter: &DisbursementFilter,
    ) -> Result<Vec<UnifiedDisbursement>> {
        let (records, _) = self.collect(filter).await?;
        Ok(records)
    }

    pub async fn statistics(&self, filter: &DisbursementFilter) -> Result<SummaryStatistics> {
        let (records, _) = self.collect(filter).await?;
        Ok(summarize(&records, self.config.goods_valuation))
    }

    /// Gap-filled monthly totals, oldest month first.
    pub async fn monthly_trend(
        &self,
        filter: &DisbursementFilter,
    ) -> Result<Vec<MonthlyTrendPoint>> {
        let (records, _) = self.collect(filter).await?;
        self.trend_for(&records, filter)
    }

    pub async fn category_distribution(
        &self,
        filter: &DisbursementFilter,
    ) -> Result<Vec<CategorySlice>> {
        let (records, _) = self.collect(filter).await?;
        Ok(self.distribution_for(&records))
    }

    /// Top beneficiaries by combined value. `None` uses the configured default
    /// limit; negative limits are rejected before any source is queried.
    pub async fn top_recipients(
        &self,
        filter: &DisbursementFilter,
        limit: Option<i64>,
    ) -> Result<Vec<RecipientTotal>> {
        let limit = self.resolve_limit(limit)?;
        let (records, _) = self.collect(filter).await?;
        Ok(top_recipients(&records, limit, self.config.goods_valuation))
    }

    /// All views from one fetch, with the category totals verified against
    /// the grand total.
    pub async fn report(
        &self,
        filter: &DisbursementFilter,
        limit: Option<i64>,
    ) -> Result<DisbursementReport> {
        let limit = self.resolve_limit(limit)?;
        let (records, merge) = self.collect(filter).await?;
        let valuation = self.config.goods_valuation;

        let statistics = summarize(&records, valuation);
        let category_distribution = self.distribution_for(&records);
        if let Err(e) = verify_category_totals(
            &statistics,
            &category_distribution,
            self.config.total_tolerance,
        ) {
            warn!("Disbursement totals failed verification: {}", e);
            return Err(e);
        }
        debug!("Disbursement totals verified");

        Ok(DisbursementReport {
            filter: filter.clone(),
            statistics,
            monthly_trend: self.trend_for(&records, filter)?,
            category_distribution,
            top_recipients: top_recipients(&records, limit, valuation),
            history: records,
            merge,
        })
    }

    async fn collect(
        &self,
        filter: &DisbursementFilter,
    ) -> Result<(Vec<UnifiedDisbursement>, MergeOutcome)> {
        filter.validate()?;

        info!(
            "Building disbursement history from {}, {} and {}",
            self.allocations.name(),
            self.expenses.name(),
            self.goods.name()
        );

        let batch = self.fetch_all(&filter.source_query()).await?;
        let normalizer = Normalizer::new(&self.config.default_goods_unit);
        Ok(merge_sources(batch, filter, &normalizer))
    }

    /// Queries the three sources concurrently and waits for all of them. Any
    /// failure fails the whole query.
    async fn fetch_all(&self, query: &SourceQuery) -> Result<SourceBatch> {
        let (allocations, expenses, goods) = futures::join!(
            self.allocations.fetch(query),
            self.expenses.fetch(query),
            self.goods.fetch(query),
        );

        let batch = SourceBatch {
            allocations: allocations.map_err(|e| unavailable(self.allocations.name(), e))?,
            expenses: expenses.map_err(|e| unavailable(self.expenses.name(), e))?,
            goods: goods.map_err(|e| unavailable(self.goods.name(), e))?,
        };

        debug!(
            "Fetched {} allocation, {} expense and {} goods rows",
            batch.allocations.len(),
            batch.expenses.len(),
            batch.goods.len()
        );

        Ok(batch)
    }

    fn trend_for(
        &self,
        records: &[UnifiedDisbursement],
        filter: &DisbursementFilter,
    ) -> Result<Vec<MonthlyTrendPoint>> {
        let today = self
            .fixed_today
            .unwrap_or_else(|| Local::now().date_naive());
        monthly_trend(
            records,
            filter.date_from,
            filter.date_to,
            today,
            self.config.goods_valuation,
        )
    }

    fn distribution_for(&self, records: &[UnifiedDisbursement]) -> Vec<CategorySlice> {
        category_distribution(
            records,
            &self.config.headline_categories,
            &self.config.other_color,
            self.config.goods_valuation,
        )
    }

    fn resolve_limit(&self, limit: Option<i64>) -> Result<usize> {
        match limit {
            None => Ok(self.config.default_top_limit),
            Some(n) if n < 0 => Err(LedgerError::InvalidLimit(n)),
            Some(n) => Ok(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }
}

fn unavailable(source_name: &str, cause: AdapterError) -> LedgerError {
    LedgerError::SourceUnavailable {
        source_name: source_name.to_string(),
        cause,
    }
}
