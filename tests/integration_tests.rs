use async_trait::async_trait;
use chrono::NaiveDate;
use disbursement_ledger::*;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn student(id: &str, name: &str) -> RecipientRef {
    RecipientRef {
        id: id.to_string(),
        name: Some(name.to_string()),
        external_code: Some(format!("00{}", id.trim_start_matches("S-"))),
    }
}

fn allocation(
    id: &str,
    ledger_id: &str,
    date: NaiveDate,
    category: &str,
    recipient: RecipientRef,
    amount: f64,
) -> AllocationRow {
    AllocationRow {
        id: id.to_string(),
        recipient: Some(recipient),
        amount: Some(amount),
        allocation_target: None,
        ledger_entry: Some(LedgerEntryRef {
            id: ledger_id.to_string(),
            date: Some(date),
            category: Some(category.to_string()),
            sub_category: None,
            description: None,
        }),
        note: None,
        aid_type: None,
        created_on: None,
    }
}

fn expense(
    id: &str,
    date: NaiveDate,
    category: &str,
    recipient: Option<RecipientRef>,
    amount: f64,
) -> OperationalExpenseRow {
    OperationalExpenseRow {
        id: id.to_string(),
        date: Some(date),
        category: Some(category.to_string()),
        sub_category: None,
        description: None,
        amount: Some(amount),
        recipient,
    }
}

fn goods(
    id: &str,
    date: Option<NaiveDate>,
    item: &str,
    item_category: &str,
    unit: &str,
    quantity: f64,
    recipient: Option<RecipientRef>,
) -> GoodsDistributionRow {
    GoodsDistributionRow {
        id: id.to_string(),
        date,
        quantity: Some(quantity),
        recipient,
        item: Some(InventoryItemRef {
            name: Some(item.to_string()),
            category: Some(item_category.to_string()),
            unit: Some(unit.to_string()),
            unit_value: Some(15_000.0),
        }),
        note: None,
    }
}

type MemoryEngine = DisbursementEngine<
    InMemorySource<AllocationRow>,
    InMemorySource<OperationalExpenseRow>,
    InMemorySource<GoodsDistributionRow>,
>;

fn engine(
    allocations: Vec<AllocationRow>,
    expenses: Vec<OperationalExpenseRow>,
    goods: Vec<GoodsDistributionRow>,
) -> MemoryEngine {
    DisbursementEngine::new(
        InMemorySource::new("allocations", allocations),
        InMemorySource::new("expenses", expenses),
        InMemorySource::new("goods", goods),
    )
    .with_today(d(2024, 6, 15))
}

/// Counts how often the engine reaches the wrapped source.
struct CountingSource<R> {
    inner: InMemorySource<R>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl<R> SourceAdapter for CountingSource<R>
where
    R: SourceRow + Clone + Send + Sync,
{
    type Row = R;

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, query: &SourceQuery) -> std::result::Result<Vec<R>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(query).await
    }
}

fn counting<R>(name: &str, rows: Vec<R>, calls: &Arc<AtomicUsize>) -> CountingSource<R> {
    CountingSource {
        inner: InMemorySource::new(name, rows),
        calls: Arc::clone(calls),
    }
}

struct FailingSource<R> {
    name: &'static str,
    _row: PhantomData<fn() -> R>,
}

impl<R> FailingSource<R> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            _row: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Send> SourceAdapter for FailingSource<R> {
    type Row = R;

    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, _query: &SourceQuery) -> std::result::Result<Vec<R>, AdapterError> {
        Err("connection refused".into())
    }
}

#[tokio::test]
async fn test_monetary_and_goods_for_one_student() {
    let ahmad = student("S-001", "Ahmad Fauzi");
    let engine = engine(
        vec![allocation(
            "A-1",
            "L-10",
            d(2024, 3, 5),
            "Formal Education",
            ahmad.clone(),
            500_000.0,
        )],
        vec![],
        vec![goods(
            "G-1",
            Some(d(2024, 3, 10)),
            "Rice",
            "Groceries",
            "kg",
            10.0,
            Some(ahmad),
        )],
    );
    let filter = DisbursementFilter::new();

    let history = engine.unified_history(&filter).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, "G-1");
    assert_eq!(history[0].quantity(), Some((10.0, "kg")));
    assert_eq!(history[0].amount(), None);
    assert_eq!(history[1].amount(), Some(500_000.0));

    let stats = engine.statistics(&filter).await.unwrap();
    assert_eq!(stats.total_monetary, 500_000.0);
    assert_eq!(stats.total_goods, 0.0);
    assert_eq!(stats.total_recipients, 1);
    assert_eq!(stats.transaction_count, 2);

    let slices = engine.category_distribution(&filter).await.unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].category, "Formal Education");
    assert_eq!(slices[0].amount, 500_000.0);
    assert_eq!(slices[1].category, "Other");
    assert_eq!(slices[1].amount, 0.0);
    assert_eq!(slices[1].count, 1);
}

#[tokio::test]
async fn test_operational_spend_has_no_beneficiary() {
    let engine = engine(
        vec![],
        vec![expense(
            "E-1",
            d(2024, 4, 2),
            "Foundation Operations",
            Some(student("S-002", "Siti Rahma")),
            200_000.0,
        )],
        vec![],
    );
    let filter = DisbursementFilter::new();

    let history = engine.unified_history(&filter).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, DisbursementKind::Operational);
    assert!(history[0].recipient.is_none());

    assert!(engine.top_recipients(&filter, None).await.unwrap().is_empty());

    let stats = engine.statistics(&filter).await.unwrap();
    assert_eq!(stats.total_operational, 200_000.0);
    assert_eq!(stats.total_recipients, 0);
    assert_eq!(stats.average_per_recipient, 0.0);

    let slices = engine.category_distribution(&filter).await.unwrap();
    assert_eq!(slices.len(), 1);
    assert_eq!(slices[0].category, "Foundation Operations");
    assert_eq!(slices[0].amount, 200_000.0);

    let trend = engine.monthly_trend(&filter).await.unwrap();
    assert_eq!(trend.len(), 1);
    assert_eq!(trend[0].total, 0.0);
}

#[tokio::test]
async fn test_empty_quarter_yields_three_zero_points() {
    let engine = engine(vec![], vec![], vec![]);
    let filter = DisbursementFilter::for_period("2024-01:2024-03").unwrap();

    let trend = engine.monthly_trend(&filter).await.unwrap();
    let labels: Vec<&str> = trend.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["Jan 2024", "Feb 2024", "Mar 2024"]);
    assert!(trend
        .iter()
        .all(|p| p.monetary == 0.0 && p.goods == 0.0 && p.transaction_count == 0));

    assert_eq!(
        engine.statistics(&filter).await.unwrap(),
        SummaryStatistics::default()
    );
}

#[tokio::test]
async fn test_entry_reported_by_both_ledgers_appears_once() {
    let ahmad = student("S-001", "Ahmad Fauzi");
    let engine = engine(
        vec![allocation(
            "A-7",
            "L-77",
            d(2024, 5, 2),
            "Formal Education",
            ahmad.clone(),
            750_000.0,
        )],
        vec![expense(
            "L-77",
            d(2024, 5, 2),
            "Formal Education",
            Some(ahmad),
            750_000.0,
        )],
        vec![],
    );

    let report = engine.report(&DisbursementFilter::new(), None).await.unwrap();
    assert_eq!(report.history.len(), 1);
    assert_eq!(report.history[0].id, "L-77");
    assert_eq!(
        report.history[0].provenance,
        Provenance::new(OriginSource::FinanceLedger, "L-77#S-001")
    );
    assert_eq!(report.merge.duplicates, 1);
    assert_eq!(report.statistics.total_monetary, 750_000.0);
}

#[tokio::test]
async fn test_split_ledger_entry_keeps_each_beneficiary() {
    let engine = engine(
        vec![
            allocation(
                "A-1",
                "L-5",
                d(2024, 2, 1),
                "Boarding Education",
                student("S-001", "Ahmad Fauzi"),
                100_000.0,
            ),
            allocation(
                "A-2",
                "L-5",
                d(2024, 2, 1),
                "Boarding Education",
                student("S-002", "Siti Rahma"),
                100_000.0,
            ),
        ],
        vec![],
        vec![],
    );

    let history = engine.unified_history(&DisbursementFilter::new()).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_unattributed_entry_split_by_allocations_is_counted_once() {
    let engine = engine(
        vec![
            allocation(
                "A-1",
                "R1",
                d(2024, 2, 1),
                "Formal Education",
                student("S-001", "Ahmad Fauzi"),
                300_000.0,
            ),
            allocation(
                "A-2",
                "R1",
                d(2024, 2, 1),
                "Formal Education",
                student("S-002", "Siti Rahma"),
                200_000.0,
            ),
        ],
        vec![expense("R1", d(2024, 2, 1), "Formal Education", None, 500_000.0)],
        vec![],
    );

    let report = engine.report(&DisbursementFilter::new(), None).await.unwrap();
    assert_eq!(report.statistics.grand_total, 500_000.0);
    assert_eq!(report.statistics.total_recipients, 2);
    assert_eq!(report.merge.superseded, 1);

    let ids: Vec<&str> = report.history.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A-1", "A-2"]);
    assert_eq!(report.monthly_trend[0].monetary, 500_000.0);
    assert_eq!(report.category_distribution[0].amount, 500_000.0);
}

#[tokio::test]
async fn test_blank_ledger_link_is_filtered_on_creation_date() {
    let mut row = allocation(
        "A-9",
        "  ",
        d(2023, 12, 30),
        "Formal Education",
        student("S-001", "Ahmad Fauzi"),
        40_000.0,
    );
    row.created_on = Some(d(2024, 1, 5));
    let engine = engine(vec![row], vec![], vec![]);

    let january = engine
        .unified_history(&DisbursementFilter::for_period("2024-01").unwrap())
        .await
        .unwrap();
    assert_eq!(january.len(), 1);
    assert_eq!(january[0].date, d(2024, 1, 5));
    assert_eq!(
        january[0].provenance,
        Provenance::new(OriginSource::AllocationLedger, "A-9")
    );
}

#[tokio::test]
async fn test_distribution_sums_to_grand_total() {
    let config = EngineConfig {
        goods_valuation: GoodsValuation::UnitValue,
        ..Default::default()
    };
    let ahmad = student("S-001", "Ahmad Fauzi");
    let siti = student("S-002", "Siti Rahma");
    let engine = engine(
        vec![
            allocation("A-1", "L-1", d(2024, 1, 8), "Formal Education", ahmad.clone(), 0.1),
            allocation("A-2", "L-2", d(2024, 1, 9), "Direct Foundation Aid", siti.clone(), 0.2),
        ],
        vec![
            expense("E-1", d(2024, 2, 1), "Foundation Operations", None, 0.3),
            expense("E-2", d(2024, 2, 3), "Student Operations & Meals", Some(siti), 0.7),
        ],
        vec![
            goods("G-1", Some(d(2024, 2, 4)), "Rice", "Groceries", "kg", 2.5, Some(ahmad.clone())),
            goods("G-2", Some(d(2024, 2, 5)), "Notebook", "Stationery", "pcs", 3.0, Some(ahmad)),
        ],
    )
    .with_config(config)
    .unwrap();

    let report = engine.report(&DisbursementFilter::new(), None).await.unwrap();
    let stats = &report.statistics;
    let slice_total: f64 = report.category_distribution.iter().map(|s| s.amount).sum();
    assert!((slice_total - stats.grand_total).abs() <= 0.01);
    assert!((stats.total_goods - 82_500.0).abs() < 1e-6);

    let slice_count: usize = report.category_distribution.iter().map(|s| s.count).sum();
    assert_eq!(slice_count, stats.transaction_count);

    let other = report
        .category_distribution
        .iter()
        .find(|s| s.category == "Other")
        .unwrap();
    assert_eq!(other.count, 2);
    assert_eq!(other.color, "#9ca3af");
}

#[tokio::test]
async fn test_trend_fills_gaps_between_active_months() {
    let ahmad = student("S-001", "Ahmad Fauzi");
    let engine = engine(
        vec![
            allocation("A-1", "L-1", d(2024, 1, 20), "Formal Education", ahmad.clone(), 10.0),
            allocation("A-2", "L-2", d(2024, 4, 2), "Formal Education", ahmad, 30.0),
        ],
        vec![],
        vec![],
    );

    let trend = engine.monthly_trend(&DisbursementFilter::new()).await.unwrap();
    assert_eq!(trend.len(), 4);
    assert_eq!((trend[0].year, trend[0].month), (2024, 1));
    assert_eq!(trend[0].monetary, 10.0);
    assert_eq!(trend[1].total, 0.0);
    assert_eq!(trend[2].total, 0.0);
    assert_eq!(trend[3].monetary, 30.0);
}

#[tokio::test]
async fn test_top_recipient_ties_keep_first_seen_order() {
    let date = d(2024, 3, 1);
    let engine = engine(
        vec![
            allocation("A-1", "L-1", date, "Formal Education", student("S-003", "Dewi"), 100.0),
            allocation("A-2", "L-2", date, "Formal Education", student("S-004", "Eko"), 100.0),
            allocation("A-3", "L-3", date, "Formal Education", student("S-005", "Fajar"), 100.0),
            allocation("A-4", "L-4", date, "Formal Education", student("S-006", "Gita"), 400.0),
        ],
        vec![],
        vec![],
    );

    let top = engine
        .top_recipients(&DisbursementFilter::new(), Some(3))
        .await
        .unwrap();
    let names: Vec<&str> = top.iter().map(|t| t.recipient_name.as_str()).collect();
    assert_eq!(names, vec!["Gita", "Dewi", "Eko"]);
    assert_eq!(top[0].external_code.as_deref(), Some("00006"));
}

#[tokio::test]
async fn test_identical_queries_are_idempotent() {
    let ahmad = student("S-001", "Ahmad Fauzi");
    let engine = engine(
        vec![allocation("A-1", "L-1", d(2024, 3, 5), "Formal Education", ahmad.clone(), 5.0)],
        vec![expense("E-1", d(2024, 3, 6), "Foundation Operations", None, 7.0)],
        vec![goods("G-1", Some(d(2024, 3, 7)), "Rice", "Groceries", "kg", 1.0, Some(ahmad))],
    );
    let filter = DisbursementFilter::for_period("2024-03").unwrap();

    let first = engine.report(&filter, Some(5)).await.unwrap();
    let second = engine.report(&filter, Some(5)).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_post_hoc_filters() {
    let ahmad = student("S-001", "Ahmad Fauzi");
    let siti = student("S-002", "Siti Rahma");
    let engine = engine(
        vec![
            allocation("A-1", "L-1", d(2024, 3, 5), "Formal Education", ahmad.clone(), 5.0),
            allocation("A-2", "L-2", d(2024, 3, 6), "Boarding Education", siti, 6.0),
        ],
        vec![expense("E-1", d(2024, 3, 6), "Foundation Operations", None, 7.0)],
        vec![goods("G-1", Some(d(2024, 3, 7)), "Rice", "Groceries", "kg", 1.0, Some(ahmad))],
    );

    let operational = engine
        .unified_history(&DisbursementFilter::new().with_kind(KindFilter::Operational))
        .await
        .unwrap();
    assert_eq!(operational.len(), 1);
    assert_eq!(operational[0].id, "E-1");

    let boarding = engine
        .unified_history(&DisbursementFilter::new().with_category("Boarding Education"))
        .await
        .unwrap();
    assert_eq!(boarding.len(), 1);
    assert_eq!(boarding[0].id, "A-2");

    let ahmad_only = engine
        .unified_history(&DisbursementFilter::new().with_recipient("S-001"))
        .await
        .unwrap();
    let ids: Vec<&str> = ahmad_only.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["G-1", "A-1"]);
}

#[tokio::test]
async fn test_malformed_rows_are_dropped_not_fatal() {
    let engine = engine(
        vec![],
        vec![expense("  ", d(2024, 3, 6), "Foundation Operations", None, 7.0)],
        vec![
            goods("G-1", None, "Rice", "Groceries", "kg", 1.0, None),
            goods("G-2", Some(d(2024, 3, 8)), "Rice", "Groceries", "kg", 1.0, None),
        ],
    );

    let report = engine.report(&DisbursementFilter::new(), None).await.unwrap();
    assert_eq!(report.history.len(), 1);
    assert_eq!(report.merge.malformed, 2);
    assert_eq!(report.merge.rows_seen, 3);
}

#[tokio::test]
async fn test_failing_source_fails_the_whole_query() {
    let goods_calls = Arc::new(AtomicUsize::new(0));
    let engine = DisbursementEngine::new(
        FailingSource::<AllocationRow>::new("allocations"),
        InMemorySource::new(
            "expenses",
            vec![expense("E-1", d(2024, 3, 6), "Foundation Operations", None, 7.0)],
        ),
        counting::<GoodsDistributionRow>("goods", vec![], &goods_calls),
    );

    let err = engine
        .report(&DisbursementFilter::new(), None)
        .await
        .unwrap_err();
    match &err {
        LedgerError::SourceUnavailable { source_name, cause } => {
            assert_eq!(source_name, "allocations");
            assert_eq!(cause.to_string(), "connection refused");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(std::error::Error::source(&err).is_some());
    // Wait-all: the other sources still ran to completion.
    assert_eq!(goods_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failure_order_is_deterministic() {
    let engine = DisbursementEngine::new(
        InMemorySource::<AllocationRow>::new("allocations", vec![]),
        FailingSource::<OperationalExpenseRow>::new("expenses"),
        FailingSource::<GoodsDistributionRow>::new("goods"),
    );

    for _ in 0..3 {
        let err = engine
            .unified_history(&DisbursementFilter::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::SourceUnavailable { ref source_name, .. } if source_name == "expenses"
        ));
    }
}

#[tokio::test]
async fn test_invalid_requests_never_reach_sources() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = DisbursementEngine::new(
        counting::<AllocationRow>("allocations", vec![], &calls),
        counting::<OperationalExpenseRow>("expenses", vec![], &calls),
        counting::<GoodsDistributionRow>("goods", vec![], &calls),
    );

    let reversed = DisbursementFilter::new().between(d(2024, 3, 1), d(2024, 2, 1));
    assert!(matches!(
        engine.statistics(&reversed).await,
        Err(LedgerError::InvalidFilter(_))
    ));
    assert!(matches!(
        engine.top_recipients(&DisbursementFilter::new(), Some(-1)).await,
        Err(LedgerError::InvalidLimit(-1))
    ));
    assert!(matches!(
        engine.report(&DisbursementFilter::new(), Some(-5)).await,
        Err(LedgerError::InvalidLimit(-5))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    engine
        .top_recipients(&DisbursementFilter::new(), Some(0))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_report_exports() -> anyhow::Result<()> {
    let ahmad = student("S-001", "Ahmad Fauzi");
    let engine = engine(
        vec![allocation("A-1", "L-1", d(2024, 3, 5), "Formal Education", ahmad.clone(), 500_000.0)],
        vec![expense("E-1", d(2024, 3, 6), "Foundation Operations", None, 200_000.0)],
        vec![goods("G-1", Some(d(2024, 3, 7)), "Rice", "Groceries", "kg", 10.0, Some(ahmad))],
    );
    let report = engine
        .report(&DisbursementFilter::for_period("2024-03")?, Some(5))
        .await?;

    let csv = report.to_csv()?;
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.lines().nth(1).unwrap_or_default().starts_with("2024-03-07,G-1,Goods"));

    let markdown = report.to_markdown();
    assert!(markdown.contains("| Grand total | 700000.00 |"));
    assert!(markdown.contains("| 1 | Ahmad Fauzi | 00001 |"));
    assert!(markdown.contains("| Mar 2024 |"));

    let json = report.to_json()?;
    let parsed: DisbursementReport = serde_json::from_str(&json)?;
    assert_eq!(parsed.history.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_engine_over_json_exports() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join(format!("disbursement-ledger-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;

    let allocations = dir.join("allocations.json");
    let expenses = dir.join("expenses.json");
    let goods_log = dir.join("goods.json");
    std::fs::write(
        &allocations,
        r#"[{
            "id": "A-1",
            "recipient": { "id": "S-001", "name": "Ahmad Fauzi", "external_code": "0091234567" },
            "amount": 250000,
            "allocation_target": "boarding",
            "created_on": "2024-07-01"
        }]"#,
    )?;
    std::fs::write(
        &expenses,
        r#"[{ "id": "E-1", "date": "2024-07-03", "category": "Foundation Operations", "amount": 90000 }]"#,
    )?;
    std::fs::write(&goods_log, "[]")?;

    let engine = DisbursementEngine::new(
        JsonSnapshotSource::<AllocationRow>::new("allocations", &allocations),
        JsonSnapshotSource::<OperationalExpenseRow>::new("expenses", &expenses),
        JsonSnapshotSource::<GoodsDistributionRow>::new("goods", &goods_log),
    );

    let history = engine.unified_history(&DisbursementFilter::new()).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].category, "Boarding Education");
    assert_eq!(
        history[1].provenance,
        Provenance::new(OriginSource::AllocationLedger, "A-1")
    );

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn test_schema_generation() {
    let schema = SourceRowSchemas::schema_as_json().unwrap();
    assert!(schema.contains("allocation_target"));
    assert!(schema.contains("unit_value"));
}
