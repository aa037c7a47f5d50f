// End-to-end flows through the public API: input validation, the store,
// persistence, listing, reports and CSV exchange.

use chrono::NaiveDate;
use pocketwatch::{
    compare, export_csv, import_csv, query, summarize, validate_input, Category, EmptyReason,
    ExpenseError, ExpenseInput, ExpenseStore, FileStorage, MemoryStorage, QueryParams,
    ReportPeriod, SortBy, SortOrder, SqliteStorage, Trend,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn input(amount: &str, category: &str, description: &str, on: &str) -> ExpenseInput {
    ExpenseInput {
        amount: amount.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        date: on.to_string(),
    }
}

fn memory_store() -> ExpenseStore {
    ExpenseStore::open(Box::new(MemoryStorage::new()), date(2024, 12, 31))
}

fn add(store: &mut ExpenseStore, entry: ExpenseInput, today: NaiveDate) {
    let draft = validate_input(&entry, today).unwrap();
    store.add(draft);
}

#[test]
fn monthly_summary_ranks_categories_by_spend() {
    let today = date(2024, 1, 15);
    let mut store = memory_store();
    add(&mut store, input("10", "Food & Dining", "Lunch", "2024-01-05"), today);
    add(&mut store, input("20", "Travel", "Train", "2024-01-10"), today);

    let summary = summarize(store.expenses(), ReportPeriod::Month, today);

    assert!((summary.total_amount - 30.0).abs() < 1e-9);
    let ranked: Vec<(Category, f64)> = summary
        .by_category
        .iter()
        .map(|c| (c.category, (c.percentage * 10.0).round() / 10.0))
        .collect();
    assert_eq!(
        ranked,
        vec![(Category::Travel, 66.7), (Category::FoodDining, 33.3)]
    );
}

#[test]
fn empty_collection_reports_nothing() {
    let today = date(2024, 1, 15);
    let store = memory_store();

    let summary = summarize(store.expenses(), ReportPeriod::Month, today);
    assert_eq!(summary.total_amount, 0.0);
    assert!(summary.by_category.is_empty());

    let result = query(store.expenses(), &QueryParams::default(), today);
    assert_eq!(result.empty_reason(), Some(EmptyReason::NoRecords));
}

#[test]
fn search_without_hits_is_distinct_from_no_data() {
    let today = date(2024, 1, 15);
    let mut store = memory_store();
    add(&mut store, input("4.50", "Shopping", "Notebook", ""), today);

    let params = QueryParams::default().with_search("coffee");
    let result = query(store.expenses(), &params, today);

    assert!(result.items.is_empty());
    assert_eq!(result.total_records, 1);
    assert_eq!(result.empty_reason(), Some(EmptyReason::NoMatches));
    assert_eq!(
        result.empty_reason().map(|r| r.message()),
        Some("No expenses match your filters.")
    );
}

#[test]
fn first_month_of_spending_is_a_full_increase() {
    let today = date(2024, 3, 20);
    let mut store = memory_store();
    add(&mut store, input("100", "Healthcare", "Dentist", "2024-03-02"), today);

    let comparison = compare(store.expenses(), today);

    assert_eq!(comparison.current_total, 100.0);
    assert_eq!(comparison.prior_total, 0.0);
    assert_eq!(comparison.total_delta, 100.0);
    assert_eq!(comparison.total_percent_change, 100.0);
    assert_eq!(comparison.trend(), Trend::Up);
}

#[test]
fn third_page_holds_the_last_two_matches() {
    let today = date(2024, 1, 31);
    let mut store = memory_store();
    for i in 1..=12 {
        add(
            &mut store,
            input(&i.to_string(), "Other", &format!("Item {}", i), "2024-01-01"),
            today,
        );
    }

    let params = QueryParams::default()
        .with_sort(SortBy::Amount, SortOrder::Asc)
        .with_page_size(5)
        .with_page(3);
    let result = query(store.expenses(), &params, today);

    assert_eq!(result.total_matches, 12);
    assert_eq!(result.page_count(), 3);
    let amounts: Vec<f64> = result.items.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![11.0, 12.0]);
}

#[test]
fn invalid_input_never_reaches_the_store() {
    let today = date(2024, 1, 15);
    let store = memory_store();

    let err = validate_input(&input("-3", "Groceries", "  ", "2024-02-01"), today).unwrap_err();
    assert!(matches!(err, ExpenseError::Invalid(_)));
    let fields: Vec<&str> = err.validation_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["amount", "category", "description", "date"]);
    assert!(store.is_empty());
}

#[test]
fn edits_and_deletes_survive_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let today = date(2024, 1, 15);

    let kept_id = {
        let mut store = ExpenseStore::open(Box::new(FileStorage::new(dir.path())), today);
        add(&mut store, input("12", "Entertainment", "Cinema", "2024-01-12"), today);
        add(&mut store, input("30", "Bills & Utilities", "Phone", "2024-01-03"), today);

        let phone = store.expenses()[0].id.clone();
        let cinema = store.expenses()[1].id.clone();

        let draft = validate_input(&input("35", "Bills & Utilities", "Phone plan", "2024-01-03"), today)
            .unwrap();
        store.update(&phone, draft).unwrap();
        store.remove(&cinema).unwrap();
        phone
    };

    let reopened = ExpenseStore::open(Box::new(FileStorage::new(dir.path())), today);
    assert_eq!(reopened.len(), 1);
    let phone = reopened.get(&kept_id).unwrap();
    assert_eq!(phone.amount, 35.0);
    assert_eq!(phone.description, "Phone plan");
}

#[test]
fn csv_export_feeds_an_import_into_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let today = date(2024, 1, 15);

    let mut source = memory_store();
    add(&mut source, input("8", "Transportation", "Bus pass", "2024-01-02"), today);
    add(&mut source, input("60", "Shopping", "Shoes, running", "2024-01-09"), today);

    let mut csv = Vec::new();
    assert_eq!(export_csv(source.expenses(), &mut csv).unwrap(), 2);

    let report = import_csv(csv.as_slice(), today).unwrap();
    assert!(report.rejected.is_empty());

    let db_path = dir.path().join("pocketwatch.db");
    {
        let mut target = ExpenseStore::open(Box::new(SqliteStorage::open(&db_path).unwrap()), today);
        assert_eq!(target.import(report.drafts), 2);
    }

    let target = ExpenseStore::open(Box::new(SqliteStorage::open(&db_path).unwrap()), today);
    let descriptions: Vec<&str> = target.expenses().iter().map(|e| e.description.as_str()).collect();
    // Rows are added in file order, so the last row ends up first
    assert_eq!(descriptions, vec!["Bus pass", "Shoes, running"]);
    // Imported rows get fresh ids
    assert!(target.expenses().iter().all(|e| source.get(&e.id).is_none()));
}
