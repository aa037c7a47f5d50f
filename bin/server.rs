// PocketWatch - Web Server
// JSON API over the expense store

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use chrono::NaiveDate;
use clap::Parser;
use pocketwatch::{
    compare, query, summarize, telemetry, today, validate_draft, validate_input, Backend,
    Category, CategoryFilter, Config, EmptyReason, Expense, ExpenseDraft, ExpenseError,
    ExpenseInput, ExpensePayload, ExpenseStore, MonthComparison, QueryParams, ReportPeriod, SortBy, SortOrder, Summary, TimePeriod,
    YearMonth,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use pocketwatch::telemetry::Frontend;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "pocketwatch-server")]
#[command(version = pocketwatch::VERSION)]
#[command(about = "Serve the expense store as a JSON API", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "POCKETWATCH_ADDR", default_value = "127.0.0.1:3000")]
    addr: String,

    #[arg(long, env = "POCKETWATCH_DATA_DIR", default_value = pocketwatch::config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[arg(long, env = "POCKETWATCH_BACKEND", default_value = "json")]
    backend: Backend,

    #[arg(long, env = "POCKETWATCH_PAGE_SIZE", default_value_t = pocketwatch::query::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    json_logs: bool,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<ExpenseStore>>,
    page_size: usize,
}

impl AppState {
    fn store(&self) -> Result<MutexGuard<'_, ExpenseStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::internal("expense store lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl From<ExpenseError> for ApiError {
    fn from(err: ExpenseError) -> Self {
        let status = match &err {
            ExpenseError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ExpenseError::NotFound(_) => StatusCode::NOT_FOUND,
            ExpenseError::Parse { .. } => StatusCode::BAD_REQUEST,
            ExpenseError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(ApiResponse::err(self.message))).into_response()
    }
}

/// Body for create and edit: the record's own shape with a numeric
/// `amount`, or the text fields a form submits
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpenseBody {
    Typed(ExpensePayload),
    Form(ExpenseInput),
}

impl ExpenseBody {
    fn validate(self, today: NaiveDate) -> Result<ExpenseDraft, ExpenseError> {
        match self {
            ExpenseBody::Typed(payload) => validate_draft(payload, today),
            ExpenseBody::Form(input) => validate_input(&input, today),
        }
    }
}

/// Query string for GET /api/expenses; every field optional
#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    search: Option<String>,
    category: Option<String>,
    period: Option<String>,
    sort: Option<String>,
    order: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

impl ListQuery {
    fn into_params(self, default_page_size: usize) -> Result<QueryParams, ExpenseError> {
        let defaults = QueryParams::default();
        let category = match self.category {
            Some(c) => c.parse::<CategoryFilter>()?,
            None => defaults.category,
        };
        let period = match self.period {
            Some(p) => p.parse::<TimePeriod>()?,
            None => defaults.time_period,
        };
        let sort_by = match self.sort {
            Some(s) => s.parse::<SortBy>()?,
            None => defaults.sort_by,
        };
        let sort_order = match self.order {
            Some(o) => o.parse::<SortOrder>()?,
            None => defaults.sort_order,
        };

        Ok(defaults
            .with_search(self.search.unwrap_or_default())
            .with_category(category)
            .with_time_period(period)
            .with_sort(sort_by, sort_order)
            .with_page_size(self.page_size.unwrap_or(default_page_size))
            .with_page(self.page.unwrap_or(1)))
    }
}

/// One page of the filtered list
#[derive(Serialize)]
struct ListResponse {
    items: Vec<Expense>,
    total_matches: usize,
    total_records: usize,
    page: usize,
    page_size: usize,
    page_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_reason: Option<EmptyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Serialize)]
struct CategoryResponse {
    label: &'static str,
    icon: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryQuery {
    period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CompareQuery {
    month: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/categories - The fixed category list
async fn get_categories() -> Json<ApiResponse<Vec<CategoryResponse>>> {
    let categories = Category::ALL
        .iter()
        .map(|c| CategoryResponse {
            label: c.label(),
            icon: c.icon(),
        })
        .collect();
    Json(ApiResponse::ok(categories))
}

/// GET /api/expenses - Search, filter, sort and page
async fn list_expenses(
    State(state): State<AppState>,
    Query(list_query): Query<ListQuery>,
) -> ApiResult<ListResponse> {
    let params = list_query.into_params(state.page_size)?;
    let store = state.store()?;
    let result = query(store.expenses(), &params, today());

    let empty_reason = result.empty_reason();
    Ok(Json(ApiResponse::ok(ListResponse {
        page_count: result.page_count(),
        total_matches: result.total_matches,
        total_records: result.total_records,
        page: result.page,
        page_size: result.page_size,
        items: result.items,
        empty_reason,
        message: empty_reason.map(|r| r.message()),
    })))
}

/// POST /api/expenses - Record a new expense
async fn create_expense(
    State(state): State<AppState>,
    body: Result<Json<ExpenseBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Expense>>), ApiError> {
    let Json(body) = body?;
    let draft = body.validate(today())?;
    let mut store = state.store()?;
    let expense = store.add(draft).clone();
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(expense))))
}

/// PUT /api/expenses/:id - Replace an expense's fields
async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ExpenseBody>, JsonRejection>,
) -> ApiResult<Expense> {
    let Json(body) = body?;
    let draft = body.validate(today())?;
    let mut store = state.store()?;
    let expense = store.update(&id, draft)?.clone();
    Ok(Json(ApiResponse::ok(expense)))
}

/// DELETE /api/expenses/:id
async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Expense> {
    let mut store = state.store()?;
    let removed = store.remove(&id)?;
    Ok(Json(ApiResponse::ok(removed)))
}

/// GET /api/summary?period=month|year
async fn get_summary(
    State(state): State<AppState>,
    Query(summary_query): Query<SummaryQuery>,
) -> ApiResult<Summary> {
    let period = match summary_query.period {
        Some(p) => p.parse::<ReportPeriod>()?,
        None => ReportPeriod::default(),
    };
    let store = state.store()?;
    Ok(Json(ApiResponse::ok(summarize(store.expenses(), period, today()))))
}

/// GET /api/compare?month=YYYY-MM
async fn get_comparison(
    State(state): State<AppState>,
    Query(compare_query): Query<CompareQuery>,
) -> ApiResult<MonthComparison> {
    let reference = match compare_query.month {
        Some(m) => {
            let month = m.parse::<YearMonth>()?;
            month
                .first_day()
                .ok_or_else(|| ExpenseError::parse("month", &m))?
        }
        None => today(),
    };
    let store = state.store()?;
    Ok(Json(ApiResponse::ok(compare(store.expenses(), reference))))
}

fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(get_categories))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/:id", put(update_expense).delete(delete_expense))
        .route("/summary", get(get_summary))
        .route("/compare", get(get_comparison))
        .with_state(state)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    telemetry::init_tracing(Frontend::Server, args.verbose, args.json_logs);

    let config = Config {
        data_dir: args.data_dir,
        backend: args.backend,
        page_size: args.page_size,
    };
    let store = config.open_store(today())?;
    info!(expenses = store.len(), "expense store loaded");

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        page_size: config.page_size,
    };

    let app = Router::new()
        .nest("/api", api_routes(state))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    info!(addr = %args.addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketwatch::{MemoryStorage, ValidationError};

    fn test_state() -> AppState {
        let store = ExpenseStore::open(Box::new(MemoryStorage::new()), today());
        AppState {
            store: Arc::new(Mutex::new(store)),
            page_size: 5,
        }
    }

    fn body(json: &str) -> Result<Json<ExpenseBody>, JsonRejection> {
        Ok(Json(serde_json::from_str(json).unwrap()))
    }

    #[tokio::test]
    async fn test_create_accepts_numeric_amount() {
        let state = test_state();
        let (status, Json(response)) = create_expense(
            State(state.clone()),
            body(r#"{"amount": 12.5, "category": "Travel", "description": "Taxi"}"#),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        let expense = response.data.unwrap();
        assert_eq!(expense.amount, 12.5);
        assert_eq!(expense.category, Category::Travel);
        assert_eq!(expense.date, today());
        assert_eq!(state.store().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_accepts_form_text() {
        let state = test_state();
        let (status, _) = create_expense(
            State(state.clone()),
            body(r#"{"amount": "4.20", "category": "food & dining", "description": "Bagel", "date": ""}"#),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(state.store().unwrap().expenses()[0].amount, 4.2);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_typed_body() {
        let state = test_state();
        let err = create_expense(
            State(state.clone()),
            body(r#"{"amount": -3, "category": "Groceries", "description": " "}"#),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("amount"));
        assert!(err.message.contains("category"));
        assert!(state.store().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_typed_body() {
        let state = test_state();
        let (_, Json(created)) = create_expense(
            State(state.clone()),
            body(r#"{"amount": 30, "category": "Shopping", "description": "Shoes"}"#),
        )
        .await
        .unwrap();
        let id = created.data.unwrap().id;

        let Json(updated) = update_expense(
            State(state.clone()),
            Path(id.clone()),
            body(r#"{"amount": 35, "category": "Shopping", "description": "Running shoes"}"#),
        )
        .await
        .unwrap();

        let expense = updated.data.unwrap();
        assert_eq!(expense.id, id);
        assert_eq!(expense.amount, 35.0);

        let err = update_expense(
            State(state),
            Path("missing".to_string()),
            body(r#"{"amount": 1, "category": "Other", "description": "x"}"#),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_list_query_defaults() {
        let params = ListQuery::default().into_params(10).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, 10);
        assert_eq!(params.sort_by, SortBy::Date);
        assert_eq!(params.sort_order, SortOrder::Desc);
        assert!(!params.has_active_filters());
    }

    #[test]
    fn test_list_query_parses_filters() {
        let list_query = ListQuery {
            search: Some("lunch".to_string()),
            category: Some("food & dining".to_string()),
            period: Some("month".to_string()),
            sort: Some("amount".to_string()),
            order: Some("asc".to_string()),
            page: Some(3),
            page_size: Some(20),
        };
        let params = list_query.into_params(5).unwrap();
        assert_eq!(params.search_term, "lunch");
        assert_eq!(params.category, CategoryFilter::Only(Category::FoodDining));
        assert_eq!(params.time_period, TimePeriod::Month);
        assert_eq!(params.sort_by, SortBy::Amount);
        assert_eq!(params.sort_order, SortOrder::Asc);
        assert_eq!(params.page, 3);
        assert_eq!(params.page_size, 20);
    }

    #[test]
    fn test_list_query_rejects_unknown_values() {
        let list_query = ListQuery {
            sort: Some("price".to_string()),
            ..ListQuery::default()
        };
        assert!(matches!(
            list_query.into_params(5),
            Err(ExpenseError::Parse { what: _, .. })
        ));
    }

    #[test]
    fn test_error_status_codes() {
        let invalid = ApiError::from(ExpenseError::Invalid(vec![ValidationError::new(
            "amount",
            "is required",
        )]));
        assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError::from(ExpenseError::NotFound("x".to_string())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ExpenseError::parse("month", "2024-13")).status,
            StatusCode::BAD_REQUEST
        );
    }
}
