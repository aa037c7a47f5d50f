// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::PathBuf;

use pocketwatch::telemetry::Frontend;
use pocketwatch::{
    clamp_page, compare, export_csv, import_csv, page_window, query, summarize, telemetry, today,
    validate_input, Backend, Category, CategoryFilter, Config, Expense, ExpenseInput, ExpenseStore,
    MonthComparison, QueryParams, ReportPeriod, SortBy, SortOrder, Summary, TimePeriod, YearMonth,
};

#[derive(Parser)]
#[command(name = "pocketwatch")]
#[command(version = pocketwatch::VERSION)]
#[command(about = "Track personal expenses and see where the money goes", long_about = None)]
struct Cli {
    /// Directory holding saved expenses
    #[arg(long, global = true, env = "POCKETWATCH_DATA_DIR", default_value = pocketwatch::config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Storage backend: json or sqlite
    #[arg(long, global = true, env = "POCKETWATCH_BACKEND", default_value = "json")]
    backend: Backend,

    /// Rows per page for lists
    #[arg(long, global = true, env = "POCKETWATCH_PAGE_SIZE", default_value_t = pocketwatch::query::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new expense
    Add {
        #[arg(short, long)]
        amount: String,

        #[arg(short, long)]
        category: String,

        #[arg(short, long)]
        description: String,

        /// YYYY-MM-DD (default: today)
        #[arg(long, default_value = "")]
        date: String,
    },

    /// Change an expense; omitted fields keep their value
    Edit {
        id: String,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Delete an expense
    Delete { id: String },

    /// List expenses with search, filters, sorting and paging
    List {
        /// Case-insensitive text in description or category
        #[arg(short, long, default_value = "")]
        search: String,

        /// "all" or a category label
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,

        /// all, week, month or year
        #[arg(short, long, default_value = "all")]
        period: TimePeriod,

        /// date, amount or category
        #[arg(long, default_value = "date")]
        sort: SortBy,

        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Totals per category for this month or year
    Summary {
        #[arg(short, long, default_value = "month")]
        period: ReportPeriod,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// This month against last month, per category
    Compare {
        /// Month to treat as current, YYYY-MM (default: this month)
        #[arg(short, long)]
        month: Option<YearMonth>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the available categories
    Categories,

    /// Write all expenses as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add expenses from a CSV file (date,category,description,amount)
    ///
    /// Rows are added as if entered one by one, so the last row ends up first.
    /// Importing an export therefore lists the records in reverse order.
    Import { file: PathBuf },

    /// Open the terminal UI (default when no command is given)
    Ui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Ui);
    let frontend = match command {
        Commands::Ui => Frontend::Tui,
        _ => Frontend::Cli,
    };
    telemetry::init_tracing(frontend, cli.verbose, cli.json_logs);

    let config = Config {
        data_dir: cli.data_dir,
        backend: cli.backend,
        page_size: cli.page_size,
    };

    let mut store = config.open_store(today())?;

    match command {
        Commands::Add {
            amount,
            category,
            description,
            date,
        } => {
            let input = ExpenseInput {
                amount,
                category,
                description,
                date,
            };
            let draft = validate_input(&input, today())?;
            let expense = store.add(draft);
            println!("✓ Added {}", expense.id);
            print_expense(expense);
        }
        Commands::Edit {
            id,
            amount,
            category,
            description,
            date,
        } => {
            let existing = store
                .get(&id)
                .with_context(|| format!("No expense with id {}", id))?;

            let mut input = ExpenseInput::from_expense(existing);
            if let Some(amount) = amount {
                input.amount = amount;
            }
            if let Some(category) = category {
                input.category = category;
            }
            if let Some(description) = description {
                input.description = description;
            }
            if let Some(date) = date {
                input.date = date;
            }

            let draft = validate_input(&input, today())?;
            let expense = store.update(&id, draft)?;
            println!("✓ Updated {}", expense.id);
            print_expense(expense);
        }
        Commands::Delete { id } => {
            let removed = store.remove(&id)?;
            println!("✓ Deleted {} ({})", removed.id, removed.description);
        }
        Commands::List {
            search,
            category,
            period,
            sort,
            order,
            page,
        } => {
            let params = QueryParams::default()
                .with_search(search)
                .with_category(category)
                .with_time_period(period)
                .with_sort(sort, order)
                .with_page_size(config.page_size)
                .with_page(page);
            run_list(&store, params);
        }
        Commands::Summary { period, json } => {
            let summary = summarize(store.expenses(), period, today());
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Commands::Compare { month, json } => {
            let reference = match month {
                Some(month) => month
                    .first_day()
                    .with_context(|| format!("Invalid month {}", month))?,
                None => today(),
            };
            let comparison = compare(store.expenses(), reference);
            if json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            } else {
                print_comparison(&comparison);
            }
        }
        Commands::Categories => {
            for category in Category::ALL {
                println!("{} {}", category.icon(), category.label());
            }
        }
        Commands::Export { output } => {
            let count = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    export_csv(store.expenses(), file)?
                }
                None => export_csv(store.expenses(), io::stdout().lock())?,
            };
            eprintln!("✓ Exported {} expenses", count);
        }
        Commands::Import { file } => {
            let reader =
                File::open(&file).with_context(|| format!("Failed to open {}", file.display()))?;
            let report = import_csv(reader, today())?;

            for rejected in &report.rejected {
                eprintln!("✗ Line {}: {}", rejected.line, rejected.reason);
            }
            let added = store.import(report.drafts);
            println!("✓ Imported {} expenses ({} rejected)", added, report.rejected.len());
        }
        Commands::Ui => run_ui_mode(store, &config)?,
    }

    Ok(())
}

fn run_list(store: &ExpenseStore, params: QueryParams) {
    let today = today();

    // Count matches first so the requested page can be clamped
    let total = pocketwatch::filter_and_sort(store.expenses(), &params, today).len();
    let page = clamp_page(params.page, total, params.page_size);
    let result = query(store.expenses(), &params.with_page(page), today);

    if let Some(reason) = result.empty_reason() {
        println!("{}", reason.message());
        return;
    }

    println!(
        "{:<36}  {:<10}  {:<18}  {:>10}  {}",
        "ID", "Date", "Category", "Amount", "Description"
    );
    for expense in &result.items {
        println!(
            "{:<36}  {:<10}  {:<18}  {:>10}  {}",
            expense.id,
            expense.date.format("%Y-%m-%d"),
            expense.category.label(),
            format!("${:.2}", expense.amount),
            expense.description
        );
    }

    let first = (result.page - 1) * result.page_size + 1;
    let last = first + result.items.len() - 1;
    println!(
        "\nShowing {}-{} of {} expenses (page {} of {})",
        first,
        last,
        result.total_matches,
        result.page,
        result.page_count()
    );

    if result.has_multiple_pages() {
        let pages: Vec<String> = page_window(result.page, result.page_count())
            .into_iter()
            .map(|p| match p {
                Some(p) if p == result.page => format!("[{}]", p),
                Some(p) => p.to_string(),
                None => "…".to_string(),
            })
            .collect();
        println!("Pages: {}", pages.join(" "));
    }
}

fn print_expense(expense: &Expense) {
    println!(
        "  {}  {}  ${:.2}  {}",
        expense.date.format("%Y-%m-%d"),
        expense.category.label(),
        expense.amount,
        expense.description
    );
}

fn print_summary(summary: &Summary) {
    println!("Total {}: ${:.2}", summary.period.title().to_lowercase(), summary.total_amount);

    if summary.is_empty() {
        println!("{}", summary.empty_message());
        return;
    }

    for item in &summary.by_category {
        println!(
            "  {:<18} ${:>10.2}  {:>3.0}%",
            item.category.label(),
            item.total,
            item.percentage
        );
    }
}

fn signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn print_comparison(comparison: &MonthComparison) {
    println!(
        "{}: ${:.2}   {}: ${:.2}",
        comparison.current_month,
        comparison.current_total,
        comparison.prior_month,
        comparison.prior_total
    );
    println!(
        "Change: ${} ({}%) vs last month",
        signed(comparison.total_delta),
        signed(comparison.total_percent_change.round())
    );

    if comparison.is_empty() {
        println!("No expenses to compare.");
        return;
    }

    for item in &comparison.by_category {
        println!(
            "  {:<18} this ${:>10.2}  last ${:>10.2}  {} ({}%)",
            item.category.label(),
            item.current_amount,
            item.prior_amount,
            signed(item.delta),
            signed(item.percent_change.round())
        );
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: ExpenseStore, config: &Config) -> Result<()> {
    let mut app = ui::App::new(store, config.page_size);
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: ExpenseStore, _config: &Config) -> Result<()> {
    anyhow::bail!("TUI mode not available; rebuild with --features tui or pick a command (see --help)")
}
