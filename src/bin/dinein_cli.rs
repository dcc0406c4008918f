use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use dinein_api::{
    config::{self, AppConfig},
    db,
    dto::{
        CreateTransactionRequest, TransactionDetail, TransactionResponse, TransactionSummary,
        TransitionResponse,
    },
    events,
    pagination::PageRequest,
    payments::PaymentNotification,
    services::pricing::LineItem,
    AppState,
};
use serde::Serialize;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(config.log_level(), config.log_json);

    let context = CliContext::initialize(config).await?;
    let outcome = run(&context, cli).await;

    // Close even when the command failed; its error takes precedence.
    let closed = db::close_pool((*context.state.db).clone())
        .await
        .context("failed to close database pool");
    outcome.and(closed)
}

async fn run(context: &CliContext, cli: Cli) -> Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.state.db)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::Create(args) => handle_create(context, args, json).await?,
        Commands::Show(args) => {
            let detail = context.state.transactions.get_transaction_by_id(args.id).await?;
            render_detail(&detail, json)?;
        }
        Commands::List(args) => handle_list(context, args, json).await?,
        Commands::Ready => {
            let ready = context
                .state
                .transactions
                .get_all_ready_to_serve_transactions()
                .await?;
            render_summaries(&ready, json)?;
        }
        Commands::Next => {
            let next = context.state.transactions.get_next_order().await?;
            render_detail(&next, json)?;
        }
        Commands::StartCooking(args) => {
            let response = context.state.transactions.start_cooking(&args.queue_code).await?;
            render_transition(&response, json)?;
        }
        Commands::FinishCooking(args) => {
            let response = context.state.transactions.finish_cooking(&args.queue_code).await?;
            render_transition(&response, json)?;
        }
        Commands::StartDelivering(args) => {
            let response = context
                .state
                .transactions
                .start_delivering(&args.queue_code)
                .await?;
            render_transition(&response, json)?;
        }
        Commands::FinishDelivering(args) => {
            let response = context
                .state
                .transactions
                .finish_delivering(&args.queue_code)
                .await?;
            render_transition(&response, json)?;
        }
        Commands::Hook(args) => handle_hook(context, args, json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "dinein", about = "Dine-in order and kitchen workflow CLI", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Open a transaction for a table
    Create(CreateArgs),
    /// Show one transaction
    Show(ShowArgs),
    /// List transactions, newest first
    List(ListArgs),
    /// Transactions ready to be served
    Ready,
    /// The next paid order for the kitchen
    Next,
    StartCooking(QueueCodeArgs),
    FinishCooking(QueueCodeArgs),
    StartDelivering(QueueCodeArgs),
    FinishDelivering(QueueCodeArgs),
    /// Apply a payment gateway notification read from a JSON file
    Hook(HookArgs),
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long, value_parser = clap::value_parser!(Uuid), help = "Customer identifier (UUID)")]
    user_id: Uuid,
    #[arg(long, value_parser = clap::value_parser!(Uuid), help = "Table identifier (UUID)")]
    table_id: Uuid,
    #[arg(
        long = "item",
        value_parser = parse_line_item,
        action = ArgAction::Append,
        help = "Order line as MENU_ID=QUANTITY (repeatable)"
    )]
    items: Vec<LineItem>,
}

#[derive(Args)]
struct ShowArgs {
    #[arg(value_parser = clap::value_parser!(Uuid), help = "Transaction identifier (UUID)")]
    id: Uuid,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, default_value_t = 1, help = "Page number (1-based)")]
    page: u64,
    #[arg(long, help = "Rows per page (defaults to the configured page size)")]
    per_page: Option<u64>,
}

#[derive(Args)]
struct QueueCodeArgs {
    #[arg(help = "Queue code printed on the ticket, e.g. Q0042")]
    queue_code: String,
}

#[derive(Args)]
struct HookArgs {
    #[arg(help = "Path to the notification payload")]
    payload: PathBuf,
}

struct CliContext {
    state: AppState,
}

impl CliContext {
    async fn initialize(config: AppConfig) -> Result<Self> {
        let (state, event_rx) = AppState::build(config)
            .await
            .context("failed to initialize services")?;
        tokio::spawn(events::process_events(event_rx));
        Ok(Self { state })
    }
}

async fn handle_create(context: &CliContext, args: CreateArgs, json: bool) -> Result<()> {
    if args.items.is_empty() {
        return Err(anyhow!("at least one --item is required"));
    }
    let response = context
        .state
        .transactions
        .create_transaction(CreateTransactionRequest {
            user_id: args.user_id,
            table_id: args.table_id,
            items: args.items,
        })
        .await?;
    render_created(&response, json)
}

async fn handle_list(context: &CliContext, args: ListArgs, json: bool) -> Result<()> {
    let per_page = args
        .per_page
        .unwrap_or(context.state.config.default_page_size);
    let page = context
        .state
        .transactions
        .get_all_transactions_with_pagination(PageRequest::new(args.page, per_page))
        .await?;

    if json {
        return print_json(&page);
    }
    println!(
        "Page {}/{} ({} transactions)",
        page.page, page.max_page, page.count
    );
    for summary in &page.data {
        render_summary(summary);
    }
    Ok(())
}

async fn handle_hook(context: &CliContext, args: HookArgs, json: bool) -> Result<()> {
    let raw = fs::read_to_string(&args.payload)
        .with_context(|| format!("failed to read {}", args.payload.display()))?;
    let notification: PaymentNotification =
        serde_json::from_str(&raw).context("payload is not a payment notification")?;
    let order_id = notification.order_id.clone();

    let status = context.state.transactions.hook_transaction(notification).await?;
    if json {
        return print_json(&serde_json::json!({ "order_id": order_id, "payment_status": status }));
    }
    println!("Payment for {} is now {}", order_id, status);
    Ok(())
}

fn parse_line_item(raw: &str) -> Result<LineItem, String> {
    let (menu, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected MENU_ID=QUANTITY, got '{}'", raw))?;
    let menu_id = Uuid::parse_str(menu.trim()).map_err(|e| format!("invalid menu id: {}", e))?;
    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid quantity: {}", e))?;
    Ok(LineItem { menu_id, quantity })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_created(response: &TransactionResponse, json: bool) -> Result<()> {
    if json {
        return print_json(response);
    }
    println!(
        "Transaction {} • queue {} • total {}",
        response.id, response.queue_code, response.total_price
    );
    println!("Pay at: {}", response.payment_link);
    for line in &response.orders {
        println!("  {} x{} @ {}", line.name, line.quantity, line.price);
    }
    Ok(())
}

fn render_transition(response: &TransitionResponse, json: bool) -> Result<()> {
    if json {
        return print_json(response);
    }
    println!("{} is now {}", response.queue_code, response.order_status);
    for line in &response.orders {
        println!("  {} x{}", line.name, line.quantity);
    }
    Ok(())
}

fn render_detail(detail: &TransactionDetail, json: bool) -> Result<()> {
    if json {
        return print_json(detail);
    }
    println!(
        "Transaction {} • queue {} • {} • payment {} • total {}{}",
        detail.id,
        detail.queue_code.as_deref().unwrap_or("-"),
        detail.order_status,
        detail.payment_status,
        detail.total_price,
        if detail.is_delayed { " • DELAYED" } else { "" }
    );
    for line in &detail.orders {
        println!("  {} x{} @ {}", line.name, line.quantity, line.price);
    }
    Ok(())
}

fn render_summaries(summaries: &[TransactionSummary], json: bool) -> Result<()> {
    if json {
        return print_json(&summaries);
    }
    if summaries.is_empty() {
        println!("Nothing to serve");
    }
    for summary in summaries {
        render_summary(summary);
    }
    Ok(())
}

fn render_summary(summary: &TransactionSummary) {
    println!(
        "- {} • queue {} • {} • payment {} • total {}",
        summary.id,
        summary.queue_code.as_deref().unwrap_or("-"),
        summary.order_status,
        summary.payment_status,
        summary.total_price
    );
}
