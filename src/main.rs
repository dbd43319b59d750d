use anyhow::{Context, Result, anyhow};
use book_slice::{
    Book, BookScenario, BookSlice, ClientConfig, EntityId, ListQuery, OperationResult,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SCROLL_SORT: &str = "id,asc";

#[derive(Parser)]
#[command(name = "book-slice")]
#[command(about = "Drive the Book REST resource through the client slice")]
struct Cli {
    /// Application root; overrides BOOK_API_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        size: Option<u32>,
        #[arg(long)]
        sort: Option<String>,
        /// Load this many following pages as scroll continuations
        #[arg(long, default_value_t = 0)]
        scroll: u32,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
    },
    Patch {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
    },
    Delete {
        id: String,
    },
    /// Run the end-to-end scenario against the configured backend
    E2e,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.base_url {
        Some(base_url) => ClientConfig::new(base_url),
        None => ClientConfig::from_env(),
    }
    .context("failed to load client configuration")?;

    let slice = BookSlice::connect(config).context("failed to build HTTP client")?;

    match cli.command {
        Command::List {
            page,
            size,
            sort,
            scroll,
        } => list(&slice, page, size, sort, scroll).await,
        Command::Get { id } => {
            let outcome = slice.get_entity(&EntityId::from(id)).await;
            settle(&slice, outcome, "get")
        }
        Command::Create { name, price } => {
            let book = Book {
                id: None,
                name,
                price,
            };
            let outcome = slice.create_entity(&book).await;
            settle(&slice, outcome, "create")
        }
        Command::Update { id, name, price } => {
            let book = Book {
                id: Some(EntityId::from(id)),
                name,
                price,
            };
            let outcome = slice.update_entity(&book).await;
            settle(&slice, outcome, "update")
        }
        Command::Patch { id, name, price } => {
            let book = Book {
                id: Some(EntityId::from(id)),
                name,
                price,
            };
            let outcome = slice.partial_update_entity(&book).await;
            settle(&slice, outcome, "patch")
        }
        Command::Delete { id } => {
            let outcome = slice.delete_entity(&EntityId::from(id)).await;
            settle(&slice, outcome, "delete")
        }
        Command::E2e => {
            let report = BookScenario::new(slice)
                .run()
                .await
                .context("end-to-end scenario failed")?;
            print_json(&report)
        }
    }
}

async fn list(
    slice: &BookSlice,
    page: Option<u32>,
    size: Option<u32>,
    sort: Option<String>,
    scroll: u32,
) -> Result<()> {
    let sort = scroll_sort(sort, scroll);
    let query = ListQuery {
        page,
        size,
        sort: sort.clone(),
        continuation: false,
    };
    let outcome = slice.get_entities(query).await;
    if outcome.is_err() {
        return settle(slice, outcome, "list");
    }

    for _ in 0..scroll {
        let state = slice.state();
        let Some(next) = state.links.next() else {
            break;
        };
        let next = u32::try_from(next).map_err(|_| anyhow!("page {next} out of range"))?;

        let query = ListQuery {
            page: Some(next),
            size,
            sort: sort.clone(),
            continuation: true,
        };
        let outcome = slice.get_entities(query).await;
        if outcome.is_err() {
            return settle(slice, outcome, "scroll");
        }
    }

    print_json(&slice.state())
}

/// Scrolling appends pages, so every request must share one ordering.
fn scroll_sort(sort: Option<String>, scroll: u32) -> Option<String> {
    match sort {
        None if scroll > 0 => Some(DEFAULT_SCROLL_SORT.to_string()),
        sort => sort,
    }
}

/// Prints the state either way; a rejected operation exits non-zero.
fn settle<P>(slice: &BookSlice, outcome: OperationResult<P>, operation: &str) -> Result<()> {
    print_json(&slice.state())?;
    failure(outcome, operation)
}

fn failure<P>(outcome: OperationResult<P>, operation: &str) -> Result<()> {
    outcome
        .map(|_| ())
        .with_context(|| format!("{operation} request was rejected"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("book_slice=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
