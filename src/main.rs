// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, Month, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use milk_dairy::{
    record_range, AppConfig, CsvRenderer, DairyError, DocumentRenderer, EntryForm, MilkEntry,
    MilkStore, PdfRenderer, PdfTemplate, Report, ReportEngine, ReportKind, WeekWindow,
};

#[derive(Parser)]
#[command(name = "milk-dairy", about = "Milk collection ledger and reports", version)]
struct Cli {
    /// Database file (overrides MILK_DAIRY_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Print results as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema if it is missing
    Init,
    /// Record one entry per day from --start to --end
    Add(AddArgs),
    /// Entries for one day, by customer name
    Daily {
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Entries whose start date falls in [start, end]
    Weekly {
        /// Defaults to seven days before --end
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Entries in a month of ANY year (05 = every May on record)
    Monthly {
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
        month: u8,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// One customer's entries, oldest first
    Customer {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List every customer on record
    Customers,
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    customer: String,
    /// Defaults to today
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Defaults to --start
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long, default_value_t = 0.0)]
    morning_mound: f64,
    #[arg(long, default_value_t = 0)]
    morning_sair: u32,
    #[arg(long, default_value_t = 0.0)]
    morning_rate: f64,
    #[arg(long, default_value_t = 0.0)]
    evening_mound: f64,
    #[arg(long, default_value_t = 0)]
    evening_sair: u32,
    #[arg(long, default_value_t = 0.0)]
    evening_rate: f64,
    #[arg(long, default_value_t = 0.0)]
    rent: f64,
    #[arg(long, default_value_t = 0.0)]
    commission: f64,
    #[arg(long, default_value_t = 0.0)]
    bandi: f64,
    #[arg(long, default_value_t = 0.0)]
    paid: f64,
}

#[derive(Args)]
struct OutputArgs {
    /// Write a PDF (default path: <report dir>/<report name>.pdf)
    #[arg(long, num_args = 0..=1)]
    pdf: Option<Option<PathBuf>>,
    /// Write a CSV (default path: <report dir>/<report name>.csv)
    #[arg(long, num_args = 0..=1)]
    csv: Option<Option<PathBuf>>,
    /// Browse the report in the terminal
    #[arg(long, action = ArgAction::SetTrue)]
    view: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "milk_dairy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let store = MilkStore::open(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    store.initialize().context("failed to initialize database")?;

    let today = Local::now().date_naive();
    let engine = ReportEngine::new(&store);

    match cli.command {
        Commands::Init => {
            let count = store.count()?;
            println!("✓ Database ready at {} ({} entries)", config.db_path.display(), count);
        }
        Commands::Add(args) => run_add(&store, args, today, cli.json)?,
        Commands::Daily { date, output } => {
            let report = engine.daily(date.unwrap_or(today))?;
            show_report(&report, &output, &config, cli.json)?;
        }
        Commands::Weekly { start, end, output } => {
            let window = WeekWindow::ending_on(end.unwrap_or(today));
            let report = engine.weekly(start.unwrap_or(window.start), window.end)?;
            show_report(&report, &output, &config, cli.json)?;
        }
        Commands::Monthly { month, output } => {
            let month = Month::try_from(month).map_err(|_| anyhow!("month must be 1-12"))?;
            let report = engine.monthly(month)?;
            show_report(&report, &output, &config, cli.json)?;
        }
        Commands::Customer { name, output } => {
            let report = engine.customer(&name)?;
            show_report(&report, &output, &config, cli.json)?;
        }
        Commands::Customers => {
            let names = store.customer_names()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else if names.is_empty() {
                println!("⚠️  No customers on record");
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
        }
    }

    Ok(())
}

fn run_add(store: &MilkStore, args: AddArgs, today: NaiveDate, json: bool) -> Result<()> {
    let start = args.start.unwrap_or(today);
    let form = EntryForm::new(MilkEntry {
        customer_name: args.customer,
        start_date: start,
        end_date: args.end.unwrap_or(start),
        morning_mound: args.morning_mound,
        morning_sair: args.morning_sair,
        morning_rate: args.morning_rate,
        evening_mound: args.evening_mound,
        evening_sair: args.evening_sair,
        evening_rate: args.evening_rate,
        rent: args.rent,
        commission: args.commission,
        bandi: args.bandi,
        paid_amount: args.paid,
    });

    form.validate().map_err(DairyError::from)?;

    match record_range(store, &form) {
        Ok(ids) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else {
                println!("✅ Added {} entries from {} to {}", ids.len(), start, form.template.end_date);
            }
            Ok(())
        }
        Err(partial) => {
            eprintln!(
                "❌ Saved {} of {} days before failing on {}",
                partial.inserted.len(),
                form.days().len(),
                partial.failed_on
            );
            Err(DairyError::from(partial).into())
        }
    }
}

fn show_report(report: &Report, output: &OutputArgs, config: &AppConfig, json: bool) -> Result<()> {
    if json {
        match report.kind {
            ReportKind::Customer(_) => {
                println!("{}", serde_json::to_string_pretty(&report.customer_details())?)
            }
            _ => println!("{}", serde_json::to_string_pretty(&report.entries)?),
        }
    } else {
        print_report(report);
    }

    if report.is_empty() {
        return Ok(());
    }

    let table = report.to_table()?;
    let stem = report.kind.file_stem();

    if let Some(path) = &output.pdf {
        let template =
            PdfTemplate::with_title(&config.report_title).with_font(config.pdf_font.clone());
        let renderer = PdfRenderer::new(template);
        let written = write_document(&renderer, &table, path.clone(), config, &stem)?;
        println!("📄 PDF saved to {}", written.display());
    }

    if let Some(path) = &output.csv {
        let written = write_document(&CsvRenderer, &table, path.clone(), config, &stem)?;
        println!("📄 CSV saved to {}", written.display());
    }

    if output.view {
        view_report(report)?;
    }

    Ok(())
}

fn write_document(
    renderer: &dyn DocumentRenderer,
    table: &milk_dairy::Table,
    explicit: Option<PathBuf>,
    config: &AppConfig,
    stem: &str,
) -> Result<PathBuf> {
    let path = explicit
        .unwrap_or_else(|| config.report_dir.join(format!("{}.{}", stem, renderer.extension())));
    renderer
        .render(table, &path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn print_report(report: &Report) {
    println!("📊 {}", report.kind.title());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if report.is_empty() {
        println!("⚠️  No entries found");
        return;
    }

    if let ReportKind::Customer(name) = &report.kind {
        println!("Found {} entries for {}\n", report.len(), name);
        for (i, detail) in report.customer_details().iter().enumerate() {
            println!("📋 Entry #{} | {} → {}", i + 1, detail.start_date, detail.end_date);
            println!(
                "   Morning: {} (weight) | {} (mounds) → {} (liters) @ {}",
                detail.morning_mound,
                detail.morning_mound_equivalent,
                detail.morning_sair,
                detail.morning_rate
            );
            println!(
                "   Evening: {} (weight) | {} (mounds) → {} (liters) @ {}",
                detail.evening_mound,
                detail.evening_mound_equivalent,
                detail.evening_sair,
                detail.evening_rate
            );
            println!(
                "   Rent: {} | Commission: {} | Bandi: {} | Paid: {}",
                detail.rent, detail.commission, detail.bandi, detail.paid_amount
            );
        }
        return;
    }

    let table = match report.to_table() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("❌ {}", e);
            return;
        }
    };
    println!("{}", table.columns().join("\t"));
    for row in table.rows() {
        println!("{}", row.join("\t"));
    }
    println!("\n✓ {} entries", report.len());
}

#[cfg(feature = "tui")]
fn view_report(report: &Report) -> Result<()> {
    let mut app = ui::App::new(report.clone());
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn view_report(_report: &Report) -> Result<()> {
    eprintln!("❌ Terminal viewer not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    Ok(())
}
