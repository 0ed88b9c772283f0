use anyhow::{bail, Context};
use clap::{Parser, Subcommand, Args, ValueEnum};
use revest::prelude::*;
use revest::export::export_summary;
use revest::reader::parse_service_date;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "revcli")]
#[command(about = "Billing ledger CLI - Aggregate payer/procedure performance and project revenue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show summary statistics for a ledger
    Stats(StatsArgs),
    /// Aggregate procedures for a payer and date window
    Summary(SummaryArgs),
    /// List selectable payers
    Payers(FilterArgs),
    /// List selectable procedures
    Procedures(FilterArgs),
    /// Project revenue for a procedure at a given volume
    Project(ProjectArgs),
    /// Export the aggregated summary to JSON, JSON Lines, or CSV
    Export(ExportArgs),
}

#[derive(Args)]
struct StatsArgs {
    /// Path to the billing ledger CSV file
    #[arg(short, long)]
    ledger: PathBuf,
}

#[derive(Args)]
struct FilterArgs {
    /// Path to the billing ledger CSV file
    #[arg(short, long)]
    ledger: PathBuf,
    /// Payer name (defaults to all payers)
    #[arg(long)]
    payer: Option<String>,
    /// Start of the service-date window, inclusive (e.g. 2024-01-01)
    #[arg(long)]
    from: Option<String>,
    /// End of the service-date window, inclusive
    #[arg(long)]
    to: Option<String>,
}

#[derive(Args)]
struct SummaryArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Sort groups by total paid, highest first
    #[arg(long)]
    sort_by_total: bool,
}

#[derive(Args)]
struct ProjectArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Procedure code to project
    #[arg(long)]
    code: String,
    /// Procedure description, to disambiguate codes with drifting descriptions
    #[arg(long)]
    description: Option<String>,
    /// Estimated procedure volume (defaults to the historical claim count)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    volume: Option<u64>,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
    /// Export format
    #[arg(long, value_enum, default_value_t = ExportFormatOpt::Json)]
    format: ExportFormatOpt,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ExportFormatOpt {
    Json,
    Jsonl,
    Csv,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Stats(args) => cmd_stats(args),
        Commands::Summary(args) => cmd_summary(args),
        Commands::Payers(args) => cmd_payers(args),
        Commands::Procedures(args) => cmd_procedures(args),
        Commands::Project(args) => cmd_project(args),
        Commands::Export(args) => cmd_export(args),
    }
}

fn load_dataset(path: &PathBuf) -> anyhow::Result<LedgerDataset> {
    LedgerDatasetBuilder::new()
        .ledger(path)
        .build()
        .with_context(|| format!("failed to load ledger from {}", path.display()))
}

fn pipeline_params(dataset: &LedgerDataset, args: &FilterArgs) -> anyhow::Result<PipelineParams> {
    let mut params = PipelineParams::all();

    // Missing bounds default to the edges of the pickable span. An empty
    // ledger has no span; the window is irrelevant to an empty result.
    if args.from.is_some() || args.to.is_some() {
        if let Some(span) = dataset.date_span() {
            let start = match &args.from {
                Some(s) => parse_service_date(s).map_err(|e| anyhow::anyhow!(e.user_message()))?,
                None => span.start,
            };
            let end = match &args.to {
                Some(s) => parse_service_date(s).map_err(|e| anyhow::anyhow!(e.user_message()))?,
                None => span.end,
            };
            params = params.with_window(DateWindow::new(start, end));
        }
    }

    if let Some(payer) = &args.payer {
        params = params.with_payer(PayerChoice::One(payer.clone()));
    }

    Ok(params)
}

fn cmd_stats(args: StatsArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(&args.ledger)?;
    dataset.statistics().print_summary();
    let report = &dataset.read_report;
    if report.skipped() > 0 {
        println!(
            "Rows skipped: {} ({} bad date, {} zero amount, {} bad amount, {} missing field)",
            report.skipped(),
            report.unparsable_date,
            report.zero_amount,
            report.bad_amount,
            report.missing_field
        );
    }
    Ok(())
}

fn cmd_summary(args: SummaryArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(&args.filter.ledger)?;
    let params = pipeline_params(&dataset, &args.filter)?;
    let table = dataset.pipeline(&params);

    if table.is_empty() {
        println!("No claims match the selected payer and date window.");
        return Ok(());
    }

    let mut groups: Vec<&ProcedureGroupSummary> = table.groups.iter().collect();
    if args.sort_by_total {
        groups.sort_by(|a, b| {
            b.total_paid
                .partial_cmp(&a.total_paid)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    println!(
        "{:<10} {:<40} {:>12} {:>14} {:>8}",
        "Code", "Description", "Avg Paid", "Total Paid", "Claims"
    );
    for group in groups {
        println!(
            "{:<10} {:<40} {:>12} {:>14} {:>8}",
            group.key.code,
            truncate(&group.key.description, 40),
            format!("${:.2}", group.avg_paid),
            format!("${:.2}", group.total_paid),
            group.claim_count
        );
    }

    let total = &table.grand_total;
    let avg = total
        .avg_paid
        .map(|a| format!("${:.2}", a))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<10} {:<40} {:>12} {:>14} {:>8}",
        "", "GRAND TOTAL", avg, format!("${:.2}", total.total_paid), total.claim_count
    );
    Ok(())
}

fn cmd_payers(args: FilterArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(&args.ledger)?;
    let params = pipeline_params(&dataset, &args)?;
    for payer in dataset.selectable_payers(params.window) {
        println!("{}", payer);
    }
    Ok(())
}

fn cmd_procedures(args: FilterArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(&args.ledger)?;
    let params = pipeline_params(&dataset, &args)?;
    for key in dataset.selectable_procedures(&params) {
        println!("{}", key);
    }
    Ok(())
}

fn cmd_project(args: ProjectArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(&args.filter.ledger)?;
    let params = pipeline_params(&dataset, &args.filter)?;
    let table = dataset.pipeline(&params);

    // Resolve the selection among the non-rollup groups: by code, refined by
    // description when one is supplied.
    let selected = table
        .groups
        .iter()
        .find(|g| {
            g.key.code.as_str() == args.code
                && args
                    .description
                    .as_ref()
                    .map(|d| &g.key.description == d)
                    .unwrap_or(true)
        })
        .map(|g| g.key.clone());

    let key = match selected {
        Some(key) => key,
        None => {
            println!("No data available for the selected procedure and payer.");
            return Ok(());
        }
    };

    let volume = args.volume.unwrap_or_else(|| default_volume(&table, &key));
    match project(&table, &key, volume) {
        ProjectionOutcome::Revenue(revenue) => {
            println!("Procedure: {}", key);
            println!("Volume: {}", volume);
            println!("Projected Revenue: ${}", format_thousands(revenue));
        }
        ProjectionOutcome::NoData => {
            println!("No data available for the selected procedure and payer.");
        }
    }
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let dataset = load_dataset(&args.filter.ledger)?;
    let params = pipeline_params(&dataset, &args.filter)?;
    let table = dataset.pipeline(&params);

    let format = match args.format {
        ExportFormatOpt::Json => ExportFormat::Json,
        ExportFormatOpt::Jsonl => ExportFormat::JsonLines,
        ExportFormatOpt::Csv => ExportFormat::Csv,
    };

    if let Err(e) = export_summary(&table, &args.output, format) {
        bail!("export error: {}", e.user_message());
    }
    println!("Exported to {}", args.output.display());
    Ok(())
}

/// Two-decimal USD amount with thousands separators
fn format_thousands(amount: f64) -> String {
    let formatted = format!("{:.2}", amount);
    let (integer, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in integer.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let integer: String = grouped.chars().rev().collect();
    format!("{}.{}", integer, fraction)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
