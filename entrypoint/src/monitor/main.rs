use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use common::{
    config::PipelineConfig,
    deals::{Deal, DealCategory, Effort, analyze_deal},
    result::enums::Sort,
};
use crawler::unprotected::UnprotectedCrawler;
use listings::{CrawlReport, PaginationClient};
use mimalloc::MiMalloc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use utils::{
    config::{ConfigOverrides, load_config},
    errors::MonitorError,
    logger::configure_logger,
    output::{render_json, render_text},
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "monitor", about = "Listing monitor and deal analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a paginated listing site described by a JSON config
    Crawl(CrawlArgs),
    /// Score a single deal for resale
    Deal(DealArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    #[arg(short, long)]
    config: PathBuf,
    #[arg(long)]
    max_pages: Option<u64>,
    #[arg(long)]
    concurrency: Option<usize>,
    #[arg(long, default_value_t = Sort::PageOrder)]
    sort: Sort,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DealArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    original_price: f64,
    #[arg(long)]
    deal_price: f64,
    #[arg(long)]
    resale_price: f64,
    #[arg(long, default_value_t = DealCategory::Other)]
    category: DealCategory,
    /// Parcel weight in kilograms
    #[arg(long, default_value_t = 0.5)]
    weight: f64,
    #[arg(long, default_value_t = Effort::Medium)]
    effort: Effort,
    #[arg(long)]
    json: bool,
}

fn build_crawler(config: &PipelineConfig) -> UnprotectedCrawler {
    let crawler = UnprotectedCrawler::new().with_timeout(config.per_fetch_timeout);

    match &config.user_agent {
        Some(user_agent) => crawler.with_user_agent(user_agent),
        None => crawler,
    }
}

fn print_report(report: &CrawlReport, args: &CrawlArgs) -> Result<(), MonitorError> {
    if args.json {
        println!("{}", render_json(&report.results, args.sort)?);
    } else {
        print!("{}", render_text(&report.results, args.sort));
    }

    Ok(())
}

async fn crawl(args: CrawlArgs) -> Result<bool, MonitorError> {
    let overrides = ConfigOverrides {
        max_pages: args.max_pages,
        concurrency: args.concurrency,
    };
    let config = load_config(&args.config, &overrides).await?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current page");
            ctrl_c.cancel();
        }
    });

    info!("Listing monitor starting on {}", config.base_url);

    let client = PaginationClient::new(&config, Box::new(build_crawler(&config)))?
        .with_cancellation(cancel);

    let report = client.crawl().await?;

    print_report(&report, &args)?;

    if let Some(err) = &report.halted {
        error!("Crawl stopped early: {err}");
        return Ok(false);
    }

    Ok(true)
}

fn deal(args: DealArgs) -> Result<(), MonitorError> {
    let deal = Deal {
        name: args.name,
        original_price: args.original_price,
        deal_price: args.deal_price,
        estimated_resale_price: args.resale_price,
        category: args.category,
        weight: args.weight,
        effort: args.effort,
    };

    let analysis = analyze_deal(&deal);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{analysis}");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    configure_logger();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Crawl(args) => crawl(args).await,
        Command::Deal(args) => deal(args).map(|_| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
