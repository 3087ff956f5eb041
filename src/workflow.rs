//! Headless analysis orchestration: resolve the dataset, build the request,
//! dispatch, and render the results to stdout.
//!
//! Shares every component with the interactive session; only presentation
//! differs. HTTP and decode failures are reported and exit cleanly — the only
//! fatal errors are a dataset that will not load and a transport failure.

use crate::cli::AnalyzeArgs;
use crate::client::ScoringClient;
use crate::config::Config;
use crate::dataset::{DatasetCache, LeadSource};
use crate::params::ScoringParams;
use crate::plot::optim_thresh_plot;
use crate::render::{self, PREVIEW_ROWS};
use crate::strategy::{outcome_from_response, write_strategy_csv, RunOutcome};
use crate::util::truncate_string;
use anyhow::{ensure, Context, Result};

const MAX_ERROR_BODY: usize = 2048;

pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&args.safe_guard),
        "--safe-guard must be within 0.0..=1.0"
    );
    let config = Config::resolve(args.endpoint, args.leads, args.out_dir)?;
    let source = match args.upload {
        Some(path) => LeadSource::Upload(path),
        None => LeadSource::Bundled(config.bundled_leads.clone()),
    };
    let mut cache = DatasetCache::new();
    let dataset = cache.load(&source)?;
    println!(
        "Scoring {} leads from {}",
        dataset.len(),
        source.path().display()
    );

    let params = ScoringParams {
        avg_sales_per_month: args.sales,
        safe_guard: args.safe_guard,
    };
    println!(
        "Monthly sales will not go below: {}",
        params.sales_floor_label()
    );

    let body = dataset
        .to_records_json()
        .context("serialize leads dataset")?;
    let client = ScoringClient::new(config.endpoint.clone());
    println!("Lead scoring in progress...");
    let response = client.calculate_lead_strategy(&body, &params)?;
    println!("Response status code: {}", response.status);

    match outcome_from_response(&response) {
        RunOutcome::Strategy(bundle) => {
            println!();
            println!("Lead strategy summary:");
            print!("{}", render::render_table(&bundle.expected_value));
            println!();
            match optim_thresh_plot(&bundle.thresh_optim, params.safe_guard) {
                Ok(plot) => println!(
                    "Threshold sweep: {} points of {} vs {}, safeguard at {:.2}",
                    plot.points.len(),
                    plot.y_label,
                    plot.x_label,
                    plot.safeguard
                ),
                Err(err) => println!("Threshold sweep unavailable: {err}"),
            }
            println!();
            println!(
                "Lead strategy (first {} rows):",
                PREVIEW_ROWS.min(bundle.lead_strategy.len())
            );
            print!(
                "{}",
                render::render_preview(&bundle.lead_strategy, PREVIEW_ROWS)
            );
            let path =
                write_strategy_csv(&bundle.lead_strategy, source.tag(), &config.download_dir)?;
            println!();
            println!("Wrote {}", path.display());
        }
        RunOutcome::HttpFailure { status, body } => {
            println!("Request failed with status {status}");
            println!("Response text: {}", truncate_string(&body, MAX_ERROR_BODY));
        }
        RunOutcome::DecodeFailure { message } => {
            println!("An error occurred while processing the response: {message}");
        }
    }
    Ok(())
}
