use crate::infra::{build_pipeline, PipelineOverrides};
use chrono::Utc;
use clap::Args;
use deal_scout::config::AppConfig;
use deal_scout::error::AppError;
use deal_scout::telemetry;
use deal_scout::workflows::enrichment::{BatchSummary, ListingFilter};
use deal_scout::workflows::listings::{write_csv, ListingImporter};
use deal_scout::workflows::pipeline::EnrichedRow;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct EnrichArgs {
    /// MLS listing export to enrich (CSV)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Where to write the enriched CSV (summary only when omitted)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Jurisdiction rules file (defaults to DEALSCOUT_RULES_PATH)
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Column of the export holding pre-joined zoning codes
    #[arg(long, conflicts_with = "parcels")]
    pub(crate) zoning_column: Option<String>,
    /// Parcel zoning table (Latitude, Longitude, ZoningCode) used instead of a column
    #[arg(long)]
    pub(crate) parcels: Option<PathBuf>,
    /// Address book used to place listings that lack coordinates
    #[arg(long)]
    pub(crate) addresses: Option<PathBuf>,
    /// Keep only listings at or below this price per unit
    #[arg(long)]
    pub(crate) max_price_per_unit: Option<f64>,
    /// Keep only listings in these zoning codes (repeatable)
    #[arg(long)]
    pub(crate) zone: Vec<String>,
    /// Drop excluded listings and listings with unknown zoning
    #[arg(long)]
    pub(crate) resolved_only: bool,
}

impl EnrichArgs {
    fn filter(&self) -> ListingFilter {
        ListingFilter {
            max_price_per_unit: self.max_price_per_unit,
            zoning_codes: self.zone.iter().cloned().collect(),
            resolved_only: self.resolved_only,
        }
    }
}

pub(crate) fn run_enrich(args: EnrichArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let filter = args.filter();
    let EnrichArgs {
        input,
        output,
        rules,
        zoning_column,
        parcels,
        addresses,
        ..
    } = args;

    let pipeline = build_pipeline(
        &config.enrichment,
        PipelineOverrides {
            rules,
            zoning_column,
            parcels,
            addresses,
        },
    )?;

    let table = ListingImporter::from_path(&input)?;
    let rows = pipeline.run(&table);
    let summary = BatchSummary::build(
        pipeline.engine().rules().jurisdiction.clone(),
        rows.iter().map(|row| &row.listing),
        Utc::now(),
    );

    let matched: Vec<EnrichedRow> = rows
        .into_iter()
        .filter(|row| filter.matches(&row.listing))
        .collect();

    render_summary(&summary, &table.missing_columns, &filter, matched.len());

    if let Some(path) = output {
        let writer = BufWriter::new(File::create(&path)?);
        write_csv(writer, &table.headers, &matched)?;
        info!(path = %path.display(), rows = matched.len(), "enriched listings written");
        println!("\nWrote {} rows to {}", matched.len(), path.display());
    }

    Ok(())
}

fn render_summary(
    summary: &BatchSummary,
    missing_columns: &[&'static str],
    filter: &ListingFilter,
    matched: usize,
) {
    println!("DealScout enrichment ({})", summary.jurisdiction);
    println!(
        "Rows: {} total, {} enriched, {} excluded",
        summary.total_rows,
        summary.enriched,
        summary.excluded_total()
    );

    if !missing_columns.is_empty() {
        println!("Missing columns: {}", missing_columns.join(", "));
    }

    if !summary.excluded.is_empty() {
        println!("\nExclusions");
        for (reason, count) in &summary.excluded {
            println!("- {reason}: {count}");
        }
    }

    println!("\nZoning");
    println!("- unknown zoning: {}", summary.unknown_zoning);
    println!("- SB-9 eligible: {}", summary.sb9_eligible);
    for (code, count) in &summary.zoning_counts {
        println!("- {code}: {count}");
    }

    match summary.median_price_per_unit {
        Some(median) => println!("\nMedian price per unit: ${median:.2}"),
        None => println!("\nMedian price per unit: n/a"),
    }

    if !filter.is_empty() {
        println!("Matching filter: {matched} of {}", summary.total_rows);
    }
}
