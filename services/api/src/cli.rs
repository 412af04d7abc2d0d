use crate::report::{run_enrich, EnrichArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use deal_scout::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "DealScout",
    about = "Enrich MLS listing exports with zoning-based unit counts, price per unit, and SB-9 eligibility",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Enrich a listing CSV from the command line and write the result
    Enrich(EnrichArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Enrich(args) => run_enrich(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrich_arguments_parse() {
        let cli = Cli::try_parse_from([
            "deal-scout",
            "enrich",
            "--input",
            "listings.csv",
            "--zone",
            "R1-1",
            "--zone",
            "RD1.5-1",
            "--max-price-per-unit",
            "400000",
            "--resolved-only",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Enrich(args)) => {
                assert_eq!(args.zone, vec!["R1-1".to_string(), "RD1.5-1".to_string()]);
                assert_eq!(args.max_price_per_unit, Some(400_000.0));
                assert!(args.resolved_only);
                assert!(args.output.is_none());
            }
            other => panic!("expected enrich command, got {other:?}"),
        }
    }

    #[test]
    fn zoning_column_and_parcels_conflict() {
        let result = Cli::try_parse_from([
            "deal-scout",
            "enrich",
            "--input",
            "listings.csv",
            "--zoning-column",
            "Zoning",
            "--parcels",
            "parcels.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["deal-scout"]).expect("no arguments parse");
        assert!(cli.command.is_none());
    }
}
