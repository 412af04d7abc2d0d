use deal_scout::config::EnrichmentConfig;
use deal_scout::error::AppError;
use deal_scout::workflows::enrichment::{JurisdictionRules, MetricsEngine};
use deal_scout::workflows::pipeline::{DealScoutPipeline, ZoningSource};
use deal_scout::workflows::zoning::{AddressBook, ParcelZoningIndex};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Default)]
pub(crate) struct PipelineOverrides {
    pub(crate) rules: Option<PathBuf>,
    pub(crate) zoning_column: Option<String>,
    pub(crate) parcels: Option<PathBuf>,
    pub(crate) addresses: Option<PathBuf>,
}

/// Loads and validates everything the pipeline needs. Runs before any row is read,
/// so a bad rules file stops the process instead of producing misclassified output.
pub(crate) fn build_pipeline(
    config: &EnrichmentConfig,
    overrides: PipelineOverrides,
) -> Result<DealScoutPipeline, AppError> {
    let rules_path = match overrides.rules {
        Some(path) => path,
        None => config.require_rules_path()?.clone(),
    };
    let rules = JurisdictionRules::from_path(&rules_path)?;
    info!(
        jurisdiction = %rules.jurisdiction,
        path = %rules_path.display(),
        eligible_zones = rules.eligible_zoning_codes.len(),
        "jurisdiction rules loaded"
    );
    let engine = MetricsEngine::new(rules)?;

    // An explicit zoning column beats a configured parcel index.
    let parcels = if overrides.zoning_column.is_some() {
        None
    } else {
        overrides.parcels.or_else(|| config.parcels_path.clone())
    };
    let zoning = match parcels {
        Some(path) => {
            let index = ParcelZoningIndex::from_path(&path)?;
            info!(path = %path.display(), parcels = index.len(), "parcel zoning index loaded");
            ZoningSource::Lookup(Arc::new(index))
        }
        None => ZoningSource::Column(
            overrides
                .zoning_column
                .unwrap_or_else(|| config.zoning_column.clone()),
        ),
    };

    let mut pipeline = DealScoutPipeline::new(engine, zoning);
    if let Some(path) = overrides.addresses.or_else(|| config.address_book_path.clone()) {
        let book = AddressBook::from_path(&path)?;
        info!(path = %path.display(), entries = book.len(), "address book loaded");
        pipeline = pipeline.with_resolver(Arc::new(book));
    }

    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deal_scout::config::ConfigError;

    fn enrichment_config() -> EnrichmentConfig {
        EnrichmentConfig {
            rules_path: None,
            zoning_column: "Zoning".to_string(),
            parcels_path: None,
            address_book_path: None,
        }
    }

    #[test]
    fn refuses_to_build_without_rules() {
        let error = build_pipeline(&enrichment_config(), PipelineOverrides::default())
            .err()
            .expect("rules required");
        assert!(matches!(error, AppError::Config(ConfigError::MissingRules)));
    }

    #[test]
    fn unreadable_rules_file_is_fatal() {
        let overrides = PipelineOverrides {
            rules: Some(PathBuf::from("./no-such-rules.json")),
            ..PipelineOverrides::default()
        };
        let error = build_pipeline(&enrichment_config(), overrides)
            .err()
            .expect("rules unreadable");
        assert!(matches!(error, AppError::Rules(_)));
    }

    #[test]
    fn builds_from_bundled_los_angeles_rules() {
        let overrides = PipelineOverrides {
            rules: Some(PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../rules/los_angeles.json"
            ))),
            ..PipelineOverrides::default()
        };
        let pipeline = build_pipeline(&enrichment_config(), overrides).expect("pipeline builds");
        assert_eq!(pipeline.engine().rules().jurisdiction, "City of Los Angeles");
        assert_eq!(pipeline.engine().rules().max_units_cap, Some(20));
    }
}
