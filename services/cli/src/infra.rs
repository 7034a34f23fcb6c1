use dispute_evidence::config::AppConfig;
use dispute_evidence::error::AppError;
use dispute_evidence::telemetry;
use dispute_evidence::workflows::evidence::{DocumentCatalog, SlotType, Visibility};
use std::path::{Path, PathBuf};
use tracing::info;

/// `slot=path` pair given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotFile {
    pub(crate) slot_type: SlotType,
    pub(crate) path: PathBuf,
}

pub(crate) fn parse_slot_file(value: &str) -> Result<SlotFile, String> {
    let (slot, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected <slot>=<path>, got '{value}'"))?;
    let slot = slot.trim();
    let path = path.trim();
    if slot.is_empty() || path.is_empty() {
        return Err(format!("expected <slot>=<path>, got '{value}'"));
    }
    Ok(SlotFile {
        slot_type: SlotType::new(slot),
        path: PathBuf::from(path),
    })
}

pub(crate) fn parse_visibility(value: &str) -> Result<Visibility, String> {
    value.parse::<Visibility>().map_err(|err| err.to_string())
}

/// Loads configuration and installs the subscriber.
pub(crate) fn bootstrap() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

/// An explicit `--catalog` wins over `EVIDENCE_CATALOG_PATH`; without either the
/// built-in checklists are used.
pub(crate) fn load_catalog(
    explicit: Option<&Path>,
    config: &AppConfig,
) -> Result<DocumentCatalog, AppError> {
    match explicit.or(config.evidence.catalog_path.as_deref()) {
        Some(path) => {
            let catalog = DocumentCatalog::from_path(path)?;
            info!(
                path = %path.display(),
                categories = catalog.categories().len(),
                "loaded evidence catalog"
            );
            Ok(catalog)
        }
        None => Ok(DocumentCatalog::standard()),
    }
}
