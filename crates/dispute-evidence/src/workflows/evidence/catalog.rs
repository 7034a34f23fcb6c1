use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{DocumentSlotSpec, SlotType};

/// Upload size the picker advertises. Larger files are still submitted.
pub const ADVISORY_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions the picker advertises, lowercase and without the dot.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "doc", "docx"];

/// Required-document checklists keyed by dispute category.
#[derive(Debug, Clone, Default)]
pub struct DocumentCatalog {
    categories: BTreeMap<String, Vec<DocumentSlotSpec>>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to open catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog row: {0}")]
    Csv(#[from] csv::Error),
    #[error("category '{category}' lists slot '{slot_type}' more than once")]
    DuplicateSlot { category: String, slot_type: String },
    #[error("slot '{slot_type}' has an unreadable required flag '{value}'")]
    InvalidRequiredFlag { slot_type: String, value: String },
    #[error("catalog row is missing a {field}")]
    MissingField { field: &'static str },
}

impl DocumentCatalog {
    pub fn standard() -> Self {
        Self {
            categories: standard_categories(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Reads `category,slot_type,label,required` rows. Row order is checklist order.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut categories: BTreeMap<String, Vec<DocumentSlotSpec>> = BTreeMap::new();

        for row in csv_reader.deserialize::<CatalogRow>() {
            let row = row?;
            if row.category.is_empty() {
                return Err(CatalogError::MissingField { field: "category" });
            }
            if row.slot_type.is_empty() {
                return Err(CatalogError::MissingField { field: "slot_type" });
            }

            let required = parse_required_flag(&row.slot_type, row.required.as_deref())?;
            let label = if row.label.is_empty() {
                row.slot_type.clone()
            } else {
                row.label
            };

            let slots = categories.entry(row.category.clone()).or_default();
            if slots
                .iter()
                .any(|slot| slot.slot_type.as_str() == row.slot_type)
            {
                return Err(CatalogError::DuplicateSlot {
                    category: row.category,
                    slot_type: row.slot_type,
                });
            }

            slots.push(DocumentSlotSpec {
                slot_type: SlotType::new(row.slot_type),
                label,
                required,
            });
        }

        Ok(Self { categories })
    }

    /// Exact-key lookup; unknown categories have no checklist.
    pub fn slots_for(&self, category: &str) -> &[DocumentSlotSpec] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn required_slots(&self, category: &str) -> Vec<&DocumentSlotSpec> {
        self.slots_for(category)
            .iter()
            .filter(|slot| slot.required)
            .collect()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    category: String,
    slot_type: String,
    #[serde(default)]
    label: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    required: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_required_flag(slot_type: &str, value: Option<&str>) -> Result<bool, CatalogError> {
    let Some(raw) = value else {
        return Ok(false);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(CatalogError::InvalidRequiredFlag {
            slot_type: slot_type.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn standard_categories() -> BTreeMap<String, Vec<DocumentSlotSpec>> {
    let mut categories = BTreeMap::new();

    categories.insert(
        "mutual-partition".to_string(),
        vec![
            DocumentSlotSpec::new("land_deed", "Title deed / sale deed", true),
            DocumentSlotSpec::new("survey_map", "Survey map or sketch", true),
            DocumentSlotSpec::new("record_of_rights", "Record of rights extract", true),
            DocumentSlotSpec::new("co_owner_consent", "Co-owner consent letters", true),
            DocumentSlotSpec::new("tax_receipt", "Latest property tax receipt", false),
            DocumentSlotSpec::new("valuation_report", "Valuation report", false),
        ],
    );

    categories.insert(
        "family-partition".to_string(),
        vec![
            DocumentSlotSpec::new("land_deed", "Title deed / sale deed", true),
            DocumentSlotSpec::new("family_tree", "Family tree certificate", true),
            DocumentSlotSpec::new("legal_heir_certificate", "Legal heir certificate", true),
            DocumentSlotSpec::new("record_of_rights", "Record of rights extract", true),
            DocumentSlotSpec::new("prior_settlement", "Earlier settlement or memorandum", false),
        ],
    );

    categories.insert(
        "boundary-dispute".to_string(),
        vec![
            DocumentSlotSpec::new("land_deed", "Title deed / sale deed", true),
            DocumentSlotSpec::new("survey_map", "Survey map or sketch", true),
            DocumentSlotSpec::new("boundary_survey", "Licensed surveyor boundary report", true),
            DocumentSlotSpec::new("site_photographs", "Site photographs", false),
            DocumentSlotSpec::new("neighbor_correspondence", "Correspondence with neighbor", false),
        ],
    );

    categories.insert(
        "inheritance-succession".to_string(),
        vec![
            DocumentSlotSpec::new("death_certificate", "Death certificate", true),
            DocumentSlotSpec::new("legal_heir_certificate", "Legal heir certificate", true),
            DocumentSlotSpec::new("will_or_testament", "Will or testament", false),
            DocumentSlotSpec::new("land_deed", "Title deed of the estate", true),
            DocumentSlotSpec::new("succession_certificate", "Succession certificate", false),
        ],
    );

    categories.insert(
        "encroachment".to_string(),
        vec![
            DocumentSlotSpec::new("land_deed", "Title deed / sale deed", true),
            DocumentSlotSpec::new("survey_map", "Survey map or sketch", true),
            DocumentSlotSpec::new("site_photographs", "Photographs of the encroachment", true),
            DocumentSlotSpec::new("police_complaint", "Police complaint or FIR copy", false),
            DocumentSlotSpec::new("notice_served", "Legal notice served on encroacher", false),
        ],
    );

    categories
}
