use crate::infra::{bootstrap, load_catalog};
use clap::Args;
use dispute_evidence::error::AppError;
use dispute_evidence::workflows::evidence::{ACCEPTED_EXTENSIONS, ADVISORY_MAX_FILE_BYTES};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ChecklistArgs {
    /// Dispute category, e.g. mutual-partition
    #[arg(long)]
    pub(crate) category: String,
    /// CSV catalog (category,slot_type,label,required) replacing the built-in checklists
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

pub(crate) fn run_checklist(args: ChecklistArgs) -> Result<(), AppError> {
    let config = bootstrap()?;
    let catalog = load_catalog(args.catalog.as_deref(), &config)?;
    let slots = catalog.slots_for(&args.category);

    if slots.is_empty() {
        println!("No document checklist for category '{}'.", args.category);
        println!("Known categories: {}", catalog.categories().join(", "));
        return Ok(());
    }

    println!("Document checklist for {}", args.category);
    for slot in slots {
        let marker = if slot.required { "required" } else { "optional" };
        println!("- {} ({}) [{}]", slot.label, slot.slot_type, marker);
    }
    println!(
        "\nAccepted formats: {} | advisory size limit {} MiB",
        ACCEPTED_EXTENSIONS.join(", "),
        ADVISORY_MAX_FILE_BYTES / (1024 * 1024)
    );
    Ok(())
}
