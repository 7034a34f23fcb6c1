use crate::infra::{bootstrap, load_catalog, parse_slot_file, parse_visibility, SlotFile};
use clap::Args;
use dispute_evidence::error::AppError;
use dispute_evidence::workflows::evidence::{
    DisputeContext, DisputeSession, EvidenceFile, EvidenceSummary, HttpVerificationClient,
    SlotView, SubmitError, UploadOutcome, Visibility,
};
use futures::future::join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct UploadArgs {
    /// Dispute category, e.g. mutual-partition
    #[arg(long)]
    pub(crate) category: String,
    /// Identifier of an existing dispute case
    #[arg(long)]
    pub(crate) dispute_id: Option<String>,
    /// Sharing scope: private, shared-with-reviewer or public
    #[arg(long, value_parser = parse_visibility)]
    pub(crate) visibility: Option<Visibility>,
    /// CSV catalog (category,slot_type,label,required) replacing the built-in checklists
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Emit the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
    /// Evidence to submit as <slot>=<path>; repeat for several slots
    #[arg(long = "file", value_parser = parse_slot_file, required = true)]
    pub(crate) files: Vec<SlotFile>,
}

#[derive(Debug, Serialize)]
struct UploadLine {
    slot_type: String,
    file_name: String,
    outcome: String,
    document_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadReport<'a> {
    context: &'a DisputeContext,
    visibility: Visibility,
    uploads: Vec<UploadLine>,
    slots: Vec<SlotView>,
    summary: EvidenceSummary,
    completion_percent: u8,
}

pub(crate) async fn run_upload(args: UploadArgs) -> Result<(), AppError> {
    let UploadArgs {
        category,
        dispute_id,
        visibility,
        catalog,
        json,
        files,
    } = args;

    let config = bootstrap()?;
    let catalog = load_catalog(catalog.as_deref(), &config)?;
    let visibility = visibility.unwrap_or(config.evidence.default_visibility);

    let mut context = DisputeContext::new(category);
    if let Some(dispute_id) = dispute_id {
        context = context.with_dispute_id(dispute_id);
    }

    let client = HttpVerificationClient::from_config(&config.verification);
    info!(
        url = client.upload_url(),
        category = %context.category,
        files = files.len(),
        "starting evidence upload"
    );
    let session =
        DisputeSession::new(context, &catalog, Arc::new(client)).with_visibility(visibility);

    let mut evidence = Vec::with_capacity(files.len());
    for SlotFile { slot_type, path } in files {
        let bytes = tokio::fs::read(&path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        evidence.push((slot_type, EvidenceFile::new(file_name, bytes)));
    }

    let submissions = evidence.into_iter().map(|(slot_type, file)| {
        let file_name = file.file_name.clone();
        let session = &session;
        async move {
            let result = session.upload(file, slot_type.clone()).await;
            upload_line(slot_type.to_string(), file_name, result)
        }
    });
    let uploads = join_all(submissions).await;

    let summary = session.summary();
    let report = UploadReport {
        context: session.context(),
        visibility: session.visibility(),
        uploads,
        slots: session.slot_views(),
        completion_percent: summary.completion_percent(),
        summary,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&report);
    }
    Ok(())
}

fn upload_line(
    slot_type: String,
    file_name: String,
    result: Result<UploadOutcome, SubmitError>,
) -> UploadLine {
    match result {
        Ok(outcome) => UploadLine {
            slot_type,
            file_name,
            outcome: outcome.kind.label().to_string(),
            document_id: (!outcome.record.id.is_provisional())
                .then(|| outcome.record.id.as_str().to_string()),
        },
        Err(err) => UploadLine {
            slot_type,
            file_name,
            outcome: format!("refused: {err}"),
            document_id: None,
        },
    }
}

fn render_report(report: &UploadReport<'_>) {
    match &report.context.dispute_id {
        Some(id) => println!("Evidence for {} (case {})", report.context.category, id),
        None => println!("Evidence for {}", report.context.category),
    }
    println!("Visibility: {}", report.visibility);

    println!("\nUploads");
    for line in &report.uploads {
        match &line.document_id {
            Some(id) => println!(
                "- {} <- {}: {} (document {})",
                line.slot_type, line.file_name, line.outcome, id
            ),
            None => println!("- {} <- {}: {}", line.slot_type, line.file_name, line.outcome),
        }
    }

    println!("\nChecklist");
    for view in &report.slots {
        let marker = if view.slot.required { "*" } else { " " };
        let detail = view
            .record
            .as_ref()
            .map(|record| {
                let hash = record
                    .content_hash
                    .as_ref()
                    .map(|hash| format!(" | hash {}", hash.as_str()))
                    .unwrap_or_default();
                let confidence = record
                    .extraction_confidence()
                    .map(|value| format!(" | confidence {value:.1}%"))
                    .unwrap_or_default();
                format!(" | {}{}{}", record.file_name, confidence, hash)
            })
            .unwrap_or_default();
        println!(
            "{} {}: {}{}",
            marker,
            view.slot.label,
            view.status_label(),
            detail
        );
    }

    let summary = &report.summary;
    println!(
        "\n{}% complete | {} of {} required | {} uploaded | {} extracted | {} awaiting legal review | {} hash secured",
        report.completion_percent,
        summary.required_count - summary.missing_required.len(),
        summary.required_count,
        summary.uploaded_count,
        summary.extraction_completed_count,
        summary.pending_legal_review_count,
        summary.hash_secured_count
    );
    if !summary.missing_required.is_empty() {
        let missing: Vec<&str> = summary
            .missing_required
            .iter()
            .map(|slot| slot.as_str())
            .collect();
        println!("Missing required: {}", missing.join(", "));
    }
}
