use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use dispute_evidence::workflows::evidence::{
    DisputeContext, DisputeSession, DocumentCatalog, DocumentId, EvidenceFile, ExtractionStatus,
    GatewayError, HttpVerificationClient, SlotType, UploadOutcomeKind, VerificationGateway,
    VerificationRequest, VerificationStatus, Visibility,
};
use serde_json::{json, Value};

#[derive(Debug, Clone, Default)]
struct ReceivedUpload {
    fields: BTreeMap<String, String>,
    file_name: Option<String>,
    file_content_type: Option<String>,
    file_len: usize,
    authorization: Option<String>,
}

type Received = Arc<Mutex<Vec<ReceivedUpload>>>;

async fn upload_handler(
    State(received): State<Received>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut upload = ReceivedUpload {
        authorization: headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        ..ReceivedUpload::default()
    };

    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            upload.file_name = field.file_name().map(str::to_string);
            upload.file_content_type = field.content_type().map(str::to_string);
            upload.file_len = field.bytes().await.expect("file bytes").len();
        } else {
            let value = field.text().await.expect("text field");
            upload.fields.insert(name, value);
        }
    }

    let document_type = upload
        .fields
        .get("documentType")
        .cloned()
        .unwrap_or_default();
    let file_name = upload.file_name.clone().unwrap_or_default();
    let file_len = upload.file_len;
    received.lock().expect("received mutex").push(upload);

    let body = match document_type.as_str() {
        "land_deed" => json!({
            "success": true,
            "document": {
                "id": "d1",
                "fileName": file_name,
                "fileSize": file_len,
                "documentType": "land_deed"
            },
            "extraction": {
                "extracted": true,
                "confidence": 92.5,
                "analysis": {"suggestedType": "land_deed", "keywordsFound": ["survey", "registry"]},
                "relevanceCheck": {"isRelevant": true}
            },
            "contentAddressing": {"hash": "abc123"}
        }),
        "site_photographs" => json!({
            "success": true,
            "document": {"id": 77, "fileName": file_name, "fileSize": file_len},
            "extraction": {"extracted": false},
            "contentAddressing": {"hash": "photohash"}
        }),
        _ => json!({"success": false, "error": "document type not accepted"}),
    };
    Json(body)
}

async fn broken_handler() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, "upstream extraction worker crashed")
}

async fn garbled_handler() -> impl IntoResponse {
    (StatusCode::OK, "<html>maintenance</html>")
}

async fn spawn_fake_service() -> (SocketAddr, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/api/documents/upload", post(upload_handler))
        .route("/broken", post(broken_handler))
        .route("/garbled", post(garbled_handler))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake service runs");
    });
    (addr, received)
}

fn deed() -> EvidenceFile {
    EvidenceFile::new("deed.pdf", vec![0x25; 2 * 1024 * 1024])
}

#[tokio::test]
async fn deed_round_trip_through_http_client() {
    let (addr, received) = spawn_fake_service().await;
    let client = HttpVerificationClient::new(format!("http://{addr}/api/documents/upload"))
        .with_api_token("secret-token");
    let session = DisputeSession::new(
        DisputeContext::new("mutual-partition").with_dispute_id("case-9"),
        &DocumentCatalog::standard(),
        Arc::new(client),
    );

    let outcome = session
        .upload(deed(), SlotType::new("land_deed"))
        .await
        .expect("accepted");

    assert_eq!(outcome.kind, UploadOutcomeKind::Resolved);
    let record = session
        .document(&SlotType::new("land_deed"))
        .expect("deed present");
    assert_eq!(record.id, DocumentId::Issued("d1".to_string()));
    assert_eq!(record.extraction_status(), ExtractionStatus::Completed);
    assert_eq!(
        record.verification_status,
        VerificationStatus::ExtractionProcessed
    );
    assert_eq!(
        record.content_hash.as_ref().map(|hash| hash.as_str()),
        Some("abc123")
    );
    assert!(record.extracted_info().map(|info| info.is_relevant).unwrap_or(false));

    let uploads = received.lock().expect("received mutex").clone();
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert_eq!(upload.file_name.as_deref(), Some("deed.pdf"));
    assert_eq!(upload.file_content_type.as_deref(), Some("application/pdf"));
    assert_eq!(upload.file_len, 2 * 1024 * 1024);
    assert_eq!(upload.fields.get("documentType").map(String::as_str), Some("land_deed"));
    assert_eq!(
        upload.fields.get("disputeType").map(String::as_str),
        Some("mutual-partition")
    );
    assert_eq!(
        upload.fields.get("visibility").map(String::as_str),
        Some("shared-with-reviewer")
    );
    assert_eq!(upload.fields.get("disputeId").map(String::as_str), Some("case-9"));
    assert_eq!(upload.authorization.as_deref(), Some("Bearer secret-token"));
}

#[tokio::test]
async fn service_failure_and_partial_extraction_over_http() {
    let (addr, received) = spawn_fake_service().await;
    let client = HttpVerificationClient::new(format!("http://{addr}/api/documents/upload"));
    let session = DisputeSession::new(
        DisputeContext::new("encroachment"),
        &DocumentCatalog::standard(),
        Arc::new(client),
    )
    .with_visibility(Visibility::Private);

    let rejected = session
        .upload(
            EvidenceFile::new("map.png", vec![1; 64]),
            SlotType::new("survey_map"),
        )
        .await
        .expect("accepted");
    assert_eq!(rejected.kind, UploadOutcomeKind::ServiceRejected);
    assert!(rejected.record.content_hash.is_none());
    assert_eq!(rejected.record.verification_status, VerificationStatus::Pending);

    let photos = session
        .upload(
            EvidenceFile::new("site.jpg", vec![2; 64]),
            SlotType::new("site_photographs"),
        )
        .await
        .expect("accepted");
    assert_eq!(photos.kind, UploadOutcomeKind::ExtractionFailed);
    assert_eq!(photos.record.id, DocumentId::Issued("77".to_string()));
    assert_eq!(
        photos.record.content_hash.as_ref().map(|hash| hash.as_str()),
        Some("photohash")
    );

    let summary = session.summary();
    assert_eq!(summary.uploaded_count, 1);
    assert_eq!(summary.hash_secured_count, 1);
    assert_eq!(summary.extraction_completed_count, 0);

    let uploads = received.lock().expect("received mutex").clone();
    assert!(uploads.iter().all(|upload| upload.authorization.is_none()));
    assert!(uploads
        .iter()
        .all(|upload| upload.fields.get("disputeId").is_none()));
    assert!(uploads
        .iter()
        .all(|upload| upload.fields.get("visibility").map(String::as_str) == Some("private")));
}

#[tokio::test]
async fn non_success_status_and_garbled_body_surface_as_gateway_errors() {
    let (addr, _received) = spawn_fake_service().await;
    let request = || VerificationRequest {
        file: EvidenceFile::new("deed.pdf", vec![3; 32]),
        document_type: SlotType::new("land_deed"),
        dispute_type: "mutual-partition".to_string(),
        visibility: Visibility::Public,
        dispute_id: None,
    };

    let broken = HttpVerificationClient::new(format!("http://{addr}/broken"));
    match broken.verify(request()).await {
        Err(GatewayError::Server { status, body }) => {
            assert_eq!(status, 502);
            assert!(body.contains("crashed"));
        }
        other => panic!("expected server error, got {other:?}"),
    }

    let garbled = HttpVerificationClient::new(format!("http://{addr}/garbled"));
    assert!(matches!(
        garbled.verify(request()).await,
        Err(GatewayError::Decode(_))
    ));
}

#[tokio::test]
async fn transport_errors_leave_failed_records() {
    let (addr, _received) = spawn_fake_service().await;
    let broken = Arc::new(HttpVerificationClient::new(format!("http://{addr}/broken")));
    let session = DisputeSession::new(
        DisputeContext::new("mutual-partition"),
        &DocumentCatalog::standard(),
        broken,
    );

    let outcome = session
        .upload(deed(), SlotType::new("land_deed"))
        .await
        .expect("accepted");
    assert_eq!(outcome.kind, UploadOutcomeKind::TransportFailed);

    let record = session
        .document(&SlotType::new("land_deed"))
        .expect("failed record kept");
    assert!(record.id.is_provisional());
    assert_eq!(record.extraction_status(), ExtractionStatus::Failed);
    assert!(record.content_hash.is_none());
    assert_eq!(record.verification_status, VerificationStatus::Pending);
}
