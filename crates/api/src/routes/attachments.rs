//! Attachment routes for the four owner-scoped resources.
//!
//! Patients, encounters, inventory transactions, and inventory transfers
//! each expose the same attachment surface. Handlers are generic over an
//! [`OwnerFacet`] that binds the owner kind to its store and lookup, so
//! the four resources cannot drift apart.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use mediref_core::attachment::{
    Attachment, AttachmentError, AttachmentService, AttachmentSource, AttachmentStore,
    AttachmentType, ClassificationPatch, OwnerKind, OwnerLookup, UploadInput,
};
use mediref_core::storage::{PresignedDownload, StorageError};
use mediref_db::{
    EncounterAttachmentStore, EncounterLookup, InventoryTransactionAttachmentStore,
    InventoryTransactionLookup, InventoryTransferAttachmentStore, InventoryTransferLookup,
    PatientAttachmentStore, PatientLookup,
};

use crate::AppState;
use crate::extractors::CallerIdentity;

/// Binds an owner kind to its metadata store and owner lookup.
pub trait OwnerFacet: Send + Sync + 'static {
    /// Owner kind served by this facet.
    const KIND: OwnerKind;
    /// Metadata store for this owner's attachment table.
    type Store: AttachmentStore + 'static;
    /// Existence lookup against the owner table.
    type Lookup: OwnerLookup + 'static;

    /// Build the store from a connection.
    fn store(db: &DatabaseConnection) -> Self::Store;
    /// Build the lookup from a connection.
    fn lookup(db: &DatabaseConnection) -> Self::Lookup;
}

/// Patient attachment facet.
pub struct PatientOwner;

impl OwnerFacet for PatientOwner {
    const KIND: OwnerKind = OwnerKind::Patient;
    type Store = PatientAttachmentStore;
    type Lookup = PatientLookup;

    fn store(db: &DatabaseConnection) -> Self::Store {
        PatientAttachmentStore::new(db.clone())
    }

    fn lookup(db: &DatabaseConnection) -> Self::Lookup {
        PatientLookup::new(db.clone())
    }
}

/// Encounter attachment facet.
pub struct EncounterOwner;

impl OwnerFacet for EncounterOwner {
    const KIND: OwnerKind = OwnerKind::Encounter;
    type Store = EncounterAttachmentStore;
    type Lookup = EncounterLookup;

    fn store(db: &DatabaseConnection) -> Self::Store {
        EncounterAttachmentStore::new(db.clone())
    }

    fn lookup(db: &DatabaseConnection) -> Self::Lookup {
        EncounterLookup::new(db.clone())
    }
}

/// Inventory transaction attachment facet.
pub struct InventoryTransactionOwner;

impl OwnerFacet for InventoryTransactionOwner {
    const KIND: OwnerKind = OwnerKind::InventoryTransaction;
    type Store = InventoryTransactionAttachmentStore;
    type Lookup = InventoryTransactionLookup;

    fn store(db: &DatabaseConnection) -> Self::Store {
        InventoryTransactionAttachmentStore::new(db.clone())
    }

    fn lookup(db: &DatabaseConnection) -> Self::Lookup {
        InventoryTransactionLookup::new(db.clone())
    }
}

/// Inventory transfer attachment facet.
pub struct InventoryTransferOwner;

impl OwnerFacet for InventoryTransferOwner {
    const KIND: OwnerKind = OwnerKind::InventoryTransfer;
    type Store = InventoryTransferAttachmentStore;
    type Lookup = InventoryTransferLookup;

    fn store(db: &DatabaseConnection) -> Self::Store {
        InventoryTransferAttachmentStore::new(db.clone())
    }

    fn lookup(db: &DatabaseConnection) -> Self::Lookup {
        InventoryTransferLookup::new(db.clone())
    }
}

fn service<F: OwnerFacet>(state: &AppState) -> AttachmentService<F::Store, F::Lookup> {
    AttachmentService::new(
        F::KIND,
        state.storage.clone(),
        Arc::new(F::store(&state.db)),
        Arc::new(F::lookup(&state.db)),
    )
}

/// Creates the attachment routes for all four owner resources.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Patients
        .route("/patients/{owner_id}/attachments", post(upload::<PatientOwner>))
        .route("/patients/{owner_id}/attachments", get(list::<PatientOwner>))
        .route(
            "/patients/attachments/{id}/download-url",
            post(download_url::<PatientOwner>),
        )
        .route(
            "/patients/attachments/{id}",
            delete(soft_delete::<PatientOwner>),
        )
        .route(
            "/patients/attachments/{id}",
            put(update_classification::<PatientOwner>),
        )
        .route(
            "/patients/{owner_id}/profile-picture",
            get(patient_profile_picture),
        )
        // Encounters
        .route(
            "/encounters/{owner_id}/attachments",
            post(upload::<EncounterOwner>),
        )
        .route(
            "/encounters/{owner_id}/attachments",
            get(list::<EncounterOwner>),
        )
        .route("/encounters/attachments", get(list_encounter_batch))
        .route(
            "/encounters/attachments/{id}/download-url",
            post(download_url::<EncounterOwner>),
        )
        .route(
            "/encounters/attachments/{id}",
            delete(soft_delete::<EncounterOwner>),
        )
        .route(
            "/encounters/attachments/{id}",
            put(update_classification::<EncounterOwner>),
        )
        // Inventory transactions
        .route(
            "/inventory-transactions/{owner_id}/attachments",
            post(upload::<InventoryTransactionOwner>),
        )
        .route(
            "/inventory-transactions/{owner_id}/attachments",
            get(list::<InventoryTransactionOwner>),
        )
        .route(
            "/inventory-transactions/attachments/{id}/download-url",
            post(download_url::<InventoryTransactionOwner>),
        )
        .route(
            "/inventory-transactions/attachments/{id}",
            delete(soft_delete::<InventoryTransactionOwner>),
        )
        // Inventory transfers
        .route(
            "/inventory-transfers/{owner_id}/attachments",
            post(upload::<InventoryTransferOwner>),
        )
        .route(
            "/inventory-transfers/{owner_id}/attachments",
            get(list::<InventoryTransferOwner>),
        )
        .route(
            "/inventory-transfers/attachments/{id}/download-url",
            post(download_url::<InventoryTransferOwner>),
        )
        .route(
            "/inventory-transfers/attachments/{id}",
            delete(soft_delete::<InventoryTransferOwner>),
        )
}

// ---------- request / response types ----------

/// Attachment representation returned by the API.
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    /// Attachment ID.
    pub id: Uuid,
    /// Owning entity ID.
    pub owner_id: Uuid,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Classification.
    #[serde(rename = "type")]
    pub attachment_type: &'static str,
    /// Origin tag, patient/encounter resources only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    /// Free-form classification details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Caller that created the attachment.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Presigned download URL, when one was issued with the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Seconds until the download URL expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url_expires_in: Option<u64>,
}

impl AttachmentResponse {
    fn from_domain(attachment: Attachment, ticket: Option<PresignedDownload>) -> Self {
        let (download_url, download_url_expires_in) = match ticket {
            Some(t) => (Some(t.url), Some(t.expires_in_secs)),
            None => (None, None),
        };
        Self {
            id: attachment.id,
            owner_id: attachment.owner_id,
            file_name: attachment.filename,
            mime_type: attachment.mime_type,
            size_bytes: attachment.size_bytes,
            attachment_type: attachment.attachment_type.as_str(),
            source: attachment.source.map(AttachmentSource::as_str),
            details: attachment.details,
            created_by: attachment.created_by,
            created_at: attachment.created_at,
            download_url,
            download_url_expires_in,
        }
    }
}

/// Presigned download ticket response.
#[derive(Debug, Serialize)]
pub struct DownloadUrlResponse {
    /// Time-limited URL the bearer fetches directly from the backend.
    pub download_url: String,
    /// Seconds until the URL expires.
    pub expires_in: u64,
}

impl From<PresignedDownload> for DownloadUrlResponse {
    fn from(t: PresignedDownload) -> Self {
        Self {
            download_url: t.url,
            expires_in: t.expires_in_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchListQuery {
    encounter_ids: String,
    source: Option<String>,
}

/// Classification update request. Binary identity fields are immutable
/// and not accepted here.
#[derive(Debug, Deserialize)]
pub struct UpdateClassificationRequest {
    /// New classification value.
    #[serde(rename = "type")]
    pub attachment_type: Option<String>,
    /// New details text.
    pub details: Option<String>,
}

struct UploadForm {
    bytes: Bytes,
    filename: String,
    mime_type: String,
    size_bytes: i64,
    attachment_type: AttachmentType,
    source: Option<AttachmentSource>,
    details: Option<String>,
}

// ---------- error mapping ----------

fn bad_request(code: &str, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": code, "message": message })),
    )
        .into_response()
}

fn error_meta(err: &AttachmentError) -> (StatusCode, &'static str) {
    match err {
        AttachmentError::InvalidAttachment(_) => (StatusCode::BAD_REQUEST, "invalid_attachment"),
        AttachmentError::OwnerNotFound(_) => (StatusCode::NOT_FOUND, "owner_not_found"),
        AttachmentError::Mismatch { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "attachment_mismatch")
        }
        AttachmentError::NotFound(_) => (StatusCode::NOT_FOUND, "attachment_not_found"),
        AttachmentError::DuplicateKey(_) => (StatusCode::CONFLICT, "duplicate_storage_key"),
        AttachmentError::Storage(storage) => match storage {
            StorageError::Unavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
            }
            StorageError::WriteRejected(_) => (StatusCode::BAD_GATEWAY, "storage_write_rejected"),
            StorageError::ObjectNotFound { .. } => (StatusCode::NOT_FOUND, "object_not_found"),
            StorageError::PresignNotSupported | StorageError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
        },
        AttachmentError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}

fn error_response(err: &AttachmentError) -> Response {
    let (status, code) = error_meta(err);
    let message = if status.is_server_error() {
        error!(error = %err, "attachment operation failed");
        "An internal error occurred".to_string()
    } else {
        err.to_string()
    };
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

// ---------- parsing helpers ----------

fn parse_source_param(
    raw: Option<&str>,
    kind: OwnerKind,
) -> Result<Option<AttachmentSource>, Response> {
    let Some(raw) = raw else { return Ok(None) };
    if !kind.has_source() {
        return Err(bad_request(
            "source_not_supported",
            "source filtering is not available for this resource",
        ));
    }
    AttachmentSource::parse(raw).map(Some).ok_or_else(|| {
        bad_request(
            "invalid_source",
            "source must be one of: profile_picture, document",
        )
    })
}

fn parse_type_param(raw: &str) -> Result<AttachmentType, Response> {
    AttachmentType::parse(raw).ok_or_else(|| {
        bad_request(
            "invalid_type",
            "type must be one of: lab_report, prescription, imaging, consent_form, other",
        )
    })
}

fn parse_id_csv(raw: &str) -> Result<Vec<Uuid>, Response> {
    let ids: Result<Vec<Uuid>, _> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Uuid::parse_str)
        .collect();
    match ids {
        Ok(ids) if !ids.is_empty() => Ok(ids),
        Ok(_) => Err(bad_request(
            "invalid_encounter_ids",
            "encounter_ids must contain at least one UUID",
        )),
        Err(_) => Err(bad_request(
            "invalid_encounter_ids",
            "encounter_ids must be a comma-separated list of UUIDs",
        )),
    }
}

/// Drains the multipart stream into an upload form.
///
/// The `file` part is required and supplies the filename, MIME type, and
/// payload. `size` overrides the declared size when present (some clients
/// report the pre-upload size separately); otherwise the payload length
/// stands in as the claim.
async fn read_upload_form(
    multipart: &mut Multipart,
    allow_source: bool,
) -> Result<UploadForm, Response> {
    let mut file: Option<(String, String, Bytes)> = None;
    let mut declared_size: Option<i64> = None;
    let mut attachment_type = AttachmentType::default();
    let mut source: Option<AttachmentSource> = None;
    let mut details: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(bad_request("invalid_multipart", &e.to_string()));
            }
        };

        match field.name().unwrap_or_default() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request("invalid_multipart", &e.to_string()))?;
                file = Some((filename, mime_type, bytes));
            }
            "size" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request("invalid_multipart", &e.to_string()))?;
                let parsed = text
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| bad_request("invalid_size", "size must be an integer"))?;
                declared_size = Some(parsed);
            }
            "type" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request("invalid_multipart", &e.to_string()))?;
                attachment_type = parse_type_param(text.trim())?;
            }
            "source" if allow_source => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request("invalid_multipart", &e.to_string()))?;
                source = AttachmentSource::parse(text.trim());
                if source.is_none() {
                    return Err(bad_request(
                        "invalid_source",
                        "source must be one of: profile_picture, document",
                    ));
                }
            }
            "details" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request("invalid_multipart", &e.to_string()))?;
                let text = text.trim().to_string();
                if !text.is_empty() {
                    details = Some(text);
                }
            }
            // Unknown fields (including "source" on inventory resources)
            // are ignored.
            _ => {}
        }
    }

    let Some((filename, mime_type, bytes)) = file else {
        return Err(bad_request(
            "missing_file",
            "multipart body must contain a 'file' part",
        ));
    };

    // i64 overflow is unreachable for realistic payloads.
    #[allow(clippy::cast_possible_wrap)]
    let size_bytes = declared_size.unwrap_or(bytes.len() as i64);

    Ok(UploadForm {
        bytes,
        filename,
        mime_type,
        size_bytes,
        attachment_type,
        source: if allow_source {
            Some(source.unwrap_or_default())
        } else {
            None
        },
        details,
    })
}

// ---------- handlers ----------

/// POST `/{resource}/{owner_id}/attachments`
async fn upload<F: OwnerFacet>(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(owner_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_upload_form(&mut multipart, F::KIND.has_source()).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let svc = service::<F>(&state);
    let result = svc
        .upload(UploadInput {
            owner_id,
            bytes: form.bytes,
            filename: form.filename,
            mime_type: form.mime_type,
            size_bytes: form.size_bytes,
            attachment_type: form.attachment_type,
            source: form.source,
            details: form.details,
            created_by: caller.0,
        })
        .await;

    match result {
        Ok(attachment) => {
            info!(
                attachment_id = %attachment.id,
                owner_id = %owner_id,
                resource = F::KIND.key_prefix(),
                size_bytes = attachment.size_bytes,
                "attachment uploaded"
            );
            // A failed presign does not fail the upload; the caller can
            // request a fresh ticket later.
            let ticket = match svc.download_url(attachment.id).await {
                Ok(ticket) => Some(ticket),
                Err(e) => {
                    warn!(attachment_id = %attachment.id, error = %e, "presign after upload failed");
                    None
                }
            };
            (
                StatusCode::CREATED,
                Json(AttachmentResponse::from_domain(attachment, ticket)),
            )
                .into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET `/{resource}/{owner_id}/attachments`
async fn list<F: OwnerFacet>(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(owner_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Response {
    let source = match parse_source_param(query.source.as_deref(), F::KIND) {
        Ok(source) => source,
        Err(response) => return response,
    };

    match service::<F>(&state).list(&[owner_id], source).await {
        Ok(attachments) => {
            let items: Vec<AttachmentResponse> = attachments
                .into_iter()
                .map(|a| AttachmentResponse::from_domain(a, None))
                .collect();
            Json(json!({ "attachments": items })).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET `/encounters/attachments?encounter_ids=a,b,c`
///
/// Batch listing across encounters, e.g. every attachment in a visit
/// history. Only encounters need this shape.
async fn list_encounter_batch(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Query(query): Query<BatchListQuery>,
) -> Response {
    let owner_ids = match parse_id_csv(&query.encounter_ids) {
        Ok(ids) => ids,
        Err(response) => return response,
    };
    let source = match parse_source_param(query.source.as_deref(), OwnerKind::Encounter) {
        Ok(source) => source,
        Err(response) => return response,
    };

    match service::<EncounterOwner>(&state)
        .list(&owner_ids, source)
        .await
    {
        Ok(attachments) => {
            let items: Vec<AttachmentResponse> = attachments
                .into_iter()
                .map(|a| AttachmentResponse::from_domain(a, None))
                .collect();
            Json(json!({ "attachments": items })).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// POST `/{resource}/attachments/{id}/download-url`
async fn download_url<F: OwnerFacet>(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Response {
    match service::<F>(&state).download_url(id).await {
        Ok(ticket) => Json(DownloadUrlResponse::from(ticket)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/patients/{owner_id}/profile-picture`
///
/// Resolves the most recent active profile picture straight to a download
/// ticket.
async fn patient_profile_picture(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(owner_id): Path<Uuid>,
) -> Response {
    match service::<PatientOwner>(&state)
        .latest_download_url(owner_id, AttachmentSource::ProfilePicture)
        .await
    {
        Ok(ticket) => Json(DownloadUrlResponse::from(ticket)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// DELETE `/{resource}/attachments/{id}`
async fn soft_delete<F: OwnerFacet>(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Response {
    match service::<F>(&state).soft_delete(id).await {
        Ok(()) => {
            info!(
                attachment_id = %id,
                resource = F::KIND.key_prefix(),
                deleted_by = %caller.0,
                "attachment soft-deleted"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// PUT `/{resource}/attachments/{id}`
async fn update_classification<F: OwnerFacet>(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClassificationRequest>,
) -> Response {
    let attachment_type = match request.attachment_type.as_deref() {
        Some(raw) => match parse_type_param(raw.trim()) {
            Ok(t) => Some(t),
            Err(response) => return response,
        },
        None => None,
    };
    let patch = ClassificationPatch {
        attachment_type,
        details: request.details,
    };

    match service::<F>(&state).update_classification(id, patch).await {
        Ok(attachment) => Json(AttachmentResponse::from_domain(attachment, None)).into_response(),
        Err(e) => error_response(&e),
    }
}
