//! Document registry routes
//!
//! Every route sits behind the request gate. Writes also require the
//! `admin` or `superadmin` role.

use super::extractors::{field_failed, validation_failed, ValidJson};
use crate::auth::{auth_middleware, require_roles, AuthUser, ADMIN_ROLES};
use crate::error::{ApiError, ApiResult};
use crate::services::DocumentUpload;
use crate::state::AppState;
use crate::storage::UploadedFile;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use docvault_shared::validation::{parse_availability, validate_required};
use docvault_shared::{
    ApiResponse, CreateDocumentRequest, Document, DocumentListQuery, MessageResponse,
    UpdateDocumentRequest,
};
use std::collections::HashMap;
use tracing::debug;
use validator::Validate;

/// Multipart overhead allowed on top of the file size limit
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Create document routes
pub fn document_routes(state: AppState) -> Router<AppState> {
    let body_limit = usize::try_from(state.config().uploads.max_file_size_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    let reads = Router::new()
        .route("/", get(list_documents))
        .route("/:number", get(get_document));

    let writes = Router::new()
        .route("/", post(create_document))
        .route("/upload", post(create_document_with_file))
        .route("/:number", put(update_document).delete(delete_document))
        .route("/:number/upload", put(update_document_with_file))
        .route_layer(middleware::from_fn(require_roles(ADMIN_ROLES)))
        .layer(DefaultBodyLimit::max(body_limit));

    reads
        .merge(writes)
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// GET /api/v1/documents
async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<DocumentListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Document>>>> {
    let (documents, meta) = state.documents().list(&query).await?;
    Ok(Json(ApiResponse::paginated(documents, meta)))
}

/// GET /api/v1/documents/:number
async fn get_document(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<Json<ApiResponse<Document>>> {
    let document = state.documents().get(&number).await?;
    Ok(Json(ApiResponse::ok(document)))
}

/// POST /api/v1/documents
async fn create_document(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(req): ValidJson<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Document>>)> {
    debug!(user_id = %user.id, number = %req.number, "Creating document");
    let document = state.documents().create(&req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(document))))
}

/// POST /api/v1/documents/upload
async fn create_document_with_file(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Document>>)> {
    let (upload, file) = DocumentForm::read(multipart).await?.into_upload()?;
    debug!(user_id = %user.id, number = %upload.number, file = %file.file_name, "Uploading document");
    let document = state.documents().create_with_file(upload, file).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(document))))
}

/// PUT /api/v1/documents/:number
async fn update_document(
    State(state): State<AppState>,
    Path(number): Path<String>,
    ValidJson(changes): ValidJson<UpdateDocumentRequest>,
) -> ApiResult<Json<ApiResponse<Document>>> {
    let document = state.documents().update(&number, &changes).await?;
    Ok(Json(ApiResponse::ok(document)))
}

/// PUT /api/v1/documents/:number/upload
async fn update_document_with_file(
    State(state): State<AppState>,
    Path(number): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ApiResponse<Document>>> {
    let (changes, file) = DocumentForm::read(multipart).await?.into_changes()?;
    let document = state
        .documents()
        .update_with_file(&number, changes, file)
        .await?;
    Ok(Json(ApiResponse::ok(document)))
}

/// DELETE /api/v1/documents/:number
async fn delete_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    debug!(user_id = %user.id, number = %number, "Deleting document");
    let message = state.documents().delete(&number).await?;
    Ok(Json(ApiResponse::ok(message)))
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::BadRequest(err.body_text())
}

/// Text fields and the optional `file` part of a document form
#[derive(Debug, Default)]
struct DocumentForm {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl DocumentForm {
    async fn read(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was picked
                if !file_name.is_empty() || !bytes.is_empty() {
                    form.file = Some(UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn take_required(&mut self, name: &str) -> ApiResult<String> {
        let value = self.fields.remove(name).unwrap_or_default();
        validate_required(name, &value).map_err(field_failed)?;
        Ok(value)
    }

    fn into_upload(mut self) -> ApiResult<(DocumentUpload, UploadedFile)> {
        let upload = DocumentUpload {
            number: self.take_required("number")?,
            title: self.take_required("title")?,
            availability: parse_availability(&self.take_required("availability")?)
                .map_err(field_failed)?,
            project: self.take_required("project")?,
            discipline: self.take_required("discipline")?,
            wp: self.take_required("wp")?,
            lookup: self.take_required("lookup")?,
        };
        let file = self
            .file
            .ok_or_else(|| field_failed("file: File is required".to_string()))?;
        Ok((upload, file))
    }

    fn into_changes(mut self) -> ApiResult<(UpdateDocumentRequest, Option<UploadedFile>)> {
        let availability = self
            .fields
            .remove("availability")
            .map(|value| parse_availability(&value))
            .transpose()
            .map_err(field_failed)?;

        let changes = UpdateDocumentRequest {
            title: self.fields.remove("title"),
            availability,
            file_path: None,
            project: self.fields.remove("project"),
            discipline: self.fields.remove("discipline"),
            wp: self.fields.remove("wp"),
            lookup: self.fields.remove("lookup"),
        };
        changes.validate().map_err(|e| validation_failed(&e))?;

        Ok((changes, self.file))
    }
}
