//! Document registry service

use crate::error::{ApiError, ApiResult};
use crate::pagination::PageRequest;
use crate::repositories::{DocumentFilter, DocumentStore, StoreError};
use crate::storage::{FileStorage, FileStorageError, StoredFile, UploadedFile};
use docvault_shared::{
    CreateDocumentRequest, Document, DocumentListQuery, MessageResponse, PaginationMeta,
    UpdateDocumentRequest,
};
use std::sync::Arc;
use tracing::info;

pub const DOCUMENT_NOT_FOUND: &str = "Document not found";
pub const DOCUMENT_EXISTS: &str = "Document with this number already exists";
pub const NO_FIELDS_TO_UPDATE: &str = "No fields to update";

/// Document metadata that arrives alongside a multipart upload
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub number: String,
    pub title: String,
    pub availability: bool,
    pub project: String,
    pub discipline: String,
    pub wp: String,
    pub lookup: String,
}

impl DocumentUpload {
    fn with_file_path(self, file_path: String) -> CreateDocumentRequest {
        CreateDocumentRequest {
            number: self.number,
            title: self.title,
            availability: self.availability,
            file_path,
            project: self.project,
            discipline: self.discipline,
            wp: self.wp,
            lookup: self.lookup,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn storage_error(err: FileStorageError) -> ApiError {
    match err {
        FileStorageError::Io(_) => ApiError::infrastructure(err.to_string(), err),
        rejected => ApiError::BadRequest(rejected.to_string()),
    }
}

fn create_error(err: StoreError) -> ApiError {
    match err {
        StoreError::AlreadyExists => ApiError::Conflict(DOCUMENT_EXISTS.to_string()),
        other => ApiError::infrastructure("Failed to create document", other),
    }
}

#[derive(Clone)]
pub struct DocumentService {
    documents: Arc<dyn DocumentStore>,
    files: FileStorage,
}

impl DocumentService {
    pub fn new(documents: Arc<dyn DocumentStore>, files: FileStorage) -> Self {
        Self { documents, files }
    }

    pub async fn list(&self, query: &DocumentListQuery) -> ApiResult<(Vec<Document>, PaginationMeta)> {
        let page = PageRequest::from_query(query.page.as_deref(), query.limit.as_deref())?;
        let filter = DocumentFilter {
            search: non_empty(&query.search),
            project: non_empty(&query.project),
            discipline: non_empty(&query.discipline),
        };

        let (documents, total) = self
            .documents
            .list(&filter, page.limit, page.offset())
            .await
            .map_err(|e| ApiError::infrastructure("Failed to retrieve documents", e))?;

        Ok((documents, page.meta(total)))
    }

    pub async fn get(&self, number: &str) -> ApiResult<Document> {
        self.documents
            .find(number)
            .await
            .map_err(|e| ApiError::infrastructure("Failed to retrieve document", e))?
            .ok_or_else(|| ApiError::NotFound(DOCUMENT_NOT_FOUND.to_string()))
    }

    /// 409 when the number is taken. The insert itself also maps a unique
    /// violation to 409, which covers concurrent creates.
    async fn ensure_number_available(&self, number: &str) -> ApiResult<()> {
        let taken = self
            .documents
            .exists(number)
            .await
            .map_err(|e| ApiError::infrastructure("Failed to create document", e))?;
        if taken {
            return Err(ApiError::Conflict(DOCUMENT_EXISTS.to_string()));
        }
        Ok(())
    }

    pub async fn create(&self, req: &CreateDocumentRequest) -> ApiResult<Document> {
        self.ensure_number_available(&req.number).await?;
        let document = self.documents.create(req).await.map_err(create_error)?;
        info!(number = %document.number, "Document created");
        Ok(document)
    }

    /// Store the file, then insert the row. The file is removed again if
    /// the insert fails.
    pub async fn create_with_file(
        &self,
        upload: DocumentUpload,
        file: UploadedFile,
    ) -> ApiResult<Document> {
        self.ensure_number_available(&upload.number).await?;

        let stored = self.files.save(&file).await.map_err(storage_error)?;
        let req = upload.with_file_path(stored.file_path.clone());

        match self.documents.create(&req).await {
            Ok(document) => {
                info!(number = %document.number, file = %stored.file_name, "Document created with file");
                Ok(document)
            }
            Err(e) => {
                self.files.delete(&stored.file_path).await;
                Err(create_error(e))
            }
        }
    }

    pub async fn update(&self, number: &str, changes: &UpdateDocumentRequest) -> ApiResult<Document> {
        if changes.is_empty() {
            return Err(ApiError::BadRequest(NO_FIELDS_TO_UPDATE.to_string()));
        }

        self.documents
            .update(number, changes)
            .await
            .map_err(|e| ApiError::infrastructure("Failed to update document", e))?
            .ok_or_else(|| ApiError::NotFound(DOCUMENT_NOT_FOUND.to_string()))
    }

    /// Update metadata and optionally replace the attached file. The old
    /// file is deleted only once the row points at the new one.
    pub async fn update_with_file(
        &self,
        number: &str,
        mut changes: UpdateDocumentRequest,
        file: Option<UploadedFile>,
    ) -> ApiResult<Document> {
        let existing = self.get(number).await?;

        let replacement: Option<StoredFile> = match file {
            Some(file) => Some(self.files.save(&file).await.map_err(storage_error)?),
            None => None,
        };
        if let Some(stored) = &replacement {
            changes.file_path = Some(stored.file_path.clone());
        }

        if changes.is_empty() {
            return Err(ApiError::BadRequest(NO_FIELDS_TO_UPDATE.to_string()));
        }

        let outcome = self
            .documents
            .update(number, &changes)
            .await
            .map_err(|e| ApiError::infrastructure("Failed to update document", e))
            .and_then(|updated| {
                updated.ok_or_else(|| ApiError::NotFound(DOCUMENT_NOT_FOUND.to_string()))
            });

        match (outcome, replacement) {
            (Ok(document), Some(_)) => {
                self.files.delete(&existing.file_path).await;
                Ok(document)
            }
            (Ok(document), None) => Ok(document),
            (Err(e), Some(stored)) => {
                self.files.delete(&stored.file_path).await;
                Err(e)
            }
            (Err(e), None) => Err(e),
        }
    }

    /// Delete the row, then its file. A missing or undeletable file does
    /// not fail the request.
    pub async fn delete(&self, number: &str) -> ApiResult<MessageResponse> {
        self.get(number).await?;

        let deleted = self
            .documents
            .delete(number)
            .await
            .map_err(|e| ApiError::infrastructure("Failed to delete document", e))?
            .ok_or_else(|| ApiError::NotFound(DOCUMENT_NOT_FOUND.to_string()))?;

        self.files.delete(&deleted.file_path).await;
        info!(number = %deleted.number, "Document deleted");

        Ok(MessageResponse::new("Document deleted successfully"))
    }
}
