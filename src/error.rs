//! Typed errors, the error catalog, and HTTP mapping.

use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid primary key: model {model} field {field}")]
    InvalidPrimaryKey { model: String, field: String },
    #[error("duplicate model: {0}")]
    DuplicateModel(String),
    #[error("duplicate association '{alias}' on model {model}")]
    DuplicateAssociation { model: String, alias: String },
    #[error("unknown transport: {0}")]
    UnknownTransport(String),
    #[error("invalid id format: {0}")]
    InvalidIdFormat(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("route /{0} does not exist")]
    UnknownResource(String),
    #[error("invalid resource id '{0}'")]
    InvalidIdentifier(String),
    #[error("resource /{route}/{id} does not exist")]
    ResourceNotFound { route: String, id: String },
    #[error("route /{route} has no association named {association}")]
    UnknownAssociation { route: String, association: String },
    #[error("{0} multiple resources is not supported")]
    UnsupportedBatchOperation(&'static str),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("persistence: {0}")]
    PersistenceFault(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Rejected(msg) => AppError::Rejected(msg),
            other => AppError::PersistenceFault(other.to_string()),
        }
    }
}

/// `{"errors": {"title", "description"}}`, the single error shape on the wire.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDocument {
    pub errors: ErrorDetail,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub title: String,
    pub description: String,
}

fn document(title: &str, description: String) -> ErrorDocument {
    ErrorDocument {
        errors: ErrorDetail {
            title: title.to_string(),
            description,
        },
    }
}

/// Pure constructors for each failure kind.
pub mod catalog {
    use super::{document, ErrorDocument};

    pub fn route_does_not_exist(route: &str) -> ErrorDocument {
        document("Route does not exist", format!("The route /{} does not exist.", route))
    }

    pub fn invalid_resource_id(id: &str) -> ErrorDocument {
        document("Invalid resource id", format!("The resource id '{}' is invalid.", id))
    }

    pub fn does_not_exist(route: &str, id: &str) -> ErrorDocument {
        document(
            "Resource does not exist",
            format!("The resource /{}/{} does not exist.", route, id),
        )
    }

    pub fn assoc_does_not_exist(route: &str, association: &str) -> ErrorDocument {
        document(
            "Association does not exist",
            format!("The route /{} does not have any association named {}.", route, association),
        )
    }

    pub fn not_yet_implemented(operation: &str) -> ErrorDocument {
        document(
            "Not yet implemented",
            format!("{} multiple resources is not yet implemented.", operation),
        )
    }

    pub fn bad_request(reason: &str) -> ErrorDocument {
        document("Invalid request body", format!("The request body is invalid: {}.", reason))
    }

    pub fn rejected(reason: &str) -> ErrorDocument {
        document("Resource rejected", format!("The resource was rejected: {}.", reason))
    }

    pub fn internal() -> ErrorDocument {
        document(
            "Internal error",
            "The request could not be completed by the storage layer.".to_string(),
        )
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UnknownResource(_) => StatusCode::NOT_FOUND,
            AppError::InvalidIdentifier(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::UnknownAssociation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnsupportedBatchOperation(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::PersistenceFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn document(&self) -> ErrorDocument {
        match self {
            AppError::UnknownResource(route) => catalog::route_does_not_exist(route),
            AppError::InvalidIdentifier(id) => catalog::invalid_resource_id(id),
            AppError::ResourceNotFound { route, id } => catalog::does_not_exist(route, id),
            AppError::UnknownAssociation { route, association } => {
                catalog::assoc_does_not_exist(route, association)
            }
            AppError::UnsupportedBatchOperation(op) => catalog::not_yet_implemented(op),
            AppError::BadRequest(reason) => catalog::bad_request(reason),
            AppError::Rejected(reason) => catalog::rejected(reason),
            AppError::Config(_) | AppError::PersistenceFault(_) => catalog::internal(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(self.document())).into_response()
    }
}
