use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use squares_engine::{PoolDatabaseError, PoolQueryError, SettlementError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("A valid admin token is required for this request.")]
    AdminTokenRequired,
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state of the pool. {0}")]
    Conflict(String),
    #[error("The request cannot be applied to this pool. {0}")]
    Unprocessable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AdminTokenRequired => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<PoolQueryError> for ServerError {
    fn from(e: PoolQueryError) -> Self {
        match e {
            PoolQueryError::PoolNotFound(_) => Self::NoRecordFound(e.to_string()),
            PoolQueryError::Database(e) => Self::from(e),
        }
    }
}

impl From<PoolDatabaseError> for ServerError {
    fn from(e: PoolDatabaseError) -> Self {
        match e {
            PoolDatabaseError::PoolNotFound(_) => Self::NoRecordFound(e.to_string()),
            PoolDatabaseError::VersionConflict { .. } |
            PoolDatabaseError::AlreadyLocked(_) |
            PoolDatabaseError::PoolLocked(_) |
            PoolDatabaseError::AxisImmutable { .. } |
            PoolDatabaseError::SquareTaken { .. } => Self::Conflict(e.to_string()),
            PoolDatabaseError::InvalidSquare(_) | PoolDatabaseError::InvalidRules(_) => {
                Self::Unprocessable(e.to_string())
            },
            PoolDatabaseError::DriverError(_) | PoolDatabaseError::CorruptData(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<SettlementError> for ServerError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::Database(e) => Self::from(e),
            SettlementError::PoolNotFound(_) => Self::NoRecordFound(e.to_string()),
            SettlementError::Suspended { .. } | SettlementError::Conflict { .. } => Self::Conflict(e.to_string()),
            SettlementError::Configuration(_) | SettlementError::Sync(_) => Self::Unprocessable(e.to_string()),
            SettlementError::InvalidSimulation(_) => Self::InvalidRequestBody(e.to_string()),
        }
    }
}
