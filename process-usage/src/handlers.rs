//! Handlers for the process endpoints.
//!
//! Every response, success or failure, is wrapped in a [`ProcessView`].

use crate::process_record::{ProcessInput, ProcessRecord, validate_batch};
use crate::process_time::ParseError;
use crate::store::{ProcessStore, StoreError};
use crate::view::{self, DEFAULT_ERROR_MESSAGE, ProcessView, Status};
use axum::{
    Extension, Json,
    extract::{
        Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub type SharedProcessStore = Arc<dyn ProcessStore>;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// Unified error type for process handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("The request body is too large.")]
    PayloadTooLarge,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Parse(_) | ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(StoreError::DuplicateKey(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Message shown to the caller. Storage details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Store(StoreError::Storage(_)) => DEFAULT_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(view::error(&self.public_message()))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn log_failure(operation: &str, pid: Option<i32>, err: &ApiError) {
    let pid = pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
    match err {
        ApiError::Store(StoreError::Storage(detail)) => {
            error!("{operation} failed pid={pid}: {detail}");
        }
        other => warn!("{operation} rejected pid={pid}: {other}"),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Get a process by pid.
#[instrument(skip_all)]
pub async fn get_process(
    Extension(store): Extension<SharedProcessStore>,
    pid: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<ProcessView<ProcessRecord>>> {
    let Path(pid) = pid
        .map_err(ApiError::from)
        .inspect_err(|e| log_failure("get_process", None, e))?;
    let record = store
        .get_one(pid)
        .await
        .map_err(ApiError::from)
        .inspect_err(|e| log_failure("get_process", Some(pid), e))?;
    Ok(Json(view::success(
        record,
        "The process was retrieved successfully.",
    )))
}

/// List processes ordered by pid.
#[instrument(skip_all)]
pub async fn list_processes(
    Extension(store): Extension<SharedProcessStore>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ProcessView<Vec<ProcessRecord>>>> {
    let Query(params) = params
        .map_err(ApiError::from)
        .inspect_err(|e| log_failure("list_processes", None, e))?;
    let limit = params.limit.min(MAX_LIMIT);
    let records = store
        .list_all(params.skip, limit)
        .await
        .map_err(ApiError::from)
        .inspect_err(|e| log_failure("list_processes", None, e))?;
    Ok(Json(view::success(
        records,
        "The processes were retrieved successfully.",
    )))
}

/// Insert one process. Fails when the pid is already stored.
#[instrument(skip_all)]
pub async fn create_process(
    Extension(store): Extension<SharedProcessStore>,
    body: Result<Json<ProcessInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProcessView<ProcessRecord>>)> {
    let Json(input) = body
        .map_err(ApiError::from)
        .inspect_err(|e| log_failure("create_process", None, e))?;
    let pid = input.id;
    let record = input
        .validate()
        .map_err(ApiError::from)
        .inspect_err(|e| log_failure("create_process", Some(pid), e))?;
    store
        .insert_one(&record)
        .await
        .map_err(ApiError::from)
        .inspect_err(|e| log_failure("create_process", Some(pid), e))?;
    info!("created process pid={pid}");
    Ok((
        StatusCode::CREATED,
        Json(view::success(
            record,
            "The process was created successfully.",
        )),
    ))
}

/// Replace the whole process set with the request body.
///
/// The body is validated before the store is touched. Once validated, a failed
/// insert leaves the store empty.
#[instrument(skip_all)]
pub async fn create_processes(
    Extension(store): Extension<SharedProcessStore>,
    body: Result<Json<Vec<ProcessInput>>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProcessView<Vec<ProcessRecord>>>)> {
    let Json(inputs) = body
        .map_err(ApiError::from)
        .inspect_err(|e| log_failure("create_processes", None, e))?;
    let records = validate_batch(inputs)
        .map_err(ApiError::from)
        .inspect_err(|e| {
            let pid = match e {
                ApiError::Parse(parse_error) => parse_error.pid,
                _ => None,
            };
            log_failure("create_processes", pid, e)
        })?;
    store
        .replace_all(&records)
        .await
        .map_err(ApiError::from)
        .inspect_err(|e| {
            let pid = match e {
                ApiError::Store(StoreError::DuplicateKey(pid)) => *pid,
                _ => None,
            };
            log_failure("create_processes", pid, e)
        })?;
    info!("replaced process set with {} processes", records.len());
    Ok((
        StatusCode::CREATED,
        Json(view::success(
            records,
            "The processes were created successfully.",
        )),
    ))
}

/// Liveness probe.
pub async fn health() -> Json<ProcessView<()>> {
    Json(ProcessView {
        status: Status::Success,
        message: String::from("ok"),
        data: None,
    })
}
