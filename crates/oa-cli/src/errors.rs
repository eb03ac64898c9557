//! Error types for the CLI runtime.

use std::sync::Arc;

use thiserror::Error;

use oa_api::{ApiError, LicenseError};

use crate::telemetry::TelemetryError;
use crate::update::HotfixError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    License(#[from] LicenseError),
    #[error(transparent)]
    Hotfix(#[from] HotfixError),
}
