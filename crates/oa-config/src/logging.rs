//! Output format of the CLI's log records.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How `oa-provision` renders log records on standard error or the log file.
///
/// Parsed case-insensitively from `--log-format`, `OA_LOG_FORMAT` or the
/// `log_format` key of the configuration file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per record, fields flattened.
    #[default]
    Json,
    /// Single-line text for interactive runs.
    Compact,
}
