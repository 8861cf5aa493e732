// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use http::StatusCode;
use recoverable::RecoveryInfo;

/// Classifies an HTTP status for retry.
///
/// Success statuses are never retried. Every other status, informational and redirection
/// included, is retried.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use recoverable::RecoveryKind;
/// use respite::service::classify_status;
///
/// assert_eq!(classify_status(StatusCode::OK).kind(), RecoveryKind::Never);
/// assert_eq!(classify_status(StatusCode::SERVICE_UNAVAILABLE).kind(), RecoveryKind::Retry);
/// ```
#[must_use]
pub fn classify_status(status: StatusCode) -> RecoveryInfo {
    if status.is_success() {
        RecoveryInfo::never()
    } else {
        RecoveryInfo::retry()
    }
}
