// This file is part of chainlake.
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The internal error taxonomy (§4.7) and the single boundary that converts it to RPC status.

use log::Level;
use thiserror::Error;
use tonic::{Code, Status};

/// Internal failure modes raised by the serving core's components.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("item not found")]
    ItemNotFound,

    #[error("no event history: {0}")]
    NoEventHistory(String),

    #[error("invalid event id: {0}")]
    InvalidEventId(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("invalid height: {0}")]
    InvalidHeight(String),

    #[error("invalid parser input: {0}")]
    InvalidParserInput(String),

    #[error("invalid chain: {0}")]
    InvalidChain(String),

    #[error("request canceled")]
    RequestCanceled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("not implemented")]
    NotImplemented,

    #[error("shutting down")]
    ShuttingDown,

    #[error("idle timeout")]
    IdleTimeout,

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// An opaque, already-logged internal failure with no further taxonomy; maps to `INTERNAL`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InternalError(pub String);

impl ErrorKind {
    /// The RPC status code this error kind maps to (§4.7).
    pub fn code(&self) -> Code {
        match self {
            ErrorKind::ItemNotFound => Code::NotFound,
            ErrorKind::NoEventHistory(_)
            | ErrorKind::InvalidEventId(_)
            | ErrorKind::OutOfRange(_)
            | ErrorKind::InvalidHeight(_)
            | ErrorKind::InvalidParserInput(_) => Code::InvalidArgument,
            ErrorKind::InvalidChain(_) => Code::FailedPrecondition,
            ErrorKind::RequestCanceled => Code::Cancelled,
            ErrorKind::DeadlineExceeded => Code::DeadlineExceeded,
            ErrorKind::NotImplemented => Code::Unimplemented,
            ErrorKind::ShuttingDown | ErrorKind::IdleTimeout => Code::Aborted,
            ErrorKind::Internal(_) => Code::Internal,
        }
    }

    /// The log level an occurrence of this error kind should be reported at (§4.7, §7).
    pub fn log_level(&self) -> Level {
        match self {
            ErrorKind::ItemNotFound
            | ErrorKind::NoEventHistory(_)
            | ErrorKind::InvalidEventId(_)
            | ErrorKind::OutOfRange(_)
            | ErrorKind::InvalidHeight(_)
            | ErrorKind::InvalidParserInput(_)
            | ErrorKind::InvalidChain(_)
            | ErrorKind::RequestCanceled
            | ErrorKind::NotImplemented
            | ErrorKind::ShuttingDown
            | ErrorKind::IdleTimeout => Level::Info,
            ErrorKind::DeadlineExceeded => Level::Warn,
            ErrorKind::Internal(_) => Level::Error,
        }
    }

    /// The user-facing description carried on the RPC status.
    pub fn user_description(&self) -> String {
        self.to_string()
    }
}

/// Converts an [`ErrorKind`] to the `{code, userDescription, logLevel}` triple of §4.7 and logs
/// it, then builds the `tonic::Status` returned to the caller.
///
/// Errors that are already a pre-classified `tonic::Status` (e.g. from an unrelated registered
/// service such as reflection) are expected to bypass this mapper entirely — see the
/// `reflection`-service-name check in `chainlake_api::surface`.
pub struct ErrorMapper;

impl ErrorMapper {
    pub fn map(method: &str, request: &str, error: &ErrorKind) -> Status {
        let code = error.code();
        let description = error.user_description();
        let level = error.log_level();

        metrics::counter!("error", "method" => method.to_string(), "status" => code.to_string())
            .increment(1);

        log::log!(
            level,
            method = method,
            status:% = code,
            description = description,
            request = request,
            error:% = error;
            "request failed"
        );

        Status::new(code, description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapper_determinism() {
        let cases = [
            (ErrorKind::ItemNotFound, Code::NotFound),
            (ErrorKind::NoEventHistory("x".into()), Code::InvalidArgument),
            (ErrorKind::InvalidEventId("x".into()), Code::InvalidArgument),
            (ErrorKind::OutOfRange("x".into()), Code::InvalidArgument),
            (ErrorKind::InvalidHeight("x".into()), Code::InvalidArgument),
            (ErrorKind::InvalidParserInput("x".into()), Code::InvalidArgument),
            (ErrorKind::InvalidChain("x".into()), Code::FailedPrecondition),
            (ErrorKind::RequestCanceled, Code::Cancelled),
            (ErrorKind::DeadlineExceeded, Code::DeadlineExceeded),
            (ErrorKind::NotImplemented, Code::Unimplemented),
            (ErrorKind::ShuttingDown, Code::Aborted),
            (ErrorKind::IdleTimeout, Code::Aborted),
            (
                ErrorKind::Internal(InternalError("boom".into())),
                Code::Internal,
            ),
        ];

        for (kind, expected_code) in cases {
            let status = ErrorMapper::map("some.Method", "req", &kind);
            assert_eq!(status.code(), expected_code, "{kind:?}");
        }
    }

    #[test]
    fn test_cancellation_and_idle_timeout_are_info_level() {
        assert_eq!(ErrorKind::RequestCanceled.log_level(), Level::Info);
        assert_eq!(ErrorKind::IdleTimeout.log_level(), Level::Info);
        assert_eq!(ErrorKind::ShuttingDown.log_level(), Level::Info);
    }

    #[test]
    fn test_internal_is_error_level() {
        assert_eq!(
            ErrorKind::Internal(InternalError("x".into())).log_level(),
            Level::Error
        );
    }
}
