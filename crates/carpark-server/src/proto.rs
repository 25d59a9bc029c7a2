//! Generated gRPC types and conversions from domain types
//!
//! A failed `ProcessCommand` is reported on two channels that must agree: the
//! gRPC status (code + message) and a sentinel [`pb::CommandResponse`] encoded
//! into the status details. Both are built from the same [`Error`] in
//! [`error_status`].

use bytes::Bytes;
use prost::Message;
use tonic::{Code, Status};

use carpark_core::{CommandResult, Error, ErrorKind, LogMessage};

#[allow(clippy::derive_partial_eq_without_eq)]
pub mod pb {
    tonic::include_proto!("park");
}

/// `value`/`result` of a failed command
pub const FAILURE_SENTINEL: &str = "Error occurred";

impl From<&CommandResult> for pb::CommandResponse {
    fn from(result: &CommandResult) -> Self {
        let mut response = pb::CommandResponse {
            result: result.combined(),
            invocation_id: result.invocation_id.to_string(),
            sensor_id: result.sensor_id.clone(),
            value: result.value.clone(),
            ..Default::default()
        };
        response.set_error(pb::ErrorKind::None);
        response
    }
}

impl From<LogMessage> for pb::LogMessage {
    fn from(message: LogMessage) -> Self {
        pb::LogMessage {
            timestamp_ms: message.timestamp.timestamp_millis(),
            invocation_id: message.invocation_id.to_string(),
            text: message.text,
        }
    }
}

impl From<ErrorKind> for pb::ErrorKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::UnknownCommand => pb::ErrorKind::UnknownCommand,
            ErrorKind::ProcessFailure => pb::ErrorKind::ProcessFailure,
            ErrorKind::Internal => pb::ErrorKind::Internal,
        }
    }
}

/// Sentinel response describing `err`
pub fn failure_response(err: &Error) -> pb::CommandResponse {
    let mut response = pb::CommandResponse {
        result: FAILURE_SENTINEL.to_string(),
        value: FAILURE_SENTINEL.to_string(),
        stderr: err.stderr().unwrap_or_default().to_string(),
        ..Default::default()
    };
    response.set_error(err.kind().into());
    response
}

/// gRPC status for `err`, carrying the encoded sentinel response as details
pub fn error_status(err: &Error) -> Status {
    let code = match err.kind() {
        ErrorKind::UnknownCommand => Code::InvalidArgument,
        ErrorKind::ProcessFailure | ErrorKind::Internal => Code::Internal,
    };
    let details = Bytes::from(failure_response(err).encode_to_vec());
    Status::with_details(code, err.to_string(), details)
}

/// Recover the sentinel response a server attached to `status`
pub fn response_from_status(status: &Status) -> Option<pb::CommandResponse> {
    if status.details().is_empty() {
        return None;
    }
    pb::CommandResponse::decode(status.details()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpark_core::InvocationId;

    #[test]
    fn test_success_response_fields() {
        let result = CommandResult {
            invocation_id: InvocationId::new(),
            sensor_id: "s1".to_string(),
            value: "30".to_string(),
        };
        let response = pb::CommandResponse::from(&result);

        assert_eq!(response.value, "30");
        assert_eq!(response.sensor_id, "s1");
        assert_eq!(response.invocation_id, result.invocation_id.to_string());
        assert_eq!(response.result, format!("{},s1,30", result.invocation_id));
        assert_eq!(response.error(), pb::ErrorKind::None);
        assert!(response.stderr.is_empty());
    }

    #[test]
    fn test_log_message_conversion() {
        let message = LogMessage::new(InvocationId::new(), "10");
        let millis = message.timestamp.timestamp_millis();
        let id = message.invocation_id.to_string();

        let wire = pb::LogMessage::from(message);
        assert_eq!(wire.text, "10");
        assert_eq!(wire.timestamp_ms, millis);
        assert_eq!(wire.invocation_id, id);
    }

    #[test]
    fn test_unknown_command_status() {
        let status = error_status(&Error::unknown_command("bogus"));
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(status.message().contains("bogus"));

        let response = response_from_status(&status).unwrap();
        assert_eq!(response.value, FAILURE_SENTINEL);
        assert_eq!(response.result, FAILURE_SENTINEL);
        assert_eq!(response.error(), pb::ErrorKind::UnknownCommand);
    }

    #[test]
    fn test_process_failure_status_carries_stderr() {
        let status = error_status(&Error::process_failed(Some(2), "disk full"));
        assert_eq!(status.code(), Code::Internal);
        assert!(status.message().contains("disk full"));

        let response = response_from_status(&status).unwrap();
        assert_eq!(response.error(), pb::ErrorKind::ProcessFailure);
        assert_eq!(response.stderr, "disk full");
    }

    #[test]
    fn test_status_without_details() {
        assert!(response_from_status(&Status::internal("boom")).is_none());
    }
}
