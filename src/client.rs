//! Client subcommands talking to a running server

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Serialize;

use carpark_server::proto::pb::car_park_service_client::CarParkServiceClient;
use carpark_server::proto::{pb, response_from_status};

/// JSON printed by `carpark run`
#[derive(Debug, Serialize)]
struct RunOutput {
    ok: bool,
    invocation_id: String,
    sensor_id: String,
    value: String,
    result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,
}

impl From<pb::CommandResponse> for RunOutput {
    fn from(response: pb::CommandResponse) -> Self {
        Self {
            ok: response.error() == pb::ErrorKind::None,
            error: match response.error() {
                pb::ErrorKind::None => None,
                kind => Some(kind.as_str_name().to_string()),
            },
            stderr: Some(response.stderr).filter(|s| !s.is_empty()),
            invocation_id: response.invocation_id,
            sensor_id: response.sensor_id,
            value: response.value,
            result: response.result,
            message: None,
        }
    }
}

/// JSON printed per line by `carpark logs --json`
#[derive(Debug, Serialize)]
struct LogLine<'a> {
    timestamp: String,
    invocation_id: &'a str,
    text: &'a str,
}

/// Invoke `command` and print the outcome as JSON.
///
/// Exits with an error after printing when the server reports a failure.
pub async fn run_command(endpoint: String, command: String) -> Result<()> {
    let mut client = CarParkServiceClient::connect(endpoint.clone())
        .await
        .wrap_err_with(|| format!("failed to connect to {}", endpoint))?;

    match client
        .process_command(pb::CommandRequest {
            command: command.clone(),
        })
        .await
    {
        Ok(response) => {
            let output = RunOutput::from(response.into_inner());
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(status) => {
            let mut output = match response_from_status(&status) {
                Some(sentinel) => RunOutput::from(sentinel),
                None => RunOutput {
                    ok: false,
                    invocation_id: String::new(),
                    sensor_id: String::new(),
                    value: String::new(),
                    result: String::new(),
                    error: Some(format!("{:?}", status.code())),
                    message: None,
                    stderr: None,
                },
            };
            output.message = Some(status.message().to_string());
            println!("{}", serde_json::to_string_pretty(&output)?);
            Err(eyre!("command {:?} failed: {}", command, status.message()))
        }
    }
}

/// Print every log line the server broadcasts until the stream ends
pub async fn follow_logs(endpoint: String, json: bool) -> Result<()> {
    let mut client = CarParkServiceClient::connect(endpoint.clone())
        .await
        .wrap_err_with(|| format!("failed to connect to {}", endpoint))?;

    let mut stream = client
        .stream_logs(pb::StreamLogsRequest {})
        .await
        .wrap_err("failed to open log stream")?
        .into_inner();

    while let Some(message) = stream.message().await? {
        let timestamp = chrono::DateTime::from_timestamp_millis(message.timestamp_ms)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();

        if json {
            let line = LogLine {
                timestamp,
                invocation_id: &message.invocation_id,
                text: &message.text,
            };
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!("{} {}", timestamp, message.text);
        }
    }

    Ok(())
}
