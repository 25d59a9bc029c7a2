//! tonic implementation of `park.CarParkService`

use std::sync::Arc;

use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};

use carpark_core::prelude::*;

use crate::command::CommandService;
use crate::proto::pb::car_park_service_server::{CarParkService, CarParkServiceServer};
use crate::proto::{error_status, pb};
use crate::stream::{open_log_stream, LogStreamItem};

/// RPC adapter over [`CommandService`]
#[derive(Debug, Clone)]
pub struct CarParkRpc {
    commands: Arc<CommandService>,
    stream_buffer: usize,
}

impl CarParkRpc {
    pub fn new(commands: Arc<CommandService>, stream_buffer: usize) -> Self {
        Self {
            commands,
            stream_buffer,
        }
    }

    /// Wrap into the tonic service type accepted by `Server::add_service`
    pub fn into_server(self) -> CarParkServiceServer<Self> {
        CarParkServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl CarParkService for CarParkRpc {
    async fn process_command(
        &self,
        request: Request<pb::CommandRequest>,
    ) -> std::result::Result<Response<pb::CommandResponse>, Status> {
        let command = request.into_inner().command;
        let commands = Arc::clone(&self.commands);

        // Detached so the process still runs to completion if the caller hangs up.
        let handle = tokio::spawn(async move { commands.execute(&command).await });

        match handle.await {
            Ok(Ok(result)) => Ok(Response::new(pb::CommandResponse::from(&result))),
            Ok(Err(err)) => Err(error_status(&err)),
            Err(join_err) => {
                error!("Command task failed: {}", join_err);
                Err(error_status(&Error::transport(format!(
                    "command task failed: {}",
                    join_err
                ))))
            }
        }
    }

    type StreamLogsStream = ReceiverStream<LogStreamItem>;

    async fn stream_logs(
        &self,
        _request: Request<pb::StreamLogsRequest>,
    ) -> std::result::Result<Response<Self::StreamLogsStream>, Status> {
        Ok(Response::new(open_log_stream(
            self.commands.hub(),
            self.stream_buffer,
        )))
    }
}
