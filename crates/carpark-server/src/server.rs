//! Server assembly and lifecycle

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

use carpark_core::prelude::*;

use crate::command::CommandService;
use crate::config::{build_resolver, Config, ServerSettings};
use crate::hub::BroadcastHub;
use crate::sensor::policy_from_settings;
use crate::service::CarParkRpc;

/// Wire the hub, command table and sensor policy described by `config`
pub fn build_rpc(config: &Config) -> Result<CarParkRpc> {
    let resolver = build_resolver(config).context("Failed to build the command table")?;
    let sensors =
        policy_from_settings(&config.sensors).context("Failed to set up the sensor policy")?;
    let commands = CommandService::new(resolver, BroadcastHub::new(), sensors);

    info!(
        "Registered commands: {}",
        commands.resolver().commands().collect::<Vec<_>>().join(", ")
    );

    Ok(CarParkRpc::new(
        Arc::new(commands),
        config.server.stream_buffer,
    ))
}

/// Bind the listening socket
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| Error::transport(format!("Failed to bind {}: {}", addr, e)))
}

/// Serve `rpc` on `listener` until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    rpc: CarParkRpc,
    settings: &ServerSettings,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    info!("gRPC server listening on {}", addr);

    Server::builder()
        .concurrency_limit_per_connection(settings.concurrency_limit)
        .add_service(rpc.into_server())
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
        .map_err(|e| Error::transport(e.to_string()))?;

    info!("gRPC server stopped");
    Ok(())
}
