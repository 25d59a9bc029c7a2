//! # carpark-server - Command Service & Live Log Broadcast
//!
//! Runs named commands through [`carpark_runner`], publishes every output line
//! to a [`BroadcastHub`], and exposes both over gRPC.
//!
//! ## Public API
//!
//! ### Broadcasting (`hub`)
//! - [`BroadcastHub`] - Subscriber registry with ordered, non-blocking fan-out
//! - [`Subscription`] - Drain handle of one subscriber
//!
//! ### Commands (`command`, `sensor`)
//! - [`CommandService`] - Resolve, run, publish, and build a `CommandResult`
//! - [`SensorPolicy`] - Injectable sensor id selection
//!
//! ### RPC (`service`, `stream`, `proto`)
//! - [`CarParkRpc`] - tonic service implementation
//! - [`open_log_stream()`] - One relayed log stream session
//! - [`proto::pb`] - Generated protobuf types, server and client
//!
//! ### Configuration & Lifecycle (`config`, `server`)
//! - [`config::load_config()`] - Locate, parse and validate `carpark.toml`
//! - [`build_rpc()`], [`serve()`] - Assemble and run the server

pub mod command;
pub mod config;
pub mod hub;
pub mod proto;
pub mod sensor;
pub mod server;
pub mod service;
pub mod stream;

pub use command::CommandService;
pub use hub::{BroadcastHub, SubscriberId, Subscription};
pub use sensor::{FirstSensor, RoundRobinSensor, SensorPolicy};
pub use server::{bind, build_rpc, serve};
pub use service::CarParkRpc;
pub use stream::open_log_stream;
