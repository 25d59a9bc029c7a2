//! Command-line arguments

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:50051";

/// carpark - run named commands over gRPC and broadcast their output live
#[derive(Parser, Debug)]
#[command(name = "carpark")]
#[command(about = "Run named commands over gRPC and broadcast their output live")]
#[command(long_about = None)]
pub struct Args {
    /// Path to carpark.toml
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gRPC server (default)
    Serve(ServeArgs),

    /// Invoke a command on a running server and print the result as JSON
    Run {
        /// Command name, e.g. "start"
        command: String,

        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
    },

    /// Follow the live log stream of a running server
    Logs {
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Write a default config file
    InitConfig {
        #[arg(value_name = "PATH", default_value = "carpark.toml")]
        path: PathBuf,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve(ServeArgs::default())
    }
}

#[derive(ClapArgs, Debug, Default)]
pub struct ServeArgs {
    /// Address to listen on (overrides server.listen)
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// RPC worker pool size (overrides server.worker_threads)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,
}
