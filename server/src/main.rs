use clap::Parser;
use log::info;
use server::network::Server;
use server::session::SessionConfig;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Board dimension (even, 2 to 6)
    #[arg(short, long, default_value = "4")]
    dim: usize,

    /// Pause before announcing a mismatch, in milliseconds
    #[arg(short, long, default_value = "1000")]
    mismatch_delay_ms: u64,

    /// Log the solution of every dealt board
    #[arg(long)]
    cheat: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = SessionConfig::new(
        args.dim,
        Duration::from_millis(args.mismatch_delay_ms),
        args.cheat,
    )?;

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
