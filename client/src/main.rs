use clap::Parser;
use client::input::{parse_command, Command};
use client::network::Client;
use client::rendering::Renderer;
use log::info;
use std::io::BufRead;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", shared::DEFAULT_PORT))]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let client = Client::connect(&args.server).await?;
    let dim = client.state().current_dimension();
    info!("Enter moves as `row col` (0 to {}), `quit` to leave", dim - 1);

    let (move_tx, move_rx) = mpsc::channel(8);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    // stdin -> moves; blocking reads stay off the runtime
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Ok(Command::Reveal(at)) => {
                    if move_tx.blocking_send(at).is_err() {
                        break;
                    }
                }
                Ok(Command::Quit) => break,
                Err(e) => eprintln!("{}", e),
            }
        }
    });

    // view events -> terminal
    let render = tokio::spawn(async move {
        let mut renderer = Renderer::new(dim);
        print!("{}", renderer.render());
        while let Some(event) = event_rx.recv().await {
            renderer.apply(&event);
            print!("{}", renderer.render());
        }
    });

    let state = client.run(move_rx, event_tx).await?;
    let _ = render.await;

    info!(
        "Finished with {} matches in {} moves",
        state.matches_made(),
        state.moves_made()
    );

    Ok(())
}
