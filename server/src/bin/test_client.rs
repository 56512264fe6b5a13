//! Scripted probe for a running server: sends one malformed request, then turns
//! over every cell in reading order and prints whatever comes back.

use shared::{Coord, Message, DEFAULT_PORT};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("127.0.0.1:{}", DEFAULT_PORT));

    println!("Connecting to {}", server_addr);
    let stream = TcpStream::connect(&server_addr).await?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let dim = match lines.next_line().await? {
        Some(line) => match line.parse::<Message>() {
            Ok(Message::BoardDim { dim }) => {
                println!("<- {}", line);
                dim
            }
            _ => {
                println!("Expected BOARD_DIM but got: {}", line);
                return Ok(());
            }
        },
        None => {
            println!("Server closed the connection");
            return Ok(());
        }
    };

    // Print everything the server says from here on
    let printer = tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            println!("<- {}", line);
            if line == shared::GAME_OVER {
                break;
            }
        }
    });

    let mut requests = vec!["REVEAL x 0".to_string()];
    for row in 0..dim {
        for col in 0..dim {
            requests.push(Message::Reveal(Coord::new(row, col)).to_string());
        }
    }

    for request in requests {
        if printer.is_finished() {
            break;
        }
        println!("-> {}", request);
        if writer.write_all(format!("{}\n", request).as_bytes()).await.is_err() {
            println!("Server went away");
            break;
        }
        // Leave room for the mismatch announcement
        sleep(Duration::from_millis(1200)).await;
    }

    drop(writer);
    let _ = printer.await;
    println!("Test client finished");

    Ok(())
}
