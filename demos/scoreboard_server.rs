//! Scoreboard server example
//!
//! Run with: cargo run --example scoreboard_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example scoreboard_server                    # binds to 0.0.0.0:8080
//!   cargo run --example scoreboard_server localhost          # binds to 127.0.0.1:8080
//!   cargo run --example scoreboard_server 127.0.0.1:9000     # binds to 127.0.0.1:9000
//!   cargo run --example scoreboard_server 9000               # binds to 0.0.0.0:9000
//!
//! ## Updating the score
//!
//!   curl -X POST http://localhost:8080/api/v1/scoreboard \
//!        -d '{"type":"state","data":{"a":12,"b":10,"sv":"A"}}'
//!
//! ## Watching updates
//!
//!   curl -N http://localhost:8080/api/v1/events
//!
//! The wireless link is simulated: every line typed on stdin is written to it
//! as one fragment, and notifications are printed back.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use scoreboard_sync::{Scoreboard, ScoreboardConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_PORT: u16 = 8080;

/// Bind address from `PORT`, `HOST` or `HOST:PORT`; `localhost` means loopback
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    if let Ok(port) = arg.parse::<u16>() {
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }
    if let Ok(addr) = arg.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = arg.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    match arg.split_once(':') {
        None if arg == "localhost" => Ok(SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT))),
        Some(("localhost", port)) => port
            .parse::<u16>()
            .map(|port| SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
            .map_err(|_| format!("bad port in '{arg}'")),
        _ => Err(format!("'{arg}' is not a PORT, HOST or HOST:PORT")),
    }
}

fn print_usage() {
    eprintln!("Usage: scoreboard_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    PORT, HOST or HOST:PORT (default: 0.0.0.0:{DEFAULT_PORT})");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scoreboard_sync=debug".parse()?)
                .add_directive("scoreboard=info".parse()?),
        )
        .init();

    let config = ScoreboardConfig::with_addr(bind_addr);
    let mut scoreboard = Scoreboard::with_config(config);

    // Simulated wireless controller on stdin/stdout
    let wireless = scoreboard.wireless();
    if let Some(mut notify) = scoreboard.take_wireless_notify() {
        tokio::spawn(async move {
            while let Some(payload) = notify.recv().await {
                println!("[notify] {}", String::from_utf8_lossy(&payload));
            }
        });
    }
    tokio::spawn(async move {
        if let Err(e) = wireless.on_connect().await {
            tracing::error!(error = %e, "Simulated controller failed to connect");
            return;
        }
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Err(e) = wireless.on_write(line.as_bytes()).await {
                tracing::error!(error = %e, "Simulated write failed");
                break;
            }
        }
        let _ = wireless.on_disconnect().await;
    });

    println!("Starting scoreboard on {}", bind_addr);
    println!("Type envelope fragments to simulate a wireless controller.");
    println!();

    scoreboard
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
