//! wc3stats CLI
//!
//! ```bash
//! wc3stats serve                        # Start HTTP server (port 5000)
//! wc3stats serve --port 8080            # Or WC3STATS_PORT=8080
//! wc3stats inspect game1.w3g game2.w3g  # Print decoded replays
//! ```

use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use wc3stats::api::log_warning;
use wc3stats::config::{DEFAULT_MAX_UPLOAD_MB, DEFAULT_PORT, DEFAULT_STATIC_DIR};
use wc3stats::{format_length, map_name, read_replay_file, start_server, ServerConfig};

#[derive(Parser)]
#[command(name = "wc3stats")]
#[command(about = "Warcraft III replay statistics server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Address to bind
        #[arg(long, env = "WC3STATS_HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to listen on
        #[arg(short, long, env = "WC3STATS_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Directory with the compiled frontend bundle
        #[arg(long, env = "WC3STATS_STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
        static_dir: PathBuf,

        /// Maximum upload size in megabytes
        #[arg(long, env = "WC3STATS_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
        max_upload_mb: usize,
    },

    /// Print the decoded header, players and winner of replay files
    Inspect {
        /// Replay files (.w3g)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            host,
            port,
            static_dir,
            max_upload_mb,
        } => cmd_serve(host, port, static_dir, max_upload_mb).await,

        Commands::Inspect { files } => cmd_inspect(&files),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(
    host: IpAddr,
    port: u16,
    static_dir: PathBuf,
    max_upload_mb: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::new(host, port, static_dir, max_upload_mb)?;
    if !config.static_dir.is_dir() {
        log_warning(format!(
            "{} not found, build the frontend with wasm-pack first",
            config.static_dir.display()
        ));
    }
    start_server(config).await?;
    Ok(())
}

fn cmd_inspect(files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = 0;

    for path in files {
        if let Err(e) = inspect_file(path) {
            failed += 1;
            eprintln!("❌ {}: {}", path.display(), e);
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} file(s) could not be read", failed, files.len()).into());
    }
    Ok(())
}

fn inspect_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let replay = read_replay_file(path)?;
    let header = &replay.header;
    let game = &replay.game;

    println!("📄 {}", path.display());
    println!("   Game:        {}", header.product.label());
    println!("   Version:     {} (build {})", header.version_label(), header.build);
    println!("   Mode:        {}", header.mode.label());
    println!("   Length:      {}", format_length(header.length_ms as u64));
    println!("   Header:      v{} ({} bytes)", header.header_version, header.header_size);
    println!("   Blocks:      {}", header.block_count);
    println!("   Type:        {}", game.game_type.label());
    println!("   Map:         {} ({})", map_name(&game.map_path), game.map_path);
    for player in &game.players {
        let team = game
            .slot(player.id)
            .map_or("-".to_string(), |s| s.team.to_string());
        println!(
            "   Player {:>2}:   {} ({}, team {}){}",
            player.id,
            player.name,
            game.race_of(player),
            team,
            if game.winner == Some(player.id) { " 🏆" } else { "" }
        );
    }
    if game.winner.is_none() {
        println!("   Winner:      unknown");
    }
    println!();
    Ok(())
}
