use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use rs_inbox::config::{load_config, resolve_db_path};
use rs_inbox::domain::records::InboundMessage;
use rs_inbox::secrets;
use rs_inbox::send::http::HttpSender;
use rs_inbox::store::repo::MailboxRepository;
use rs_inbox::store::sqlite::SqliteRepo;
use rs_inbox::terminal::run_tui;
use rs_inbox::worker::Worker;

#[derive(Parser)]
#[command(name = "rs_inbox")]
#[command(about = "Admin mailbox: inbox, sent, drafts and trash in the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the mailbox TUI
    Tui,

    /// Store the send API key in the keyring
    SetApiKey,

    /// Upsert inbound messages from a JSON array (webhook export)
    Ingest {
        /// Path to the JSON file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;

    match cli.cmd {
        Command::SetApiKey => {
            eprintln!("Paste API key (end with Ctrl-D):");
            let mut key = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut key)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(anyhow!("empty API key"));
            }
            secrets::save_api_key(&cfg.from_address, key)?;
            println!("Saved API key for {}", cfg.from_address);
            Ok(())
        }

        Command::Ingest { file } => {
            let db_path = resolve_db_path(&cfg)?;
            let repo = SqliteRepo::open(&db_path)?;
            let raw = std::fs::read_to_string(&file)?;
            let items: Vec<InboundMessage> = serde_json::from_str(&raw)
                .map_err(|e| anyhow!("{}: {e}", file.display()))?;
            repo.upsert_inbound_messages(&items)?;
            log::info!("ingested {} messages from {}", items.len(), file.display());
            println!("Ingested {} messages", items.len());
            Ok(())
        }

        Command::Tui => {
            let db_path = resolve_db_path(&cfg)?;
            let repo = SqliteRepo::open(&db_path)?;
            let sender = HttpSender::new(
                cfg.send_api_url()?,
                secrets::resolve_api_key(&cfg.from_address),
                cfg.from_address.clone(),
            )?;
            let worker = Worker::spawn(Box::new(repo), Box::new(sender));
            run_tui(&worker)
        }
    }
}
