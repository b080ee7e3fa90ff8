use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};

use mailview::auth::credentials::load_access_token;
use mailview::config::{load_config, resolve_max_results};
use mailview::domain::message::{NormalizedMessage, OutboundDraft};
use mailview::mail::decoders::normalize_snippet;
use mailview::mail::gmail_client::GmailClient;
use mailview::mailbox::Mailbox;
use mailview::service::{Folder, MailService};

#[derive(Parser)]
#[command(name = "mailview")]
#[command(about = "Read and send Gmail messages as plain text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the messages of a folder
    Folder {
        #[arg(value_enum)]
        folder: Folder,

        /// Print the normalized records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send a plain-text message
    Send {
        #[arg(long)]
        to: String,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
    let credential = load_access_token(&cfg)?;
    let client = GmailClient::from_config(&cfg)?;
    let service = MailService::new(Mailbox::new(client).max_results(resolve_max_results(&cfg)));

    match cli.cmd {
        Command::Folder { folder, json } => {
            let messages = service.get_folder(credential.as_ref(), folder).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&messages)?);
            } else if messages.is_empty() {
                println!("{folder}: no messages");
            } else {
                for m in &messages {
                    println!("{}", summary_line(m));
                }
            }
            Ok(())
        }

        Command::Send {
            to,
            subject,
            message,
        } => {
            let draft = OutboundDraft::new(to, subject, message);
            let sent = service.send_draft(credential.as_ref(), &draft).await?;
            println!("Email sent successfully! id {}", sent.id);
            Ok(())
        }
    }
}

fn summary_line(m: &NormalizedMessage) -> String {
    let marker = if m.read { ' ' } else { '*' };
    let from = m.from.as_deref().unwrap_or("(unknown)");
    format!(
        "{marker} {}  {from}  {}  {}",
        m.date_iso(),
        m.subject,
        normalize_snippet(&m.body, 100)
    )
}
