use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mailcraft::{DirectoryTransport, Draft, MailError};

/// Exit status for drafts rejected by validation
const EXIT_INVALID_DRAFT: u8 = 2;

/// Compose an email from a TOML draft
#[derive(Parser, Debug)]
#[command(name = "mailcraft")]
#[command(about = "Compose an email from a TOML draft", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the draft file
    #[arg(short, long)]
    draft: PathBuf,

    /// Write the message into this directory instead of printing it
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    mailcraft::logging::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            let invalid = e
                .downcast_ref::<MailError>()
                .is_some_and(MailError::is_validation);
            if invalid {
                ExitCode::from(EXIT_INVALID_DRAFT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let draft = Draft::load(&cli.draft)
        .with_context(|| format!("Failed to load draft {}", cli.draft.display()))?;

    if let Some(dir) = cli.out_dir {
        let mut builder = draft.to_builder().context("Invalid draft")?;
        let transport = DirectoryTransport::new(dir);
        let id = mailcraft::send(&mut builder, &transport).context("Failed to send message")?;
        println!("{id}");
        return Ok(());
    }

    let bytes = draft.render().context("Failed to render draft")?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;

    Ok(())
}
