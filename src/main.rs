use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use bat::PrettyPrinter;
use clap::{Parser, Subcommand};
use cliclack::{input, spinner};
use console::style;
use tracing_subscriber::EnvFilter;

use glimpse::prompts::{UseCase, RECEIPT_USER_INSTRUCTION};
use glimpse::{AgentConfig, Model, MultimodalChatAgent};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat about a graph image; answers stream in as they are generated
    Graph {
        /// Image attached to every question
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Model to use (scout, maverick or gemini)
        #[arg(short, long, default_value = "scout")]
        model: Model,

        /// Wait for the full answer instead of streaming it
        #[arg(long)]
        once: bool,
    },
    /// Extract the text of a receipt image
    Receipt {
        /// Receipt image
        #[arg(short, long)]
        image: PathBuf,

        /// Write the extracted text to this file
        #[arg(short, long, num_args = 0..=1, default_missing_value = "receipt_output.txt")]
        export: Option<PathBuf>,
    },
}

/// Raw bytes plus the filename used for MIME inference.
struct Upload {
    bytes: Vec<u8>,
    filename: Option<String>,
}

impl Upload {
    fn read(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(Self { bytes, filename })
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Graph { image, model, once } => {
            let upload = image.as_deref().map(Upload::read).transpose()?;
            graph(model, upload, once)
        }
        Command::Receipt { image, export } => receipt(&Upload::read(&image)?, export.as_deref()),
    }
}

fn agent_for(model: Model, use_case: UseCase) -> Result<MultimodalChatAgent> {
    let provider_config = model
        .provider_type()
        .config_from_env()
        .context("API key must be provided via the environment or a .env file")?;
    Ok(MultimodalChatAgent::from_provider_config(
        provider_config,
        AgentConfig::for_use_case(model, use_case),
    )?)
}

fn graph(model: Model, upload: Option<Upload>, once: bool) -> Result<()> {
    let agent = agent_for(model, UseCase::GraphAnalysis)?;
    let image = upload.as_ref().map(|u| u.bytes.as_slice());
    let filename = upload.as_ref().and_then(|u| u.filename.as_deref());

    println!(
        "Graph analyzer ({}) {}",
        model,
        style("- type \"exit\" to end the session").dim()
    );
    println!("\n");

    loop {
        let message_text: String = input("Message:").placeholder("").multiline().interact()?;

        if message_text.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        if once {
            let spin = spinner();
            spin.start("awaiting reply");
            let answer = agent.complete(&message_text, image, filename);
            spin.stop("");
            render(&answer?, Some("Markdown"))?;
        } else {
            let mut stdout = io::stdout().lock();
            for fragment in agent.stream(&message_text, image, filename)? {
                stdout.write_all(fragment?.as_bytes())?;
                stdout.flush()?;
            }
        }
        println!("\n");
    }
    Ok(())
}

fn receipt(upload: &Upload, export: Option<&Path>) -> Result<()> {
    let agent = agent_for(Model::GeminiPro, UseCase::ReceiptOcr)?;

    let spin = spinner();
    spin.start("Extracting text from receipt...");
    let extracted = agent.complete(
        RECEIPT_USER_INSTRUCTION,
        Some(upload.bytes.as_slice()),
        upload.filename.as_deref(),
    );
    spin.stop("");
    let extracted = extracted?;

    render(&extracted, None)?;

    if UseCase::ReceiptOcr.is_not_detected(&extracted) {
        println!("{}", style("no receipt found in the image, nothing exported").yellow());
        return Ok(());
    }

    if let Some(path) = export {
        fs::write(path, &extracted)
            .with_context(|| format!("failed to export OCR result to {}", path.display()))?;
        println!("{}", style(format!("saved to {}", path.display())).dim());
    }
    Ok(())
}

fn render(content: &str, language: Option<&str>) -> Result<()> {
    let mut printer = PrettyPrinter::new();
    printer.input_from_bytes(content.as_bytes());
    if let Some(language) = language {
        printer.language(language);
    }
    printer
        .print()
        .map_err(|e| anyhow!("failed to render output: {}", e))?;
    Ok(())
}
