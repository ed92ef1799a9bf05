//! `sealdoc` CLI: document encryption and recipient key management.

#![warn(clippy::pedantic, clippy::nursery)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sealdoc::prelude::*;
use sealdoc_key_http::HttpKeyProvider;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sealdoc")]
#[command(about = "Selective envelope encryption for HTML documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt the protected sections of an HTML document
    Encrypt {
        /// Input HTML file
        #[arg(short, long)]
        input: PathBuf,
        /// Output path for the encrypted document
        #[arg(short, long)]
        output: PathBuf,
        /// Entitlement granted upon decryption, e.g. "acme.example:premium"
        #[arg(short, long)]
        access_requirement: String,
        /// Recipient as "<domain>,<source>" where source is an http(s)
        /// URL serving a key document or a path to a base64 public key
        /// file; repeatable
        #[arg(short, long = "recipient", value_parser = parse_recipient_spec, required = true)]
        recipients: Vec<(String, String)>,
    },
    /// Generate a recipient keypair in a local key directory
    Keygen {
        /// Output directory for keys
        #[arg(short, long, default_value = "./keys")]
        output_dir: PathBuf,
        /// Recipient domain the keypair belongs to
        #[arg(short, long)]
        recipient: String,
    },
}

fn parse_recipient_spec(value: &str) -> Result<(String, String), String> {
    match value.split_once(',') {
        Some((domain, source)) if !domain.is_empty() && !source.is_empty() => {
            Ok((domain.to_string(), source.to_string()))
        }
        _ => Err("expected \"<domain>,<url-or-key-file>\"".to_string()),
    }
}

fn resolve_recipients(specs: &[(String, String)]) -> Result<RecipientSet> {
    let mut http = HttpKeyProvider::new()?;
    let mut set = RecipientSet::new();
    for (domain, source) in specs {
        let key = if source.starts_with("http://") || source.starts_with("https://") {
            http.register(domain, source);
            http.fetch_public_key(domain)
                .with_context(|| format!("fetching public key for {domain}"))?
        } else {
            let encoded = fs::read_to_string(source)
                .with_context(|| format!("reading public key file {source}"))?;
            RecipientKey::from_base64(&encoded)
                .with_context(|| format!("parsing public key for {domain}"))?
        };
        set.insert(domain, key);
    }
    Ok(set)
}

fn encrypt(
    input: &Path,
    output: &Path,
    access_requirement: &str,
    specs: &[(String, String)],
) -> Result<()> {
    let html = fs::read_to_string(input)
        .with_context(|| format!("reading input file {}", input.display()))?;
    let recipients = resolve_recipients(specs)?;
    info!(recipients = recipients.len(), "resolved recipient public keys");

    let encrypted = DocumentEncryptor::new()
        .encrypt_document(&html, access_requirement, &recipients)
        .context("encrypting document")?;

    // only reached on full success; no partial output is ever written
    fs::write(output, encrypted)
        .with_context(|| format!("writing output file {}", output.display()))?;
    info!(output = %output.display(), "encrypted document written");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Encrypt { input, output, access_requirement, recipients } => {
            encrypt(&input, &output, &access_requirement, &recipients)
        }
        Commands::Keygen { output_dir, recipient } => {
            let public = sealdoc_key_file::generate_keypair(&output_dir, &recipient)
                .with_context(|| format!("generating keypair for {recipient}"))?;
            info!(
                recipient = %recipient,
                dir = %output_dir.display(),
                public_key = %public.to_base64(),
                "keypair generated"
            );
            Ok(())
        }
    }
}
