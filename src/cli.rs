//! CLI commands and argument parsing.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use zeroize::Zeroize;

use crate::cipher::Algorithm;
use crate::encoder::Encoder;
use crate::engine::Engine;
use crate::payload::Payload;
use crate::{list_algorithms, list_encoders};

/// bpio - self-describing token encryption.
#[derive(Parser)]
#[command(name = "bpio", version)]
#[command(about = "Encrypt a title and instructions into a self-describing token, and back.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Only print errors.
    #[arg(long, global = true)]
    pub silent: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt a payload into a token.
    Encrypt {
        /// Algorithm name (see list-algorithms).
        #[arg(short, long, default_value = "xchacha20-poly1305")]
        algorithm: String,

        /// Encoder name (defaults to the algorithm's default).
        #[arg(short, long)]
        encoder: Option<String>,

        /// Token title.
        #[arg(short, long)]
        title: String,

        /// Token instructions.
        #[arg(short, long, default_value = "")]
        instructions: String,

        /// Hex key of the algorithm's required size (generated if absent).
        #[arg(short, long)]
        key: Option<String>,

        /// Write the token to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decrypt a token back into its payload.
    Decrypt {
        /// The token string.
        #[arg(short, long, conflicts_with = "input")]
        token: Option<String>,

        /// Read the token from a file.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Hex key.
        #[arg(short, long)]
        key: String,

        /// Encoder the token was written with (defaults to base64).
        #[arg(short, long)]
        encoder: Option<String>,
    },

    /// List the registered algorithms.
    ListAlgorithms,

    /// List the available encoders.
    ListEncoders,
}

/// Runs a parsed command.
///
/// # Errors
/// Propagates engine errors for the exit-code mapping in `main`.
pub fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Encrypt { algorithm, encoder, title, instructions, key, output } => {
            encrypt(algorithm, encoder.as_deref(), title, instructions, key.as_deref(), output.as_deref(), cli.silent)
        }
        Commands::Decrypt { token, input, key, encoder } => {
            decrypt(token.as_deref(), input.as_deref(), key, encoder.as_deref())
        }
        Commands::ListAlgorithms => {
            print_algorithms();
            Ok(())
        }
        Commands::ListEncoders => {
            print_encoders();
            Ok(())
        }
    }
}

fn build_engine(algorithm: &str, encoder: Option<&str>) -> Result<Engine> {
    let algorithm = Algorithm::from_name(algorithm)?;
    let mut engine = Engine::new(algorithm);
    if let Some(name) = encoder {
        engine = engine.with_encoder(Encoder::from_name(name)?);
    }
    Ok(engine)
}

#[allow(clippy::too_many_arguments)]
fn encrypt(
    algorithm: &str,
    encoder: Option<&str>,
    title: &str,
    instructions: &str,
    key: Option<&str>,
    output: Option<&std::path::Path>,
    silent: bool,
) -> Result<()> {
    let engine = build_engine(algorithm, encoder)?;
    let mut key = match key {
        Some(hex_key) => parse_key(hex_key, engine.algorithm())?,
        None => {
            let key = engine.generate_key();
            if !silent {
                eprintln!("generated key: {}", hex::encode(&key));
            }
            key
        }
    };

    let payload = Payload::new(title, instructions);
    let token = engine.encrypt_and_encode_bytes(&payload.to_bytes(), &key);
    key.zeroize();
    let token = token?;

    match output {
        Some(path) => fs::write(path, &token)
            .with_context(|| format!("failed to write token to {}", path.display()))?,
        None => println!("{token}"),
    }
    Ok(())
}

fn decrypt(
    token: Option<&str>,
    input: Option<&std::path::Path>,
    key: &str,
    encoder: Option<&str>,
) -> Result<()> {
    let token = match (token, input) {
        (Some(token), _) => token.to_string(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read token from {}", path.display()))?
            .trim()
            .to_string(),
        (None, None) => bail!("either --token or --input is required"),
    };

    let mut key = hex::decode(key).map_err(|_| crate::Error::invalid("key is not valid hex"))?;
    // The container routes to the right cipher; the engine here only picks
    // the encoder used to decode the string.
    let mut engine = Engine::new(Algorithm::XChaCha20Poly1305);
    if let Some(name) = encoder {
        engine = engine.with_encoder(Encoder::from_name(name)?);
    }

    let decrypted = engine.decode_and_decrypt_bytes(&token, &key);
    key.zeroize();
    let payload = Payload::from_bytes(&decrypted?)?;
    println!("title: {}", payload.title);
    println!("instructions: {}", payload.instructions);
    Ok(())
}

fn parse_key(hex_key: &str, algorithm: Algorithm) -> Result<Vec<u8>> {
    let key = hex::decode(hex_key).map_err(|_| crate::Error::invalid("key is not valid hex"))?;
    if key.len() != algorithm.key_size() {
        bail!(crate::Error::invalid(format!(
            "{} needs a {}-byte key, got {}",
            algorithm.name(),
            algorithm.key_size(),
            key.len()
        )));
    }
    Ok(key)
}

fn print_algorithms() {
    for info in list_algorithms() {
        let mut notes = Vec::new();
        if info.legacy {
            notes.push("legacy");
        }
        if !info.authenticated {
            notes.push("confidentiality only");
        }
        let notes = if notes.is_empty() { String::new() } else { format!(" ({})", notes.join(", ")) };
        println!(
            "{:<20} id={} key={} bytes default-encoder={}{notes}",
            info.name, info.id, info.key_size, info.default_encoder
        );
    }
}

fn print_encoders() {
    for info in list_encoders() {
        let url = if info.url_safe { " (url-safe)" } else { "" };
        println!("{}{url}", info.name);
    }
}
