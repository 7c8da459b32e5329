//! mlcodec -- inspect and produce COS and DevSync payloads.
//!
//! Usage:
//!   mlcodec cos decode obs.cos --json
//!   mlcodec cos encode observations.json -o obs.cos --ticks
//!   mlcodec devsync decode-request req.bin --template thermostat.yaml
//!   mlcodec devsync encode-response response.json -o resp.bin
//!   mlcodec devsync decode-response resp.bin

mod error;
mod input;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use masterloop_core::IdentifiedObservation;
use masterloop_cos::{decode_document, encode_observations, CosOptions, COS_VERSION_2};
use masterloop_devsync::{decode_request, decode_response, encode_response, DevSyncResponse};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::ToolResult;
use crate::input::{load_template, read_payload, read_text, write_payload};

#[derive(Parser)]
#[command(name = "mlcodec", version, about = "COS and DevSync payload codec")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compact Observation Stream documents
    Cos {
        #[command(subcommand)]
        action: CosAction,
    },
    /// DevSync requests and responses
    Devsync {
        #[command(subcommand)]
        action: DevSyncAction,
    },
}

#[derive(Args)]
struct PayloadInput {
    /// Payload file
    file: PathBuf,

    /// Treat the file as hex text
    #[arg(long)]
    hex: bool,
}

#[derive(Subcommand)]
enum CosAction {
    /// Decode a COS document
    Decode {
        #[command(flatten)]
        input: PayloadInput,

        /// Print the whole document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Encode a JSON list of observations
    Encode {
        /// JSON file with observations
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Format version
        #[arg(long, default_value_t = COS_VERSION_2)]
        version: u8,

        /// Write 64-bit tick timestamps
        #[arg(long)]
        ticks: bool,
    },
}

#[derive(Subcommand)]
enum DevSyncAction {
    /// Decode a device request
    DecodeRequest {
        #[command(flatten)]
        input: PayloadInput,

        /// Device template (YAML or JSON)
        #[arg(short, long)]
        template: PathBuf,
    },
    /// Encode a response from JSON
    EncodeResponse {
        /// JSON file with the response
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Decode a response as the device would
    DecodeResponse {
        #[command(flatten)]
        input: PayloadInput,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> ToolResult<()> {
    match command {
        Commands::Cos { action } => run_cos(action),
        Commands::Devsync { action } => run_devsync(action),
    }
}

fn run_cos(action: CosAction) -> ToolResult<()> {
    match action {
        CosAction::Decode { input, json } => {
            let data = read_payload(&input.file, input.hex)?;
            let document = decode_document(&data)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&document)?);
                return Ok(());
            }
            println!(
                "COS v{} flags {} ({} observations, {} bytes)",
                document.version,
                document.flags,
                document.len(),
                data.len()
            );
            for observation in &document.observations {
                println!("{}", serde_json::to_string(observation)?);
            }
        }
        CosAction::Encode {
            input,
            output,
            version,
            ticks,
        } => {
            let observations: Vec<IdentifiedObservation> =
                serde_json::from_str(&read_text(&input)?)?;
            let mut options = CosOptions {
                version,
                ..CosOptions::default()
            };
            if ticks {
                options = options.with_64bit_timestamps();
            }
            let bytes = encode_observations(&observations, &options)?;
            write_payload(&output, &bytes)?;
            info!(
                observations = observations.len(),
                bytes = bytes.len(),
                output = %output.display(),
                "encoded COS document"
            );
        }
    }
    Ok(())
}

fn run_devsync(action: DevSyncAction) -> ToolResult<()> {
    match action {
        DevSyncAction::DecodeRequest { input, template } => {
            let template = load_template(&template)?;
            let data = read_payload(&input.file, input.hex)?;
            let request = decode_request(&data, &template)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
            println!("{}", request.observation_package_json()?);
        }
        DevSyncAction::EncodeResponse { input, output } => {
            let response: DevSyncResponse = serde_json::from_str(&read_text(&input)?)?;
            let bytes = encode_response(&response)?;
            write_payload(&output, &bytes)?;
            info!(
                settings = response.settings.len(),
                commands = response.commands.len(),
                bytes = bytes.len(),
                output = %output.display(),
                "encoded DevSync response"
            );
        }
        DevSyncAction::DecodeResponse { input } => {
            let data = read_payload(&input.file, input.hex)?;
            let received = decode_response(&data)?;
            println!("{}", serde_json::to_string_pretty(&received)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cos_encode() {
        let cli = Cli::try_parse_from([
            "mlcodec", "cos", "encode", "obs.json", "-o", "obs.cos", "--version", "1", "--ticks",
        ])
        .unwrap();
        match cli.command {
            Commands::Cos {
                action: CosAction::Encode { version, ticks, .. },
            } => {
                assert_eq!(version, 1);
                assert!(ticks);
            }
            _ => panic!("expected cos encode"),
        }
    }

    #[test]
    fn test_parse_decode_request() {
        let cli = Cli::try_parse_from([
            "mlcodec",
            "-v",
            "devsync",
            "decode-request",
            "req.hex",
            "--hex",
            "--template",
            "tpl.yaml",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Devsync {
                action: DevSyncAction::DecodeRequest { input, template },
            } => {
                assert!(input.hex);
                assert_eq!(template, PathBuf::from("tpl.yaml"));
            }
            _ => panic!("expected devsync decode-request"),
        }
    }
}
