use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use serde::Serialize;

use nestscope_core::{
    DecodeContext, DecodeOptions, DumpSummary, EventSink, TextSink, TraceEvent, dump_pcap_file,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("NESTSCOPE_BUILD_COMMIT"),
    " ",
    env!("NESTSCOPE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "nestscope")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Nested dissector for IS-IS, IEEE 802.15.4 and RADIUS captures.",
    long_about = None,
    after_help = "Examples:\n  nestscope pcap dump capture.pcapng\n  nestscope pcap dump capture.pcap --json --pretty -o trace.json\n  nestscope pcap dump 'captures/*.pcapng' --hex-limit 64"
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Decode every packet of a capture file and print its nested trace.
    Dump(DumpArgs),
}

#[derive(clap::Args, Debug)]
struct DumpArgs {
    /// Path to a .pcap or .pcapng file
    input: PathBuf,

    /// Write the trace to a file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Emit structured trace events as JSON
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, requires = "json")]
    pretty: bool,

    /// Decoder options as a JSON file; flags below override it
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Skip IS-IS LSP checksum and 802.15.4 FCS verification
    #[arg(long)]
    no_verify: bool,

    /// Show at most N bytes of each opaque dump
    #[arg(long, value_name = "N")]
    hex_limit: Option<usize>,

    /// Suppress the summary line
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Dump(args) => cmd_pcap_dump(args),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

#[derive(Serialize)]
struct JsonTrace<'a> {
    summary: &'a DumpSummary,
    events: &'a [TraceEvent],
}

fn cmd_pcap_dump(args: DumpArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    if let Some(output) = args.output.as_ref() {
        ensure_distinct_output(&resolved_input, output)?;
    }

    let options = load_options(args.options.as_deref(), args.no_verify, args.hex_limit)?;
    log::debug!("decode options: {options:?}");
    let hex_limit = options.hex_dump_limit;
    let mut ctx = DecodeContext::new(options);

    let (summary, rendered) = if args.json {
        let mut sink = EventSink::new();
        let summary = dump_pcap_file(&resolved_input, &mut ctx, &mut sink)
            .context("PCAP/PCAPNG decoding failed")?;
        let trace = JsonTrace {
            summary: &summary,
            events: sink.events(),
        };
        let json = if args.pretty {
            serde_json::to_string_pretty(&trace)
        } else {
            serde_json::to_string(&trace)
        }
        .context("JSON serialization failed")?;
        (summary, json + "\n")
    } else {
        let mut sink = TextSink::with_hex_limit(hex_limit);
        let summary = dump_pcap_file(&resolved_input, &mut ctx, &mut sink)
            .context("PCAP/PCAPNG decoding failed")?;
        (summary, sink.into_string())
    };

    match args.output.as_ref() {
        Some(output) => write_output(output, &rendered)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write trace to stdout")?;
        }
    }

    if !args.quiet {
        eprintln!(
            "OK: {} packets, {} decoded, {} truncated, {} malformed, {} corrupt records, {} skipped, {} hostnames",
            summary.packets,
            summary.decoded,
            summary.truncated,
            summary.malformed,
            summary.corrupt_records,
            summary.skipped,
            summary.hostnames
        );
    }
    Ok(())
}

fn load_options(
    path: Option<&Path>,
    no_verify: bool,
    hex_limit: Option<usize>,
) -> Result<DecodeOptions, CliError> {
    let mut options = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file: {}", path.display()))?;
            serde_json::from_str(&raw).map_err(|err| {
                CliError::new(
                    format!("invalid options file '{}': {err}", path.display()),
                    Some(
                        "expected JSON such as {\"verify_checksums\": true, \"hex_dump_limit\": 64}"
                            .to_string(),
                    ),
                )
            })?
        }
        None => DecodeOptions::default(),
    };
    if no_verify {
        options.verify_checksums = false;
    }
    if hex_limit.is_some() {
        options.hex_dump_limit = hex_limit;
    }
    Ok(options)
}

fn ensure_distinct_output(input: &Path, output: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let Ok(output_dir) = fs::canonicalize(parent) else {
        // Directory will be created on write; it cannot hold the input yet.
        return Ok(());
    };
    let file_name = output
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid output path: {}", output.display()))?;
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn write_output(output: &Path, rendered: &str) -> Result<(), CliError> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(output, rendered)
        .with_context(|| format!("Failed to write trace: {}", output.display()))?;
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if count > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!("multiple files match pattern '{pattern}' ({count} matches); matches: {listed}"),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
