//! Silex CLI - inspect and produce transport envelopes and derivation paths.
//!
//!   silex path-to-array "m/44'/12586'/0'/0/0"      → [2147483692, 2147496234, 2147483648, 0, 0]
//!   silex array-to-path 2147483692,2147496234,0   → {"path": "m/44'/12586'/0"}
//!   silex decode account|request|signature <data> → decoded message as JSON
//!   silex encode account|request|signature <json> → {"encoded": "eNp..."}
//!   silex encode-signature <json>                 → shorthand for `encode signature`
//!   silex generate-mnemonic [--words 12|24]       → {"mnemonic": "..."}
//!
//! Configuration (CLI args override env, env overrides `.env`):
//!   SILEX_MNEMONIC_WORDS   default word count for generate-mnemonic
//!   SILEX_LOG_JSON=1       JSON logs on stderr
//!
//! Output format:
//!   --json     Output compact JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context};
use serde::Serialize;
use serde_json::{json, Value};
use silex_core::logging::init_logging;
use silex_core::vault::mnemonic::generate_mnemonic;
use silex_core::vault::config::DEFAULT_MNEMONIC_WORDS;
use silex_core::{array_to_path, path_to_array, transport, SignRequest, Signature, TransportAccount};
use std::env;
use std::io::IsTerminal;
use tracing::debug;

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging();

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("silex {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("path-to-array") => cmd_path_to_array(&opts),
        Some("array-to-path") => cmd_array_to_path(&opts),
        Some("decode") => cmd_decode(&opts),
        Some("encode") => cmd_encode(opts.target.as_deref(), opts.data.as_deref()),
        Some("encode-signature") => {
            // No target word: the first positional is already the JSON.
            let data = join_present(opts.target.as_deref(), opts.data.as_deref());
            cmd_encode(Some("signature"), data.as_deref())
        }
        Some("generate-mnemonic") => cmd_generate_mnemonic(&opts),
        Some(cmd) => Err(anyhow!("Unknown command: {cmd}")),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = !opts.json && (opts.pretty || std::io::stdout().is_terminal());
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": format!("{e:#}") }), pretty));
            std::process::exit(1);
        }
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    target: Option<String>,
    data: Option<String>,
    words: Option<usize>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        // Load .env file if present
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let value = value.trim().trim_matches('"');
                    if !value.is_empty() && env::var(key.trim()).is_err() {
                        env::set_var(key.trim(), value);
                    }
                }
            }
        }

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--words" | "-w" => {
                    if i + 1 < args.len() {
                        opts.words = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') || arg.len() == 1 => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        // First positional is command
        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        // Second positional is the target (path, message kind, ...)
        if !positional.is_empty() {
            opts.target = Some(positional.remove(0));
        }
        // Rest is data (joined)
        if !positional.is_empty() {
            opts.data = Some(positional.join(" "));
        }

        if opts.words.is_none() {
            opts.words = env::var("SILEX_MNEMONIC_WORDS").ok().and_then(|s| s.parse().ok());
        }

        opts
    }
}

fn print_usage() {
    println!(
        r#"silex - transport envelopes and derivation paths

USAGE:
    silex <command> [target] [data] [options]

COMMANDS:
    path-to-array <path>              Parse "m/44'/12586'/0'/0/0" into indices
    array-to-path <indices>           Render indices (JSON array or comma list) as a path
    decode <kind> <envelope>          Decode an envelope (kind: account, request, signature)
    encode <kind> <json>              Encode a message as an envelope
    encode-signature <json>           Encode {{"signature": ..., "publicKey": ...}}
    generate-mnemonic                 Generate a BIP39 mnemonic

OPTIONS:
    -w, --words <n>      Mnemonic length: 12, 15, 18, 21 or 24 (env: SILEX_MNEMONIC_WORDS)
    --json               Compact JSON output
    --pretty             Pretty JSON output
    -h, --help           Show this help
    -V, --version        Show version

ENVIRONMENT:
    RUST_LOG             Log filter (default: info)
    SILEX_LOG_JSON=1     JSON logs on stderr"#
    );
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

fn join_present(first: Option<&str>, rest: Option<&str>) -> Option<String> {
    match (first, rest) {
        (Some(first), Some(rest)) => Some(format!("{first} {rest}")),
        (Some(first), None) => Some(first.to_string()),
        (None, rest) => rest.map(str::to_string),
    }
}

fn to_value<T: Serialize>(value: &T) -> anyhow::Result<Value> {
    serde_json::to_value(value).context("serialize output")
}

fn cmd_path_to_array(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let path = opts.target.as_deref().context("Usage: silex path-to-array <path>")?;
    Ok(json!(path_to_array(path)?))
}

fn cmd_array_to_path(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let raw = join_present(opts.target.as_deref(), opts.data.as_deref())
        .context("Usage: silex array-to-path <indices>")?;
    let indices = parse_indices(&raw)?;
    Ok(json!({ "path": array_to_path(&indices) }))
}

fn parse_indices(raw: &str) -> anyhow::Result<Vec<u32>> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str(raw).context("indices must be a JSON array of u32");
    }
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u32>().with_context(|| format!("invalid index '{part}'")))
        .collect()
}

fn cmd_decode(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let kind = opts.target.as_deref().context("Usage: silex decode <kind> <envelope>")?;
    let data = opts.data.as_deref().context("Usage: silex decode <kind> <envelope>")?.trim();
    debug!(kind, len = data.len(), "decoding envelope");
    match kind {
        "account" => to_value(&transport::decode_account(data)?),
        "request" | "sign-request" => to_value(&transport::decode_sign_request(data)?),
        "signature" => to_value(&transport::decode_signature(data)?),
        other => bail!("Unknown message kind: {other} (expected account, request or signature)"),
    }
}

fn cmd_encode(kind: Option<&str>, data: Option<&str>) -> anyhow::Result<Value> {
    let kind = kind.context("Usage: silex encode <kind> <json>")?;
    let data = data.context("Usage: silex encode <kind> <json>")?;
    let encoded = match kind {
        "account" => {
            let account: TransportAccount = serde_json::from_str(data).context("parse account")?;
            transport::encode_account(&account)?
        }
        "request" | "sign-request" => {
            let request: SignRequest = serde_json::from_str(data).context("parse sign request")?;
            transport::encode_sign_request(&request)?
        }
        "signature" => {
            let signature: Signature = serde_json::from_str(data).context("parse signature")?;
            transport::encode_signature(&signature)?
        }
        other => bail!("Unknown message kind: {other} (expected account, request or signature)"),
    };
    Ok(json!({ "encoded": encoded }))
}

fn cmd_generate_mnemonic(opts: &ParsedArgs) -> anyhow::Result<Value> {
    let words = opts.words.unwrap_or(DEFAULT_MNEMONIC_WORDS);
    let mnemonic = generate_mnemonic(words)?;
    Ok(json!({ "mnemonic": mnemonic.as_str(), "words": words }))
}
