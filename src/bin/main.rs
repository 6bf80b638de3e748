//! Amdtel CLI - profile sealing and address tooling
//!
//!   amdtel canonical <address>               → {"address", "canonical", "valid"}
//!   amdtel user-id <address>                 → {"userId", "pointerKey"}
//!   amdtel balance <lovelace>                → {"lovelace", "formatted"}
//!   amdtel save --address <a> [fields]       → {"profile", "contentId", "pointerKey"}
//!   amdtel load <cid> --address <a>          → profile JSON
//!   amdtel encrypt --secret <s> <json>       → envelope JSON
//!   amdtel decrypt --secret <s> <json>       → profile JSON
//!
//! Storage comes from AMDTEL_* variables (a `.env` in the working directory is
//! read first) or from --backend / --root / --gateway.

use amdtel::logging::init_logging;
use amdtel::profile::pointer_key;
use amdtel::wallet::format_balance;
use amdtel::{
    decrypt_profile, encrypt_profile, generate_user_id, is_valid_address, to_canonical_form, AmdtelConfig,
    ContentBackend, ContentId, EncryptedProfile, EventBus, ProfileDraft, ProfilePipeline, UserProfile,
};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use tracing::debug;

const APP: &str = "amdtel";

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);
    init_logging();

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("amdtel {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    debug!(command = ?opts.command, "dispatching");
    let result = match opts.command.as_deref() {
        Some("canonical") => cmd_canonical(&opts),
        Some("user-id") => cmd_user_id(&opts),
        Some("balance") => cmd_balance(&opts),
        Some("save") => cmd_save(&opts),
        Some("load") => cmd_load(&opts),
        Some("encrypt") => cmd_encrypt(&opts),
        Some("decrypt") => cmd_decrypt(&opts),
        Some(cmd) => Err(format!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": e }), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    target: Option<String>,
    data: Option<String>,
    address: Option<String>,
    secret: Option<String>,
    username: Option<String>,
    email: Option<String>,
    bio: Option<String>,
    avatar: Option<String>,
    backend: Option<String>,
    root: Option<String>,
    gateway: Option<String>,
    app: Option<String>,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        load_dotenv();

        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let slot = match arg.as_str() {
                "--help" | "-h" => {
                    opts.help = true;
                    None
                }
                "--version" | "-V" => {
                    opts.version = true;
                    None
                }
                "--pretty" => {
                    opts.pretty = true;
                    None
                }
                "--address" | "-a" => Some(&mut opts.address),
                "--secret" | "-s" => Some(&mut opts.secret),
                "--username" | "-u" => Some(&mut opts.username),
                "--email" => Some(&mut opts.email),
                "--bio" => Some(&mut opts.bio),
                "--avatar" => Some(&mut opts.avatar),
                "--backend" | "-b" => Some(&mut opts.backend),
                "--root" | "-d" => Some(&mut opts.root),
                "--gateway" | "-g" => Some(&mut opts.gateway),
                "--app" => Some(&mut opts.app),
                _ if !arg.starts_with('-') => {
                    positional.push(arg.clone());
                    None
                }
                _ => None, // Ignore unknown flags
            };
            if let Some(slot) = slot {
                if i + 1 < args.len() {
                    *slot = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        opts.command = positional.next();
        opts.target = positional.next();
        let rest: Vec<String> = positional.collect();
        if !rest.is_empty() {
            opts.data = Some(rest.join(" "));
        }

        opts
    }
}

/// `.env` in the working directory; never overrides variables already set.
fn load_dotenv() {
    let Ok(contents) = std::fs::read_to_string(".env") else { return };
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

fn print_usage() {
    println!(
        r#"amdtel - wallet-encrypted profiles on content-addressed storage

USAGE:
    amdtel <command> [target] [data] [options]

COMMANDS:
    canonical <address>         Canonical (bech32) form of a hex/base64 address
    user-id <address>           Profile id and pointer key for an address
    balance <lovelace>          Format a lovelace amount as ADA
    save --address <a>          Seal and store a profile, print its content id
    load <cid> --address <a>    Fetch and open a stored profile
    encrypt --secret <s> <json> Seal a profile JSON without storing it
    decrypt --secret <s> <json> Open an envelope JSON

PROFILE OPTIONS:
    --username, -u <name>
    --email <email>
    --bio <text>
    --avatar <url>

STORAGE OPTIONS:
    --backend, -b <kind>        memory|fs|ipfs (env: AMDTEL_BACKEND, default fs)
    --root, -d <path>           Data root (env: AMDTEL_ROOT)
    --gateway, -g <url>         IPFS API base (env: AMDTEL_GATEWAY)
    --app <name>                Data namespace (default amdtel)

OUTPUT OPTIONS:
    --pretty                    Pretty-print JSON
    --version, -V               Print version

ENVIRONMENT:
    AMDTEL_API_KEY, AMDTEL_PINNING_SERVICE, AMDTEL_LOG_JSON=1, RUST_LOG

EXAMPLES:
    amdtel save --address addr_test1qz... --username bob
    amdtel load bafkrei... --address addr_test1qz...
"#
    );
}

fn required<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str, String> {
    value.as_deref().filter(|v| !v.is_empty()).ok_or_else(|| format!("{} required", what))
}

fn cmd_canonical(opts: &ParsedArgs) -> Result<Value, String> {
    let address = required(&opts.target, "address")?;
    let canonical = to_canonical_form(address);
    Ok(json!({
        "address": address,
        "canonical": canonical,
        "valid": is_valid_address(&canonical),
    }))
}

fn cmd_user_id(opts: &ParsedArgs) -> Result<Value, String> {
    let address = required(&opts.target, "address")?;
    let user_id = generate_user_id(address);
    Ok(json!({ "userId": user_id, "pointerKey": pointer_key(&user_id) }))
}

fn cmd_balance(opts: &ParsedArgs) -> Result<Value, String> {
    let lovelace = required(&opts.target, "lovelace amount")?;
    Ok(json!({ "lovelace": lovelace, "formatted": format_balance(lovelace) }))
}

fn cmd_encrypt(opts: &ParsedArgs) -> Result<Value, String> {
    let secret = required(&opts.secret, "--secret")?;
    let raw = opts.target.as_deref().map(|t| match &opts.data {
        Some(rest) => format!("{} {}", t, rest),
        None => t.to_string(),
    });
    let raw = required(&raw, "profile JSON")?;
    let profile: UserProfile = serde_json::from_str(raw).map_err(|e| format!("Invalid profile JSON: {}", e))?;
    let sealed = encrypt_profile(&profile, secret).map_err(|e| e.to_string())?;
    serde_json::to_value(sealed).map_err(|e| e.to_string())
}

fn cmd_decrypt(opts: &ParsedArgs) -> Result<Value, String> {
    let secret = required(&opts.secret, "--secret")?;
    let raw = opts.target.as_deref().map(|t| match &opts.data {
        Some(rest) => format!("{} {}", t, rest),
        None => t.to_string(),
    });
    let raw = required(&raw, "envelope JSON")?;
    let sealed: EncryptedProfile = serde_json::from_str(raw).map_err(|e| format!("Invalid envelope JSON: {}", e))?;
    let profile = decrypt_profile(&sealed, secret).map_err(|e| e.to_string())?;
    serde_json::to_value(profile).map_err(|e| e.to_string())
}

fn cmd_save(opts: &ParsedArgs) -> Result<Value, String> {
    let address = required(&opts.address, "--address")?.to_string();
    let mut draft = ProfileDraft::new();
    if let Some(v) = &opts.username { draft = draft.with_username(v.as_str()); }
    if let Some(v) = &opts.email { draft = draft.with_email(v.as_str()); }
    if let Some(v) = &opts.bio { draft = draft.with_bio(v.as_str()); }
    if let Some(v) = &opts.avatar { draft = draft.with_avatar(v.as_str()); }

    let pipeline = open_pipeline(opts)?;
    let saved = block_on(async move { pipeline.save_for_address(&address, draft).await })?
        .map_err(|e| e.to_string())?;
    let pointer = saved.pointer_key();
    Ok(json!({
        "profile": saved.profile,
        "contentId": saved.content_id,
        "pointerKey": pointer,
    }))
}

fn cmd_load(opts: &ParsedArgs) -> Result<Value, String> {
    let content_id = ContentId::new(required(&opts.target, "content id")?);
    let address = required(&opts.address, "--address")?.to_string();

    let pipeline = open_pipeline(opts)?;
    let profile = block_on(async move { pipeline.load_profile(&content_id, &address).await })?
        .map_err(|e| e.to_string())?;
    serde_json::to_value(profile).map_err(|e| e.to_string())
}

fn open_pipeline(opts: &ParsedArgs) -> Result<ProfilePipeline, String> {
    let app = opts.app.clone().unwrap_or_else(|| APP.to_string());
    let mut config = AmdtelConfig::from_env(app).map_err(|e| e.to_string())?;
    if let Some(backend) = &opts.backend {
        let parsed = ContentBackend::parse(backend).ok_or_else(|| format!("Invalid backend: {}", backend))?;
        config = config.with_backend(parsed);
    }
    if let Some(root) = &opts.root {
        config = config.with_root(root);
    }
    if let Some(gateway) = &opts.gateway {
        config.content.gateway = gateway.clone();
    }
    let store = config.open_content_store().map_err(|e| e.to_string())?;
    Ok(ProfilePipeline::new(store, EventBus::new()))
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, String> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| format!("Failed to start runtime: {}", e))?;
    Ok(rt.block_on(future))
}
