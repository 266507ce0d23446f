// crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use statesync_config::{Config, ConfigManager};
use std::path::PathBuf;

mod commands;

fn build_cli() -> Command {
    Command::new("statesync")
        .version(env!("CARGO_PKG_VERSION"))
        .author("statesync contributors")
        .about("Encode, inspect and sync application state stored in URLs")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the platform config dir)")
                .global(true),
        )
        .subcommand(
            Command::new("encode")
                .about("Encode a JSON value as rison")
                .arg(Arg::new("json").required(true).value_name("JSON").help("JSON text to encode")),
        )
        .subcommand(
            Command::new("decode")
                .about("Decode rison into pretty JSON")
                .arg(Arg::new("rison").required(true).value_name("RISON").help("Rison text to decode")),
        )
        .subcommand(
            Command::new("read")
                .about("Read the state stored under a key in a URL")
                .arg(url_arg().required(true))
                .arg(key_arg()),
        )
        .subcommand(
            Command::new("write")
                .about("Store a state under a key in a URL and print the new URL")
                .arg(url_arg().required(true))
                .arg(key_arg())
                .arg(state_arg().required(true))
                .arg(
                    Arg::new("hashed")
                        .long("hashed")
                        .help("Put a hash in the URL and the state in session storage")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("session")
                .about("Run a scripted sync between a store and an in-memory history")
                .arg(url_arg().default_value("http://localhost/app#/"))
                .arg(key_arg())
                .arg(state_arg().required(true).help("Initial store state as a JSON object"))
                .arg(
                    Arg::new("set")
                        .long("set")
                        .value_name("JSON")
                        .help("Store state to set after start (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("back")
                        .long("back")
                        .help("Navigate back once after all store updates")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("truth-source")
                        .long("truth-source")
                        .value_name("SOURCE")
                        .help("Which side wins on start (defaults to the config value)")
                        .value_parser(["storage", "store", "none"]),
                )
                .arg(
                    Arg::new("strategy")
                        .long("strategy")
                        .value_name("STRATEGY")
                        .help("Sync strategy (defaults to the config value)")
                        .value_parser(["url", "hashed_url"]),
                )
                .arg(
                    Arg::new("settle-ms")
                        .long("settle-ms")
                        .value_name("MS")
                        .help("How long to let sync settle after each step")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("50"),
                ),
        )
}

fn url_arg() -> Arg {
    Arg::new("url")
        .short('u')
        .long("url")
        .value_name("URL")
        .help("Application URL")
}

fn key_arg() -> Arg {
    Arg::new("key")
        .short('k')
        .long("key")
        .value_name("KEY")
        .help("URL parameter that holds the state")
        .default_value("_a")
}

fn state_arg() -> Arg {
    Arg::new("state")
        .short('s')
        .long("state")
        .value_name("JSON")
        .help("State as a JSON object")
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let manager = match matches.get_one::<String>("config-dir") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    }
    .context("Failed to locate config directory")?;

    Ok(manager.load_with_env_overrides().unwrap_or_else(|e| {
        eprintln!("Config error: {}, using defaults", e);
        Config::default()
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = load_config(&matches)?;

    let level = config.app.effective_log_level().to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match matches.subcommand() {
        Some(("encode", sub_matches)) => commands::encode(sub_matches),
        Some(("decode", sub_matches)) => commands::decode(sub_matches),
        Some(("read", sub_matches)) => commands::read_state(&config, sub_matches),
        Some(("write", sub_matches)) => commands::write_state(&config, sub_matches),
        Some(("session", sub_matches)) => commands::run_session(&config, sub_matches).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
