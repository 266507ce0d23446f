// crates/cli/src/commands.rs

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use console::style;
use statesync_config::Config;
use statesync_core::{into_base_state, BaseState};
use statesync_sync_engine::{
    sync_state, InitialTruthSource, StateContainer, Store, SyncConfig, SyncStrategyKind,
    UrlSyncContext,
};
use statesync_url::{
    get_state_from_url, set_state_to_url, MemoryHistory, SetStateOptions, UrlControls,
};
use std::sync::Arc;
use std::time::Duration;

/// Encode a JSON value as rison
pub fn encode(matches: &ArgMatches) -> Result<()> {
    let json = required(matches, "json")?;
    println!("{}", encode_json(json)?);
    Ok(())
}

/// Decode rison into pretty JSON
pub fn decode(matches: &ArgMatches) -> Result<()> {
    let rison = required(matches, "rison")?;
    println!("{}", decode_rison(rison)?);
    Ok(())
}

/// Read the state stored under a key in a URL
pub fn read_state(config: &Config, matches: &ArgMatches) -> Result<()> {
    let url = required(matches, "url")?;
    let key = required(matches, "key")?;
    let hashed = config.url.hashed_item_store();

    match get_state_from_url(key, url, config.url.state_location, &hashed) {
        Some(state) => println!("{}", pretty(&state)?),
        None => println!("No readable state stored under {}", style(key).yellow()),
    }
    Ok(())
}

/// Store a state under a key in a URL
pub fn write_state(config: &Config, matches: &ArgMatches) -> Result<()> {
    let url = required(matches, "url")?;
    let key = required(matches, "key")?;
    let state = parse_state(required(matches, "state")?)?;
    let use_hash = matches.get_flag("hashed") || config.sync.store_in_session_storage;

    let hashed = config.url.hashed_item_store();
    let opts = SetStateOptions {
        use_hash,
        location: config.url.state_location,
    };
    let new_url = set_state_to_url(key, &state, opts, url, &hashed)
        .context("Failed to write state into URL")?;

    println!("{}", new_url);
    if use_hash {
        println!(
            "{} hashed state lives in this process's session storage only",
            style("note:").dim()
        );
    }
    Ok(())
}

/// Run a scripted sync session and print the resulting history
pub async fn run_session(config: &Config, matches: &ArgMatches) -> Result<()> {
    let url = required(matches, "url")?;
    let key = required(matches, "key")?;
    let initial = parse_state(required(matches, "state")?)?;
    let updates = matches
        .get_many::<String>("set")
        .map(|values| values.map(|v| parse_state(v)).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();
    let settle = Duration::from_millis(matches.get_one::<u64>("settle-ms").copied().unwrap_or(50));

    let strategy = match matches.get_one::<String>("strategy") {
        Some(name) => parse_strategy(name)?,
        None => config.sync.effective_strategy(),
    };
    let truth_source = match matches.get_one::<String>("truth-source") {
        Some(name) => parse_truth_source(name)?,
        None => config.sync.initial_truth_source,
    };

    let ctx = session_context(config, url);
    let store = Arc::new(StateContainer::with_change_buffer(initial, config.url.change_buffer));

    let handle = sync_state(
        &ctx,
        [SyncConfig::new(key, store.clone())
            .with_strategy(strategy)
            .with_initial_truth_source(truth_source)],
    )
    .context("Failed to start sync")?;

    tokio::time::sleep(settle).await;
    print_step("start", &ctx, store.as_ref())?;

    for update in updates {
        store.set(update);
        tokio::time::sleep(settle).await;
        print_step("set", &ctx, store.as_ref())?;
    }

    if matches.get_flag("back") {
        if ctx.controls.history().back() {
            tokio::time::sleep(settle).await;
            print_step("back", &ctx, store.as_ref())?;
        } else {
            println!("{} nothing to go back to", style("back").yellow());
        }
    }

    handle.stop();
    handle.join().await;

    println!("\n{}", style("History").bold().cyan());
    println!("{}", "=".repeat(60));
    let history = ctx.controls.history();
    for (index, entry) in history.entries().iter().enumerate() {
        let marker = if index == history.index() { ">" } else { " " };
        println!("{} {:>2}  {}", marker, index, entry);
    }

    Ok(())
}

fn session_context(config: &Config, url: &str) -> UrlSyncContext {
    let history = MemoryHistory::with_listener_capacity(url, config.url.change_buffer);
    UrlSyncContext::new(UrlControls::new(history), config.url.hashed_item_store())
        .with_location(config.url.state_location)
}

fn print_step(label: &str, ctx: &UrlSyncContext, store: &dyn Store) -> Result<()> {
    println!("{} {}", style(format!("[{}]", label)).green().bold(), ctx.controls.get_url());
    println!("      store: {}", serde_json::to_string(&store.get())?);
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("--{} is required", name))
}

fn encode_json(json: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(json).context("Input is not valid JSON")?;
    Ok(statesync_rison::to_string(&value))
}

fn decode_rison(rison: &str) -> Result<String> {
    let value = statesync_rison::from_str(rison).context("Input is not valid rison")?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn parse_state(json: &str) -> Result<BaseState> {
    let value: serde_json::Value = serde_json::from_str(json).context("State is not valid JSON")?;
    into_base_state(value).context("State must be a JSON object")
}

fn parse_strategy(name: &str) -> Result<SyncStrategyKind> {
    match name {
        "url" => Ok(SyncStrategyKind::Url),
        "hashed_url" => Ok(SyncStrategyKind::HashedUrl),
        other => bail!("Unknown strategy: {}", other),
    }
}

fn parse_truth_source(name: &str) -> Result<InitialTruthSource> {
    match name {
        "storage" => Ok(InitialTruthSource::Storage),
        "store" => Ok(InitialTruthSource::Store),
        "none" => Ok(InitialTruthSource::None),
        other => bail!("Unknown truth source: {}", other),
    }
}

fn pretty(state: &BaseState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

#[cfg(test)]
mod tests;
