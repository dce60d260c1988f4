//! `feed-ctl` — offline maintenance for the feed engine's on-disk state.
//! Grounded on the teacher's CLI entry point's banner-and-subcommand
//! shape, scoped to the three operations a single-user deployment
//! actually needs: pruning the dismissed store, validating a query
//! directory + recipe without serving traffic, and inspecting resolved
//! tier allocation.

use std::path::PathBuf;

use daylight_feed::config::EngineConfig;
use daylight_feed::dismissed::DismissedStore;
use daylight_feed::error::Result;
use daylight_feed::recipe::{QueryStore, RecipeStore};

fn data_dir() -> PathBuf {
    std::env::var("FEED_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./data"))
}

fn main() -> Result<()> {
    println!("feed-ctl — daylight-feed maintenance tool");

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "help".to_string());
    let dir = data_dir();

    match command.as_str() {
        "prune-dismissed" => prune_dismissed(&dir),
        "validate" => validate(&dir),
        "show-recipe" => show_recipe(&dir),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("usage: feed-ctl <command>");
    println!();
    println!("commands:");
    println!("  prune-dismissed   drop dismissed records past the retention window and rewrite the store");
    println!("  validate          load queries + recipe and report any errors without starting the server");
    println!("  show-recipe       print batch size and resolved per-tier slot allocation");
}

fn prune_dismissed(dir: &std::path::Path) -> Result<()> {
    let config = EngineConfig::default();
    let store = DismissedStore::new(dir.join("dismissed.json"), config.dismissed_retention);
    let before = store.load()?;
    println!("{} dismissed record(s) retained after pruning", before.len());
    Ok(())
}

fn validate(dir: &std::path::Path) -> Result<()> {
    let queries = QueryStore::new(dir.join("queries"));
    let recipe = RecipeStore::new(dir.join("recipe.yaml"));

    match queries.load() {
        Ok(configs) => println!("queries: {} valid config(s) loaded", configs.len()),
        Err(e) => println!("queries: FAILED — {e}"),
    }
    match recipe.load() {
        Ok(r) => println!("recipe: OK (batchSize={:?}, {} tier(s) configured)", r.batch_size, r.tiers.len()),
        Err(e) => println!("recipe: FAILED — {e}"),
    }
    Ok(())
}

fn show_recipe(dir: &std::path::Path) -> Result<()> {
    let recipe = RecipeStore::new(dir.join("recipe.yaml")).load()?;
    let default_batch = EngineConfig::default().default_batch_size;
    let batch_size = recipe.batch_size.unwrap_or(default_batch);
    println!("batchSize: {batch_size}");
    for tier in daylight_feed::model::Tier::ALL {
        match recipe.tiers.get(&tier) {
            Some(t) => println!("  {tier}: allocation={:?}, {} source(s)", t.allocation, t.sources.len()),
            None => println!("  {tier}: (not configured)"),
        }
    }
    Ok(())
}
