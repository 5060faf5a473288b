use anyhow::{bail, Context, Result};
use std::env;
use tracing_subscriber::EnvFilter;

use sanctions_registry::{check, search_by_name, Config, RegistryAssembler, SanctionedEntity};

const USAGE: &str = "usage: sanctions-registry <reprocess | status | check <name> | search <name>>";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sanctions_registry=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let config = Config::from_env();
    let assembler = RegistryAssembler::new(&config);

    match args.get(1).map(String::as_str) {
        Some("reprocess") => run_reprocess(&assembler),
        Some("status") => run_status(&assembler),
        Some("check") => run_lookup(&assembler, &args[2..], true),
        Some("search") => run_lookup(&assembler, &args[2..], false),
        _ => bail!(USAGE),
    }
}

fn run_reprocess(assembler: &RegistryAssembler) -> Result<()> {
    println!("Reprocessing sanctions lists");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let report = assembler
        .reprocess()
        .context("Reprocessing failed, previous snapshot kept")?;

    for (source, count) in &report.counts {
        println!("  {:<4} {:>7} entries", source, count);
    }
    for source in &report.skipped {
        println!("  {:<4} skipped (document not found)", source);
    }
    for source in &report.failed {
        println!("  {:<4} failed (see log)", source);
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "✓ Snapshot {} saved with {} entries in {} ms",
        report.snapshot.id,
        report.total(),
        report.elapsed_ms
    );
    Ok(())
}

fn run_status(assembler: &RegistryAssembler) -> Result<()> {
    let store = assembler.store();
    let meta = store
        .latest_meta()
        .with_context(|| format!("Failed to read snapshot store {}", store.path().display()))?;

    let meta = match meta {
        Some(meta) => meta,
        None => {
            println!("No snapshot at {}", store.path().display());
            println!("   Run: sanctions-registry reprocess");
            return Ok(());
        }
    };

    let registry = assembler.load();
    println!("Snapshot:       {}", meta.id);
    println!("Last updated:   {}", meta.created_at.to_rfc3339());
    println!("Format version: {}", meta.format_version);
    println!("Checksum:       {}", meta.checksum);
    println!("Total entries:  {}", meta.entity_count);
    for (source, count) in registry.count_by_source() {
        println!("  {:<4} {:>7}", source, count);
    }
    Ok(())
}

fn run_lookup(assembler: &RegistryAssembler, words: &[String], include_aliases: bool) -> Result<()> {
    if words.is_empty() {
        bail!(USAGE);
    }
    let query = words.join(" ");

    let registry = assembler.load();
    let hit = if include_aliases {
        check(&query, &registry)
    } else {
        search_by_name(&query, &registry)
    };

    match hit {
        Some(entity) => print_match(entity),
        None => println!("No match for {:?} in {} entries", query, registry.len()),
    }
    Ok(())
}

fn print_match(entity: &SanctionedEntity) {
    println!("⚠️  Match: {} [{}]", entity.name, entity.source);
    if let Some(id) = &entity.id {
        println!("   Reference:   {}", id);
    }
    if let Some(dob) = &entity.date_of_birth {
        println!("   DOB:         {}", dob);
    }
    if let Some(nationality) = &entity.nationality {
        println!("   Nationality: {}", nationality);
    }
    for alias in entity.aliases.iter() {
        println!("   a.k.a.       {}", alias);
    }
}
