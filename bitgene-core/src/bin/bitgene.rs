//! bitgene CLI — breed synthetic genomes and inspect their family tree
//!
//! Commands:
//!   bitgene create    — build a genome from a seed (or a random one)
//!   bitgene cross     — cross two seeds into a child
//!   bitgene clone     — single-parent replication of a seed
//!   bitgene distance  — fitness and distance of two seeds
//!   bitgene family    — bootstrap founders + offspring into the store
//!   bitgene ancestry  — print the pedigree of a stored member
//!   bitgene members   — list stored members
//!   bitgene demo      — run a full walkthrough without touching the store

use bitgene_core::family::DEFAULT_DEPTH_LIMIT;
use bitgene_core::{Family, FamilyConfig, FamilyStore, Genome, GenomeLayout, ParentRef};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::env;

const STORE_FILE: &str = "bitgene-family.json";

fn print_usage() {
    println!(
        r#"
╔══════════════════════════════════════════════════════════════╗
║        bitgene — deterministic genomes + family lineage      ║
╚══════════════════════════════════════════════════════════════╝

Usage: bitgene <command> [options]

Commands:
  create    [seed]                                  Build a genome (random seed if omitted)
  cross     <seed_a> <seed_b> [branch]              Cross two genomes
  clone     <seed> [branch]                         Replicate a single genome
  distance  <seed_a> <seed_b>                       Fitness and distance of two genomes
  family    [founders] [offspring] [rng-seed]       Bootstrap a family into the store
  family    --config <file.json>                    Bootstrap from a JSON FamilyConfig
  ancestry  <id> [depth-limit]                      Print the pedigree of a member
  members                                           List stored members
  demo                                              Run a walkthrough (no store)

Examples:
  bitgene create 3178
  bitgene cross 1234 5678 2
  bitgene family 25 9 42
  bitgene ancestry 30
"#
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "create" => cmd_create(&args[2..]),
        "cross" => cmd_cross(&args[2..]),
        "clone" => cmd_clone(&args[2..]),
        "distance" => cmd_distance(&args[2..]),
        "family" => cmd_family(&args[2..]),
        "ancestry" => cmd_ancestry(&args[2..]),
        "members" => cmd_members(),
        "demo" => cmd_demo(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
        }
    }
}

/// Parse a numeric argument, reporting which one was malformed
fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, name: &str) -> Option<T> {
    let raw = args.get(index)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            eprintln!("  {} must be a number, got '{}'", name, raw);
            None
        }
    }
}

fn genome_from_arg(args: &[String], index: usize, name: &str) -> Option<Genome> {
    let seed: u64 = parse_arg(args, index, name)?;
    match Genome::new(seed) {
        Ok(genome) => Some(genome),
        Err(e) => {
            eprintln!("  {}", e);
            None
        }
    }
}

fn print_genome(label: &str, genome: &Genome) {
    println!("  {}", label);
    println!("    {}", genome.summary());
    println!(
        "    Blocks     : {} | {:?}",
        genome.blocks().len(),
        genome.sums()
    );
    println!("    Fitness    : {}", genome.fitness());
    println!("    Canonical  : {}", genome.canonical_id().unwrap_or("-"));
}

fn load_store() -> Option<FamilyStore> {
    match FamilyStore::open(STORE_FILE) {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("  Failed to open {}: {}", STORE_FILE, e);
            None
        }
    }
}

fn save_store(store: &mut FamilyStore) {
    if let Err(e) = store.save() {
        eprintln!("  Failed to save: {}", e);
    } else {
        println!("  Saved to {}", STORE_FILE);
    }
}

fn cmd_create(args: &[String]) {
    let genome = if args.is_empty() {
        let mut rng = ChaCha8Rng::from_entropy();
        Genome::random(GenomeLayout::default(), &mut rng)
    } else {
        let Some(seed) = parse_arg::<u64>(args, 0, "seed") else {
            return;
        };
        Genome::new(seed)
    };
    match genome {
        Ok(genome) => print_genome("Created", &genome),
        Err(e) => eprintln!("  {}", e),
    }
}

fn cmd_cross(args: &[String]) {
    if args.len() < 2 {
        eprintln!("Usage: bitgene cross <seed_a> <seed_b> [branch]");
        return;
    }
    let (Some(mut a), Some(b)) = (
        genome_from_arg(args, 0, "seed_a"),
        genome_from_arg(args, 1, "seed_b"),
    ) else {
        return;
    };
    let branch: u64 = parse_arg(args, 2, "branch").unwrap_or(0);

    match a.crossover(&b, branch) {
        Ok(child) => {
            print_genome("Parent A", &a);
            print_genome("Parent B", &b);
            print_genome("Child", &child);
            if let Ok(d) = child.distance(&a) {
                println!("  Distance to A: {:.4}", d);
            }
            if let Ok(d) = child.distance(&b) {
                println!("  Distance to B: {:.4}", d);
            }
        }
        Err(e) => eprintln!("  Crossover failed: {}", e),
    }
}

fn cmd_clone(args: &[String]) {
    if args.is_empty() {
        eprintln!("Usage: bitgene clone <seed> [branch]");
        return;
    }
    let Some(mut parent) = genome_from_arg(args, 0, "seed") else {
        return;
    };
    let branch: u64 = parse_arg(args, 1, "branch").unwrap_or(0);
    let child = parent.replicate(branch);
    print_genome("Parent", &parent);
    print_genome("Clone", &child);
}

fn cmd_distance(args: &[String]) {
    if args.len() < 2 {
        eprintln!("Usage: bitgene distance <seed_a> <seed_b>");
        return;
    }
    let (Some(a), Some(b)) = (
        genome_from_arg(args, 0, "seed_a"),
        genome_from_arg(args, 1, "seed_b"),
    ) else {
        return;
    };
    println!("  Fitness A : {}", a.fitness());
    println!("  Fitness B : {}", b.fitness());
    match a.distance(&b) {
        Ok(d) => println!("  Distance  : {:.4}", d),
        Err(e) => eprintln!("  {}", e),
    }
}

fn family_config(args: &[String]) -> Option<FamilyConfig> {
    if args.first().map(String::as_str) == Some("--config") {
        let Some(path) = args.get(1) else {
            eprintln!("Usage: bitgene family --config <file.json>");
            return None;
        };
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("  Failed to read {}: {}", path, e);
                return None;
            }
        };
        return match FamilyConfig::from_json(&json) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("  Invalid config {}: {}", path, e);
                None
            }
        };
    }

    let mut config = FamilyConfig::default();
    if args.first().is_some() {
        config.founders = parse_arg(args, 0, "founders")?;
    }
    if args.get(1).is_some() {
        config.offspring = parse_arg(args, 1, "offspring")?;
    }
    if args.get(2).is_some() {
        config.rng_seed = Some(parse_arg(args, 2, "rng-seed")?);
    }
    Some(config)
}

fn cmd_family(args: &[String]) {
    let Some(config) = family_config(args) else {
        return;
    };
    if let Err(e) = config.validate() {
        eprintln!("  {}", e);
        return;
    }
    let Some(mut store) = load_store() else {
        return;
    };
    if store.family.is_empty() && store.family.layout() != config.layout {
        store.family = Family::with_layout(config.layout);
    }

    let mut rng = config.rng();
    let members = match store
        .family
        .bootstrap(config.founders, config.offspring, &mut rng)
    {
        Ok(members) => members,
        Err(e) => {
            eprintln!("  Bootstrap failed: {}", e);
            return;
        }
    };
    store.record_bootstrap();

    println!("\n  * * * * Offspring Data:");
    println!("  Pool       : {}", store.family.len());
    println!();
    let tail = members.len().saturating_sub(5);
    for member in &members[tail..] {
        print_genome("Member", member);
        println!(
            "    Lineage    : {}",
            store.family.ancestry_of(member, config.depth_limit)
        );
        println!();
    }
    save_store(&mut store);
}

fn cmd_ancestry(args: &[String]) {
    let Some(id) = parse_arg::<u64>(args, 0, "id") else {
        eprintln!("Usage: bitgene ancestry <id> [depth-limit]");
        return;
    };
    let depth_limit: usize = parse_arg(args, 1, "depth-limit").unwrap_or(DEFAULT_DEPTH_LIMIT);
    let Some(store) = load_store() else {
        return;
    };
    println!("  {}", store.family.ancestry(id, depth_limit));
}

fn cmd_members() {
    let Some(store) = load_store() else {
        return;
    };
    if store.family.is_empty() {
        println!("\n  No members. Use 'bitgene family' or 'bitgene demo' to get started.");
        return;
    }
    println!("\n  {}", store.summary());
    println!("  {}", "-".repeat(80));
    for (id, genome) in store.family.members() {
        let generation = store.family.generation_of(*id).unwrap_or(0);
        println!("  [{:>4}] G{:<3} {}", id, generation, genome.summary());
    }
    for (canonical, ids) in store.family.duplicates() {
        println!("  duplicate {}… -> {:?}", canonical.get(..12).unwrap_or(canonical), ids);
    }
}

fn cmd_demo() {
    println!("\n  === Step 1: Codec ===");
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let layout = GenomeLayout::default();
    let founders: Vec<Genome> = (0..2)
        .filter_map(|_| Genome::random(layout, &mut rng).ok())
        .collect();
    for founder in &founders {
        print_genome("Founder", founder);
    }

    println!("\n  === Step 2: Reproduction ===");
    let mut family = Family::with_layout(layout);
    let mut pair = founders.into_iter();
    let (Some(mut a), Some(mut b)) = (pair.next(), pair.next()) else {
        return;
    };
    let child = match family.pair(ParentRef::from(&mut a), ParentRef::from(&mut b), 0) {
        Ok(child) => child,
        Err(e) => {
            eprintln!("  Pairing failed: {}", e);
            return;
        }
    };
    print_genome("Child", &child);
    println!("  Lineage: {}", family.ancestry_of(&child, DEFAULT_DEPTH_LIMIT));

    println!("\n  === Step 3: Family bootstrap ===");
    let mut family = Family::with_layout(layout);
    match family.bootstrap(6, 12, &mut rng) {
        Ok(members) => {
            println!("  {}", family.summary());
            if let Some(last) = members.last() {
                println!(
                    "  Deepest lineage: {}",
                    family.ancestry_of(last, DEFAULT_DEPTH_LIMIT)
                );
            }
            for (generation, ids) in family.by_generation() {
                println!("  G{}: {:?}", generation, ids);
            }
        }
        Err(e) => eprintln!("  Bootstrap failed: {}", e),
    }
}
