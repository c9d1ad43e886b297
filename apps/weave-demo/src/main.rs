//! # Weave Demo
//!
//! A standalone CLI walking through the event-graph walker:
//! replicas author events, exchange what the other side is missing, and
//! replay the graph to reach the same document.
//!
//! ## Sync model
//!
//! ```text
//! missing = source.changes_since(target.frontier)   (parents first)
//! target.ingest_batch(missing)
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use weave_graph::{EventId, Op, Path};
use weave_walker::{Document, Snapshot, UndoManager, Walker};

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "weave-demo")]
#[command(about = "Event-graph walker walkthroughs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Basic demo: two replicas edit a document, sync, and converge
    Demo,
    /// Time travel: rebuild the document at earlier frontiers
    Rebuild,
    /// Undo and redo over a shared history
    Undo {
        /// Number of edits to make before undoing
        #[arg(short, long, default_value_t = 4)]
        edits: usize,
    },
    /// Export a snapshot and restore it on a fresh replica
    Snapshot {
        /// Print the snapshot JSON
        #[arg(short, long)]
        print: bool,
    },
}

// ─── Pretty printing ──────────────────────────────────────────────────────

fn header(text: &str) {
    let bar = "═".repeat(60);
    println!("\n{}", bar.bright_cyan());
    println!("  {}", text.bold().bright_white());
    println!("{}", bar.bright_cyan());
}

fn section(text: &str) {
    println!("\n{} {}", "▸".bright_yellow(), text.bold());
}

fn step(text: &str) {
    println!("  {} {}", "•".bright_green(), text);
}

fn failure(text: &str) {
    println!("  {} {}", "✗".bright_red().bold(), text.bright_red());
}

fn sync_arrow(from: &str, to: &str, count: usize) {
    println!(
        "  {} {} {} {}",
        from.bright_magenta(),
        format!("──{} events──▶", count).bright_cyan(),
        to.bright_magenta(),
        "✓".bright_green()
    );
}

fn show_frontier(frontier: &[EventId]) -> String {
    if frontier.is_empty() {
        return "[]".to_string();
    }
    let ids: Vec<&str> = frontier.iter().map(|id| id.as_str()).collect();
    format!("[{}]", ids.join(", "))
}

fn show_replica(walker: &Walker) {
    let border = "─".repeat(52);
    println!("  ┌{}┐", border);
    println!(
        "  │ {:^50} │",
        format!("Replica: {}", walker.replica_id()).bright_yellow().to_string()
    );
    println!("  ├{}┤", border);
    let stats = walker.graph().stats();
    println!(
        "  │ {:<50} │",
        format!(
            "events: {}  heads: {}  depth: {}",
            stats.total_events, stats.head_count, stats.max_depth
        )
    );
    println!("  │ {:<50} │", format!("frontier: {}", show_frontier(&walker.frontier())));
    println!("  └{}┘", border);
    println!("    {}", walker.root().to_plain_json().to_string().dimmed());
}

fn convergence_result(converged: bool) {
    if converged {
        println!(
            "\n  {} {}",
            "✓".bright_green().bold(),
            "ALL REPLICAS CONVERGED: documents and frontiers match!"
                .bright_green()
                .bold()
        );
    } else {
        println!(
            "\n  {} {}",
            "✗".bright_red().bold(),
            "DIVERGENCE DETECTED: replicas differ!".bright_red().bold()
        );
    }
}

/// Send everything `to` is missing from `from`. Returns the number applied.
fn sync(from: &Walker, to: &mut Walker) -> Result<usize, weave_walker::WalkerError> {
    let missing: Vec<_> = from
        .graph()
        .changes_since(&to.frontier())
        .into_iter()
        .cloned()
        .collect();
    let count = to.ingest_batch(missing)?;
    sync_arrow(from.replica_id().as_str(), to.replica_id().as_str(), count);
    Ok(count)
}

// ─── Demo ──────────────────────────────────────────────────────────────────

fn run_demo() -> Result<(), weave_walker::WalkerError> {
    header("DEMO: Two Replicas, One Document");

    section("Phase 1: Each replica edits its own part of the document");
    let mut alice = Document::with_replica("alice");
    let mut bob = Document::with_replica("bob");

    alice.map_set(["meta"], "title", json!("Groceries"))?;
    step("alice: meta.title = \"Groceries\"");
    alice.list_insert(["items"], 0, vec![json!("milk"), json!("eggs")])?;
    step("alice: items.insert(0, [milk, eggs])");

    bob.text_insert(["notes"], 0, "buy before noon")?;
    step("bob:   notes.insert(0, \"buy before noon\")");
    bob.map_set(["meta"], "owner", json!("bob"))?;
    step("bob:   meta.owner = \"bob\"");

    show_replica(alice.walker());
    show_replica(bob.walker());

    section("Phase 2: Bidirectional sync");
    let snapshot_of_bob = bob.walker().clone();
    sync(&snapshot_of_bob, alice.walker_mut())?;
    let snapshot_of_alice = alice.walker().clone();
    sync(&snapshot_of_alice, bob.walker_mut())?;

    section("Phase 3: Post-sync state");
    show_replica(alice.walker());
    show_replica(bob.walker());

    let converged = alice.to_json() == bob.to_json()
        && bob.walker().graph().is_current_frontier(&alice.walker().frontier());
    convergence_result(converged);
    Ok(())
}

// ─── Rebuild ───────────────────────────────────────────────────────────────

fn run_rebuild() -> Result<(), weave_walker::WalkerError> {
    header("REBUILD: Time Travel Over the Event Graph");

    section("Phase 1: Record a frontier after every edit");
    let mut walker = Walker::with_replica("writer");
    let edits = [
        Op::text_insert(["draft"], 0, "Hello"),
        Op::text_insert(["draft"], 5, " world"),
        Op::text_delete(["draft"], 0, 6),
        Op::map_set(Path::root(), "published", json!(true)),
    ];

    let mut checkpoints = Vec::new();
    for op in edits {
        let event = walker.author(op)?;
        step(&format!(
            "{} {}",
            event.id.as_str().bright_magenta(),
            event.operation.type_name()
        ));
        checkpoints.push(walker.frontier());
    }
    show_replica(&walker);

    section("Phase 2: Walk back through every version");
    for frontier in checkpoints.iter().rev() {
        walker.rebuild_at(frontier)?;
        step(&format!(
            "at {:<12} {}",
            show_frontier(frontier),
            walker.root().to_plain_json()
        ));
    }

    section("Phase 3: Rebuild at the empty version");
    walker.rebuild_at(&[])?;
    step(&format!("at []           {}", walker.root().to_plain_json()));
    step(&format!(
        "graph still holds {} events",
        walker.graph().len()
    ));
    Ok(())
}

// ─── Undo ──────────────────────────────────────────────────────────────────

fn run_undo(edits: usize) -> Result<(), weave_walker::WalkerError> {
    header("UNDO: Version-Based Undo and Redo");

    let mut walker = Walker::with_replica("editor");
    let mut undo = UndoManager::for_walker(&walker);

    section(&format!("Phase 1: {} edits, each tracked", edits));
    for i in 0..edits {
        walker.author(Op::list_insert(["log"], i, vec![json!(format!("entry {}", i))]))?;
        undo.track(&walker);
        step(&format!("log.push(\"entry {}\")", i));
    }
    show_replica(&walker);

    section("Phase 2: Undo twice");
    for _ in 0..2 {
        if undo.undo(&mut walker)? {
            step(&format!("undo → {}", walker.root().to_plain_json()));
        } else {
            failure("nothing to undo");
        }
    }

    section("Phase 3: Redo once");
    if undo.redo(&mut walker)? {
        step(&format!("redo → {}", walker.root().to_plain_json()));
    } else {
        failure("nothing to redo");
    }
    step(&format!(
        "undo stack: {}  redo stack: {}",
        undo.undo_stack_size(),
        undo.redo_stack_size()
    ));
    Ok(())
}

// ─── Snapshot ──────────────────────────────────────────────────────────────

fn run_snapshot(print: bool) -> Result<(), weave_walker::WalkerError> {
    header("SNAPSHOT: Export and Restore Replica State");

    section("Phase 1: Build up some state");
    let mut source = Document::with_replica("source");
    source.map_set(["settings"], "theme", json!("dark"))?;
    source.list_insert(["tags"], 0, vec![json!("crdt"), json!("dag")])?;
    source.text_insert(["readme"], 0, "event graphs all the way down")?;
    show_replica(source.walker());

    section("Phase 2: Export");
    let snapshot = source.walker().snapshot();
    let wire = snapshot.to_json_string()?;
    step(&format!(
        "{} events, next sequence {}, {} bytes",
        snapshot.event_count(),
        snapshot.next_sequence,
        wire.len()
    ));
    if print {
        println!("{}", wire.dimmed());
    }

    section("Phase 3: Restore on a fresh replica");
    let mut target = Walker::with_replica("target");
    target.restore(&Snapshot::from_json_str(&wire)?)?;
    show_replica(&target);

    let converged = target.to_json() == source.to_json()
        && target.frontier() == source.walker().frontier();
    convergence_result(converged);
    Ok(())
}

// ─── Entry point ───────────────────────────────────────────────────────────

fn main() {
    // Walker warnings (failed applies) are shown by default; RUST_LOG=debug shows every event.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Demo => run_demo(),
        Commands::Rebuild => run_rebuild(),
        Commands::Undo { edits } => run_undo(edits),
        Commands::Snapshot { print } => run_snapshot(print),
    };

    if let Err(err) = result {
        failure(&err.to_string());
        std::process::exit(1);
    }
}
