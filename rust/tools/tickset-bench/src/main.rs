//! Random-walk benchmark driver for the segmented bitset.
//!
//! Simulates an order-book-like workload: insertions biased into a band
//! around the current head, followed by removals of the head, of `tail - 1`
//! and of random indices, followed by random membership probes.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tickset::SegmentedBitset;

#[derive(Parser)]
#[command(name = "tickset-bench")]
#[command(about = "Random-walk benchmark for the tickset segmented bitset")]
#[command(version)]
struct Cli {
    /// Total number of insertions
    #[arg(long, default_value_t = 100_000_000)]
    inserts: u64,

    /// Lower bound of the index range
    #[arg(long, default_value_t = 1832)]
    min_index: u64,

    /// Upper bound of the index range
    #[arg(long, default_value_t = 5500)]
    max_index: u64,

    /// Half-width of the insertion band around the current head
    #[arg(long, default_value_t = 500)]
    band: u64,

    /// Number of random removals after the insertion phase
    #[arg(long, default_value_t = 10)]
    removals: u64,

    /// Number of random membership probes
    #[arg(long, default_value_t = 100)]
    probes: u64,

    /// RNG seed (omit for a random seed)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    anyhow::ensure!(
        cli.min_index < cli.max_index,
        "min-index must be below max-index"
    );
    if let Some(seed) = cli.seed {
        fastrand::seed(seed);
    }

    let mut set = SegmentedBitset::new();
    let start_total = Instant::now();

    run_insertions(&cli, &mut set);
    run_removals(&cli, &mut set);
    run_probes(&cli, &set);

    println!("Active range: {}", set.tail().saturating_sub(set.head()));
    println!("Set indices: {}", set.count_positions());
    println!("Allocated segments: {}", set.segment_count());
    println!("Total simulation time: {:?}", start_total.elapsed());
    Ok(())
}

/// Insertion phase: each index is drawn uniformly from a band around the
/// current head, clamped to the configured range; the first draw (and any
/// draw while the set is empty) is uniform over the whole range.
fn run_insertions(cli: &Cli, set: &mut SegmentedBitset) {
    let start = Instant::now();
    for i in 0..cli.inserts {
        let index = if set.is_empty() {
            fastrand::u64(cli.min_index..=cli.max_index)
        } else {
            let head = set.head();
            let lo = head.saturating_sub(cli.band).max(cli.min_index);
            let hi = (head + cli.band).min(cli.max_index);
            fastrand::u64(lo..=hi)
        };
        set.set(index);

        if i % 100_000_000 == 0 {
            println!(
                "[Insert] Iteration {i} | Head: {} | Tail: {}",
                set.head(),
                set.tail()
            );
        }
    }
    println!(
        "\nInsertion of {} indices took: {:?}\n",
        cli.inserts,
        start.elapsed()
    );
}

/// Removal phase: the head, then `tail - 1`, then random indices.
fn run_removals(cli: &Cli, set: &mut SegmentedBitset) {
    let start = Instant::now();
    if !set.is_empty() {
        set.unset(set.head());
        set.unset(set.tail() - 1);
        for _ in 0..cli.removals {
            set.unset(fastrand::u64(cli.min_index..=cli.max_index));
        }
    }
    println!("After removals:");
    println!("Head now: {}", set.head());
    println!("Tail now: {}", set.tail());
    println!("Removals took: {:?}\n", start.elapsed());
}

/// Probe phase: random membership checks over the configured range.
fn run_probes(cli: &Cli, set: &SegmentedBitset) {
    let start = Instant::now();
    let mut misses = 0u64;
    for _ in 0..cli.probes {
        if !set.contains(fastrand::u64(cli.min_index..=cli.max_index)) {
            misses += 1;
        }
    }
    println!("Random access checks took: {:?}", start.elapsed());
    println!("Unset bits found: {misses}\n");
}
