//! Batch simulation CLI for Ludo
//!
//! Plays many computer-vs-computer games in parallel and reports how each seat did.

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ludo::agent::Bot;
use ludo::display::{colored, color_name, BOLD, RESET};
use ludo::simulate::{play_game, GameRecord};
use ludo::{Rules, ALL_COLORS, NUM_COLORS};

/// Simulate Ludo games between computer players
#[derive(Parser, Debug)]
#[command(name = "ludo")]
#[command(about = "Run computer-vs-computer Ludo games and report win rates", long_about = None)]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 1000)]
    games: u64,

    /// Base random seed; game i uses seed + i
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Player for each color in turn order (red,green,yellow,blue)
    #[arg(long, value_delimiter = ',', default_value = "greedy,random,random,random")]
    agents: Vec<Bot>,

    /// Forfeit the turn on this many sixes in a row
    #[arg(long)]
    max_sixes: Option<u8>,

    /// Abandon a game after this many turns
    #[arg(long, default_value_t = 10_000)]
    max_turns: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let agents: [Bot; NUM_COLORS] = args
        .agents
        .as_slice()
        .try_into()
        .map_err(|_| format!("--agents needs {NUM_COLORS} entries, got {}", args.agents.len()))?;

    let rules = Rules::new(args.max_sixes)?;

    eprintln!("Simulation Configuration:");
    eprintln!("  Games: {}", args.games);
    eprintln!("  Seed: {}", args.seed);
    for (color, agent) in ALL_COLORS.iter().zip(agents.iter()) {
        eprintln!("  {:<7} {}", color_name(*color), agent);
    }
    match rules.max_consecutive_sixes {
        Some(n) => eprintln!("  Six cap: {n}"),
        None => eprintln!("  Six cap: none"),
    }
    eprintln!();

    info!(games = args.games, "starting simulation");

    // Each task owns its agents and rng
    let records = (0..args.games)
        .into_par_iter()
        .map(|game| {
            let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(game));
            let mut seats = agents;
            play_game(&mut seats, rules, args.max_turns, &mut rng)
        })
        .collect::<Result<Vec<GameRecord>, _>>()?;

    let mut wins = [0u64; NUM_COLORS];
    let mut abandoned = 0u64;
    let mut turns = 0u64;
    let mut captures = 0u64;
    for record in &records {
        match record.winner {
            Some(color) => wins[color.index()] += 1,
            None => abandoned += 1,
        }
        turns += record.turns as u64;
        captures += record.captures as u64;
    }

    info!(games = records.len(), abandoned, "simulation finished");

    let n = records.len().max(1) as f64;
    println!("\n{BOLD}Results over {} games{RESET}", records.len());
    for color in ALL_COLORS {
        let w = wins[color.index()];
        println!(
            "  {:<16} {:>8}  {:>6} wins  {:>5.1}%",
            colored(color, color_name(color)),
            agents[color.index()].to_string(),
            w,
            100.0 * w as f64 / n
        );
    }
    if abandoned > 0 {
        println!("  Abandoned at turn limit: {abandoned}");
    }
    println!("  Mean turns per game:    {:.1}", turns as f64 / n);
    println!("  Mean captures per game: {:.1}", captures as f64 / n);

    Ok(())
}
