use beverage_bandits::battle::Battle;
use beverage_bandits::boost::minimum_elf_power;
use clap::Parser;
use failure::Error;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Simulate the battle between the Elves and the Goblins.
#[derive(Parser, Debug)]
#[command(name = "day-15")]
struct Args {
    /// The cave map: '#' walls, '.' open floor, 'E' Elves, 'G' Goblins
    input: PathBuf,

    /// Stop the first battle after this many full rounds
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Don't search for the Elves' minimum attack power
    #[arg(long)]
    no_boost: bool,
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let text = fs::read_to_string(&args.input)?;
    let initial = Battle::from_str(&text)?;
    info!(input = %args.input.display(), units = initial.units().len(), "map loaded");
    println!("Initial map:\n{}", initial);

    let mut battle = initial.clone();
    let outcome = battle.fight(args.max_rounds);
    println!(
        "Combat ends after {} full rounds, with {} total hit points left",
        outcome.rounds, outcome.hit_points
    );
    match outcome.winner {
        Some(winner) => println!("Winner: {:?}", winner),
        None => println!("No winner"),
    }
    println!(
        "Outcome: {} * {} = {}",
        outcome.rounds,
        outcome.hit_points,
        outcome.score()
    );
    println!("Final map:\n{}", battle);

    if !args.no_boost {
        match minimum_elf_power(&initial) {
            Some(boost) => println!(
                "Elves need attack power {} to win without losses: {} * {} = {}",
                boost.attack_power,
                boost.outcome.rounds,
                boost.outcome.hit_points,
                boost.outcome.score()
            ),
            None => println!("The Elves cannot win without losses"),
        }
    }
    Ok(())
}
