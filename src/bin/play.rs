//! Interactive hot-seat Ludo in the terminal
//!
//! Usage: cargo run --bin play [--humans red,blue] [--bot greedy]

use std::io::{self, Write};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{fmt, EnvFilter};

use ludo::agent::{Agent, Bot};
use ludo::display::{color_name, colored, display_board, format_piece, format_status, BOLD, DIM, RESET};
use ludo::{
    Color, ControllerConfig, GameController, GameState, Phase, PieceId, RandomDie, Rules,
    SystemClock,
};

/// Play Ludo against the computer, or pass the keyboard around
#[derive(Parser, Debug)]
#[command(name = "play")]
#[command(about = "Hot-seat Ludo with optional computer seats", long_about = None)]
struct Args {
    /// Colors played at the keyboard; the rest are computer players
    #[arg(long, value_delimiter = ',', default_value = "red")]
    humans: Vec<Color>,

    /// Computer player for the remaining colors
    #[arg(long, default_value = "greedy")]
    bot: Bot,

    /// Forfeit the turn on this many sixes in a row
    #[arg(long)]
    max_sixes: Option<u8>,

    /// Skip roll animation and pauses
    #[arg(long)]
    fast: bool,

    /// Random seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,
}

/// What the person at the keyboard asked for
enum Input {
    Go,
    Piece(PieceId),
    Quit,
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{BOLD}{message}{RESET} ");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        // EOF
        return Ok("q".to_string());
    }
    Ok(input.trim().to_string())
}

fn get_human_roll(color: Color) -> io::Result<Input> {
    let message = format!("{} - press Enter to roll:", colored(color, color_name(color)));
    let input = prompt(&message)?;
    if input == "q" || input == "quit" {
        return Ok(Input::Quit);
    }
    Ok(Input::Go)
}

fn get_human_piece(state: &GameState, legal: &[PieceId]) -> io::Result<Input> {
    println!("{BOLD}Your legal moves:{RESET}");
    for (i, &id) in legal.iter().enumerate() {
        println!("  {}: {}", i, format_piece(&state.pieces[id as usize]));
    }

    loop {
        let input = prompt("\nEnter move number:")?;
        if input == "q" || input == "quit" {
            return Ok(Input::Quit);
        }
        if input.is_empty() && legal.len() == 1 {
            return Ok(Input::Piece(legal[0]));
        }

        match input.parse::<usize>() {
            Ok(idx) if idx < legal.len() => return Ok(Input::Piece(legal[idx])),
            Ok(_) => println!("Invalid move number. Enter 0-{}", legal.len() - 1),
            Err(_) => println!("Please enter a number (or 'q' to quit)"),
        }
    }
}

/// Sleep until the controller's next deadline, drawing the tumbling die
fn wait_for_deadline(controller: &mut GameController<SystemClock>) {
    let step = controller.config().dice_flicker.max(Duration::from_millis(10));
    while let Some(left) = controller.time_until_deadline() {
        if left.is_zero() {
            break;
        }
        if controller.state().rolling {
            if let Some(face) = controller.flicker_value() {
                print!("\r  {DIM}rolling {face}{RESET}");
                let _ = io::stdout().flush();
            }
        }
        thread::sleep(step.min(left));
        controller.tick();
    }
    controller.tick();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let seed = match args.seed {
        Some(seed) => seed,
        None => SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
    };
    let config = if args.fast {
        ControllerConfig::instant()
    } else {
        ControllerConfig::default()
    };
    let rules = Rules::new(args.max_sixes)?;

    let mut controller = GameController::new(rules, config, SystemClock::new(), RandomDie::seeded(seed));
    let mut bot_rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let mut bot = args.bot;

    println!("\n{BOLD}Welcome to Ludo!{RESET}");
    for color in ludo::ALL_COLORS {
        let seat = if args.humans.contains(&color) {
            "you".to_string()
        } else {
            format!("computer ({})", bot)
        };
        println!("  {}: {}", colored(color, color_name(color)), seat);
    }
    println!("Type 'q' to quit at any time.\n");

    loop {
        wait_for_deadline(&mut controller);
        let state = controller.state().clone();
        let color = state.current_turn;
        let human = args.humans.contains(&color);

        match state.phase() {
            Phase::Won(_) => {
                display_board(&state, None);
                println!("\n{BOLD}═══════════════════════════════════════{RESET}");
                println!("{BOLD}                GAME OVER{RESET}");
                println!("{BOLD}═══════════════════════════════════════{RESET}");
                println!("{}", format_status(&state, None));
                break;
            }
            Phase::AwaitingRoll => {
                if human {
                    display_board(&state, None);
                    if let Input::Quit = get_human_roll(color)? {
                        println!("Goodbye!");
                        break;
                    }
                }
                controller.roll();
            }
            Phase::AwaitingMove(_) => {
                print!("\r");
                let legal = controller.legal_moves();
                let id = if human {
                    display_board(&state, None);
                    match get_human_piece(&state, &legal)? {
                        Input::Piece(id) => id,
                        Input::Go | Input::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                    }
                } else {
                    let id = bot.select_piece(&state, &legal, &mut bot_rng);
                    println!("{}", format_status(&state, None));
                    println!("{DIM}Computer moves {}{RESET}", format_piece(&state.pieces[id as usize]));
                    id
                };
                if let Some(outcome) = controller.select_piece(id) {
                    for captured in outcome.captured {
                        println!(
                            "{BOLD}Captured {}!{RESET}",
                            format_piece(&state.pieces[captured as usize])
                        );
                    }
                }
            }
            Phase::TurnEnding(_) => {
                print!("\r");
                println!("{}", format_status(&state, None));
            }
            Phase::Rolling => {}
        }
    }

    Ok(())
}
