use anyhow::{Context, Result, bail};
use clap::Parser;
use klondike::{
    action::{Action, apply_action, describe_action},
    board::{Board, Status, check_draw_count},
};
use log::info;
use std::{
    io::{BufRead, Write, stdin, stdout},
    path::PathBuf,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Cards turned over per draw (1 or 3); asked for when omitted
    #[arg(short, long, value_name = "NUM")]
    draw: Option<usize>,
    /// Seed for a reproducible deal
    #[arg(short, long, value_name = "SEED", conflicts_with = "file")]
    seed: Option<u64>,
    /// Path to a game state file to continue from
    file: Option<PathBuf>,
}

enum Command {
    Play(Action),
    Hint,
    Restart,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self> {
        let command = match line.trim().to_ascii_lowercase().as_str() {
            "h" | "hint" => Command::Hint,
            "r" | "restart" => Command::Restart,
            "?" | "help" => Command::Help,
            "q" | "quit" => Command::Quit,
            other => Command::Play(Action::parse(other)?),
        };
        Ok(command)
    }
}

const HELP: &str = r#"Play options:
  D        Deal new upturned card(s)
  W:F      Talon card to the foundation
  T3:F     Tableau 3 card to the foundation
  W:T3     Talon card to tableau 3
  T1:T3    Tableau 1 to tableau 3
  F1:T3    Foundation 1 (♠ ♥ ♣ ♦) to tableau 3
  H        Get a hint
  R        Restart the game
  Q        Quit"#;

fn main() -> Result<()> {
    env_logger::init();
    let Cli { draw, seed, file } = Cli::parse();
    let mut input = stdin().lock();

    println!("Welcome to Solitaire!");
    let mut board = if let Some(file) = file {
        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read '{}'", file.display()))?;
        let mut board = Board::parse(&content).context("Failed to parse board")?;
        if !board.is_valid() {
            bail!("'{}' does not hold a complete, well-formed deck", file.display());
        }
        if let Some(draw_count) = draw {
            board.set_draw_count(draw_count)?;
        }
        board
    } else {
        let draw_count = match draw {
            Some(draw_count) => {
                check_draw_count(draw_count)?;
                draw_count
            }
            None => ask_draw_count(&mut input)?,
        };
        match seed {
            Some(seed) => Board::from_seed(seed, draw_count)?,
            None => Board::new(draw_count)?,
        }
    };
    println!("{HELP}");

    loop {
        println!("\n{}", board.render());
        let Some(line) = prompt(&mut input, "Select a play (? for help): ")? else {
            break;
        };
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err:#}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Hint => {
                if board.hint() {
                    println!("There is a move you can make.");
                } else {
                    println!("No moves available here; try dealing new cards.");
                }
            }
            Command::Restart => {
                let question = "Are you sure you want to reset the board and restart your game (y/n)? ";
                if confirm(&mut input, question)? {
                    board.reset(board.draw_count())?;
                }
            }
            Command::Play(action) => {
                let description = describe_action(&board, &action);
                if apply_action(&mut board, &action) {
                    info!("{description}");
                } else {
                    println!("\nNothing done.");
                }
            }
        }

        match board.status() {
            Status::Playing => {}
            Status::Won => {
                println!("\n{}\nYou won!", board.render());
                if !confirm(&mut input, "Would you like to play again (y/n)? ")? {
                    break;
                }
                board.reset(ask_draw_count(&mut input)?)?;
            }
            Status::Stuck => {
                let question = "You have no more valid moves! Would you like to restart (y/n)? ";
                if !confirm(&mut input, question)? {
                    break;
                }
                println!("Resetting...");
                board.reset(ask_draw_count(&mut input)?)?;
            }
        }
    }

    Ok(())
}

/// Reads one line, or `None` once input is exhausted.
fn prompt(input: &mut impl BufRead, message: &str) -> Result<Option<String>> {
    print!("{message}");
    stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read from stdin")? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn confirm(input: &mut impl BufRead, question: &str) -> Result<bool> {
    let mut message = question;
    loop {
        match prompt(input, message)?.as_deref() {
            None => return Ok(false),
            Some("y") | Some("Y") => return Ok(true),
            Some("n") | Some("N") => return Ok(false),
            Some(_) => message = "Please enter either y or n: ",
        }
    }
}

fn ask_draw_count(input: &mut impl BufRead) -> Result<usize> {
    let mut message = "Please enter the size of the talon (1 or 3): ";
    loop {
        let Some(line) = prompt(input, message)? else {
            bail!("No talon size given");
        };
        if let Ok(value) = line.parse::<usize>() {
            if check_draw_count(value).is_ok() {
                return Ok(value);
            }
        }
        message = "Please enter either 1 or 3: ";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_conflicts_with_file() {
        assert!(Cli::try_parse_from(["klondike", "--seed", "1", "board.txt"]).is_err());

        let cli = Cli::try_parse_from(["klondike", "-s", "1", "-d", "3"]).unwrap();
        assert_eq!(cli.seed, Some(1));
        assert_eq!(cli.draw, Some(3));

        let cli = Cli::try_parse_from(["klondike", "-d", "1", "board.txt"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("board.txt")));
        assert_eq!(cli.seed, None);
    }
}
