//! alphabuddy entry point
//!
//! Runs a spoken alphabet lesson: a welcome, then for each letter the letter
//! itself, a spelled-out example word and some praise, with background music
//! playing underneath.

use alphabuddy::state::config::Config;
use alphabuddy::state::letters::{self, LETTERS};
use alphabuddy::state::State;
use anyhow::{bail, Context};
use log::{debug, error, info};
use std::process;

const USAGE: &str = "Usage: alphabuddy [--debug|-d] [--name NAME] [--forget] [--letter X] [--no-music]";

/// Command line options
#[derive(Debug, Default)]
struct Options {
    debug: bool,
    name: Option<String>,
    forget: bool,
    letter: Option<char>,
    no_music: bool,
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--debug" | "-d" => options.debug = true,
                "--forget" => options.forget = true,
                "--no-music" => options.no_music = true,
                "--name" => {
                    let name = args.next().context("--name needs a value")?;
                    options.name = Some(name);
                }
                "--letter" => {
                    let value = args.next().context("--letter needs a value")?;
                    let mut chars = value.chars();
                    match (chars.next(), chars.next()) {
                        (Some(ch), None) if ch.is_ascii_alphabetic() => {
                            options.letter = Some(ch.to_ascii_uppercase())
                        }
                        _ => bail!("--letter takes a single letter A-Z, got {:?}", value),
                    }
                }
                "--help" | "-h" => {
                    println!("{}", USAGE);
                    process::exit(0);
                }
                other => bail!("unknown argument {:?}\n{}", other, USAGE),
            }
        }

        Ok(options)
    }
}

fn main() {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    // Initialize logger
    if options.debug {
        // Debug mode: write to alphabuddy.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("alphabuddy.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open alphabuddy.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "alphabuddy version {} starting (debug mode, logging to alphabuddy.log)",
            alphabuddy::VERSION
        );
    } else {
        // Normal mode: minimal logging to stderr, only errors
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    if let Err(e) = run(options) {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(options: Options) -> anyhow::Result<()> {
    debug!("Initializing alphabuddy");

    let config = Config::load().context("failed to load configuration")?;
    let mut state = State::new(config);

    if options.forget {
        state
            .forget_child_name()
            .context("failed to forget the child's name")?;
    }
    if let Some(name) = &options.name {
        state
            .set_child_name(name)
            .context("failed to save the child's name")?;
    }

    let lesson: Vec<_> = match options.letter {
        Some(ch) => vec![letters::find(ch).context("no such letter")?],
        None => LETTERS.iter().collect(),
    };

    println!("{} {}", alphabuddy::APP_NAME, alphabuddy::VERSION);
    println!("Configuration: {}", state.config.path().display());
    match &state.child_name {
        Some(name) => println!("Hello, {}!", name),
        None => println!("Tip: pass --name to personalise the lesson"),
    }

    if !options.no_music {
        state.start_music();
    }

    state.welcome();

    for letter in lesson {
        println!("{}  {}", letter.uppercase(), letter.words.join(", "));
        state.teach_letter(letter);
    }

    state.stop_music();
    info!("Lesson finished");
    Ok(())
}
