//! llyli - phrase flashcards with spaced repetition, from the terminal.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llyli::clock::{Clock, SystemClock};
use llyli::config::Settings;
use llyli::db::{self, LogOnError};
use llyli::domain::Card;
use llyli::services;
use llyli::validation::NewCard;

#[derive(Debug, Parser)]
#[command(name = "llyli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Card database file (overrides config.toml and DATABASE_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a card.
    Add {
        phrase: String,
        #[arg(long)]
        meaning: Option<String>,
        /// Context tag (defaults to "other").
        #[arg(long)]
        tag: Option<String>,
    },

    /// Replace a card's phrase, meaning and tag.
    Edit {
        id: i64,
        phrase: String,
        #[arg(long)]
        meaning: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },

    /// List all cards, newest first.
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show the review queue.
    Due {
        /// Maximum number of cards (defaults to review.queue_limit).
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },

    /// Record a recall grade: again, hard, good or easy.
    Grade { id: i64, grade: String },

    /// Keep a card out of the review queue.
    Suspend { id: i64 },

    /// Return a suspended card to the review queue.
    Unsuspend { id: i64 },

    /// Delete a card and its review history.
    Delete { id: i64 },

    /// Show a card's review history.
    History {
        id: i64,
        #[arg(long)]
        json: bool,
    },

    /// Show counters for today.
    Stats {
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llyli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load();
    let db_path = cli.db.unwrap_or_else(|| settings.database_path.clone());
    let mut conn = db::open_connection(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    let clock = SystemClock;

    match cli.command {
        Commands::Add { phrase, meaning, tag } => {
            let card = NewCard::parse(&phrase, meaning.as_deref(), tag.as_deref())?;
            let id = db::insert_card(&conn, &card, clock.now())?;
            println!("Created card {}", id);
        }
        Commands::Edit { id, phrase, meaning, tag } => {
            let card = NewCard::parse(&phrase, meaning.as_deref(), tag.as_deref())?;
            if !db::update_card_content(&conn, id, &card, clock.now())? {
                bail!("card {} not found", id);
            }
            println!("Updated card {}", id);
        }
        Commands::List { json } => {
            let cards = db::list_cards(&conn)?;
            print_cards(&cards, json)?;
        }
        Commands::Due { limit, json } => {
            let limit = limit.unwrap_or(settings.queue_limit);
            let due = services::review_queue(&conn, &clock, limit)?;
            print_cards(&due, json)?;
            if due.is_empty() && !json {
                print_next_review(&conn, &clock);
            }
        }
        Commands::Grade { id, grade } => {
            let Some(outcome) =
                services::grade_card(&mut conn, id, &grade, &settings.scheduler, &clock)?
            else {
                bail!("card {} not found", id);
            };
            let schedule = &outcome.card.schedule;
            println!(
                "{} graded {}: next review in {} day(s) ({})",
                outcome.card.phrase,
                outcome.log.grade,
                schedule.interval_days,
                schedule.next_review_at.format("%Y-%m-%d %H:%M UTC"),
            );
        }
        Commands::Suspend { id } => set_suspended(&conn, &clock, id, true)?,
        Commands::Unsuspend { id } => set_suspended(&conn, &clock, id, false)?,
        Commands::Delete { id } => {
            if !db::delete_card(&conn, id)? {
                bail!("card {} not found", id);
            }
            println!("Deleted card {}", id);
        }
        Commands::History { id, json } => {
            if db::get_card_by_id(&conn, id)?.is_none() {
                bail!("card {} not found", id);
            }
            let logs = db::get_review_logs_for_card(&conn, id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&logs)?);
            } else if logs.is_empty() {
                println!("No reviews yet");
            } else {
                for log in logs {
                    println!("{}  {}", log.reviewed_at.format("%Y-%m-%d %H:%M"), log.grade);
                }
            }
        }
        Commands::Stats { json } => {
            let stats = db::stats_overview(&conn, clock.now())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total cards:        {}", stats.total_cards);
                println!("Added last 7 days:  {}", stats.cards_added_last_7_days);
                println!("Due now:            {}", stats.due_today);
                println!("Reviewed today:     {}", stats.reviewed_today);
                if stats.should_nudge() {
                    println!("\nCards are waiting: run `llyli due`");
                }
            }
        }
    }

    Ok(())
}

fn set_suspended(conn: &Connection, clock: &impl Clock, id: i64, suspended: bool) -> Result<()> {
    if !db::set_suspended(conn, id, suspended, clock.now())? {
        bail!("card {} not found", id);
    }
    let verb = if suspended { "Suspended" } else { "Unsuspended" };
    println!("{} card {}", verb, id);
    Ok(())
}

fn print_cards(cards: &[Card], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(cards)?);
        return Ok(());
    }

    if cards.is_empty() {
        println!("No cards");
        return Ok(());
    }

    for card in cards {
        let meaning = card.meaning.as_deref().unwrap_or("-");
        let flag = if card.suspended { " [suspended]" } else { "" };
        println!(
            "{:>5}  {}  =  {}  #{}  (due {}){}",
            card.id,
            card.phrase,
            meaning,
            card.context_tag,
            card.schedule.next_review_at.format("%Y-%m-%d"),
            flag,
        );
    }
    Ok(())
}

fn print_next_review(conn: &Connection, clock: &impl Clock) {
    let next = db::get_next_review_time(conn, clock.now())
        .log_warn("Failed to look up next review time")
        .flatten();
    if let Some(next) = next {
        println!("Next review: {}", next.format("%Y-%m-%d %H:%M UTC"));
    }
}
