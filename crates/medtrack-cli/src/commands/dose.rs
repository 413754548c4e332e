//! Dose scheduling and ledger commands for CLI.

use chrono::{Local, NaiveDate, NaiveTime};
use clap::Subcommand;
use medtrack_core::{
    CatalogStore, Config, DoseEvent, DoseLedger, DoseScheduler, MemoryNotifier, SelectionFlow,
};

#[derive(Subcommand)]
pub enum DoseAction {
    /// Schedule a dose (runs the medication selection flow)
    Schedule {
        /// Medication name; reconciled against the catalogue
        name: String,
        /// Calendar date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Time of day, HH:MM
        #[arg(long)]
        time: String,
        /// Dose amount, e.g. "1 片" or "5 ml"
        #[arg(long)]
        amount: String,
    },
    /// List dose events, ascending by time
    List {
        /// Restrict to one calendar day, YYYY-MM-DD
        #[arg(long)]
        day: Option<String>,
        /// Restrict to today
        #[arg(long)]
        today: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle the completion flag of a dose event
    Done {
        /// Dose event ID
        id: String,
    },
    /// Delete one or more dose events
    Delete {
        /// Dose event IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete every dose event on a calendar day
    ClearDay {
        /// Calendar day, YYYY-MM-DD
        day: String,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}', expected YYYY-MM-DD"))?)
}

fn parse_time(s: &str) -> Result<NaiveTime, Box<dyn std::error::Error>> {
    Ok(NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| format!("invalid time '{s}', expected HH:MM"))?)
}

fn print_dose_line(event: &DoseEvent) {
    let mark = if event.is_completed { "x" } else { " " };
    println!(
        "[{mark}] {}  {}  {}  {}",
        event.id,
        event.timestamp.format("%Y-%m-%d %H:%M"),
        event.name,
        event.amount,
    );
}

pub fn run(action: DoseAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ledger = DoseLedger::open()?;

    match action {
        DoseAction::Schedule {
            name,
            date,
            time,
            amount,
        } => {
            let date = match date {
                Some(s) => parse_date(&s)?,
                None => Local::now().date_naive(),
            };
            let time = parse_time(&time)?;

            let catalog = CatalogStore::open()?;
            if config.catalog.seed_builtin {
                catalog.ensure_seeded()?;
            }
            let notifier = MemoryNotifier::new();
            let scheduler = DoseScheduler::new(&ledger, &notifier)
                .with_settings(config.notifications.clone());

            let mut flow = SelectionFlow::new(date);
            flow.submit_name(&catalog, &name)?;
            flow.set_time(time);
            flow.set_amount(&amount);
            let event = flow.confirm(&scheduler)?;

            println!(
                "Dose scheduled: {} {} at {}",
                event.name,
                event.amount,
                event.timestamp.format("%Y-%m-%d %H:%M")
            );
            match notifier.pending().first() {
                Some(request) => println!(
                    "Reminder registered: {} (fires {})",
                    request.identifier,
                    request.fire_at.format("%Y-%m-%d %H:%M")
                ),
                None => println!("No reminder registered (notifications disabled)"),
            }
        }
        DoseAction::List { day, today, json } => {
            let events = if today {
                ledger.list_for_day(Local::now().date_naive())?
            } else if let Some(day) = day {
                ledger.list_for_day(parse_date(&day)?)?
            } else {
                ledger.list_all()?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                println!("No dose events.");
            } else {
                for event in &events {
                    print_dose_line(event);
                }
            }
        }
        DoseAction::Done { id } => {
            let event = ledger.toggle_completed(&id)?;
            let state = if event.is_completed {
                "completed"
            } else {
                "pending"
            };
            println!("{} is now {state}", event.name);
        }
        DoseAction::Delete { ids } => {
            let deleted = ledger.delete(&ids)?;
            println!("Deleted {deleted} dose event(s)");
        }
        DoseAction::ClearDay { day } => {
            let deleted = ledger.delete_for_day(parse_date(&day)?)?;
            println!("Deleted {deleted} dose event(s)");
        }
    }

    Ok(())
}
