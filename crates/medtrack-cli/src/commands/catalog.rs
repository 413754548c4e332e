//! Catalogue management commands for CLI.

use clap::Subcommand;
use medtrack_core::{CatalogStore, Config, Medication, MedicationDraft};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List the catalogue, sorted by category then name
    List {
        /// Case-insensitive substring filter over name, generic name or category
        #[arg(long)]
        filter: Option<String>,
        /// Restrict to favourites ("my medications")
        #[arg(long)]
        favorites: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a medication
    Add {
        /// Medication name
        name: String,
        /// Generic name, e.g. Amlodipine
        #[arg(long, default_value = "")]
        generic_name: String,
        /// Category, e.g. 高血压
        #[arg(long, default_value = "")]
        category: String,
        /// Dosage form, e.g. 片剂
        #[arg(long, default_value = "")]
        form: String,
        /// Strength, e.g. 5 mg
        #[arg(long, default_value = "")]
        strength: String,
        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
        /// Add as a favourite
        #[arg(long)]
        favorite: bool,
    },
    /// Toggle the favourite flag
    Favorite {
        /// Medication ID
        id: String,
    },
    /// Set the usage plan
    Plan {
        /// Medication ID
        id: String,
        /// Doses per day (>= 1)
        #[arg(long, default_value = "1")]
        doses_per_day: i64,
        /// Days between doses (>= 1)
        #[arg(long, default_value = "1")]
        interval_days: i64,
    },
    /// Delete one or more medications
    Delete {
        /// Medication IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Insert the built-in medication list if the catalogue is empty
    Seed,
    /// Print the suggested category and dosage-form labels
    Vocab,
}

fn print_medication_line(medication: &Medication) {
    let favorite = if medication.is_favorite { "*" } else { " " };
    let builtin = if medication.is_builtin { "builtin" } else { "user" };
    println!(
        "{favorite} {}  {}  [{}] {} {}  ({builtin})",
        medication.id,
        medication.name,
        medication.category,
        medication.form,
        medication.strength,
    );
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = CatalogStore::open()?;

    match action {
        CatalogAction::List {
            filter,
            favorites,
            json,
        } => {
            if config.catalog.seed_builtin {
                store.ensure_seeded()?;
            }
            let medications: Vec<Medication> = if favorites {
                let needle = filter.as_deref();
                store
                    .list(needle)?
                    .into_iter()
                    .filter(|m| m.is_favorite)
                    .collect()
            } else {
                store.list(filter.as_deref())?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&medications)?);
            } else if medications.is_empty() {
                println!("No medications.");
            } else {
                for medication in &medications {
                    print_medication_line(medication);
                }
            }
        }
        CatalogAction::Add {
            name,
            generic_name,
            category,
            form,
            strength,
            notes,
            favorite,
        } => {
            let medication = store.add(
                MedicationDraft {
                    name,
                    generic_name,
                    category,
                    form,
                    strength,
                    notes,
                },
                favorite,
            )?;
            println!("Medication added: {}", medication.id);
            println!("{}", serde_json::to_string_pretty(&medication)?);
        }
        CatalogAction::Favorite { id } => {
            let medication = store.toggle_favorite(&id)?;
            let state = if medication.is_favorite { "on" } else { "off" };
            println!("Favourite {state}: {}", medication.name);
        }
        CatalogAction::Plan {
            id,
            doses_per_day,
            interval_days,
        } => {
            let medication = store.set_usage_plan(&id, doses_per_day, interval_days)?;
            println!(
                "Usage plan for {}: {} dose(s) per day, every {} day(s)",
                medication.name, medication.doses_per_day, medication.interval_days
            );
        }
        CatalogAction::Delete { ids } => {
            let deleted = store.delete(&ids)?;
            println!("Deleted {deleted} medication(s)");
        }
        CatalogAction::Seed => {
            let inserted = store.ensure_seeded()?;
            if inserted == 0 {
                println!("Catalogue already has entries; nothing seeded.");
            } else {
                println!("Seeded {inserted} built-in medication(s)");
            }
        }
        CatalogAction::Vocab => {
            println!("Categories: {}", medtrack_core::catalog::CATEGORY_SUGGESTIONS.join("、"));
            println!("Forms:      {}", medtrack_core::catalog::FORM_SUGGESTIONS.join("、"));
        }
    }

    Ok(())
}
