use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use ledger::{month, month_filename, Ledger, LedgerError, HISTORY_FILENAME};
use storage::{FileStore, KvStore};

#[derive(Parser, Debug)]
#[command(name = "budget", about = "Personal monthly budget tracker.")]
struct Args {
    /// Path to the ledger store file
    #[arg(short, long, default_value = "budget.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show budget, totals and remaining amount
    Summary,
    /// List this month's fixed and extra expenses with their record numbers
    List,
    /// List exportable months, most recent first
    Months,
    /// Add a fixed (recurring) expense
    AddFixed { name: String, amount: f64 },
    /// Replace a fixed expense by record number
    EditFixed {
        number: usize,
        name: String,
        amount: f64,
    },
    /// Delete a fixed expense by record number
    DeleteFixed { number: usize },
    /// Add an extra expense
    AddExtra {
        name: String,
        amount: f64,
        /// Date and time, e.g. "2025-03-14 09:30"; defaults to now
        #[arg(long)]
        date: Option<String>,
        /// Optional free-text note
        #[arg(long)]
        note: Option<String>,
    },
    /// Replace an extra expense by record number
    EditExtra {
        number: usize,
        name: String,
        amount: f64,
        /// Date and time, e.g. "2025-03-14 09:30"
        #[arg(long)]
        date: String,
        /// Optional free-text note; omit to remove
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete an extra expense by record number
    DeleteExtra { number: usize },
    /// Sort extra expenses by amount, descending unless --ascending
    SortExtra {
        #[arg(long)]
        ascending: bool,
    },
    /// Set the total monthly budget
    SetBudget { amount: f64 },
    /// Set the recurring template amounts
    SetRecurring {
        #[arg(long, default_value_t = 0.0)]
        rent: f64,
        #[arg(long, default_value_t = 0.0)]
        food: f64,
        #[arg(long, default_value_t = 0.0)]
        wifi: f64,
    },
    /// Apply the recurring template to this month right now
    ApplyRecurring,
    /// Export a month (default: current), or the whole history with --all
    Export {
        /// Month label to export, e.g. "March 2025"
        #[arg(long, conflicts_with = "all")]
        month: Option<String>,
        /// Export every archived month into one file
        #[arg(long)]
        all: bool,
        /// Directory the CSV file is written into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Erase everything: current lists, history, recurring defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show or set the UI theme
    Theme { mode: Option<ThemeMode> },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeMode {
    Light,
    Dark,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger=info,budget=info".into()),
        )
        .init();

    let store = FileStore::open(&args.store);
    let now = month::current_month_label();
    let (mut ledger, notice) = Ledger::open(store, &now)?;
    if let Some(notice) = notice {
        println!("{}", notice);
    }

    run(&mut ledger, args.command)
}

fn run<S: KvStore>(ledger: &mut Ledger<S>, command: Command) -> Result<()> {
    match command {
        Command::Summary => print_summary(ledger),
        Command::List => print_lists(ledger),
        Command::Months => {
            for (i, label) in ledger.month_choices().into_iter().enumerate() {
                if i == 0 {
                    println!("{} (current)", label);
                } else {
                    println!("{}", label);
                }
            }
        }
        Command::AddFixed { name, amount } => {
            ledger.add_fixed(&name, amount)?;
            print_summary(ledger);
        }
        Command::EditFixed {
            number,
            name,
            amount,
        } => {
            numbered(ledger.edit_fixed(position(number)?, &name, amount), number)?;
            print_summary(ledger);
        }
        Command::DeleteFixed { number } => {
            let removed = numbered(ledger.delete_fixed(position(number)?), number)?;
            println!("Deleted fixed expense '{}'.", removed.name);
            print_summary(ledger);
        }
        Command::AddExtra {
            name,
            amount,
            date,
            note,
        } => {
            ledger.add_extra(&name, amount, date.as_deref(), note.as_deref())?;
            print_summary(ledger);
        }
        Command::EditExtra {
            number,
            name,
            amount,
            date,
            note,
        } => {
            numbered(
                ledger.edit_extra(position(number)?, &name, amount, &date, note.as_deref()),
                number,
            )?;
            print_summary(ledger);
        }
        Command::DeleteExtra { number } => {
            let removed = numbered(ledger.delete_extra(position(number)?), number)?;
            println!("Deleted extra expense '{}'.", removed.name);
            print_summary(ledger);
        }
        Command::SortExtra { ascending } => {
            ledger.sort_extra_by_amount(!ascending)?;
            print_lists(ledger);
        }
        Command::SetBudget { amount } => {
            ledger.set_budget(amount)?;
            print_summary(ledger);
        }
        Command::SetRecurring { rent, food, wifi } => {
            ledger.set_recurring(rent, food, wifi)?;
            let r = ledger.recurring();
            println!(
                "Recurring defaults saved: rent {}, food {}, wifi {}.",
                r.rent, r.food, r.wifi
            );
        }
        Command::ApplyRecurring => {
            ledger.apply_recurring()?;
            print_lists(ledger);
        }
        Command::Export { month, all, out } => {
            let (filename, csv) = if all {
                match ledger.export_all_history() {
                    Ok(csv) => (HISTORY_FILENAME.to_string(), csv),
                    Err(LedgerError::Empty) => {
                        println!("No history available yet.");
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                }
            } else {
                let label = month.unwrap_or_else(|| ledger.month_label().to_string());
                (month_filename(&label), ledger.export_month(&label)?)
            };
            fs::create_dir_all(&out)
                .with_context(|| format!("Creating output dir: {}", out.display()))?;
            let path = out.join(filename);
            fs::write(&path, csv)
                .with_context(|| format!("Writing CSV file: {}", path.display()))?;
            tracing::info!(path = %path.display(), "csv export written");
            println!("Exported to {}", path.display());
        }
        Command::Reset { yes } => {
            if !yes && !confirm_reset()? {
                println!("Reset cancelled.");
                return Ok(());
            }
            ledger.reset_all()?;
            println!("All data has been reset.");
            print_summary(ledger);
        }
        Command::Theme { mode } => match mode {
            None => println!("{}", ledger.theme()),
            Some(mode) => {
                let mode = match mode {
                    ThemeMode::Light => "light",
                    ThemeMode::Dark => "dark",
                };
                ledger.set_theme(mode)?;
                println!("Theme set to {}.", mode);
            }
        },
    }
    Ok(())
}

/// Record numbers are 1-based on the command line, 0-based in the store.
fn position(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or_else(|| anyhow!("record numbers start at 1"))
}

/// Maps the store's index error back to the number the user typed.
fn numbered<T>(result: Result<T, LedgerError>, number: usize) -> Result<T> {
    result.map_err(|e| match e {
        LedgerError::Index(_) => anyhow!("no record number {}", number),
        other => anyhow!(other),
    })
}

fn confirm_reset() -> Result<bool> {
    print!(
        "This will erase ALL data, including history and recurring defaults, \
         and cannot be undone. Type 'yes' to continue: "
    );
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}

fn print_summary<S: KvStore>(ledger: &Ledger<S>) {
    let s = ledger.compute_summary();
    println!(
        "{} | Budget: {} | Fixed: {} | Extra: {} | Remaining: {}",
        ledger.month_label(),
        ledger.budget(),
        s.total_fixed,
        s.total_extra,
        s.remaining
    );
    if s.remaining < 0.0 {
        println!("Over budget by {}.", -s.remaining);
    }
}

fn print_lists<S: KvStore>(ledger: &Ledger<S>) {
    println!("Fixed expenses ({}):", ledger.month_label());
    if ledger.fixed().is_empty() {
        println!("  (none)");
    }
    for (i, f) in ledger.fixed().iter().enumerate() {
        println!("  {:>3}. {:<20} {:>10}", i + 1, f.name, f.amount);
    }

    println!("Extra expenses:");
    if ledger.extra().is_empty() {
        println!("  (none)");
    }
    for (i, e) in ledger.extra().iter().enumerate() {
        let note = e.note.as_deref().unwrap_or("");
        println!(
            "  {:>3}. {:<20} {:>10}  {}  {}",
            i + 1,
            e.name,
            e.amount,
            e.date,
            note
        );
    }
}
