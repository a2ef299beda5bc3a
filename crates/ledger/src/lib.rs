//! The ledger store: owns all budget state, applies mutations, and writes
//! every change through to the backing key-value store before returning.
//!
//! Lifecycle: [`Ledger::open`] loads persisted state (substituting defaults
//! for anything missing or corrupt), then runs the month rollover. From
//! there every operation is synchronous and persist-on-mutate; there is no
//! batching because data volumes are a handful of records per month.

use serde::de::DeserializeOwned;
use serde::Serialize;

use models::{ExtraExpense, FixedExpense, History, MonthRecord, Recurring, Summary};
use storage::KvStore;

mod error;
pub mod export;
pub mod month;

pub use error::LedgerError;
pub use export::{month_filename, HISTORY_FILENAME};

/// Budget assumed when nothing valid has ever been persisted.
pub const DEFAULT_BUDGET: f64 = 10_000.0;
/// Budget restored by a full reset.
pub const RESET_BUDGET: f64 = 12_000.0;

/// Storage keys, kept byte-compatible with the original localStorage layout.
pub mod keys {
    pub const FIXED: &str = "fixedExpenses";
    pub const EXTRA: &str = "extraExpenses";
    pub const BUDGET: &str = "totalBudget";
    pub const HISTORY: &str = "history";
    pub const RECURRING: &str = "recurring";
    pub const LAST_MONTH: &str = "lastMonthKey";
    pub const THEME: &str = "theme";
}

/// Emitted once when opening the ledger archived a finished month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverNotice {
    pub archived: String,
    pub started: String,
}

impl std::fmt::Display for RolloverNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "New month detected! Saved {} to history and started fresh for {}.",
            self.archived, self.started
        )
    }
}

pub struct Ledger<S: KvStore> {
    store: S,
    month: String,
    fixed: Vec<FixedExpense>,
    extra: Vec<ExtraExpense>,
    budget: f64,
    history: History,
    recurring: Recurring,
}

impl<S: KvStore> Ledger<S> {
    /// Loads persisted state and runs the month rollover.
    ///
    /// `now_label` is the current month's "Month YYYY" label; callers get it
    /// from [`month::current_month_label`] but tests pass fixed labels.
    /// Returns the rollover notice when a finished month was archived, so
    /// the UI can surface it once.
    pub fn open(store: S, now_label: &str) -> Result<(Self, Option<RolloverNotice>), LedgerError> {
        let fixed = load_json(&store, keys::FIXED);
        let extra = load_json(&store, keys::EXTRA);
        let history = load_json(&store, keys::HISTORY);
        let recurring = load_json(&store, keys::RECURRING);
        let budget = store
            .get(keys::BUDGET)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_BUDGET);
        let last_month = store.get(keys::LAST_MONTH);

        let mut ledger = Self {
            store,
            month: now_label.to_string(),
            fixed,
            extra,
            budget,
            history,
            recurring,
        };
        let notice = ledger.rollover(last_month.as_deref())?;
        Ok((ledger, notice))
    }

    /// Month-change state machine. Archives the previous month when the
    /// persisted `lastMonthKey` differs from the current label, seeds the
    /// recurring template on first run, and is a no-op otherwise. Always
    /// persists, which stamps `lastMonthKey` with the current label.
    fn rollover(&mut self, last_month: Option<&str>) -> Result<Option<RolloverNotice>, LedgerError> {
        let mut notice = None;
        match last_month {
            Some(last) if last != self.month => {
                let archived = MonthRecord {
                    fixed: std::mem::take(&mut self.fixed),
                    extra: std::mem::take(&mut self.extra),
                    budget: self.budget,
                };
                self.history.insert(last.to_string(), archived);
                self.seed_from_template();
                tracing::info!(archived = last, started = %self.month, "month rollover");
                notice = Some(RolloverNotice {
                    archived: last.to_string(),
                    started: self.month.clone(),
                });
            }
            None if self.fixed.is_empty() => self.seed_from_template(),
            _ => {}
        }
        self.persist()?;
        Ok(notice)
    }

    /// Prepends one fixed entry per strictly-positive recurring category,
    /// in rent/food/wifi order. Calling twice duplicates entries.
    fn seed_from_template(&mut self) {
        let template = [
            ("Rent", self.recurring.rent),
            ("Food", self.recurring.food),
            ("Wifi", self.recurring.wifi),
        ];
        let adds: Vec<FixedExpense> = template
            .into_iter()
            .filter(|(_, amount)| *amount > 0.0)
            .map(|(name, amount)| FixedExpense {
                name: name.to_string(),
                amount,
            })
            .collect();
        if !adds.is_empty() {
            self.fixed.splice(0..0, adds);
        }
    }

    /// Applies the recurring template on demand ("apply now"). Duplicates
    /// whatever template entries are already present, by contract.
    pub fn apply_recurring(&mut self) -> Result<(), LedgerError> {
        self.seed_from_template();
        self.persist()
    }

    pub fn add_fixed(&mut self, name: &str, amount: f64) -> Result<(), LedgerError> {
        let name = valid_entry(name, amount)?;
        self.fixed.push(FixedExpense { name, amount });
        self.persist()
    }

    pub fn edit_fixed(&mut self, index: usize, name: &str, amount: f64) -> Result<(), LedgerError> {
        if index >= self.fixed.len() {
            return Err(LedgerError::Index(index));
        }
        let name = valid_entry(name, amount)?;
        self.fixed[index] = FixedExpense { name, amount };
        self.persist()
    }

    /// Removes by position; later indices shift down, so callers must not
    /// cache indices across mutations.
    pub fn delete_fixed(&mut self, index: usize) -> Result<FixedExpense, LedgerError> {
        if index >= self.fixed.len() {
            return Err(LedgerError::Index(index));
        }
        let removed = self.fixed.remove(index);
        self.persist()?;
        Ok(removed)
    }

    /// `date` defaults to now when absent and is normalized to
    /// "YYYY-MM-DD HH:MM"; `note` is kept only if non-empty after trimming.
    pub fn add_extra(
        &mut self,
        name: &str,
        amount: f64,
        date: Option<&str>,
        note: Option<&str>,
    ) -> Result<(), LedgerError> {
        let name = valid_entry(name, amount)?;
        let date = match date.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => month::normalize_datetime(s)?,
            None => month::now_datetime(),
        };
        let note = trimmed_note(note);
        self.extra.push(ExtraExpense {
            name,
            amount,
            date,
            note,
        });
        self.persist()
    }

    pub fn edit_extra(
        &mut self,
        index: usize,
        name: &str,
        amount: f64,
        date: &str,
        note: Option<&str>,
    ) -> Result<(), LedgerError> {
        if index >= self.extra.len() {
            return Err(LedgerError::Index(index));
        }
        let name = valid_entry(name, amount)?;
        if date.trim().is_empty() {
            return Err(LedgerError::Validation(
                "date must not be empty".to_string(),
            ));
        }
        let date = month::normalize_datetime(date)?;
        let note = trimmed_note(note);
        self.extra[index] = ExtraExpense {
            name,
            amount,
            date,
            note,
        };
        self.persist()
    }

    pub fn delete_extra(&mut self, index: usize) -> Result<ExtraExpense, LedgerError> {
        if index >= self.extra.len() {
            return Err(LedgerError::Index(index));
        }
        let removed = self.extra.remove(index);
        self.persist()?;
        Ok(removed)
    }

    /// Stable sort by amount; ties keep their prior relative order. The
    /// direction is explicit per call; toggling lives in the UI, never here.
    pub fn sort_extra_by_amount(&mut self, descending: bool) -> Result<(), LedgerError> {
        if descending {
            self.extra.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        } else {
            self.extra.sort_by(|a, b| a.amount.total_cmp(&b.amount));
        }
        self.persist()
    }

    pub fn set_budget(&mut self, amount: f64) -> Result<(), LedgerError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::Validation(format!(
                "budget must be a positive number, got {amount}"
            )));
        }
        self.budget = amount;
        self.persist()
    }

    /// Replaces the recurring template; negative or non-finite inputs are
    /// clamped to 0 (a zeroed category is skipped at seeding time).
    pub fn set_recurring(&mut self, rent: f64, food: f64, wifi: f64) -> Result<(), LedgerError> {
        self.recurring = Recurring {
            rent: clamp_amount(rent),
            food: clamp_amount(food),
            wifi: clamp_amount(wifi),
        };
        self.persist()
    }

    /// Clears everything: current lists, history, budget back to
    /// [`RESET_BUDGET`], recurring back to its default. The whole store file
    /// is wiped first, so keys outside the ledger's namespace (`theme`
    /// included) are destroyed too; callers must warn before invoking.
    pub fn reset_all(&mut self) -> Result<(), LedgerError> {
        self.fixed.clear();
        self.extra.clear();
        self.history = History::new();
        self.budget = RESET_BUDGET;
        self.recurring = Recurring::default();
        self.store.clear()?;
        tracing::warn!("all ledger data reset");
        self.persist()
    }

    pub fn compute_summary(&self) -> Summary {
        let total_fixed: f64 = self.fixed.iter().map(|x| x.amount).sum();
        let total_extra: f64 = self.extra.iter().map(|x| x.amount).sum();
        Summary {
            total_fixed,
            total_extra,
            remaining: self.budget - (total_fixed + total_extra),
        }
    }

    pub fn theme(&self) -> String {
        self.store
            .get(keys::THEME)
            .unwrap_or_else(|| "light".to_string())
    }

    pub fn set_theme(&mut self, mode: &str) -> Result<(), LedgerError> {
        self.store.set(keys::THEME, mode)?;
        Ok(())
    }

    /// Month labels for export pickers: the current month first, then
    /// archived months most recent first (by re-parsing their labels).
    pub fn month_choices(&self) -> Vec<String> {
        let mut archived: Vec<String> = self.history.keys().cloned().collect();
        month::sort_labels_by_recency(&mut archived);
        let mut choices = vec![self.month.clone()];
        choices.extend(archived);
        choices
    }

    pub fn month_label(&self) -> &str {
        &self.month
    }

    pub fn fixed(&self) -> &[FixedExpense] {
        &self.fixed
    }

    pub fn extra(&self) -> &[ExtraExpense] {
        &self.extra
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn recurring(&self) -> &Recurring {
        &self.recurring
    }

    /// The live current month as a record, shaped like a history entry.
    pub fn current_record(&self) -> MonthRecord {
        MonthRecord {
            fixed: self.fixed.clone(),
            extra: self.extra.clone(),
            budget: self.budget,
        }
    }

    /// Writes the full state through to the store, stamping `lastMonthKey`
    /// with the current label. Called by every mutating operation.
    fn persist(&mut self) -> Result<(), LedgerError> {
        self.store.set(keys::FIXED, &to_json(&self.fixed)?)?;
        self.store.set(keys::EXTRA, &to_json(&self.extra)?)?;
        self.store.set(keys::BUDGET, &format!("{}", self.budget))?;
        self.store.set(keys::HISTORY, &to_json(&self.history)?)?;
        self.store.set(keys::RECURRING, &to_json(&self.recurring)?)?;
        self.store.set(keys::LAST_MONTH, &self.month)?;
        tracing::debug!(month = %self.month, "ledger state persisted");
        Ok(())
    }
}

fn load_json<S: KvStore, T: DeserializeOwned + Default>(store: &S, key: &str) -> T {
    store
        .get(key)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, LedgerError> {
    serde_json::to_string(value).map_err(|e| LedgerError::Storage(e.into()))
}

fn valid_entry(name: &str, amount: f64) -> Result<String, LedgerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::Validation(
            "name must not be empty".to_string(),
        ));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::Validation(format!(
            "amount must be a positive number, got {amount}"
        )));
    }
    Ok(name.to_string())
}

fn trimmed_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn clamp_amount(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}
