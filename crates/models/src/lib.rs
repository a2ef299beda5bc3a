
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A recurring monthly cost: plain name/amount pair, identified only by its
/// position in the current month's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedExpense {
    pub name: String,
    pub amount: f64,
}

/// An ad hoc dated expense with an optional free-text note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraExpense {
    pub name: String,
    pub amount: f64,
    /// Stored as "YYYY-MM-DD HH:MM", minute precision.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// User-configured default amounts applied to seed a fresh month's fixed list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurring {
    pub rent: f64,
    pub food: f64,
    pub wifi: f64,
}

impl Default for Recurring {
    fn default() -> Self {
        Self {
            rent: 4000.0,
            food: 2800.0,
            wifi: 250.0,
        }
    }
}

/// One archived month: full fixed/extra lists plus the budget in force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRecord {
    #[serde(default)]
    pub fixed: Vec<FixedExpense>,
    #[serde(default)]
    pub extra: Vec<ExtraExpense>,
    pub budget: f64,
}

/// Archive of past months keyed by "Month YYYY" label.
/// Insertion order is meaningful (exports enumerate in this order).
pub type History = IndexMap<String, MonthRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total_fixed: f64,
    pub total_extra: f64,
    pub remaining: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_expense_note_omitted_when_none() {
        let e = ExtraExpense {
            name: "Bus".to_string(),
            amount: 40.0,
            date: "2025-03-14 09:30".to_string(),
            note: None,
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("note"));

        let e = ExtraExpense {
            note: Some("monthly pass".to_string()),
            ..e
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("monthly pass"));
    }

    #[test]
    fn test_extra_expense_roundtrip_without_note() {
        let parsed: ExtraExpense =
            serde_json::from_str(r#"{"name":"Taxi","amount":120,"date":"2025-03-01 22:10"}"#)
                .unwrap();
        assert_eq!(parsed.note, None);
        assert_eq!(parsed.amount, 120.0);
    }

    #[test]
    fn test_recurring_defaults() {
        let r = Recurring::default();
        assert_eq!(r.rent, 4000.0);
        assert_eq!(r.food, 2800.0);
        assert_eq!(r.wifi, 250.0);
    }

    #[test]
    fn test_month_record_missing_lists_default_empty() {
        let rec: MonthRecord = serde_json::from_str(r#"{"budget":10000}"#).unwrap();
        assert!(rec.fixed.is_empty());
        assert!(rec.extra.is_empty());
    }

    #[test]
    fn test_history_preserves_insertion_order() {
        let mut h = History::new();
        h.insert(
            "March 2025".to_string(),
            MonthRecord {
                fixed: vec![],
                extra: vec![],
                budget: 1.0,
            },
        );
        h.insert(
            "January 2025".to_string(),
            MonthRecord {
                fixed: vec![],
                extra: vec![],
                budget: 2.0,
            },
        );
        let keys: Vec<&String> = h.keys().collect();
        assert_eq!(keys, ["March 2025", "January 2025"]);
    }
}
