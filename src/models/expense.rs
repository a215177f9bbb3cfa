use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub title: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Expense {
    /// Text matched by the free-text ledger search.
    pub fn search_text(&self) -> String {
        [
            self.title.as_str(),
            self.category.as_str(),
            self.notes.as_deref().unwrap_or(""),
        ]
        .join(" ")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExpenseCategory {
    Fuel,
    Maintenance,
    Salary,
    Toll,
    Insurance,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Fuel,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Salary,
        ExpenseCategory::Toll,
        ExpenseCategory::Insurance,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Fuel => "Fuel",
            ExpenseCategory::Maintenance => "Maintenance",
            ExpenseCategory::Salary => "Salary",
            ExpenseCategory::Toll => "Toll",
            ExpenseCategory::Insurance => "Insurance",
            ExpenseCategory::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Unvalidated expense fields, used for both create and full replace.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseForm {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_exact_names() {
        assert_eq!(ExpenseCategory::parse("Fuel"), Some(ExpenseCategory::Fuel));
        assert_eq!(ExpenseCategory::parse("Insurance"), Some(ExpenseCategory::Insurance));
        assert_eq!(ExpenseCategory::parse("Groceries"), None);
        assert_eq!(ExpenseCategory::parse(""), None);
    }

    #[test]
    fn test_form_accepts_string_and_number_amounts() {
        let form: ExpenseForm =
            serde_json::from_str(r#"{"title":"Diesel","amount":"120.50"}"#).unwrap();
        assert_eq!(form.amount, Some(Decimal::new(12050, 2)));

        let form: ExpenseForm = serde_json::from_str(r#"{"amount":75}"#).unwrap();
        assert_eq!(form.amount, Some(Decimal::from(75)));
    }
}
