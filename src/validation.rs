/// Field-level validation for the intake form
///
/// This module owns the vocabulary of the form (which fields exist, which
/// step each belongs to, what a raw input value looks like) and the rules a
/// value must satisfy before a step may be left:
/// 1. Required fields must be non-empty
/// 2. Emails must match a standard address grammar
/// 3. Age must be an integer between 18 and 100
/// 4. Money amounts must be non-negative numbers
/// 5. Option fields must belong to their closed option set
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::options::{ClosedOption, SUPPORTED_COUNTRY};

pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 100;

/// Per-field error messages, keyed by field.
pub type FieldErrors = BTreeMap<FormField, String>;

/// The three fixed steps of the intake wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    Personal,
    Financial,
    Goal,
}

impl FormStep {
    pub const ALL: [FormStep; 3] = [FormStep::Personal, FormStep::Financial, FormStep::Goal];

    pub fn index(self) -> usize {
        match self {
            FormStep::Personal => 0,
            FormStep::Financial => 1,
            FormStep::Goal => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    pub fn title(self) -> &'static str {
        match self {
            FormStep::Personal => "Personal",
            FormStep::Financial => "Financial",
            FormStep::Goal => "Goals",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FormStep::Personal => "Basic information",
            FormStep::Financial => "Income & expenses",
            FormStep::Goal => "Your objectives",
        }
    }

    /// Every field shown on this step, conditional ones included.
    pub fn fields(self) -> &'static [FormField] {
        use FormField::*;
        match self {
            FormStep::Personal => &[
                Email,
                Age,
                LivingCountry,
                FamilyStatus,
                HasKids,
                NumberOfKids,
                EmploymentStatus,
                HousingStatus,
            ],
            FormStep::Financial => &[
                FinancialKnowledge,
                RiskComfort,
                MonthlyIncome,
                IncomeStability,
                RentExpenditure,
                ElectricityExpenditure,
                UtilitiesExpenditure,
                TransportExpenditure,
                GroceriesExpenditure,
                MiscellaneousExpenditure,
                AdditionalYearlyIncome,
                AdditionalYearlyExpenditure,
            ],
            FormStep::Goal => &[
                GoalType,
                GoalAmount,
                GoalAmountRange,
                TimeHorizon,
                FundingSource,
                GoalFlexibility,
            ],
        }
    }
}

/// Every input of the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Email,
    Age,
    LivingCountry,
    FamilyStatus,
    HasKids,
    NumberOfKids,
    EmploymentStatus,
    HousingStatus,
    FinancialKnowledge,
    RiskComfort,
    MonthlyIncome,
    IncomeStability,
    RentExpenditure,
    ElectricityExpenditure,
    UtilitiesExpenditure,
    TransportExpenditure,
    GroceriesExpenditure,
    MiscellaneousExpenditure,
    AdditionalYearlyIncome,
    AdditionalYearlyExpenditure,
    GoalType,
    GoalAmount,
    GoalAmountRange,
    TimeHorizon,
    FundingSource,
    GoalFlexibility,
}

impl FormField {
    pub fn step(self) -> FormStep {
        FormStep::ALL
            .into_iter()
            .find(|step| step.fields().contains(&self))
            .unwrap_or(FormStep::Personal)
    }

    /// Monthly expenditures and yearly adjustments; all default to zero.
    pub fn is_money(self) -> bool {
        matches!(
            self,
            FormField::RentExpenditure
                | FormField::ElectricityExpenditure
                | FormField::UtilitiesExpenditure
                | FormField::TransportExpenditure
                | FormField::GroceriesExpenditure
                | FormField::MiscellaneousExpenditure
                | FormField::AdditionalYearlyIncome
                | FormField::AdditionalYearlyExpenditure
        )
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the serde name so logs match the wire format.
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        f.write_str(&name)
    }
}

/// A raw value as entered by the user: either a JSON number or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// True for blank text. Numbers are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Number(_) => false,
            FieldValue::Text(text) => text.trim().is_empty(),
        }
    }

    /// Numeric view of the value; text is trimmed and parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
        }
        .filter(|n| n.is_finite())
    }

    /// Text view of the value, trimmed.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(text) => text.trim().to_string(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    // local@domain.tld, at least one dot in the domain
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

/// Validate email address
///
/// Checks for:
/// - `local@domain.tld` shape with a dotted domain
/// - No leading, trailing or doubled dots in the local part
/// - Maximum length of 254 characters
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || !EMAIL_REGEX.is_match(email) {
        return false;
    }

    let local = email.split('@').next().unwrap_or_default();
    !(local.starts_with('.') || local.ends_with('.') || local.contains(".."))
}

/// Validate an email field value. Returns the trimmed address.
pub fn validate_email(value: Option<&FieldValue>) -> Result<String, String> {
    let email = value
        .filter(|v| !v.is_empty())
        .map(FieldValue::as_text)
        .ok_or_else(|| "Email address is required".to_string())?;

    if !is_valid_email(&email) {
        return Err("Invalid email address".to_string());
    }
    Ok(email)
}

/// Validate an age: an integer in `[MIN_AGE, MAX_AGE]`.
pub fn validate_age(value: Option<&FieldValue>) -> Result<i32, String> {
    let age = required_integer(value, "Please enter your age", "Age must be a whole number")?;

    if age < MIN_AGE {
        return Err("Must be at least 18 years old".to_string());
    }
    if age > MAX_AGE {
        return Err("Must be at most 100 years old".to_string());
    }
    Ok(age as i32)
}

/// The country field is fixed; anything else is rejected.
pub fn validate_country(value: Option<&FieldValue>) -> Result<String, String> {
    match value.map(FieldValue::as_text) {
        Some(country) if country == SUPPORTED_COUNTRY => Ok(country),
        Some(country) if !country.is_empty() => Err(format!(
            "Only {} is currently supported",
            SUPPORTED_COUNTRY
        )),
        _ => Err("Please enter the country you live in".to_string()),
    }
}

/// Validate a money amount: a finite number, zero or more.
pub fn validate_money(value: Option<&FieldValue>) -> Result<f64, String> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| "Please enter an amount".to_string())?;
    let amount = value
        .as_number()
        .ok_or_else(|| "Must be a number".to_string())?;

    if amount < 0.0 {
        return Err("Must be a positive number".to_string());
    }
    Ok(amount)
}

/// Validate the number of kids: a whole number, at least one.
pub fn validate_number_of_kids(value: Option<&FieldValue>) -> Result<i32, String> {
    let kids = required_integer(
        value,
        "Please enter the number of kids",
        "Number of kids must be a whole number",
    )?;

    if kids < 1 {
        return Err("Number of kids must be at least 1".to_string());
    }
    i32::try_from(kids).map_err(|_| "Number of kids is too large".to_string())
}

/// Validate an exact goal amount: a number greater than zero.
pub fn validate_goal_amount(value: Option<&FieldValue>) -> Result<f64, String> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| "Please enter a goal amount".to_string())?;
    let amount = value
        .as_number()
        .ok_or_else(|| "Goal amount must be a number".to_string())?;

    if amount <= 0.0 {
        return Err("Goal amount must be greater than 0".to_string());
    }
    Ok(amount)
}

/// Validate a select field against its closed option set.
pub fn validate_option<T: ClosedOption>(value: Option<&FieldValue>) -> Result<T, String> {
    let raw = value
        .filter(|v| !v.is_empty())
        .map(FieldValue::as_text)
        .ok_or_else(|| format!("Please select {}", T::SET_NAME))?;

    T::parse(&raw).ok_or_else(|| format!("'{}' is not a valid {}", raw, T::SET_NAME))
}

fn required_integer(
    value: Option<&FieldValue>,
    missing: &str,
    not_integer: &str,
) -> Result<i64, String> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing.to_string())?;
    let number = value.as_number().ok_or_else(|| not_integer.to_string())?;

    if number.fract() != 0.0 || number.abs() > i64::MAX as f64 {
        return Err(not_integer.to_string());
    }
    Ok(number as i64)
}
