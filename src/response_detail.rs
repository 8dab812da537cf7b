use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

use crate::models::IntakeRecord;
use crate::options::{
    label_or_verbatim, EmploymentStatus, FamilyStatus, FinancialKnowledge, FundingSource,
    GoalAmountRange, GoalFlexibility, GoalType, HasKids, HousingStatus, IncomeStability,
    MonthlyIncome, RiskComfort, TimeHorizon,
};

const GERMAN_MONTHS: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Where a record's goal size comes from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GoalSize {
    Amount(f64),
    Range(String),
    NotSpecified,
}

impl GoalSize {
    /// An exact amount wins when a record carries both.
    pub fn of(record: &IntakeRecord) -> Self {
        match (record.goal_amount, record.goal_amount_range.as_deref()) {
            (Some(amount), _) if amount > 0.0 => GoalSize::Amount(amount),
            (_, Some(range)) if !range.is_empty() => GoalSize::Range(range.to_string()),
            _ => GoalSize::NotSpecified,
        }
    }

    pub fn display(&self) -> String {
        match self {
            GoalSize::Amount(amount) => format_eur(*amount),
            GoalSize::Range(range) => label_or_verbatim::<GoalAmountRange>(range),
            GoalSize::NotSpecified => "Not specified".to_string(),
        }
    }
}

/// Formats euros the way de-DE does with no fraction digits: `1.234 €`.
pub fn format_eur(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{}", rounded.abs() as u64);

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}\u{a0}€", sign, grouped)
}

/// Long German date and time in UTC: `18. Oktober 2026 um 14:05`.
pub fn format_german_datetime(at: &DateTime<Utc>) -> String {
    format!(
        "{}. {} {} um {:02}:{:02}",
        at.day(),
        GERMAN_MONTHS[at.month0() as usize],
        at.year(),
        at.hour(),
        at.minute()
    )
}

/// Derived, display-ready view of a single submission.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseDetail {
    pub record: IntakeRecord,
    pub title: String,
    pub personal: Vec<DetailRow>,
    pub financial: Vec<DetailRow>,
    pub goal: Vec<DetailRow>,
    pub number_of_kids: Option<i32>,
    pub goal_size: GoalSize,
    pub total_monthly_expenditure: f64,
    pub net_yearly_adjustment: f64,
    pub created: String,
    pub updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

fn row(label: &'static str, value: impl Into<String>) -> DetailRow {
    DetailRow {
        label,
        value: value.into(),
    }
}

pub fn total_monthly_expenditure(record: &IntakeRecord) -> f64 {
    record.rent_expenditure
        + record.electricity_expenditure
        + record.utilities_expenditure
        + record.transport_expenditure
        + record.groceries_expenditure
        + record.miscellaneous_expenditure
}

impl ResponseDetail {
    pub fn from_record(record: &IntakeRecord) -> Self {
        let number_of_kids = record.effective_number_of_kids();
        let kids = match number_of_kids {
            Some(n) => format!("{} ({})", label_or_verbatim::<HasKids>(&record.has_kids), n),
            None => label_or_verbatim::<HasKids>(&record.has_kids),
        };

        let personal = vec![
            row("Email", record.email.clone()),
            row("Age", record.age.to_string()),
            row("Currently living in", record.currently_living_in.clone()),
            row(
                "Family status",
                label_or_verbatim::<FamilyStatus>(&record.family_status),
            ),
            row("Has kids", kids),
            row(
                "Employment status",
                label_or_verbatim::<EmploymentStatus>(&record.employment_status),
            ),
            row(
                "Housing status",
                label_or_verbatim::<HousingStatus>(&record.housing_status),
            ),
        ];

        let total = total_monthly_expenditure(record);
        let financial = vec![
            row(
                "Financial knowledge",
                label_or_verbatim::<FinancialKnowledge>(&record.financial_knowledge),
            ),
            row(
                "Risk comfort",
                label_or_verbatim::<RiskComfort>(&record.risk_comfort),
            ),
            row(
                "Monthly income",
                label_or_verbatim::<MonthlyIncome>(&record.monthly_income),
            ),
            row(
                "Income stability",
                label_or_verbatim::<IncomeStability>(&record.income_stability),
            ),
            row("Additional yearly income", format_eur(record.additional_yearly_income)),
            row(
                "Additional yearly expenditure",
                format_eur(record.additional_yearly_expenditure),
            ),
            row("Rent", format_eur(record.rent_expenditure)),
            row("Electricity", format_eur(record.electricity_expenditure)),
            row("Utilities", format_eur(record.utilities_expenditure)),
            row("Transport", format_eur(record.transport_expenditure)),
            row("Groceries", format_eur(record.groceries_expenditure)),
            row("Miscellaneous", format_eur(record.miscellaneous_expenditure)),
            row("Total monthly expenditure", format_eur(total)),
        ];

        let goal_size = GoalSize::of(record);
        let goal = vec![
            row("Goal type", label_or_verbatim::<GoalType>(&record.goal_type)),
            row("Goal amount", goal_size.display()),
            row(
                "Time horizon",
                label_or_verbatim::<TimeHorizon>(&record.time_horizon),
            ),
            row(
                "Funding source",
                label_or_verbatim::<FundingSource>(&record.funding_source),
            ),
            row(
                "Goal flexibility",
                label_or_verbatim::<GoalFlexibility>(&record.goal_flexibility),
            ),
        ];

        Self {
            record: record.clone(),
            title: format!("Response Details - {}", record.email),
            personal,
            financial,
            goal,
            number_of_kids,
            goal_size,
            total_monthly_expenditure: total,
            net_yearly_adjustment: record.additional_yearly_income
                - record.additional_yearly_expenditure,
            created: format_german_datetime(&record.created_at),
            updated: format_german_datetime(&record.updated_at),
        }
    }
}
