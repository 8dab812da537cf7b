use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::options::{
    ClosedOption, EmploymentStatus, FamilyStatus, FinancialKnowledge, FundingSource, GoalAmountRange,
    GoalFlexibility, GoalType, HasKids, HousingStatus, IncomeStability, MonthlyIncome,
    RiskComfort, TimeHorizon,
};

/// Name of the backend collection holding intake submissions.
pub const RESPONSES_TABLE: &str = "calculator_responses";

// ============ Intake (write side) ============

/// A fully validated intake submission, ready to be appended to the store.
///
/// Built only by the intake form once every step passes validation. The
/// backend assigns `id`, `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIntakeRecord {
    pub email: String,
    pub age: i32,
    pub currently_living_in: String,
    pub family_status: FamilyStatus,
    pub has_kids: HasKids,
    /// Present only when `has_kids` is `yes`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub number_of_kids: Option<i32>,
    pub employment_status: EmploymentStatus,
    pub housing_status: HousingStatus,

    pub financial_knowledge: FinancialKnowledge,
    pub risk_comfort: RiskComfort,
    pub monthly_income: MonthlyIncome,
    pub income_stability: IncomeStability,
    pub rent_expenditure: f64,
    pub electricity_expenditure: f64,
    pub utilities_expenditure: f64,
    pub transport_expenditure: f64,
    pub groceries_expenditure: f64,
    pub miscellaneous_expenditure: f64,
    pub additional_yearly_income: f64,
    pub additional_yearly_expenditure: f64,

    pub goal_type: GoalType,
    /// Exactly one of `goal_amount` / `goal_amount_range` is set.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub goal_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub goal_amount_range: Option<GoalAmountRange>,
    pub time_horizon: TimeHorizon,
    pub funding_source: FundingSource,
    pub goal_flexibility: GoalFlexibility,
}

// ============ Stored records (read side) ============

/// A persisted intake submission as returned by the store.
///
/// Option-valued columns are kept as raw strings: records already in the
/// backend are displayed as they are, never rejected. PostgREST sends every
/// column and writes absent values as `null`, so scalar columns decode a
/// `null` to their default (`""` or 0).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct IntakeRecord {
    /// Backend-assigned identifier.
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub age: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currently_living_in: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub family_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_kids: String,
    #[serde(default)]
    pub number_of_kids: Option<i32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub employment_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub housing_status: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub financial_knowledge: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_comfort: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub monthly_income: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub income_stability: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rent_expenditure: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub electricity_expenditure: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub utilities_expenditure: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transport_expenditure: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groceries_expenditure: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub miscellaneous_expenditure: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_yearly_income: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_yearly_expenditure: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub goal_type: String,
    #[serde(default)]
    pub goal_amount: Option<f64>,
    #[serde(default)]
    pub goal_amount_range: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_horizon: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub funding_source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub goal_flexibility: String,

    /// Timestamp of creation (backend clock).
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update (maintained by the backend).
    pub updated_at: DateTime<Utc>,
}

/// Decodes `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl IntakeRecord {
    /// Materializes a stored record from a submission, the way the backend
    /// would: same values, wire strings for options, backend-owned metadata.
    pub fn from_new(id: i64, new: &NewIntakeRecord, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            email: new.email.clone(),
            age: new.age,
            currently_living_in: new.currently_living_in.clone(),
            family_status: new.family_status.to_string(),
            has_kids: new.has_kids.to_string(),
            number_of_kids: new.number_of_kids,
            employment_status: new.employment_status.to_string(),
            housing_status: new.housing_status.to_string(),
            financial_knowledge: new.financial_knowledge.to_string(),
            risk_comfort: new.risk_comfort.to_string(),
            monthly_income: new.monthly_income.to_string(),
            income_stability: new.income_stability.to_string(),
            rent_expenditure: new.rent_expenditure,
            electricity_expenditure: new.electricity_expenditure,
            utilities_expenditure: new.utilities_expenditure,
            transport_expenditure: new.transport_expenditure,
            groceries_expenditure: new.groceries_expenditure,
            miscellaneous_expenditure: new.miscellaneous_expenditure,
            additional_yearly_income: new.additional_yearly_income,
            additional_yearly_expenditure: new.additional_yearly_expenditure,
            goal_type: new.goal_type.to_string(),
            goal_amount: new.goal_amount,
            goal_amount_range: new.goal_amount_range.map(|range| range.to_string()),
            time_horizon: new.time_horizon.to_string(),
            funding_source: new.funding_source.to_string(),
            goal_flexibility: new.goal_flexibility.to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    /// Number of kids, honoured only when the record says it has kids.
    pub fn effective_number_of_kids(&self) -> Option<i32> {
        if self.has_kids == HasKids::Yes.as_str() {
            self.number_of_kids
        } else {
            None
        }
    }
}
