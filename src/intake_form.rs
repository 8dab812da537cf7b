/// Intake form controller
///
/// Drives the three-step financial assessment wizard:
/// 1. Personal (contact, age, household)
/// 2. Financial (knowledge, risk, income, expenditures)
/// 3. Goal (type, size, horizon, funding, flexibility)
///
/// Each step is validated before it can be left. The last step submits one
/// record to the injected `ResponseStore`; once that succeeds the form is
/// terminal and rejects every further change.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::AppError;
use crate::models::{IntakeRecord, NewIntakeRecord};
use crate::options::{ClosedOption, HasKids, SUPPORTED_COUNTRY};
use crate::store::ResponseStore;
use crate::validation::{
    validate_age, validate_country, validate_email, validate_goal_amount, validate_money,
    validate_number_of_kids, validate_option, FieldErrors, FieldValue, FormField, FormStep,
};

/// Which of the two goal-size inputs is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalAmountMode {
    /// An exact amount in euros (`goalAmount`).
    #[default]
    Exact,
    /// A bucketed range (`goalAmountRange`), the "Not sure?" path.
    Range,
}

impl GoalAmountMode {
    pub fn toggled(self) -> Self {
        match self {
            GoalAmountMode::Exact => GoalAmountMode::Range,
            GoalAmountMode::Range => GoalAmountMode::Exact,
        }
    }
}

/// Derived lifecycle state of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "step", rename_all = "snake_case")]
pub enum FormPhase {
    Editing(FormStep),
    Submitting,
    Submitted,
}

/// State of one user's pass through the intake wizard.
#[derive(Debug, Clone)]
pub struct IntakeForm {
    current_step: FormStep,
    values: BTreeMap<FormField, FieldValue>,
    errors: FieldErrors,
    goal_amount_mode: GoalAmountMode,
    is_submitting: bool,
    is_submitted: bool,
    submission_failed: bool,
    submitted_record: Option<IntakeRecord>,
}

impl Default for IntakeForm {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeForm {
    /// Creates a form on the first step with the default values filled in:
    /// the supported country and zero for every money field.
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert(FormField::LivingCountry, FieldValue::text(SUPPORTED_COUNTRY));
        for step in FormStep::ALL {
            for field in step.fields().iter().filter(|f| f.is_money()) {
                values.insert(*field, FieldValue::Number(0.0));
            }
        }

        Self {
            current_step: FormStep::Personal,
            values,
            errors: FieldErrors::new(),
            goal_amount_mode: GoalAmountMode::default(),
            is_submitting: false,
            is_submitted: false,
            submission_failed: false,
            submitted_record: None,
        }
    }

    pub fn current_step(&self) -> FormStep {
        self.current_step
    }

    pub fn value(&self, field: FormField) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn values(&self) -> &BTreeMap<FormField, FieldValue> {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn goal_amount_mode(&self) -> GoalAmountMode {
        self.goal_amount_mode
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    /// True after the last submission attempt failed at the store.
    pub fn submission_failed(&self) -> bool {
        self.submission_failed
    }

    /// The record the store returned for a successful submission.
    pub fn submitted_record(&self) -> Option<&IntakeRecord> {
        self.submitted_record.as_ref()
    }

    pub fn phase(&self) -> FormPhase {
        if self.is_submitted {
            FormPhase::Submitted
        } else if self.is_submitting {
            FormPhase::Submitting
        } else {
            FormPhase::Editing(self.current_step)
        }
    }

    fn has_kids(&self) -> Option<HasKids> {
        self.value(FormField::HasKids)
            .and_then(|v| HasKids::parse(&v.as_text()))
    }

    /// Whether a field is currently shown, and so validated and submitted.
    ///
    /// `numberOfKids` follows the `hasKids` answer; the two goal-size inputs
    /// follow the goal amount mode. Everything else is always active.
    pub fn is_field_active(&self, field: FormField) -> bool {
        match field {
            FormField::NumberOfKids => self.has_kids() == Some(HasKids::Yes),
            FormField::GoalAmount => self.goal_amount_mode == GoalAmountMode::Exact,
            FormField::GoalAmountRange => self.goal_amount_mode == GoalAmountMode::Range,
            _ => true,
        }
    }

    pub fn active_fields(&self, step: FormStep) -> Vec<FormField> {
        step.fields()
            .iter()
            .copied()
            .filter(|field| self.is_field_active(*field))
            .collect()
    }

    fn ensure_editable(&self) -> Result<(), AppError> {
        if self.is_submitted {
            return Err(AppError::Conflict(
                "The form has already been submitted".to_string(),
            ));
        }
        if self.is_submitting {
            return Err(AppError::Conflict(
                "A submission is already in progress".to_string(),
            ));
        }
        Ok(())
    }

    /// Stores a value and drops any error previously shown for the field.
    pub fn set_field_value(&mut self, field: FormField, value: FieldValue) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.values.insert(field, value);
        self.errors.remove(&field);
        self.drop_inactive_errors();
        tracing::debug!("Form field {} updated", field);
        Ok(())
    }

    pub fn clear_field_value(&mut self, field: FormField) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.values.remove(&field);
        self.errors.remove(&field);
        self.drop_inactive_errors();
        Ok(())
    }

    pub fn set_goal_amount_mode(&mut self, mode: GoalAmountMode) -> Result<(), AppError> {
        self.ensure_editable()?;
        self.goal_amount_mode = mode;
        self.drop_inactive_errors();
        Ok(())
    }

    pub fn toggle_goal_amount_mode(&mut self) -> Result<GoalAmountMode, AppError> {
        let mode = self.goal_amount_mode.toggled();
        self.set_goal_amount_mode(mode)?;
        Ok(mode)
    }

    // Hidden fields never show errors; their values stay in `values`.
    fn drop_inactive_errors(&mut self) {
        let inactive: Vec<FormField> = self
            .errors
            .keys()
            .copied()
            .filter(|field| !self.is_field_active(*field))
            .collect();
        for field in inactive {
            self.errors.remove(&field);
        }
    }

    /// Checks one field against its rule. Inactive fields always pass.
    pub fn validate_field(&self, field: FormField) -> Result<(), String> {
        use crate::options::*;

        if !self.is_field_active(field) {
            return Ok(());
        }

        let value = self.value(field);
        match field {
            FormField::Email => validate_email(value).map(drop),
            FormField::Age => validate_age(value).map(drop),
            FormField::LivingCountry => validate_country(value).map(drop),
            FormField::FamilyStatus => validate_option::<FamilyStatus>(value).map(drop),
            FormField::HasKids => validate_option::<HasKids>(value).map(drop),
            FormField::NumberOfKids => validate_number_of_kids(value).map(drop),
            FormField::EmploymentStatus => validate_option::<EmploymentStatus>(value).map(drop),
            FormField::HousingStatus => validate_option::<HousingStatus>(value).map(drop),
            FormField::FinancialKnowledge => {
                validate_option::<FinancialKnowledge>(value).map(drop)
            }
            FormField::RiskComfort => validate_option::<RiskComfort>(value).map(drop),
            FormField::MonthlyIncome => validate_option::<MonthlyIncome>(value).map(drop),
            FormField::IncomeStability => validate_option::<IncomeStability>(value).map(drop),
            FormField::GoalType => validate_option::<GoalType>(value).map(drop),
            FormField::GoalAmount => validate_goal_amount(value).map(drop),
            FormField::GoalAmountRange => validate_option::<GoalAmountRange>(value).map(drop),
            FormField::TimeHorizon => validate_option::<TimeHorizon>(value).map(drop),
            FormField::FundingSource => validate_option::<FundingSource>(value).map(drop),
            FormField::GoalFlexibility => validate_option::<GoalFlexibility>(value).map(drop),
            money => {
                debug_assert!(money.is_money());
                validate_money(value).map(drop)
            }
        }
    }

    /// Errors for the active fields of one step. Empty means the step passes.
    pub fn validate_step(&self, step: FormStep) -> FieldErrors {
        self.active_fields(step)
            .into_iter()
            .filter_map(|field| self.validate_field(field).err().map(|msg| (field, msg)))
            .collect()
    }

    /// Validates the current step and moves forward when it passes.
    ///
    /// On the last step a passing validation leaves the step unchanged.
    pub fn go_to_next_step(&mut self) -> Result<FormStep, AppError> {
        self.ensure_editable()?;

        let step = self.current_step;
        let step_errors = self.validate_step(step);

        for field in step.fields() {
            self.errors.remove(field);
        }

        if !step_errors.is_empty() {
            tracing::debug!(
                "Step {} failed validation on {} field(s)",
                step.title(),
                step_errors.len()
            );
            self.errors.extend(step_errors.clone());
            return Err(AppError::ValidationFailed(step_errors));
        }

        if let Some(next) = step.next() {
            self.current_step = next;
        }
        Ok(self.current_step)
    }

    /// Moves one step back. Values and errors are kept.
    pub fn go_to_previous_step(&mut self) -> Result<FormStep, AppError> {
        self.ensure_editable()?;
        if let Some(previous) = self.current_step.previous() {
            self.current_step = previous;
        }
        Ok(self.current_step)
    }

    /// Validates every step and assembles the record to submit.
    ///
    /// Inactive fields are left out regardless of what is stored for them.
    pub fn build_record(&self) -> Result<NewIntakeRecord, FieldErrors> {
        use crate::options::*;

        let mut checker = Checker::default();
        let value = |field| self.value(field);

        let email = checker.check(FormField::Email, validate_email(value(FormField::Email)));
        let age = checker.check(FormField::Age, validate_age(value(FormField::Age)));
        let country = checker.check(
            FormField::LivingCountry,
            validate_country(value(FormField::LivingCountry)),
        );
        let family_status = checker.check_option::<FamilyStatus>(self, FormField::FamilyStatus);
        let has_kids = checker.check_option::<HasKids>(self, FormField::HasKids);
        let number_of_kids = if self.is_field_active(FormField::NumberOfKids) {
            checker
                .check(
                    FormField::NumberOfKids,
                    validate_number_of_kids(value(FormField::NumberOfKids)),
                )
                .map(Some)
        } else {
            Some(None)
        };
        let employment_status =
            checker.check_option::<EmploymentStatus>(self, FormField::EmploymentStatus);
        let housing_status = checker.check_option::<HousingStatus>(self, FormField::HousingStatus);

        let financial_knowledge =
            checker.check_option::<FinancialKnowledge>(self, FormField::FinancialKnowledge);
        let risk_comfort = checker.check_option::<RiskComfort>(self, FormField::RiskComfort);
        let monthly_income = checker.check_option::<MonthlyIncome>(self, FormField::MonthlyIncome);
        let income_stability =
            checker.check_option::<IncomeStability>(self, FormField::IncomeStability);
        let mut money = |field| checker.check(field, validate_money(value(field)));
        let rent = money(FormField::RentExpenditure);
        let electricity = money(FormField::ElectricityExpenditure);
        let utilities = money(FormField::UtilitiesExpenditure);
        let transport = money(FormField::TransportExpenditure);
        let groceries = money(FormField::GroceriesExpenditure);
        let miscellaneous = money(FormField::MiscellaneousExpenditure);
        let yearly_income = money(FormField::AdditionalYearlyIncome);
        let yearly_expenditure = money(FormField::AdditionalYearlyExpenditure);

        let goal_type = checker.check_option::<GoalType>(self, FormField::GoalType);
        let (goal_amount, goal_amount_range) = match self.goal_amount_mode {
            GoalAmountMode::Exact => (
                checker
                    .check(
                        FormField::GoalAmount,
                        validate_goal_amount(value(FormField::GoalAmount)),
                    )
                    .map(Some),
                Some(None),
            ),
            GoalAmountMode::Range => (
                Some(None),
                checker
                    .check_option::<GoalAmountRange>(self, FormField::GoalAmountRange)
                    .map(Some),
            ),
        };
        let time_horizon = checker.check_option::<TimeHorizon>(self, FormField::TimeHorizon);
        let funding_source = checker.check_option::<FundingSource>(self, FormField::FundingSource);
        let goal_flexibility =
            checker.check_option::<GoalFlexibility>(self, FormField::GoalFlexibility);

        let record = (|| {
            Some(NewIntakeRecord {
                email: email?,
                age: age?,
                currently_living_in: country?,
                family_status: family_status?,
                has_kids: has_kids?,
                number_of_kids: number_of_kids?,
                employment_status: employment_status?,
                housing_status: housing_status?,
                financial_knowledge: financial_knowledge?,
                risk_comfort: risk_comfort?,
                monthly_income: monthly_income?,
                income_stability: income_stability?,
                rent_expenditure: rent?,
                electricity_expenditure: electricity?,
                utilities_expenditure: utilities?,
                transport_expenditure: transport?,
                groceries_expenditure: groceries?,
                miscellaneous_expenditure: miscellaneous?,
                additional_yearly_income: yearly_income?,
                additional_yearly_expenditure: yearly_expenditure?,
                goal_type: goal_type?,
                goal_amount: goal_amount?,
                goal_amount_range: goal_amount_range?,
                time_horizon: time_horizon?,
                funding_source: funding_source?,
                goal_flexibility: goal_flexibility?,
            })
        })();

        match record {
            Some(record) if checker.errors.is_empty() => Ok(record),
            _ => Err(checker.errors),
        }
    }

    /// First half of `submit`: guards, full validation, enter Submitting.
    ///
    /// Callers that must not hold the form across the store call (the HTTP
    /// shell) use this with `complete_submission`.
    pub fn begin_submission(&mut self) -> Result<NewIntakeRecord, AppError> {
        self.ensure_editable()?;
        if !self.current_step.is_last() {
            return Err(AppError::Conflict(
                "The form can only be submitted from the final step".to_string(),
            ));
        }

        let record = match self.build_record() {
            Ok(record) => record,
            Err(errors) => {
                tracing::debug!("Submission blocked by {} invalid field(s)", errors.len());
                self.errors = errors.clone();
                return Err(AppError::ValidationFailed(errors));
            }
        };

        self.errors.clear();
        self.is_submitting = true;
        self.submission_failed = false;
        Ok(record)
    }

    /// Second half of `submit`: apply the store's answer.
    pub fn complete_submission(
        &mut self,
        result: Result<IntakeRecord, AppError>,
    ) -> Result<IntakeRecord, AppError> {
        if !self.is_submitting {
            return Err(AppError::Conflict(
                "No submission is in progress".to_string(),
            ));
        }
        self.is_submitting = false;

        match result {
            Ok(record) => {
                tracing::info!("✓ Intake submission stored as record {}", record.id);
                self.is_submitted = true;
                self.submitted_record = Some(record.clone());
                Ok(record)
            }
            Err(e) => {
                tracing::error!("Failed to store intake submission: {}", e);
                self.submission_failed = true;
                Err(e)
            }
        }
    }

    /// Validates everything and appends one record to the store.
    ///
    /// Only allowed from the final step. A store failure leaves the form on
    /// the final step with its values intact and `submission_failed` set; it
    /// is not retried.
    pub async fn submit(&mut self, store: &dyn ResponseStore) -> Result<IntakeRecord, AppError> {
        let record = self.begin_submission()?;
        let result = store.insert(&record).await;
        self.complete_submission(result)
    }

    /// Serializable snapshot for API responses.
    pub fn view(&self) -> IntakeFormView {
        IntakeFormView {
            phase: self.phase(),
            current_step: self.current_step,
            step_index: self.current_step.index(),
            step_title: self.current_step.title(),
            goal_amount_mode: self.goal_amount_mode,
            active_fields: self.active_fields(self.current_step),
            values: self.values.clone(),
            errors: self.errors.clone(),
            is_submitting: self.is_submitting,
            is_submitted: self.is_submitted,
            submission_failed: self.submission_failed,
            record_id: self.submitted_record.as_ref().map(|r| r.id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IntakeFormView {
    pub phase: FormPhase,
    pub current_step: FormStep,
    pub step_index: usize,
    pub step_title: &'static str,
    pub goal_amount_mode: GoalAmountMode,
    pub active_fields: Vec<FormField>,
    pub values: BTreeMap<FormField, FieldValue>,
    pub errors: FieldErrors,
    pub is_submitting: bool,
    pub is_submitted: bool,
    pub submission_failed: bool,
    pub record_id: Option<i64>,
}

#[derive(Default)]
struct Checker {
    errors: FieldErrors,
}

impl Checker {
    fn check<T>(&mut self, field: FormField, result: Result<T, String>) -> Option<T> {
        result.map_err(|msg| self.errors.insert(field, msg)).ok()
    }

    fn check_option<T: ClosedOption>(&mut self, form: &IntakeForm, field: FormField) -> Option<T> {
        self.check(field, validate_option::<T>(form.value(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_form_defaults() {
        let form = IntakeForm::new();
        assert_eq!(form.current_step(), FormStep::Personal);
        assert_eq!(
            form.value(FormField::LivingCountry),
            Some(&FieldValue::text("Germany"))
        );
        assert_eq!(
            form.value(FormField::GroceriesExpenditure),
            Some(&FieldValue::Number(0.0))
        );
        assert_eq!(form.goal_amount_mode(), GoalAmountMode::Exact);
        assert_eq!(form.phase(), FormPhase::Editing(FormStep::Personal));
    }

    #[test]
    fn test_kids_count_only_active_with_kids() {
        let mut form = IntakeForm::new();
        assert!(!form.is_field_active(FormField::NumberOfKids));

        form.set_field_value(FormField::HasKids, "yes".into()).unwrap();
        assert!(form.is_field_active(FormField::NumberOfKids));

        form.set_field_value(FormField::HasKids, "no".into()).unwrap();
        assert!(!form.is_field_active(FormField::NumberOfKids));
    }

    #[test]
    fn test_goal_mode_switches_active_input() {
        let mut form = IntakeForm::new();
        assert!(form.is_field_active(FormField::GoalAmount));
        assert!(!form.is_field_active(FormField::GoalAmountRange));

        assert_eq!(form.toggle_goal_amount_mode().unwrap(), GoalAmountMode::Range);
        assert!(!form.is_field_active(FormField::GoalAmount));
        assert!(form.is_field_active(FormField::GoalAmountRange));
    }

    #[test]
    fn test_previous_is_noop_on_first_step() {
        let mut form = IntakeForm::new();
        assert_eq!(form.go_to_previous_step().unwrap(), FormStep::Personal);
    }

    #[test]
    fn test_complete_without_begin_is_rejected() {
        let mut form = IntakeForm::new();
        let result = form.complete_submission(Err(AppError::InternalError("x".into())));
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(!form.submission_failed());
    }

    #[test]
    fn test_phase_serializes_with_step() {
        let json = serde_json::to_value(FormPhase::Editing(FormStep::Financial)).unwrap();
        assert_eq!(json, serde_json::json!({"phase": "editing", "step": "financial"}));
    }
}
