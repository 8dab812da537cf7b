/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use chrono::{Duration, TimeZone, Utc};
use geldhero_intake::intake_form::IntakeForm;
use geldhero_intake::models::IntakeRecord;
use geldhero_intake::response_browser::{filter_records, ResponseFilters};
use geldhero_intake::response_detail::format_eur;
use geldhero_intake::validation::{
    is_valid_email, validate_age, validate_money, FieldValue, FormField, FormStep,
};
use proptest::prelude::*;

fn record(id: i64, email: String, goal: &str, risk: &str) -> IntakeRecord {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(id);
    IntakeRecord {
        id,
        email,
        age: 30,
        currently_living_in: "Germany".into(),
        family_status: "single".into(),
        has_kids: "no".into(),
        number_of_kids: None,
        employment_status: "employed".into(),
        housing_status: "renting".into(),
        financial_knowledge: "beginner".into(),
        risk_comfort: risk.into(),
        monthly_income: "1000-2000".into(),
        income_stability: "regular".into(),
        rent_expenditure: 0.0,
        electricity_expenditure: 0.0,
        utilities_expenditure: 0.0,
        transport_expenditure: 0.0,
        groceries_expenditure: 0.0,
        miscellaneous_expenditure: 0.0,
        additional_yearly_income: 0.0,
        additional_yearly_expenditure: 0.0,
        goal_type: goal.into(),
        goal_amount: Some(100.0),
        goal_amount_range: None,
        time_horizon: "short-term".into(),
        funding_source: "monthly-savings".into(),
        goal_flexibility: "fixed".into(),
        created_at: at,
        updated_at: at,
    }
}

fn records_strategy() -> impl Strategy<Value = Vec<IntakeRecord>> {
    let goals = prop::sample::select(vec!["travel", "car", "education", "marriage"]);
    let risks = prop::sample::select(vec!["conservative", "balanced", "growth"]);
    prop::collection::vec(("[a-z]{1,8}@[a-z]{1,6}\\.de", goals, risks), 0..20).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (email, goal, risk))| record(i as i64 + 1, email, goal, risk))
            .collect()
    })
}

// Property: Email validation should never panic
proptest! {
    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }

    #[test]
    fn simple_addresses_are_valid(
        local in "[a-z]{1,10}",
        domain in "[a-z]{1,10}",
        tld in "[a-z]{2,4}"
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        prop_assert!(is_valid_email(&email));
    }

    #[test]
    fn addresses_without_at_are_invalid(text in "[a-z.]{0,30}") {
        prop_assert!(!is_valid_email(&text));
    }
}

// Property: Numeric field rules
proptest! {
    #[test]
    fn age_accepted_iff_in_range(age in -50i32..200) {
        let value = FieldValue::from(age);
        prop_assert_eq!(validate_age(Some(&value)).is_ok(), (18..=100).contains(&age));
    }

    #[test]
    fn age_as_text_behaves_like_number(age in 0i32..150) {
        let value = FieldValue::text(age.to_string());
        prop_assert_eq!(validate_age(Some(&value)).is_ok(), (18..=100).contains(&age));
    }

    #[test]
    fn money_rejects_negatives(amount in -1_000_000.0f64..1_000_000.0) {
        let value = FieldValue::from(amount);
        prop_assert_eq!(validate_money(Some(&value)).is_ok(), amount >= 0.0);
    }

    #[test]
    fn eur_format_has_only_digits_and_dots(amount in 0.0f64..1e12) {
        let formatted = format_eur(amount);
        prop_assert!(formatted.ends_with("\u{a0}€"), "formatted = {:?}", formatted);
        let number = formatted.trim_end_matches("\u{a0}€");
        prop_assert!(number.chars().all(|c| c.is_ascii_digit() || c == '.'));
        prop_assert!(!number.starts_with('.'));
    }
}

// Property: Kids count participates in validation only when kids = yes
proptest! {
    #[test]
    fn kids_count_active_iff_has_kids(has_kids in prop::sample::select(vec!["yes", "no", ""]), kids in -3i32..5) {
        let mut form = IntakeForm::new();
        form.set_field_value(FormField::HasKids, FieldValue::text(has_kids)).unwrap();
        form.set_field_value(FormField::NumberOfKids, FieldValue::from(kids)).unwrap();

        let active = form.is_field_active(FormField::NumberOfKids);
        prop_assert_eq!(active, has_kids == "yes");

        let errors = form.validate_step(FormStep::Personal);
        if !active {
            prop_assert!(!errors.contains_key(&FormField::NumberOfKids));
        } else {
            prop_assert_eq!(errors.contains_key(&FormField::NumberOfKids), kids < 1);
        }
    }
}

// Property: Filtering is a stable, idempotent projection
proptest! {
    #[test]
    fn filtering_is_idempotent_and_order_preserving(
        records in records_strategy(),
        search in "[a-z]{0,3}",
        goal in prop::sample::select(vec!["", "travel", "car"]),
        risk in prop::sample::select(vec!["", "balanced", "growth"]),
    ) {
        let filters = ResponseFilters::new(search, goal, risk);

        let once: Vec<IntakeRecord> = filter_records(&records, &filters).into_iter().cloned().collect();
        let twice: Vec<IntakeRecord> = filter_records(&once, &filters).into_iter().cloned().collect();
        prop_assert_eq!(&once, &twice);

        // Subsequence of the input, same relative order
        let mut cursor = records.iter();
        for kept in &once {
            prop_assert!(cursor.any(|r| r.id == kept.id));
        }

        for kept in &once {
            prop_assert!(filters.matches(kept));
        }
    }

    #[test]
    fn empty_filters_keep_everything(records in records_strategy()) {
        let filtered = filter_records(&records, &ResponseFilters::default());
        prop_assert_eq!(filtered.len(), records.len());
    }
}
