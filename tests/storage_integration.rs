use std::env;

use geldhero_intake::data::db::Database;
use geldhero_intake::data::pg_store::PgResponseStore;
use geldhero_intake::models::NewIntakeRecord;
use geldhero_intake::options::*;
use geldhero_intake::store::ResponseStore;

/// Integration smoke test for the Postgres response store.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
/// Expects sql/calculator_responses.sql to have been applied.
#[tokio::test]
#[ignore]
async fn insert_and_list_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    let store = PgResponseStore::new(db.pool.clone());

    // Unique address so repeated runs can be told apart
    let email = format!("smoke+{}@example.de", uuid::Uuid::new_v4().simple());
    let record = NewIntakeRecord {
        email: email.clone(),
        age: 42,
        currently_living_in: "Germany".to_string(),
        family_status: FamilyStatus::Single,
        has_kids: HasKids::No,
        number_of_kids: None,
        employment_status: EmploymentStatus::SelfEmployed,
        housing_status: HousingStatus::Owner,
        financial_knowledge: FinancialKnowledge::Confident,
        risk_comfort: RiskComfort::Growth,
        monthly_income: MonthlyIncome::Above6000,
        income_stability: IncomeStability::Unstable,
        rent_expenditure: 0.0,
        electricity_expenditure: 75.5,
        utilities_expenditure: 0.0,
        transport_expenditure: 120.0,
        groceries_expenditure: 300.0,
        miscellaneous_expenditure: 0.0,
        additional_yearly_income: 0.0,
        additional_yearly_expenditure: 0.0,
        goal_type: GoalType::Investment,
        goal_amount: None,
        goal_amount_range: Some(GoalAmountRange::Above50000),
        time_horizon: TimeHorizon::MediumTerm,
        funding_source: FundingSource::Combination,
        goal_flexibility: GoalFlexibility::Flexible,
    };

    let stored = store
        .insert(&record)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(stored.id > 0);
    assert_eq!(stored.goal_amount_range.as_deref(), Some("50000+"));
    assert_eq!(stored.goal_amount, None);

    let listed = store
        .list_newest_first()
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(listed
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
    assert!(listed.iter().any(|r| r.email == email));

    Ok(())
}
