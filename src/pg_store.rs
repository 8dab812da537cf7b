use crate::errors::{AppError, ResultExt};
use crate::models::{IntakeRecord, NewIntakeRecord};
use crate::options::ClosedOption;
use crate::store::ResponseStore;
use async_trait::async_trait;
use sqlx::PgPool;

const INSERT_RESPONSE: &str = r#"
    INSERT INTO calculator_responses (
        email, age, currently_living_in, family_status, has_kids, number_of_kids,
        employment_status, housing_status,
        financial_knowledge, risk_comfort, monthly_income, income_stability,
        rent_expenditure, electricity_expenditure, utilities_expenditure,
        transport_expenditure, groceries_expenditure, miscellaneous_expenditure,
        additional_yearly_income, additional_yearly_expenditure,
        goal_type, goal_amount, goal_amount_range, time_horizon, funding_source,
        goal_flexibility
    )
    VALUES (
        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
        $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26
    )
    RETURNING *
"#;

/// Direct Postgres storage for intake submissions.
pub struct PgResponseStore {
    pool: PgPool,
}

impl PgResponseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseStore for PgResponseStore {
    async fn insert(&self, record: &NewIntakeRecord) -> Result<IntakeRecord, AppError> {
        let stored = sqlx::query_as::<_, IntakeRecord>(INSERT_RESPONSE)
            .bind(&record.email)
            .bind(record.age)
            .bind(&record.currently_living_in)
            .bind(record.family_status.as_str())
            .bind(record.has_kids.as_str())
            .bind(record.number_of_kids)
            .bind(record.employment_status.as_str())
            .bind(record.housing_status.as_str())
            .bind(record.financial_knowledge.as_str())
            .bind(record.risk_comfort.as_str())
            .bind(record.monthly_income.as_str())
            .bind(record.income_stability.as_str())
            .bind(record.rent_expenditure)
            .bind(record.electricity_expenditure)
            .bind(record.utilities_expenditure)
            .bind(record.transport_expenditure)
            .bind(record.groceries_expenditure)
            .bind(record.miscellaneous_expenditure)
            .bind(record.additional_yearly_income)
            .bind(record.additional_yearly_expenditure)
            .bind(record.goal_type.as_str())
            .bind(record.goal_amount)
            .bind(record.goal_amount_range.map(|r| r.as_str()))
            .bind(record.time_horizon.as_str())
            .bind(record.funding_source.as_str())
            .bind(record.goal_flexibility.as_str())
            .fetch_one(&self.pool)
            .await
            .context("Failed to insert intake response")?;

        tracing::info!("✓ Stored intake response {}", stored.id);
        Ok(stored)
    }

    async fn list_newest_first(&self) -> Result<Vec<IntakeRecord>, AppError> {
        let records = sqlx::query_as::<_, IntakeRecord>(
            "SELECT * FROM calculator_responses ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list intake responses")?;

        tracing::debug!("Loaded {} intake responses from Postgres", records.len());
        Ok(records)
    }
}
