//! Utility to inspect the database schema and print the responses table structure.

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

/// Main entry point for the schema inspection utility.
///
/// Connects to the database and lists the columns of `calculator_responses`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let database_url = env::var("DB_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| "DB_URL or DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new().connect(&database_url).await?;

    let tables: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_schema, table_name FROM information_schema.tables WHERE table_name = 'calculator_responses'"
    )
    .fetch_all(&pool)
    .await?;

    if tables.is_empty() {
        println!("Table calculator_responses not found. Apply sql/calculator_responses.sql first.");
        return Ok(());
    }

    for (schema, table) in &tables {
        println!("{}.{}", schema, table);

        let columns: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position"
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&pool)
        .await?;

        for (col, type_, nullable) in columns {
            let null_marker = if nullable == "YES" { " (nullable)" } else { "" };
            println!("  - {}: {}{}", col, type_, null_marker);
        }

        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}.{}", schema, table))
            .fetch_one(&pool)
            .await?;
        println!("  {} row(s)", count);
        println!();
    }

    Ok(())
}
