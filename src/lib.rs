//! GeldHero intake API library
//!
//! Lead-intake backend for GeldHero's financial planning questionnaire:
//! a three-step form controller that validates and submits one record per
//! completed form, and an admin browser over every stored submission.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Form and browser logic.
//! - `data`: Data access layer.
//! - `integrations`: Hosted backend clients.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types.
//! - `handlers`: Shared state, health and response browser handlers.
//! - `intake_form`: Multi-step intake form controller.
//! - `intake_handler`: Intake session handlers.
//! - `models`: Stored and submitted record types.
//! - `options`: Closed option sets and their labels.
//! - `pg_store`: Direct Postgres response store.
//! - `response_browser`: Admin browser over stored submissions.
//! - `response_detail`: Display-ready single record view.
//! - `routes`: Router assembly.
//! - `store`: `ResponseStore` trait and in-memory store.
//! - `supabase_client`: PostgREST response store.
//! - `validation`: Form steps, fields and field rules.

pub mod api;
pub mod core;
pub mod data;
pub mod integrations;

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod intake_form;
pub mod intake_handler;
pub mod models;
pub mod options;
pub mod pg_store;
pub mod response_browser;
pub mod response_detail;
pub mod routes;
pub mod store;
pub mod supabase_client;
pub mod validation;
