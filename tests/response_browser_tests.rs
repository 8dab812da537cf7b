/// Response browser and detail view tests against the in-memory store
use chrono::{DateTime, Duration, TimeZone, Utc};
use geldhero_intake::models::IntakeRecord;
use geldhero_intake::response_browser::{ResponseBrowser, ResponseFilters};
use geldhero_intake::response_detail::{GoalSize, ResponseDetail};
use geldhero_intake::store::{MemoryStore, ResponseStore};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 14, 5, 0).unwrap()
}

fn record(id: i64, email: &str, age: i32, goal: &str, risk: &str) -> IntakeRecord {
    let at = base_time() + Duration::minutes(id);
    IntakeRecord {
        id,
        email: email.to_string(),
        age,
        currently_living_in: "Germany".into(),
        family_status: "married".into(),
        has_kids: "no".into(),
        number_of_kids: None,
        employment_status: "self-employed".into(),
        housing_status: "owner".into(),
        financial_knowledge: "confident".into(),
        risk_comfort: risk.into(),
        monthly_income: "4000-5000".into(),
        income_stability: "stable".into(),
        rent_expenditure: 1200.0,
        electricity_expenditure: 80.0,
        utilities_expenditure: 120.0,
        transport_expenditure: 60.0,
        groceries_expenditure: 450.0,
        miscellaneous_expenditure: 90.0,
        additional_yearly_income: 2000.0,
        additional_yearly_expenditure: 500.0,
        goal_type: goal.into(),
        goal_amount: Some(12500.0),
        goal_amount_range: None,
        time_horizon: "medium-term".into(),
        funding_source: "combination".into(),
        goal_flexibility: "flexible".into(),
        created_at: at,
        updated_at: at,
    }
}

fn sample_records() -> Vec<IntakeRecord> {
    vec![
        record(1, "anna@example.de", 30, "travel", "balanced"),
        record(2, "ben@firma.de", 45, "car", "growth"),
        record(3, "clara@example.de", 52, "car", "conservative"),
        record(4, "dieter@post.de", 28, "education", "balanced"),
    ]
}

async fn loaded_browser() -> ResponseBrowser {
    let store = MemoryStore::with_records(sample_records());
    let mut browser = ResponseBrowser::new();
    browser.refresh(&store).await.unwrap();
    browser
}

#[tokio::test]
async fn test_refresh_orders_newest_first() {
    let browser = loaded_browser().await;
    let ids: Vec<i64> = browser.snapshot().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
    assert!(!browser.is_loading());
    assert!(!browser.last_refresh_failed());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let store = MemoryStore::with_records(sample_records());
    let mut browser = ResponseBrowser::new();
    browser.refresh(&store).await.unwrap();

    store.set_failing(true);
    assert!(browser.refresh(&store).await.is_err());
    assert!(browser.last_refresh_failed());
    assert!(!browser.is_loading());
    assert_eq!(browser.snapshot().len(), 4);

    store.set_failing(false);
    browser.refresh(&store).await.unwrap();
    assert!(!browser.last_refresh_failed());
}

#[tokio::test]
async fn test_split_refresh_keeps_snapshot_while_loading() {
    let store = MemoryStore::with_records(sample_records());
    let mut browser =
        ResponseBrowser::with_snapshot(vec![record(1, "anna@example.de", 30, "travel", "balanced")]);

    browser.begin_refresh();
    assert!(browser.is_loading());
    assert_eq!(browser.snapshot().len(), 1);
    assert_eq!(browser.stats().total, 1);

    let count = browser.finish_refresh(store.list_newest_first().await).unwrap();
    assert_eq!(count, 4);
    assert!(!browser.is_loading());
    assert_eq!(browser.snapshot()[0].id, 4);
}

#[tokio::test]
async fn test_empty_filters_return_whole_snapshot() {
    let mut browser = loaded_browser().await;
    assert_eq!(browser.apply_filters("", "", "").len(), 4);
}

#[tokio::test]
async fn test_combined_filters() {
    let mut browser = loaded_browser().await;

    let ids: Vec<i64> = browser
        .apply_filters("example.de", "car", "")
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![3]);

    let ids: Vec<i64> = browser
        .apply_filters("", "", "balanced")
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![4, 1]);

    assert!(browser.apply_filters("nobody", "", "").is_empty());
}

#[tokio::test]
async fn test_search_matches_goal_type_text() {
    let mut browser = loaded_browser().await;
    let ids: Vec<i64> = browser
        .apply_filters("EDUC", "", "")
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![4]);
}

#[tokio::test]
async fn test_filters_are_stored_and_cleared() {
    let mut browser = loaded_browser().await;
    browser.apply_filters("ben", "", "");
    assert_eq!(browser.filters(), &ResponseFilters::new("ben", "", ""));
    assert_eq!(browser.filtered().len(), 1);

    browser.clear_filters();
    assert!(browser.filters().is_empty());
    assert_eq!(browser.filtered().len(), 4);
}

#[tokio::test]
async fn test_stats_ignore_filters() {
    let mut browser = loaded_browser().await;
    browser.apply_filters("anna", "", "");

    let stats = browser.stats();
    assert_eq!(stats.total, 4);
    // (30 + 45 + 52 + 28) / 4 = 38.75
    assert_eq!(stats.average_age, 39);
    assert_eq!(stats.top_goal_type.as_deref(), Some("car"));
}

#[tokio::test]
async fn test_select_and_close_detail() {
    let mut browser = loaded_browser().await;

    assert_eq!(
        browser.select_by_id(2).map(|r| r.email.clone()).as_deref(),
        Some("ben@firma.de")
    );
    assert_eq!(browser.selected().map(|r| r.id), Some(2));

    browser.close_detail();
    assert!(browser.selected().is_none());

    assert!(browser.select_by_id(99).is_none());

    let outside = record(42, "x@y.de", 40, "travel", "growth");
    browser.select_record(outside);
    assert_eq!(browser.selected().map(|r| r.id), Some(42));
}

#[tokio::test]
async fn test_risk_options_use_labels() {
    let browser = loaded_browser().await;
    let options = browser.risk_comfort_options();
    let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, vec!["balanced", "conservative", "growth"]);
    assert!(options[0].label.starts_with("Balance: Middle Risk"));
}

#[test]
fn test_detail_derived_values() {
    let mut rec = record(7, "eva@example.de", 41, "car", "growth");
    rec.has_kids = "yes".into();
    rec.number_of_kids = Some(2);

    let detail = ResponseDetail::from_record(&rec);
    assert_eq!(detail.title, "Response Details - eva@example.de");
    assert_eq!(detail.number_of_kids, Some(2));
    assert_eq!(detail.total_monthly_expenditure, 2000.0);
    assert_eq!(detail.net_yearly_adjustment, 1500.0);
    assert_eq!(detail.goal_size, GoalSize::Amount(12500.0));
    assert_eq!(detail.created, "18. Oktober 2026 um 14:12");

    let goal = detail.goal.iter().find(|r| r.label == "Goal type").unwrap();
    assert_eq!(goal.value, "Purchase a Car");
    let amount = detail.goal.iter().find(|r| r.label == "Goal amount").unwrap();
    assert_eq!(amount.value, "12.500\u{a0}€");
    let total = detail
        .financial
        .iter()
        .find(|r| r.label == "Total monthly expenditure")
        .unwrap();
    assert_eq!(total.value, "2.000\u{a0}€");
}

#[test]
fn test_detail_kids_count_hidden_without_kids() {
    let mut rec = record(8, "fritz@example.de", 33, "travel", "balanced");
    rec.number_of_kids = Some(4);
    assert_eq!(ResponseDetail::from_record(&rec).number_of_kids, None);
}

#[test]
fn test_detail_goal_size_variants() {
    let mut rec = record(9, "gina@example.de", 29, "travel", "balanced");
    rec.goal_amount = None;
    rec.goal_amount_range = Some("10000-25000".into());
    let detail = ResponseDetail::from_record(&rec);
    assert_eq!(detail.goal_size, GoalSize::Range("10000-25000".into()));
    assert_eq!(detail.goal_size.display(), "€10,000 - €25,000");

    rec.goal_amount_range = None;
    assert_eq!(GoalSize::of(&rec), GoalSize::NotSpecified);

    // Exact amount wins when both are present
    rec.goal_amount = Some(800.0);
    rec.goal_amount_range = Some("0-5000".into());
    assert_eq!(GoalSize::of(&rec), GoalSize::Amount(800.0));
}

#[test]
fn test_detail_shows_unknown_values_verbatim() {
    let mut rec = record(10, "hans@example.de", 60, "yacht", "balanced");
    rec.housing_status = "houseboat".into();
    let detail = ResponseDetail::from_record(&rec);

    let goal = detail.goal.iter().find(|r| r.label == "Goal type").unwrap();
    assert_eq!(goal.value, "yacht");
    let housing = detail
        .personal
        .iter()
        .find(|r| r.label == "Housing status")
        .unwrap();
    assert_eq!(housing.value, "houseboat");
}

#[test]
fn test_filter_example_pair() {
    let mut browser = ResponseBrowser::with_snapshot(vec![
        record(2, "a@x.com", 30, "travel", "growth"),
        record(1, "b@x.com", 40, "car", "balanced"),
    ]);

    let ids: Vec<i64> = browser.apply_filters("a@", "", "").iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2]);

    let ids: Vec<i64> = browser.apply_filters("", "car", "").iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1]);

    let ids: Vec<i64> = browser.apply_filters("", "", "").iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1]);
}
