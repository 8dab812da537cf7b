use crate::errors::AppError;
use crate::handlers::AppState;
use crate::intake_form::{GoalAmountMode, IntakeForm, IntakeFormView};
use crate::models::IntakeRecord;
use crate::validation::{FieldValue, FormField};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One field change. A `null` or missing value clears the field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldUpdate {
    pub field: FormField,
    #[serde(default)]
    pub value: Option<FieldValue>,
}

/// Field updates: single object OR array of updates
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldUpdatePayload {
    Single(FieldUpdate),
    Batch(Vec<FieldUpdate>),
}

impl FieldUpdatePayload {
    pub fn into_updates(self) -> Vec<FieldUpdate> {
        match self {
            FieldUpdatePayload::Single(update) => vec![update],
            FieldUpdatePayload::Batch(updates) => updates,
        }
    }
}

/// Goal mode change. Without `mode` the current mode is toggled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalModeRequest {
    #[serde(default)]
    pub mode: Option<GoalAmountMode>,
}

#[derive(Debug, Serialize)]
pub struct IntakeSessionResponse {
    pub id: Uuid,
    pub form: IntakeFormView,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: Uuid,
    pub record: IntakeRecord,
    pub form: IntakeFormView,
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<Mutex<IntakeForm>>, AppError> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Intake session {} not found", id)))
}

fn session_response(id: Uuid, form: &IntakeForm) -> Json<IntakeSessionResponse> {
    Json(IntakeSessionResponse {
        id,
        form: form.view(),
    })
}

/// POST /api/v1/intake
///
/// Opens a new form session on the first step.
pub async fn create_intake(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<IntakeSessionResponse>) {
    let id = Uuid::new_v4();
    let form = IntakeForm::new();
    let response = session_response(id, &form);

    state.sessions.insert(id, Arc::new(Mutex::new(form))).await;
    tracing::info!("Opened intake session {}", id);

    (StatusCode::CREATED, response)
}

/// GET /api/v1/intake/:id
pub async fn get_intake(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<IntakeSessionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let form = session.lock().await;
    Ok(session_response(id, &form))
}

/// PUT /api/v1/intake/:id/fields
///
/// Applies field updates in order. Stops at the first rejected update;
/// earlier ones stay applied.
pub async fn update_fields(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FieldUpdatePayload>,
) -> Result<Json<IntakeSessionResponse>, AppError> {
    let updates = payload.into_updates();
    tracing::debug!("Applying {} field update(s) to session {}", updates.len(), id);

    let session = find_session(&state, id).await?;
    let mut form = session.lock().await;

    for update in updates {
        match update.value {
            Some(value) => form.set_field_value(update.field, value)?,
            None => form.clear_field_value(update.field)?,
        }
    }

    Ok(session_response(id, &form))
}

/// POST /api/v1/intake/:id/goal-mode
pub async fn set_goal_mode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<GoalModeRequest>,
) -> Result<Json<IntakeSessionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut form = session.lock().await;

    match request.mode {
        Some(mode) => form.set_goal_amount_mode(mode)?,
        None => {
            form.toggle_goal_amount_mode()?;
        }
    }

    Ok(session_response(id, &form))
}

/// POST /api/v1/intake/:id/next
///
/// Validates the current step. A failing step answers 422 with the
/// field errors and the form stays where it is.
pub async fn next_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<IntakeSessionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut form = session.lock().await;

    let step = form.go_to_next_step()?;
    tracing::debug!("Session {} now on step {}", id, step.title());

    Ok(session_response(id, &form))
}

/// POST /api/v1/intake/:id/previous
pub async fn previous_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<IntakeSessionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    let mut form = session.lock().await;

    form.go_to_previous_step()?;
    Ok(session_response(id, &form))
}

/// POST /api/v1/intake/:id/submit
///
/// The session lock is released while the store call is in flight; the
/// form is in its submitting phase then, so a concurrent submit gets a
/// 409 instead of a second insert. The store call and its completion run
/// on their own task, so a client that disconnects mid-submit cannot
/// leave the form stuck in the submitting phase.
pub async fn submit_intake(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let session = find_session(&state, id).await?;

    let record = session.lock().await.begin_submission()?;
    tracing::info!("Submitting intake session {}", id);

    let store = state.store.clone();
    let submission = tokio::spawn(async move {
        let result = store.insert(&record).await;

        let mut form = session.lock().await;
        let stored = form.complete_submission(result);
        (stored, form.view())
    });

    let (stored, form) = submission.await.map_err(|e| {
        tracing::error!("Submission task for session {} failed: {}", id, e);
        AppError::InternalError(format!("Submission task failed: {}", e))
    })?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id,
            record: stored?,
            form,
        }),
    ))
}
