use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::csv_import::{self, ImportPreview, ImportSummary};
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::{ApiError, PersistenceError, ValidationError};
use crate::models::{Contact, ContactQuery, NewContact};
use crate::phone;
use crate::store::ContactStore;
use crate::template::validate_message;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct ContactView {
    #[serde(flatten)]
    pub contact: Contact,
    pub phone_display: String,
}

impl From<Contact> for ContactView {
    fn from(contact: Contact) -> Self {
        let phone_display = phone::format_display(&contact.phone);
        Self {
            contact,
            phone_display,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveMessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub token: String,
    /// No message saved yet, `message` is the built-in default.
    pub is_fallback: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub template: String,
    pub preview: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route("/api/contacts/import", post(import_contacts))
        .route("/api/contacts/import/preview", post(preview_import))
        .route("/api/contacts/:id", get(get_contact))
        .route("/api/contacts/:id/dispatch", post(dispatch_contact))
        .route("/send/:id", get(send_contact))
        .route("/api/message", get(get_message).put(save_message))
        .route("/api/message/preview", post(preview_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<ContactQuery>,
) -> Result<Json<Vec<ContactView>>, ApiError> {
    let contacts = state.store.list_contacts(&params).await?;
    Ok(Json(contacts.into_iter().map(ContactView::from).collect()))
}

async fn create_contact(
    State(state): State<AppState>,
    Json(payload): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactView>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField("name").into());
    }
    if payload.phone.trim().is_empty() {
        return Err(ValidationError::MissingField("phone").into());
    }
    let phone = phone::normalize_strict(&payload.phone)?;

    let mut inserted = state
        .store
        .insert_contacts(&[NewContact {
            name: name.to_string(),
            phone,
        }])
        .await?;
    let contact = inserted
        .pop()
        .ok_or_else(|| PersistenceError::Corrupt("insert returned no rows".to_string()))?;

    tracing::info!(contact_id = %contact.id, "created contact");
    Ok((StatusCode::CREATED, Json(contact.into())))
}

async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactView>, ApiError> {
    Ok(Json(load_contact(&state, id).await?.into()))
}

async fn load_contact(state: &AppState, id: Uuid) -> Result<Contact, ApiError> {
    state
        .store
        .get_contact(id)
        .await?
        .ok_or_else(|| PersistenceError::NotFound(id).into())
}

async fn preview_import(body: Bytes) -> Result<Json<ImportPreview>, ApiError> {
    Ok(Json(csv_import::preview(&body)?))
}

async fn import_contacts(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ImportSummary>), ApiError> {
    let summary = csv_import::commit(state.store.as_ref(), &body).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn dispatch_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DispatchReport>, ApiError> {
    let contact = load_contact(&state, id).await?;
    let report = state.dispatcher.dispatch(state.store.as_ref(), &contact).await;
    Ok(Json(report))
}

/// Dispatch and send the browser straight to WhatsApp.
async fn send_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let contact = load_contact(&state, id).await?;
    let report = state.dispatcher.dispatch(state.store.as_ref(), &contact).await;
    match report.link {
        Some(link) => Ok(Redirect::to(link.as_str())),
        None => Err(ApiError::Dispatch(report.error.unwrap_or_default())),
    }
}

async fn get_message(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    let engine = state.dispatcher.engine();
    let response = match state.store.default_message().await? {
        Some(saved) => MessageResponse {
            message: saved.message,
            token: engine.token().to_string(),
            is_fallback: false,
            updated_at: Some(saved.updated_at),
        },
        None => MessageResponse {
            message: engine.fallback(),
            token: engine.token().to_string(),
            is_fallback: true,
            updated_at: None,
        },
    };
    Ok(Json(response))
}

async fn save_message(
    State(state): State<AppState>,
    Json(payload): Json<SaveMessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = validate_message(&payload.message)?;
    let saved = state.store.upsert_default_message(&message).await?;
    tracing::info!(len = saved.message.len(), "saved default message");
    Ok(Json(MessageResponse {
        message: saved.message,
        token: state.dispatcher.engine().token().to_string(),
        is_fallback: false,
        updated_at: Some(saved.updated_at),
    }))
}

async fn preview_message(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let engine = state.dispatcher.engine();
    // A request without a JSON body previews the stored template.
    let requested = match payload {
        Ok(Json(p)) => p.message,
        Err(JsonRejection::MissingJsonContentType(_)) => None,
        Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
    };
    let template = match requested {
        Some(message) => message,
        None => state
            .store
            .default_message()
            .await?
            .map(|m| m.message)
            .unwrap_or_else(|| engine.fallback()),
    };
    let preview = engine.preview(&template);
    Ok(Json(PreviewResponse { template, preview }))
}
