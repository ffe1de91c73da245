use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

use crate::config::Config;
use crate::crm_client::CrmClient;
use crate::errors::AppError;
use crate::mailer::MailgunService;
use crate::models::{ContactRequest, ContactResponse, LeadOutcome, Submission};
use crate::notification::compose_notification;
use crate::reconciler::reconcile_lead;

pub const SUCCESS_MESSAGE: &str =
    "Thank you for reaching out. We'll be in touch within 24 hours.";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Twenty client; `None` when the CRM is not configured.
    pub crm: Option<CrmClient>,
    /// Mailgun client; `None` when email is not configured.
    pub mailer: Option<MailgunService>,
}

impl AppState {
    /// Builds clients for every configured integration.
    ///
    /// A client that fails to build is logged and left out, same as an
    /// unconfigured one.
    pub fn from_config(config: Config) -> Self {
        let crm = config.crm.as_ref().and_then(|crm| {
            match CrmClient::new(&crm.api_url, crm.api_key.clone()) {
                Ok(client) => {
                    tracing::info!("✓ Twenty CRM client initialized: {}", crm.api_url);
                    Some(client)
                }
                Err(e) => {
                    tracing::error!("Failed to initialize Twenty client: {}", e);
                    None
                }
            }
        });

        let mailer = config
            .mail
            .as_ref()
            .and_then(|mail| match MailgunService::new(mail) {
                Ok(service) => {
                    tracing::info!("✓ Mailgun client initialized: {}", mail.domain);
                    Some(service)
                }
                Err(e) => {
                    tracing::error!("Failed to initialize Mailgun client: {}", e);
                    None
                }
            });

        Self {
            config,
            crm,
            mailer,
        }
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/contact
///
/// Flow:
/// 1. Validate the submission (name and email required).
/// 2. Record the lead in Twenty, if configured. Failures are logged only.
/// 3. Email staff, with a CRM link when a lead was recorded.
///
/// Only a failed email is reported back as an error.
///
/// The body is decoded as JSON whatever its `Content-Type`, so forms posting
/// `text/plain` to skip the CORS preflight are accepted.
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ContactResponse>, AppError> {
    let request: ContactRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejected contact payload: {}", e);
        AppError::Validation("Invalid request body".to_string())
    })?;
    let submission = Submission::try_from(request)?;

    tracing::info!("📨 Contact submission from {}", submission.email);

    let lead = record_lead(&state, &submission).await;

    let notification =
        compose_notification(&submission, lead.as_ref(), state.config.crm_public_url());

    let mailer = state
        .mailer
        .as_ref()
        .ok_or(AppError::ConfigMissing("mailgun"))?;
    mailer
        .send_notification(&state.config.contact_email, &submission.email, &notification)
        .await?;

    Ok(Json(ContactResponse::success(SUCCESS_MESSAGE)))
}

/// Runs reconciliation, absorbing every failure into `None`.
async fn record_lead(state: &AppState, submission: &Submission) -> Option<LeadOutcome> {
    let Some(crm) = state.crm.as_ref() else {
        tracing::warn!("⚠️  Twenty CRM configuration missing, skipping lead creation");
        return None;
    };

    match reconcile_lead(crm, submission, state.config.match_policy).await {
        Ok(lead) => {
            if lead.is_new_person {
                tracing::info!("✅ Created new Twenty lead for {}", submission.email);
            } else {
                tracing::info!(
                    "✅ Found existing person for {}, created new opportunity",
                    submission.email
                );
            }
            Some(lead)
        }
        Err(e) => {
            tracing::warn!("⚠️  Failed to create Twenty lead: {}", e);
            None
        }
    }
}
