use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ContactResponse;

/// Message returned to the submitter whenever the notification could not go out.
pub const SEND_FAILURE_MESSAGE: &str = "Failed to send message. Please try again later.";

/// Errors surfaced by the Twenty GraphQL client.
///
/// Every variant is one outbound call that went wrong; the client never retries.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// Connection failure or timeout.
    #[error("CRM request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// Non-success HTTP status; body kept for diagnostics.
    #[error("CRM returned {status}: {body}")]
    Status {
        /// HTTP status returned by Twenty.
        status: reqwest::StatusCode,
        /// Raw response body.
        body: String,
    },
    /// Application-level error from the `errors` array (first message only).
    #[error("CRM GraphQL error: {0}")]
    GraphQl(String),
    /// Response body did not match the expected shape.
    #[error("failed to decode CRM response: {0}")]
    Decode(String),
}

/// Errors surfaced by the Mailgun client.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Connection failure or timeout.
    #[error("mail request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// Non-success HTTP status from the provider.
    #[error("mail provider returned {status}: {body}")]
    Status {
        /// HTTP status returned by the provider.
        status: reqwest::StatusCode,
        /// Raw response body.
        body: String,
    },
}

/// Fatal outcomes of lead reconciliation.
///
/// Company failures never show up here: they are absorbed and the lead is
/// recorded without a company.
#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    /// No existing person matched and creating one failed.
    #[error("failed to find/create person: {0}")]
    PersonCreate(#[source] CrmError),
    /// Person resolved but the opportunity could not be created.
    #[error("failed to create opportunity: {0}")]
    OpportunityCreate(#[source] CrmError),
}

/// Invalid values found while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a valid number between 1-65535, got '{0}'")]
    InvalidPort(String),
    #[error("{var} must be an http:// or https:// URL, got '{value}'")]
    InvalidUrl { var: &'static str, value: String },
    #[error("CRM_MATCH_POLICY must be 'first' or 'exact-first', got '{0}'")]
    InvalidMatchPolicy(String),
}

/// Errors returned from the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Submission rejected before any external call.
    #[error("validation failed: {0}")]
    Validation(String),
    /// A required integration is not configured.
    #[error("{0} configuration missing")]
    ConfigMissing(&'static str),
    /// The staff notification could not be delivered.
    #[error("failed to send notification: {0}")]
    Mail(#[from] MailError),
}

impl IntoResponse for AppError {
    /// Maps the error to a `{success: false, message}` body.
    ///
    /// Only validation problems are described to the caller; everything else
    /// collapses into a generic retry message and is logged server-side.
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ConfigMissing(what) => {
                tracing::error!("Failed to send email: {} configuration missing", what);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SEND_FAILURE_MESSAGE.to_string(),
                )
            }
            AppError::Mail(e) => {
                tracing::error!("Failed to send email: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SEND_FAILURE_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ContactResponse::failure(message))).into_response()
    }
}
