use serde::{Deserialize, Serialize};

use crate::crm_models::{CompanyId, OpportunityId, PersonId};
use crate::errors::AppError;

// ============ API Request/Response Models ============

/// Raw contact form payload as posted by the website.
///
/// Every field is optional on the wire; `Submission::try_from` enforces what
/// is actually required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Service-interest tag picked on the form.
    #[serde(default)]
    pub service: Option<String>,
}

/// Response payload for the contact endpoint.
///
/// Binary by design of the form: CRM state is never revealed to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResponse {
    /// Whether the message reached staff.
    pub success: bool,
    /// Human-readable result.
    pub message: String,
}

impl ContactResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// ============ Validated submission ============

/// A validated, trimmed contact form submission.
///
/// Lives for one request only. `name` and `email` are never empty; empty
/// optional fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub service: Option<String>,
}

/// Trims a form field, mapping blank values to `None`.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<ContactRequest> for Submission {
    type Error = AppError;

    fn try_from(req: ContactRequest) -> Result<Self, Self::Error> {
        let (Some(name), Some(email)) = (non_blank(req.name), non_blank(req.email)) else {
            return Err(AppError::Validation(
                "Name and email are required".to_string(),
            ));
        };

        Ok(Self {
            name,
            email,
            company: non_blank(req.company),
            phone: non_blank(req.phone),
            message: non_blank(req.message).unwrap_or_default(),
            service: non_blank(req.service),
        })
    }
}

// ============ Reconciliation result ============

/// Records touched in Twenty for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadOutcome {
    /// Present only if a company name was given and matched or created.
    pub company_id: Option<CompanyId>,
    pub person_id: PersonId,
    pub opportunity_id: OpportunityId,
    /// `false` when an existing person was matched and reused.
    pub is_new_person: bool,
}
