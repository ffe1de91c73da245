//! Lead reconciliation against Twenty.
//!
//! Matches a submission to existing CRM records or creates new ones, then
//! always opens a fresh opportunity. Steps run sequentially because each one
//! needs the ids produced by the previous one.

use std::str::FromStr;

use crate::crm_client::CrmClient;
use crate::crm_models::{
    CompanyId, EmailsInput, FullName, NewOpportunity, NewPerson, OpportunityStage, PersonId,
    PhonesInput,
};
use crate::errors::{ConfigError, LeadError};
use crate::models::{LeadOutcome, Submission};
use crate::phone::normalize_phone;

/// Opportunity suffix used when the submitter picked no service.
pub const DEFAULT_OPPORTUNITY_SUFFIX: &str = "Website Inquiry";

/// How to choose among several search hits.
///
/// Searches are substring matches, so "Acme" also finds "Acme Rockets Ltd".
/// Neither policy removes that looseness; `ExactFirst` only prefers an exact
/// (case-insensitive) hit when one is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// First hit in the CRM's natural return order.
    #[default]
    FirstResult,
    /// Exact case-insensitive match if any, otherwise the first hit.
    ExactFirst,
}

impl MatchPolicy {
    /// Picks the candidate to reuse, if any.
    pub fn pick<'c, T>(
        self,
        candidates: &'c [T],
        wanted: &str,
        key: impl Fn(&T) -> &str,
    ) -> Option<&'c T> {
        match self {
            MatchPolicy::FirstResult => candidates.first(),
            MatchPolicy::ExactFirst => {
                let wanted = wanted.to_lowercase();
                candidates
                    .iter()
                    .find(|candidate| key(*candidate).to_lowercase() == wanted)
                    .or_else(|| candidates.first())
            }
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "first-result" => Ok(MatchPolicy::FirstResult),
            "exact-first" | "exact" => Ok(MatchPolicy::ExactFirst),
            _ => Err(ConfigError::InvalidMatchPolicy(s.to_string())),
        }
    }
}

/// Splits a full name into (first, last).
///
/// The first whitespace-delimited token is the first name; everything after
/// it is the last name, which is empty for single-token names.
pub fn split_name(full_name: &str) -> (&str, &str) {
    let trimmed = full_name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (trimmed, ""),
    }
}

/// `"<name> - <service>"`, or `"<name> - Website Inquiry"` without a service.
pub fn opportunity_name(name: &str, service: Option<&str>) -> String {
    let suffix = service
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_OPPORTUNITY_SUFFIX);
    format!("{} - {}", name, suffix)
}

/// Records a submission as a lead: company (optional), person, opportunity.
///
/// Failure policy:
/// - company lookup/create failure is absorbed; the lead continues without a company
/// - person create failure (when nothing matched) is fatal
/// - opportunity create failure is fatal
///
/// A failed search is treated like an empty one (falls through to create) but
/// logged at `warn` so CRM outages stay visible.
#[tracing::instrument(skip_all, fields(email = %submission.email))]
pub async fn reconcile_lead(
    crm: &CrmClient,
    submission: &Submission,
    policy: MatchPolicy,
) -> Result<LeadOutcome, LeadError> {
    // Step 1: company (optional, non-fatal)
    let company_id = match submission.company.as_deref() {
        Some(company) => resolve_company(crm, company, policy).await,
        None => None,
    };

    // Step 2: person (fatal if it cannot be found or created)
    let (person_id, is_new_person) =
        resolve_person(crm, submission, company_id.as_ref(), policy).await?;

    // Step 3: opportunity (always created, fatal on failure)
    let opportunity = NewOpportunity {
        name: opportunity_name(&submission.name, submission.service.as_deref()),
        stage: OpportunityStage::New,
        point_of_contact_id: Some(&person_id),
        company_id: company_id.as_ref(),
    };
    let opportunity_id = crm
        .create_opportunity(&opportunity)
        .await
        .map_err(LeadError::OpportunityCreate)?;

    Ok(LeadOutcome {
        company_id,
        person_id,
        opportunity_id,
        is_new_person,
    })
}

/// Finds or creates the company. Never fails: `None` means "no company link".
async fn resolve_company(crm: &CrmClient, name: &str, policy: MatchPolicy) -> Option<CompanyId> {
    match crm.find_companies_by_name(name).await {
        Ok(candidates) => {
            if let Some(found) = policy.pick(&candidates, name, |c| {
                c.name.as_deref().unwrap_or_default()
            }) {
                tracing::info!(
                    "Reusing company {} for '{}' ({} candidate(s))",
                    found.id,
                    name,
                    candidates.len()
                );
                return Some(found.id.clone());
            }
            tracing::info!("No company matching '{}', creating one", name);
        }
        Err(e) => {
            tracing::warn!("⚠️  Company search failed for '{}', creating instead: {}", name, e);
        }
    }

    match crm.create_company(name).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!("⚠️  Failed to find/create company '{}': {}", name, e);
            None
        }
    }
}

/// Finds the person by email or creates one. Returns (id, newly created).
async fn resolve_person(
    crm: &CrmClient,
    submission: &Submission,
    company_id: Option<&CompanyId>,
    policy: MatchPolicy,
) -> Result<(PersonId, bool), LeadError> {
    let email = submission.email.as_str();

    match crm.find_people_by_email(email).await {
        Ok(candidates) => {
            if let Some(found) = policy.pick(&candidates, email, |p| p.primary_email()) {
                tracing::info!("Found existing person {} for {}", found.id, email);
                return Ok((found.id.clone(), false));
            }
            tracing::info!("No person matching {}, creating one", email);
        }
        Err(e) => {
            tracing::warn!("⚠️  Person search failed for {}, creating instead: {}", email, e);
        }
    }

    let (first_name, last_name) = split_name(&submission.name);
    let phone = submission.phone.as_deref().and_then(normalize_phone);
    if phone.is_none() && submission.phone.is_some() {
        tracing::debug!("Phone omitted from person: could not normalize");
    }

    let person = NewPerson {
        name: FullName {
            first_name,
            last_name,
        },
        emails: EmailsInput {
            primary_email: email,
        },
        phones: phone.map(|primary_phone_number| PhonesInput {
            primary_phone_number,
        }),
        company_id,
    };

    let id = crm
        .create_person(&person)
        .await
        .map_err(LeadError::PersonCreate)?;
    Ok((id, true))
}
