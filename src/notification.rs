use crate::crm_models::OpportunityId;
use crate::models::{LeadOutcome, Submission};

/// Staff-facing email content for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Deep link into Twenty's opportunity view.
pub fn opportunity_link(crm_url: &str, opportunity_id: &OpportunityId) -> String {
    format!(
        "{}/objects/opportunities/{}",
        crm_url.trim_end_matches('/'),
        opportunity_id
    )
}

fn person_status(lead: Option<&LeadOutcome>) -> &'static str {
    match lead {
        Some(lead) if lead.is_new_person => "New contact",
        Some(_) => "Existing contact (returning lead)",
        None => "Not recorded in CRM",
    }
}

/// Builds the notification email.
///
/// `lead` is `None` when reconciliation failed or the CRM is not configured;
/// the CRM link appears only when both an opportunity and `crm_url` exist.
pub fn compose_notification(
    submission: &Submission,
    lead: Option<&LeadOutcome>,
    crm_url: Option<&str>,
) -> Notification {
    let subject = format!("🎯 New Lead: {}", submission.name);

    let crm_link = match (lead, crm_url) {
        (Some(lead), Some(url)) => format!(
            "\n\n📊 View in CRM: {}",
            opportunity_link(url, &lead.opportunity_id)
        ),
        _ => String::new(),
    };

    let body = format!(
        "New lead from the website contact form!

👤 Contact Information
━━━━━━━━━━━━━━━━━━━━
Name: {name}
Company: {company}
Email: {email}
Phone: {phone}
Service Interest: {service}
Status: {status}

💬 Message
━━━━━━━━━━━━━━━━━━━━
{message}
{crm_link}
",
        name = submission.name,
        company = submission.company.as_deref().unwrap_or_default(),
        email = submission.email,
        phone = submission.phone.as_deref().unwrap_or_default(),
        service = submission.service.as_deref().unwrap_or_default(),
        status = person_status(lead),
        message = submission.message,
        crm_link = crm_link,
    );

    Notification { subject, body }
}
