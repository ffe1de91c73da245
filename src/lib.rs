//! Contact Lead API Library
//!
//! Accepts website contact-form submissions, records them as leads (person,
//! company, opportunity) in Twenty CRM and notifies staff by email via Mailgun.
//!
//! # Modules
//!
//! - `api`: Router and HTTP handlers.
//! - `core`: Lead reconciliation, notification composition, phone normalization.
//! - `integrations`: Twenty GraphQL client and Mailgun client.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and the binary
pub mod config;
pub mod crm_client;
pub mod crm_models;
pub mod errors;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod notification;
pub mod phone;
pub mod reconciler;
