use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============ Opaque identifiers ============

macro_rules! opaque_id {
    ($name:ident, $what:literal) => {
        #[doc = concat!("Opaque Twenty identifier of a ", $what, ". Never parsed or built locally.")]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an id returned by Twenty (or a fixture in tests).
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(CompanyId, "company");
opaque_id!(PersonId, "person");
opaque_id!(OpportunityId, "opportunity");

// ============ GraphQL envelope ============

/// Body POSTed to `/graphql`.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub variables: Value,
}

/// Two-shaped GraphQL response: `data` is decoded per operation by the caller.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    /// Servers may send `"errors": null`; treated the same as no errors.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<GraphQlError>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

// ============ Query results ============

/// Relay-style connection as returned by Twenty list queries.
#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Connection<T> {
    /// Nodes in the CRM's natural return order.
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|edge| edge.node).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyNode {
    pub id: CompanyId,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonNode {
    pub id: PersonId,
    #[serde(default)]
    pub emails: Option<PersonEmails>,
}

impl PersonNode {
    pub fn primary_email(&self) -> &str {
        self.emails
            .as_ref()
            .and_then(|e| e.primary_email.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEmails {
    #[serde(default)]
    pub primary_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FindCompaniesData {
    pub companies: Connection<CompanyNode>,
}

#[derive(Debug, Deserialize)]
pub struct FindPeopleData {
    pub people: Connection<PersonNode>,
}

/// `{ id }` selection returned by every create mutation.
#[derive(Debug, Deserialize)]
pub struct CreatedRecord<Id> {
    pub id: Id,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyData {
    pub create_company: CreatedRecord<CompanyId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonData {
    pub create_person: CreatedRecord<PersonId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOpportunityData {
    pub create_opportunity: CreatedRecord<OpportunityId>,
}

// ============ Mutation inputs ============

/// `PersonCreateInput`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson<'a> {
    pub name: FullName<'a>,
    pub emails: EmailsInput<'a>,
    /// Omitted entirely when the phone could not be normalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phones: Option<PhonesInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<&'a CompanyId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullName<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailsInput<'a> {
    pub primary_email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonesInput {
    pub primary_phone_number: String,
}

/// Pipeline stage of a freshly created opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityStage {
    New,
}

/// `OpportunityCreateInput`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOpportunity<'a> {
    pub name: String,
    pub stage: OpportunityStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_of_contact_id: Option<&'a PersonId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<&'a CompanyId>,
}
