use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

use crate::crm_models::{
    CompanyId, CompanyNode, CreateCompanyData, CreateOpportunityData, CreatePersonData,
    FindCompaniesData, FindPeopleData, GraphQlRequest, GraphQlResponse, NewOpportunity,
    NewPerson, OpportunityId, PersonId, PersonNode,
};
use crate::errors::CrmError;

/// Hard timeout applied to every CRM call.
pub const CRM_TIMEOUT: Duration = Duration::from_secs(30);

const FIND_COMPANY_QUERY: &str = r#"
    query FindCompany($filter: CompanyFilterInput) {
        companies(filter: $filter) {
            edges { node { id name } }
        }
    }
"#;

const CREATE_COMPANY_MUTATION: &str = r#"
    mutation CreateCompany($input: CompanyCreateInput!) {
        createCompany(data: $input) { id }
    }
"#;

const FIND_PERSON_QUERY: &str = r#"
    query FindPerson($filter: PersonFilterInput) {
        people(filter: $filter) {
            edges { node { id emails { primaryEmail } } }
        }
    }
"#;

const CREATE_PERSON_MUTATION: &str = r#"
    mutation CreatePerson($input: PersonCreateInput!) {
        createPerson(data: $input) { id }
    }
"#;

const CREATE_OPPORTUNITY_MUTATION: &str = r#"
    mutation CreateOpportunity($input: OpportunityCreateInput!) {
        createOpportunity(data: $input) { id }
    }
"#;

/// Client for the Twenty CRM GraphQL API.
///
/// One `execute` is exactly one POST to `{base_url}/graphql`; nothing is
/// retried or cached.
#[derive(Clone)]
pub struct CrmClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl CrmClient {
    /// Creates a new `CrmClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Twenty base URL, without the `/graphql` suffix.
    /// * `token` - API key sent as a bearer token.
    pub fn new(base_url: &str, token: String) -> Result<Self, CrmError> {
        let client = reqwest::Client::builder()
            .timeout(CRM_TIMEOUT)
            .build()
            .map_err(CrmError::Transport)?;

        Ok(Self {
            client,
            endpoint: format!("{}/graphql", base_url.trim_end_matches('/')),
            token,
        })
    }

    /// Executes a GraphQL operation and decodes its `data` payload into `T`.
    ///
    /// # Returns
    ///
    /// * `Result<T, CrmError>` - The decoded payload, or the first failure among
    ///   transport, HTTP status, GraphQL `errors`, and decoding.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, CrmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(CrmError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(CrmError::Transport)?;

        if !status.is_success() {
            return Err(CrmError::Status { status, body });
        }

        let envelope: GraphQlResponse =
            serde_json::from_str(&body).map_err(|e| CrmError::Decode(e.to_string()))?;

        if let Some(first) = envelope.errors.into_iter().next() {
            return Err(CrmError::GraphQl(first.message));
        }

        let data = envelope
            .data
            .ok_or_else(|| CrmError::Decode("response has no data".to_string()))?;

        serde_json::from_value(data).map_err(|e| CrmError::Decode(e.to_string()))
    }

    /// Companies whose name contains `name` (case-insensitive), in CRM order.
    pub async fn find_companies_by_name(&self, name: &str) -> Result<Vec<CompanyNode>, CrmError> {
        let variables = json!({
            "filter": { "name": { "ilike": format!("%{}%", name) } }
        });

        let data: FindCompaniesData = self.execute(FIND_COMPANY_QUERY, variables).await?;
        Ok(data.companies.into_nodes())
    }

    /// Creates a company named `name` and returns its new id.
    pub async fn create_company(&self, name: &str) -> Result<CompanyId, CrmError> {
        let variables = json!({ "input": { "name": name } });

        let data: CreateCompanyData = self.execute(CREATE_COMPANY_MUTATION, variables).await?;
        tracing::info!("✓ Company created in Twenty: {}", data.create_company.id);
        Ok(data.create_company.id)
    }

    /// People whose primary email contains `email` (case-insensitive), in CRM order.
    pub async fn find_people_by_email(&self, email: &str) -> Result<Vec<PersonNode>, CrmError> {
        let variables = json!({
            "filter": {
                "emails": { "primaryEmail": { "ilike": format!("%{}%", email) } }
            }
        });

        let data: FindPeopleData = self.execute(FIND_PERSON_QUERY, variables).await?;
        Ok(data.people.into_nodes())
    }

    /// Creates a person, linked to a company when `person.company_id` is set.
    pub async fn create_person(&self, person: &NewPerson<'_>) -> Result<PersonId, CrmError> {
        let variables = json!({ "input": person });

        let data: CreatePersonData = self.execute(CREATE_PERSON_MUTATION, variables).await?;
        tracing::info!("✓ Person created in Twenty: {}", data.create_person.id);
        Ok(data.create_person.id)
    }

    /// Creates an opportunity in stage `NEW` pointing at the person (and company).
    pub async fn create_opportunity(
        &self,
        opportunity: &NewOpportunity<'_>,
    ) -> Result<OpportunityId, CrmError> {
        let variables = json!({ "input": opportunity });

        let data: CreateOpportunityData =
            self.execute(CREATE_OPPORTUNITY_MUTATION, variables).await?;
        tracing::info!(
            "✓ Opportunity created in Twenty: {} ({})",
            data.create_opportunity.id,
            opportunity.name
        );
        Ok(data.create_opportunity.id)
    }
}
