//! HubSpot CRM v3 objects API client.

use crate::domain::model::{AssociationEdge, EntityType, FetchedPage, PageCursor, RawRecord};
use crate::domain::ports::RecordFetcher;
use crate::domain::schema::source_properties;
use crate::utils::error::{MigrationError, Result};
use crate::utils::validation::validate_source_url;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

#[derive(Debug, Clone)]
pub struct HubSpotOptions {
    pub page_size: u32,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for HubSpotOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ObjectPage {
    #[serde(default)]
    results: Vec<HubSpotObject>,
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    after: String,
}

#[derive(Debug, Deserialize)]
struct HubSpotObject {
    id: String,
    #[serde(default)]
    properties: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    associations: HashMap<String, AssociationList>,
}

#[derive(Debug, Deserialize)]
struct AssociationList {
    #[serde(default)]
    results: Vec<AssociatedObject>,
}

#[derive(Debug, Deserialize)]
struct AssociatedObject {
    id: String,
}

pub struct HubSpotFetcher {
    client: Client,
    base_url: String,
    token: SecretString,
    options: HubSpotOptions,
}

impl std::fmt::Debug for HubSpotFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubSpotFetcher")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("options", &self.options)
            .finish()
    }
}

impl HubSpotFetcher {
    pub fn new(base_url: &str, token: SecretString, options: HubSpotOptions) -> Result<Self> {
        validate_source_url("source.base_url", base_url)?;
        let client = Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            options,
        })
    }

    fn endpoint(&self, entity: EntityType) -> String {
        format!("{}/crm/v3/objects/{}", self.base_url, entity.plural())
    }

    fn query(&self, entity: EntityType, cursor: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("limit", self.options.page_size.to_string()),
            ("properties", source_properties(entity).join(",")),
        ];
        if entity != EntityType::Company {
            query.push(("associations", "companies".to_string()));
        }
        if let Some(after) = cursor {
            query.push(("after", after.to_string()));
        }
        query
    }

    async fn get_page(&self, entity: EntityType, cursor: Option<&str>) -> Result<ObjectPage> {
        let url = self.endpoint(entity);
        let query = self.query(entity, cursor);
        let mut attempt = 0;

        loop {
            tracing::debug!("📡 GET {} (after: {:?}, attempt {})", url, cursor, attempt + 1);
            let sent = self
                .client
                .get(&url)
                .bearer_auth(self.token.expose_secret())
                .query(&query)
                .send()
                .await;

            let retryable = match sent {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json::<ObjectPage>().await?);
                    }
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(MigrationError::AuthError {
                            status: status.as_u16(),
                        });
                    }
                    if status != StatusCode::TOO_MANY_REQUESTS && !status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(MigrationError::ProcessingError {
                            message: format!("HubSpot answered {}: {}", status, body),
                        });
                    }
                    MigrationError::ProcessingError {
                        message: format!("HubSpot answered {}", status),
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => MigrationError::ApiError(e),
                Err(e) => return Err(MigrationError::ApiError(e)),
            };

            if attempt >= self.options.retry_attempts {
                return Err(retryable);
            }
            attempt += 1;
            let delay = self.options.retry_delay * attempt;
            tracing::warn!(
                "⚠️ {} page request failed ({}), retry {}/{} in {:?}",
                entity.plural(),
                retryable,
                attempt,
                self.options.retry_attempts,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RecordFetcher for HubSpotFetcher {
    async fn fetch(&self, entity: EntityType, cursor: Option<&str>) -> Result<FetchedPage> {
        let page = self.get_page(entity, cursor).await?;
        Ok(convert_page(entity, page))
    }
}

fn convert_page(entity: EntityType, page: ObjectPage) -> FetchedPage {
    let mut records = Vec::with_capacity(page.results.len());
    let mut associations = Vec::new();

    for object in page.results {
        if let Some(companies) = object.associations.get("companies") {
            for company in &companies.results {
                match entity {
                    EntityType::Contact => associations
                        .push(AssociationEdge::company_to_contact(&company.id, &object.id)),
                    EntityType::Deal => {
                        associations.push(AssociationEdge::deal_to_company(&object.id, &company.id))
                    }
                    EntityType::Company => {}
                }
            }
        }

        let mut record = RawRecord::new(entity, object.id);
        for (name, value) in object.properties {
            // null 與空字串都視為沒有值
            let value = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            if !value.is_empty() {
                record.fields.insert(name, value);
            }
        }
        records.push(record);
    }

    let next = match page.paging.and_then(|p| p.next) {
        Some(next) => PageCursor::Next(next.after),
        None => PageCursor::Done,
    };

    FetchedPage {
        records,
        associations,
        next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn fetcher(server: &MockServer, retry_attempts: u32) -> HubSpotFetcher {
        let options = HubSpotOptions {
            retry_attempts,
            retry_delay: Duration::from_millis(1),
            ..HubSpotOptions::default()
        };
        HubSpotFetcher::new(
            &server.base_url(),
            SecretString::new("test-token".to_string()),
            options,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_contacts_page() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/crm/v3/objects/contacts")
                    .header("authorization", "Bearer test-token")
                    .query_param("limit", "100")
                    .query_param("associations", "companies")
                    .query_param(
                        "properties",
                        "firstname,lastname,email,phone,address,country,jobtitle",
                    );
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({
                        "results": [{
                            "id": "501",
                            "properties": {
                                "firstname": "Jane",
                                "lastname": "Doe",
                                "email": null,
                                "phone": ""
                            },
                            "associations": {
                                "companies": {
                                    "results": [
                                        {"id": "11", "type": "contact_to_company"},
                                        {"id": "11", "type": "contact_to_company_unlabeled"}
                                    ]
                                }
                            }
                        }],
                        "paging": {"next": {"after": "501", "link": "ignored"}}
                    }));
            })
            .await;

        let page = fetcher(&server, 0)
            .fetch(EntityType::Contact, None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.records.len(), 1);
        let record = &page.records[0];
        assert_eq!(record.id, "501");
        assert_eq!(record.field("firstname"), Some("Jane"));
        assert!(!record.fields.contains_key("email"));
        assert!(!record.fields.contains_key("phone"));
        assert_eq!(page.associations.len(), 2);
        assert_eq!(page.associations[0], AssociationEdge::company_to_contact("11", "501"));
        assert_eq!(page.next, PageCursor::Next("501".to_string()));
    }

    #[tokio::test]
    async fn test_last_page_has_no_cursor() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/crm/v3/objects/deals")
                    .query_param("after", "abc");
                then.status(200).json_body(json!({
                    "results": [{
                        "id": "9",
                        "properties": {"dealname": "Rollout", "amount": 1200},
                        "associations": {"companies": {"results": [{"id": "11"}]}}
                    }]
                }));
            })
            .await;

        let page = fetcher(&server, 0)
            .fetch(EntityType::Deal, Some("abc"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.next, PageCursor::Done);
        assert_eq!(page.records[0].field("amount"), Some("1200"));
        assert_eq!(page.associations, vec![AssociationEdge::deal_to_company("9", "11")]);
    }

    #[tokio::test]
    async fn test_companies_do_not_request_associations() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/crm/v3/objects/companies")
                    .query_param("properties", "name,domain,industry,address,country");
                then.status(200).json_body(json!({"results": []}));
            })
            .await;

        let page = fetcher(&server, 0)
            .fetch(EntityType::Company, None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(page.records.is_empty());
        assert_eq!(page.next, PageCursor::Done);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/crm/v3/objects/companies");
                then.status(503);
            })
            .await;

        let result = fetcher(&server, 2).fetch(EntityType::Company, None).await;

        assert!(result.is_err());
        mock.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/crm/v3/objects/deals");
                then.status(401);
            })
            .await;

        let err = fetcher(&server, 3)
            .fetch(EntityType::Deal, None)
            .await
            .unwrap_err();

        mock.assert_hits_async(1).await;
        assert!(matches!(err, MigrationError::AuthError { status: 401 }));
    }

    #[test]
    fn test_plain_http_requires_loopback() {
        let token = || SecretString::new("t".to_string());
        assert!(HubSpotFetcher::new("http://api.hubapi.com", token(), HubSpotOptions::default()).is_err());
        assert!(HubSpotFetcher::new("http://127.0.0.1:8080", token(), HubSpotOptions::default()).is_ok());
        assert!(HubSpotFetcher::new(DEFAULT_BASE_URL, token(), HubSpotOptions::default()).is_ok());
    }

    #[test]
    fn test_debug_hides_token() {
        let fetcher = HubSpotFetcher::new(
            DEFAULT_BASE_URL,
            SecretString::new("very-secret".to_string()),
            HubSpotOptions::default(),
        )
        .unwrap();
        let rendered = format!("{:?}", fetcher);
        assert!(!rendered.contains("very-secret"));
    }
}
