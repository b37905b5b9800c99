//! ServiceNow Table API client for incident creation.
//!
//! Creating an incident is a mutation: a request that times out may still
//! have been committed on the ServiceNow side. Calls are therefore made
//! exactly once and every failure is surfaced as
//! [`SwitchboardError::TicketCreation`]. The idempotency tag embedded in
//! the description lets operators spot duplicates from manual retries.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use switchboard_common::{redact_secrets, Result, SwitchboardError};
use tracing::{info, warn};

use crate::ticket_details::TicketDetails;

const MAX_SHORT_DESCRIPTION: usize = 200;
const IDEMPOTENCY_TAG_LEN: usize = 12;

#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceNowConfig {
    /// Instance name, as in `<instance>.service-now.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Overrides the URL derived from `instance`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Caller recorded on the incident (email or sys_id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_timeout_ms() -> u64 {
    15_000
}

impl Default for ServiceNowConfig {
    fn default() -> Self {
        Self {
            instance: None,
            user: None,
            password: None,
            base_url: None,
            timeout_ms: default_timeout_ms(),
            caller: None,
            assignment_group: None,
            category: None,
        }
    }
}

impl fmt::Debug for ServiceNowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceNowConfig")
            .field("instance", &self.instance)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("caller", &self.caller)
            .field("assignment_group", &self.assignment_group)
            .field("category", &self.category)
            .finish()
    }
}

impl ServiceNowConfig {
    /// Overlay `SN_INSTANCE`, `SN_USER` and `SN_PASS` when set.
    pub fn apply_env(&mut self) {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        if let Some(instance) = read("SN_INSTANCE") {
            self.instance = Some(instance);
        }
        if let Some(user) = read("SN_USER") {
            self.user = Some(user);
        }
        if let Some(password) = read("SN_PASS") {
            self.password = Some(password);
        }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint_base().is_some() && self.user.is_some() && self.password.is_some()
    }

    fn endpoint_base(&self) -> Option<String> {
        if let Some(ref url) = self.base_url {
            return Some(url.trim_end_matches('/').to_string());
        }
        self.instance
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .map(|i| format!("https://{i}.service-now.com"))
    }
}

/// A created incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub number: String,
    pub sys_id: String,
    pub url: String,
    pub idempotency_tag: String,
}

#[derive(Deserialize)]
struct TableResponse {
    result: IncidentRecord,
}

#[derive(Deserialize)]
struct IncidentRecord {
    number: String,
    sys_id: String,
}

/// First 12 hex chars of SHA-256 over `caller|short_description`.
pub fn idempotency_tag(caller: Option<&str>, short_description: &str) -> String {
    let base = format!(
        "{}|{}",
        caller.unwrap_or("unknown"),
        short_description.trim()
    );
    let digest = Sha256::digest(base.as_bytes());
    let mut tag = hex::encode(digest);
    tag.truncate(IDEMPOTENCY_TAG_LEN);
    tag
}

pub struct ServiceNowClient {
    config: ServiceNowConfig,
    http_client: reqwest::Client,
}

impl ServiceNowClient {
    pub fn new(config: ServiceNowConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                SwitchboardError::Config(format!("Failed to build ServiceNow HTTP client: {e}"))
            })?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ServiceNowConfig {
        &self.config
    }

    /// Build the incident payload and its idempotency tag.
    ///
    /// Both descriptions are redacted before they leave the process.
    pub fn build_payload(&self, details: &TicketDetails) -> (Value, String) {
        let short: String = redact_secrets(details.short_description.trim())
            .chars()
            .take(MAX_SHORT_DESCRIPTION)
            .collect();
        let description = redact_secrets(&details.description);
        let tag = idempotency_tag(self.config.caller.as_deref(), &short);

        let mut payload = json!({
            "short_description": short,
            "description": format!("{description}\n\n[idempotency:{tag}]"),
            "urgency": details.urgency.code(),
            "impact": details.impact.code(),
        });
        let optional = [
            ("caller_id", &self.config.caller),
            ("assignment_group", &self.config.assignment_group),
            ("category", &self.config.category),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                payload[key] = Value::String(value.clone());
            }
        }

        (payload, tag)
    }

    /// Create one incident. Never retried.
    pub async fn create_incident(&self, details: &TicketDetails) -> Result<Incident> {
        let (base, user, password) = match (
            self.config.endpoint_base(),
            self.config.user.as_deref(),
            self.config.password.as_deref(),
        ) {
            (Some(base), Some(user), Some(password)) => (base, user, password),
            _ => {
                return Err(SwitchboardError::TicketCreation(
                    "ServiceNow credentials missing (SN_INSTANCE, SN_USER, SN_PASS)".to_string(),
                ))
            }
        };

        let (payload, tag) = self.build_payload(details);
        info!(idempotency = %tag, "Creating ServiceNow incident");

        let response = self
            .http_client
            .post(format!("{base}/api/now/table/incident"))
            .basic_auth(user, Some(password))
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e, &tag))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, idempotency = %tag, "ServiceNow rejected incident");
            return Err(SwitchboardError::TicketCreation(status_message(status, &body)));
        }

        let record: TableResponse = response.json().await.map_err(|e| {
            SwitchboardError::TicketCreation(format!(
                "unexpected ServiceNow response (ref {tag}): {e}"
            ))
        })?;

        let url = format!(
            "{base}/nav_to.do?uri=incident.do?sys_id={}",
            record.result.sys_id
        );
        info!(number = %record.result.number, idempotency = %tag, "ServiceNow incident created");

        Ok(Incident {
            number: record.result.number,
            sys_id: record.result.sys_id,
            url,
            idempotency_tag: tag,
        })
    }

    fn transport_error(&self, e: reqwest::Error, tag: &str) -> SwitchboardError {
        if e.is_timeout() {
            SwitchboardError::TicketCreation(format!(
                "ServiceNow did not answer within {}ms; the incident may or may not exist (ref {tag})",
                self.config.timeout_ms
            ))
        } else {
            SwitchboardError::TicketCreation(format!("ServiceNow request failed: {e}"))
        }
    }
}

fn status_message(status: StatusCode, body: &str) -> String {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("ServiceNow authentication failed ({status})")
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            format!("ServiceNow validation failed ({status}): {body}")
        }
        _ => format!("ServiceNow API error {status}: {body}"),
    }
}
