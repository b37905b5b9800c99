//! Ticket agent - opens ServiceNow incidents.

use async_trait::async_trait;
use switchboard_common::{Adapter, AdapterResult, Backend, Request, Result};
use tracing::info;

use crate::servicenow::ServiceNowClient;
use crate::ticket_details::{TicketDetails, TicketDetailsInterpreter};

pub struct TicketAgent {
    client: ServiceNowClient,
    interpreter: Option<TicketDetailsInterpreter>,
}

impl TicketAgent {
    pub fn new(client: ServiceNowClient) -> Self {
        Self {
            client,
            interpreter: None,
        }
    }

    /// Derive incident fields with the reasoning service instead of keywords.
    pub fn with_interpreter(mut self, interpreter: TicketDetailsInterpreter) -> Self {
        self.interpreter = Some(interpreter);
        self
    }

    async fn details_for(&self, request: &Request) -> TicketDetails {
        match self.interpreter {
            Some(ref interpreter) => interpreter.interpret(&request.text).await,
            None => TicketDetails::from_request(&request.text),
        }
    }
}

#[async_trait]
impl Adapter for TicketAgent {
    fn backend(&self) -> Backend {
        Backend::Ticket
    }

    async fn invoke(&self, request: &Request) -> Result<AdapterResult> {
        let details = self.details_for(request).await;
        info!(
            request_id = %request.id,
            impact = %details.impact,
            urgency = %details.urgency,
            "Opening incident"
        );

        let incident = self.client.create_incident(&details).await?;

        Ok(AdapterResult::text(format!(
            "Created incident {} ({}) [ref {}]",
            incident.number, incident.url, incident.idempotency_tag
        )))
    }
}
