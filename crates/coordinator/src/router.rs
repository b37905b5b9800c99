//! The router: classify, dispatch, apply the document-to-web fallback.

use std::sync::Arc;

use switchboard_agents::{
    DocumentSearchAgent, ServiceNowClient, TicketAgent, TicketDetailsInterpreter, WebSearchAgent,
};
use switchboard_common::{
    Adapter, AdapterResult, Backend, Request, ResponseSection, Result, RoutedResponse,
};
use switchboard_llm::build_llm_client;
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, LlmClassifier};
use crate::config::{ClassifierMode, SwitchboardConfig};
use crate::keyword::KeywordClassifier;
use crate::routing::RoutePlan;

/// Routes each request to exactly one backend, plus the web fallback when
/// document search comes back empty.
///
/// Holds no per-request state, so one router can serve concurrent requests.
pub struct IntentRouter {
    classifier: Arc<dyn Classifier>,
    ticket: Arc<dyn Adapter>,
    document_search: Arc<dyn Adapter>,
    web_search: Arc<dyn Adapter>,
}

impl IntentRouter {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        ticket: Arc<dyn Adapter>,
        document_search: Arc<dyn Adapter>,
        web_search: Arc<dyn Adapter>,
    ) -> Self {
        Self {
            classifier,
            ticket,
            document_search,
            web_search,
        }
    }

    /// Wire the real classifier and adapters from configuration.
    pub fn from_config(config: &SwitchboardConfig) -> Result<Self> {
        let llm = build_llm_client(&config.provider)?;
        info!(
            provider = %config.provider.provider,
            model = %llm.model_name(),
            classifier = ?config.classifier.mode,
            "Initializing router"
        );

        let classifier: Arc<dyn Classifier> = match config.classifier.mode {
            ClassifierMode::Llm => Arc::new(LlmClassifier::new(llm.clone())),
            ClassifierMode::Keyword => Arc::new(KeywordClassifier::new()),
        };

        if !config.servicenow.is_configured() {
            warn!("ServiceNow credentials not configured; ticket requests will fail");
        }
        let mut ticket = TicketAgent::new(ServiceNowClient::new(config.servicenow.clone())?);
        if config.ticket.interpret_details {
            ticket = ticket.with_interpreter(TicketDetailsInterpreter::new(llm.clone()));
        }

        let document_search =
            DocumentSearchAgent::new(llm.clone(), config.search.vector_store_ids.clone())
                .with_max_results(config.search.max_num_results);
        let web_search = WebSearchAgent::new(llm);

        Ok(Self::new(
            classifier,
            Arc::new(ticket),
            Arc::new(document_search),
            Arc::new(web_search),
        ))
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Classify `text` and run its route plan.
    ///
    /// Adapter errors propagate unchanged; only a document-search miss
    /// leads to a second backend call.
    pub async fn route(&self, text: &str) -> Result<RoutedResponse> {
        let request = Request::new(text)?;
        info!(request_id = %request.id, preview = %request.preview(), "Routing request");

        let intent = self.classifier.classify(&request).await?;
        let plan = RoutePlan::for_intent(intent);
        info!(request_id = %request.id, intent = %intent, backend = %plan.primary, "Intent classified");

        let primary = self.invoke(plan.primary, &request).await?;
        let fallback = plan.fallback_after(&primary);

        let mut sections = vec![ResponseSection {
            backend: plan.primary,
            text: primary.text,
        }];

        if let Some(backend) = fallback {
            info!(request_id = %request.id, fallback = %backend, "No document match, falling back");
            let secondary = self.invoke(backend, &request).await?;
            sections.push(ResponseSection {
                backend,
                text: secondary.text,
            });
        }

        Ok(RoutedResponse {
            request_id: request.id,
            intent,
            sections,
            fallback_used: fallback.is_some(),
        })
    }

    async fn invoke(&self, backend: Backend, request: &Request) -> Result<AdapterResult> {
        debug!(request_id = %request.id, backend = %backend, "Invoking backend");
        let result = self.adapter(backend).invoke(request).await;
        if let Err(ref e) = result {
            warn!(request_id = %request.id, backend = %backend, error = %e, "Backend failed");
        }
        result
    }

    fn adapter(&self, backend: Backend) -> &dyn Adapter {
        match backend {
            Backend::Ticket => self.ticket.as_ref(),
            Backend::DocumentSearch => self.document_search.as_ref(),
            Backend::WebSearch => self.web_search.as_ref(),
        }
    }
}
