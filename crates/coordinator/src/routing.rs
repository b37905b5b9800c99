//! Intent to backend dispatch table.

use serde::{Deserialize, Serialize};
use switchboard_common::{AdapterResult, Backend, Intent};

/// Which backends serve an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub intent: Intent,
    pub primary: Backend,

    /// Invoked only when the primary reports no match
    pub fallback: Option<Backend>,
}

impl RoutePlan {
    pub fn for_intent(intent: Intent) -> Self {
        let (primary, fallback) = match intent {
            Intent::Ticket => (Backend::Ticket, None),
            Intent::DocumentSearch => (Backend::DocumentSearch, Some(Backend::WebSearch)),
            Intent::WebSearch => (Backend::WebSearch, None),
        };
        Self {
            intent,
            primary,
            fallback,
        }
    }

    /// The fallback to run after `primary_result`, if any.
    pub fn fallback_after(&self, primary_result: &AdapterResult) -> Option<Backend> {
        if primary_result.is_found() {
            None
        } else {
            self.fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_document_search_has_fallback() {
        assert_eq!(RoutePlan::for_intent(Intent::Ticket).fallback, None);
        assert_eq!(RoutePlan::for_intent(Intent::WebSearch).fallback, None);
        assert_eq!(
            RoutePlan::for_intent(Intent::DocumentSearch).fallback,
            Some(Backend::WebSearch)
        );
    }

    #[test]
    fn fallback_runs_only_on_miss() {
        let plan = RoutePlan::for_intent(Intent::DocumentSearch);
        assert_eq!(plan.fallback_after(&AdapterResult::found("answer")), None);
        assert_eq!(
            plan.fallback_after(&AdapterResult::not_found()),
            Some(Backend::WebSearch)
        );
    }

    #[test]
    fn text_results_never_trigger_fallback_for_direct_routes() {
        let plan = RoutePlan::for_intent(Intent::Ticket);
        assert_eq!(plan.fallback_after(&AdapterResult::text("Created")), None);
    }
}
