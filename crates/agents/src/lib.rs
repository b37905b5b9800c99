//! Backend adapters behind the router.
//!
//! - **TicketAgent**: opens a ServiceNow incident (the only mutating backend)
//! - **DocumentSearchAgent**: answers from the internal document repository
//! - **WebSearchAgent**: answers from the public web
//!
//! The two search agents delegate to the reasoning service with a hosted
//! tool attached; the ticket agent talks to the ServiceNow Table API
//! directly.
//!
//! ```text
//!                 ┌──────────────┐
//!                 │    Router    │
//!                 └──────┬───────┘
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//!  ┌───────────┐  ┌─────────────┐  ┌────────────┐
//!  │  Ticket   │  │  Document   │  │    Web     │
//!  │   Agent   │  │   Search    │  │   Search   │
//!  └─────┬─────┘  └──────┬──────┘  └─────┬──────┘
//!        ▼               └───────┬───────┘
//!   ServiceNow            LlmClient + hosted tool
//! ```

pub mod file_search;
pub mod servicenow;
pub mod ticket;
pub mod ticket_details;
pub mod web_search;

pub use file_search::{DocumentSearchAgent, DEFAULT_MAX_RESULTS, DEFAULT_VECTOR_STORE_ID};
pub use servicenow::{idempotency_tag, Incident, ServiceNowClient, ServiceNowConfig};
pub use ticket::TicketAgent;
pub use ticket_details::{extract_json_object, Level, TicketDetails, TicketDetailsInterpreter};
pub use web_search::WebSearchAgent;
