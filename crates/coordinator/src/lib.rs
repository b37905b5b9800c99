//! Intent routing for Switchboard.
//!
//! The coordinator is the central piece that:
//! 1. Validates the caller's request
//! 2. Classifies it into exactly one intent
//! 3. Invokes the matching backend adapter
//! 4. Falls back to web search when document search finds nothing
//!
//! # Architecture
//!
//! ```text
//! User Request
//!      │
//!      ▼
//! ┌─────────────────┐
//! │  IntentRouter   │  ◄── Classifier (LLM or keyword)
//! │  (this crate)   │
//! └────────┬────────┘
//!          │ RoutePlan
//!    ┌─────┴──────────┬──────────────┐
//!    ▼                ▼              ▼
//! [Ticket]     [Document Search] ─► [Web Search]
//!                         (on miss)
//! ```

pub mod classifier;
pub mod config;
pub mod keyword;
pub mod router;
pub mod routing;

pub use classifier::{parse_intent_reply, Classifier, LlmClassifier};
pub use config::{ClassifierConfig, ClassifierMode, SearchConfig, SwitchboardConfig, TicketConfig};
pub use keyword::KeywordClassifier;
pub use router::IntentRouter;
pub use routing::RoutePlan;
