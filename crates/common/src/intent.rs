//! Intent and backend identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The classification label deciding which backend handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Create a ticket in the external ticketing system
    Ticket,
    /// Search the internal knowledge repository
    DocumentSearch,
    /// Search the public web
    WebSearch,
}

impl Intent {
    /// Order in which reply markers are checked by the classifier.
    pub const PRIORITY: [Intent; 3] = [Intent::Ticket, Intent::DocumentSearch, Intent::WebSearch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Ticket => "TICKET",
            Intent::DocumentSearch => "DOCUMENT_SEARCH",
            Intent::WebSearch => "WEB_SEARCH",
        }
    }

    /// Substring markers that select this intent in a classifier reply.
    pub fn markers(&self) -> &'static [&'static str] {
        match self {
            Intent::Ticket => &["TICKET"],
            Intent::DocumentSearch => &["DOCUMENT_SEARCH", "FILE_SEARCH"],
            Intent::WebSearch => &["WEB_SEARCH"],
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the external services an adapter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Ticket,
    DocumentSearch,
    WebSearch,
}

impl Backend {
    /// Fixed prefix identifying which backend produced a response section.
    pub fn source_label(&self) -> &'static str {
        match self {
            Backend::Ticket => "Ticket: ",
            Backend::DocumentSearch => "Document Search: ",
            Backend::WebSearch => "Web Search: ",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Ticket => "ticket",
            Backend::DocumentSearch => "document_search",
            Backend::WebSearch => "web_search",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
