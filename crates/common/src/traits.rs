//! Core adapter trait.
//!
//! Defined in `switchboard-common` so that both the coordinator and the
//! agents crate can reference it without circular dependencies.

use crate::{AdapterResult, Backend, Request, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A component wrapping exactly one external service call.
///
/// Implementations convert every failure of their external call into a typed
/// `SwitchboardError` before returning; a semantic "nothing found" is a
/// successful result with `found: Some(false)`, not an error.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Which backend this adapter talks to.
    fn backend(&self) -> Backend;

    /// Invoke the external service once for this request.
    async fn invoke(&self, request: &Request) -> Result<AdapterResult>;
}

#[async_trait]
impl<T: Adapter + ?Sized> Adapter for Arc<T> {
    fn backend(&self) -> Backend {
        (**self).backend()
    }

    async fn invoke(&self, request: &Request) -> Result<AdapterResult> {
        (**self).invoke(request).await
    }
}
