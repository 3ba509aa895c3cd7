//! Operation context.
//!
//! Carries the authenticated caller identity and request metadata into every
//! core operation. The identity arrives pre-validated from the gateway and is
//! always passed explicitly; nothing in the core reads it from ambient or
//! thread-local state.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// Per-request context threaded through service calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Account of the authenticated caller (gateway identity id).
    pub account_id: Uuid,

    /// Correlation ID for request tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
}

impl OperationContext {
    pub fn new(account_id: Uuid) -> Self {
        Self {
            account_id,
            correlation_id: None,
            client_ip: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Generate a new correlation ID if not present.
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let account_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let context = OperationContext::new(account_id).with_correlation_id(correlation_id);

        assert_eq!(context.account_id, account_id);
        assert_eq!(context.correlation_id, Some(correlation_id));
        assert!(context.client_ip.is_none());
    }

    #[test]
    fn test_ensure_correlation_id_is_stable() {
        let mut context = OperationContext::new(Uuid::new_v4());
        assert!(context.correlation_id.is_none());

        let id = context.ensure_correlation_id();
        assert_eq!(context.ensure_correlation_id(), id);
    }
}
