use std::sync::Arc;

use crate::dtd::DtdManager;
use crate::middleware::observability::Metrics;

pub mod graphql;
pub mod rest;

/// Everything a request handler needs, cheap to clone per connection.
#[derive(Clone)]
pub struct GatewayState {
    pub manager: Arc<dyn DtdManager>,
    pub metrics: Metrics,
    pub basic_auth: Option<Arc<str>>,
}
