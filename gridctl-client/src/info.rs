//! Information service contract

use async_trait::async_trait;
use gridctl_core::dto::status::StatusRecord;
use url::Url;

use crate::error::Result;

/// Executes status queries against an information service
///
/// The filter is an opaque, backend specific expression (an LDAP filter for
/// ARC0). One call returns every record matching the filter.
#[async_trait]
pub trait InfoService: Send + Sync {
    /// Run one query
    ///
    /// # Arguments
    /// * `endpoint` - Service base URL including the search base path
    /// * `filter` - Combined filter expression
    ///
    /// # Returns
    /// All matching records, in service order
    async fn query(&self, endpoint: &Url, filter: &str) -> Result<Vec<StatusRecord>>;
}
