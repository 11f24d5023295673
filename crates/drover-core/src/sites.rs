//! Site directory collaborator.
//!
//! Site topology lives outside this system; backends only need to resolve a
//! site name to the endpoint a job should be routed to.

use std::collections::HashMap;

pub trait SiteDirectory: Send + Sync {
    /// Resolve a site name to its submission endpoint, if known.
    fn endpoint(&self, site: &str) -> Option<String>;
}

/// Directory backed by a fixed site to endpoint map.
#[derive(Debug, Clone, Default)]
pub struct StaticSiteDirectory {
    endpoints: HashMap<String, String>,
}

impl StaticSiteDirectory {
    pub fn new(endpoints: HashMap<String, String>) -> Self {
        Self { endpoints }
    }
}

impl SiteDirectory for StaticSiteDirectory {
    fn endpoint(&self, site: &str) -> Option<String> {
        self.endpoints.get(site).cloned()
    }
}
