use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

/// Read side of the platform management interface: where this twin is registered.
pub trait PlatformManagementInterfaceReader: Send + Sync {
    fn registered_platform_urls(&self) -> Vec<String>;
}

/// In-memory set of platform URLs, kept in registration order.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    urls: Arc<RwLock<Vec<String>>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for url in urls {
            registry.register(url);
        }
        registry
    }

    /// Returns false if the platform was already registered.
    pub fn register(&self, url: impl Into<String>) -> bool {
        let url = url.into();
        let mut urls = self.urls.write();
        if urls.contains(&url) {
            return false;
        }
        info!(%url, "registered to platform");
        urls.push(url);
        true
    }

    pub fn unregister(&self, url: &str) -> bool {
        let mut urls = self.urls.write();
        let before = urls.len();
        urls.retain(|u| u != url);
        before != urls.len()
    }
}

impl PlatformManagementInterfaceReader for PlatformRegistry {
    fn registered_platform_urls(&self) -> Vec<String> {
        self.urls.read().clone()
    }
}
