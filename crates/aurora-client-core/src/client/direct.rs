//! Fixed-URI scheduler location.

/// Always connects to the one configured scheduler URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectLocator {
    uri: String,
}

impl DirectLocator {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientDeps, ClientOptions, Locator, SchedulerClient};
    use crate::testing::{FakeTransportFactory, FixedAuth, ScriptedStubs};
    use std::sync::Arc;

    #[test]
    fn direct_client_connects_to_configured_uri() {
        let transports = FakeTransportFactory::new();
        let deps = ClientDeps {
            transports: Arc::new(transports.clone()),
            stubs: Arc::new(ScriptedStubs::default()),
            ..ClientDeps::default()
        };
        let mut client = SchedulerClient::new(
            Locator::Direct(DirectLocator::new("https://scheduler.example.com:1337")),
            Arc::new(FixedAuth),
            ClientOptions::default(),
            &deps,
        );

        assert_eq!(client.url().unwrap(), "https://scheduler.example.com:1337");
        assert_eq!(client.raw_url().unwrap(), "https://scheduler.example.com:1337");
        client.get_thrift_client().unwrap();
        assert_eq!(
            transports.created_uris(),
            vec!["https://scheduler.example.com:1337/api"]
        );

        // Invalidation reconnects to the same URI; nothing is re-resolved.
        client.invalidate();
        client.get_thrift_client().unwrap();
        assert_eq!(transports.created_uris().len(), 2);
        assert_eq!(transports.created_uris()[1], transports.created_uris()[0]);
    }
}
