//! HTTP transport with request modification hooks
//!
//! Every request sent through [`ModifyingTransport`] is first passed to each
//! registered [`RequestModifier`] in registration order. The manifest-info
//! tracker plugs in here to stamp provenance headers on registry traffic.

use crate::config::TransportConfig;
use crate::error::Result;
use reqwest::{Client, Request, RequestBuilder, Response};
use std::sync::Arc;
use tracing::debug;

/// Hook invoked on a request right before it is sent
pub trait RequestModifier: Send + Sync {
    fn modify_request(&self, request: &mut Request) -> Result<()>;
}

/// `reqwest` client wrapper applying request modifiers before sending
#[derive(Clone)]
pub struct ModifyingTransport {
    client: Client,
    modifiers: Vec<Arc<dyn RequestModifier>>,
}

impl ModifyingTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            modifiers: Vec::new(),
        }
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        Ok(Self::new(config.build_client()?))
    }

    pub fn with_modifier(mut self, modifier: Arc<dyn RequestModifier>) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Build the request and run it through every modifier
    pub fn prepare(&self, builder: RequestBuilder) -> Result<Request> {
        let mut request = builder.build()?;
        self.modify(&mut request)?;
        Ok(request)
    }

    fn modify(&self, request: &mut Request) -> Result<()> {
        for modifier in &self.modifiers {
            modifier.modify_request(request)?;
        }
        Ok(())
    }

    /// Send a request produced by [`prepare`](Self::prepare) as-is
    pub async fn execute(&self, request: Request) -> Result<Response> {
        debug!(method = %request.method(), url = %request.url(), "Sending registry request");
        Ok(self.client.execute(request).await?)
    }

    /// Build, modify and send
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = self.prepare(builder)?;
        self.execute(request).await
    }
}
