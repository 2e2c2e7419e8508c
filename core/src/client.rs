//! Entry point that binds a retry policy to a transport.
//!
//! # Design
//! `Client` carries no per-request state: it holds the shared, read-only
//! `Config` and transport and hands out fresh `Request` builders. Cloning a
//! client is cheap and clones share both.

use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::request::Request;
use crate::transport::{Transport, UreqTransport};

#[derive(Clone)]
pub struct Client {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(config: impl Into<Arc<Config>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: config.into(),
            transport,
        }
    }

    /// A client that performs real HTTP exchanges through ureq.
    pub fn with_default_transport(config: impl Into<Arc<Config>>) -> Self {
        Self::new(config, Arc::new(UreqTransport::new()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn request(&self) -> Request {
        Request::new(Arc::clone(&self.config), Arc::clone(&self.transport))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish_non_exhaustive()
    }
}
