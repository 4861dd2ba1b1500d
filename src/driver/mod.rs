// Remote session driver abstraction
//
// The booking core only ever talks to the site through these traits.
// Selectors are opaque strings taken from configuration; the core never
// builds or parses markup. `webdriver` is the one concrete adapter shipped
// with the crate.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::errors::ErrorKind;

pub mod webdriver;

pub use webdriver::{WebDriverFactory, WebDriverSession, WebElement};

/// Failures reported by a driver implementation
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no element matches '{0}'")]
    ElementNotFound(String),

    #[error("timed out after {timeout:?} waiting for '{selector}'")]
    Timeout { selector: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("session error: {0}")]
    Session(String),
}

impl DriverError {
    /// Map a driver failure onto the step-level error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriverError::ElementNotFound(_) => ErrorKind::ElementNotFound,
            DriverError::Timeout { .. } => ErrorKind::Timeout,
            DriverError::Navigation { .. } | DriverError::Session(_) => ErrorKind::NavigationError,
        }
    }
}

/// A located element in the remote document
#[async_trait]
pub trait ElementHandle: Send + Sync + Sized {
    /// Find a descendant matching `selector`
    async fn query(&self, selector: &str) -> Result<Option<Self>, DriverError>;

    async fn click(&self) -> Result<(), DriverError>;
}

/// Capabilities the booking workflow needs from a remote session
#[async_trait]
pub trait SessionDriver: Send + Sync {
    type Element: ElementHandle;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError>;

    async fn fill(&self, selector: &str, value: &str) -> Result<(), DriverError>;

    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Wait until `selector` matches an element, failing with `Timeout`
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), DriverError>;

    async fn query(&self, selector: &str) -> Result<Option<Self::Element>, DriverError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>, DriverError>;

    /// PNG capture of the current page
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// End the session; the default does nothing
    async fn close(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Opens one fresh, isolated session per reservation attempt
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Driver: SessionDriver;

    async fn open(&self) -> Result<Self::Driver, DriverError>;
}
