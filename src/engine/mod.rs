pub mod lighthouse;
pub mod mock;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EngineOptions, EngineReport};

pub use lighthouse::LighthouseEngine;
pub use mock::MockEngine;

/// A page-audit engine: loads a URL in a controlled browser and scores it.
///
/// Implementations must release every browser/subprocess resource they
/// acquire, on success and on failure.
#[async_trait]
pub trait AuditEngine: Send + Sync {
    /// Human-readable name of this engine.
    fn name(&self) -> &str;

    /// Run one audit against `url`.
    async fn run(&self, url: &str, options: &EngineOptions) -> Result<EngineReport>;
}
