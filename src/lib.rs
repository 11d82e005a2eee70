pub mod byteplus;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
#[cfg(feature = "server")]
pub mod server;

pub use byteplus::{ArkClient, HttpTransport, SeedreamClient};
pub use config::{Config, RetryPolicy, SeedreamConfig};
pub use error::{Result, SeedreamError, TransportError};
pub use models::{GenerationOutcome, ImageGenerationRequest, ImageSize};
