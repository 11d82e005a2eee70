pub mod client;
pub mod seedream;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ArkClient;
pub use seedream::{normalize_response, SeedreamClient, GENERATIONS_ENDPOINT};
pub use transport::{HttpTransport, ReqwestTransport, Sleeper, TokioSleeper};
