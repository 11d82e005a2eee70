use std::sync::Arc;

use serde_json::Value;

use crate::{
    byteplus::{
        client::ArkClient,
        transport::{HttpTransport, Sleeper},
    },
    config::SeedreamConfig,
    error::{Result, SeedreamError},
    logger,
    models::{GenerationOutcome, ImageGenerationRequest, SeedreamPayload, SequentialOptions},
};

pub const GENERATIONS_ENDPOINT: &str = "/images/generations";

const URL_KEYS: [&str; 3] = ["url", "output_url", "image_url"];

#[derive(Clone)]
pub struct SeedreamClient {
    ark: ArkClient,
    model: String,
    stream: bool,
}

impl SeedreamClient {
    /// Fails with a configuration error, before any network activity, when the
    /// API key or the stream flag is missing.
    pub fn new(config: SeedreamConfig) -> Result<Self> {
        config.require_api_key()?;
        let stream = config.require_stream()?;
        let ark = ArkClient::new(&config)?;
        Ok(Self::from_parts(ark, &config, stream))
    }

    pub fn with_transport(
        config: SeedreamConfig,
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        config.require_api_key()?;
        let stream = config.require_stream()?;
        let ark = ArkClient::with_transport(&config, transport, sleeper)?;
        Ok(Self::from_parts(ark, &config, stream))
    }

    fn from_parts(ark: ArkClient, config: &SeedreamConfig, stream: bool) -> Self {
        Self {
            ark,
            model: config.model.clone(),
            stream,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_payload(&self, request: &ImageGenerationRequest) -> SeedreamPayload {
        SeedreamPayload {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            image: if request.images.is_empty() {
                None
            } else {
                Some(request.images.clone())
            },
            sequential_image_generation: "auto".to_string(),
            sequential_image_generation_options: SequentialOptions {
                max_images: request.max_images,
            },
            response_format: request.response_format.clone(),
            size: request.size,
            stream: request.stream.unwrap_or(self.stream),
            watermark: request.watermark,
        }
    }

    pub async fn generate(&self, request: &ImageGenerationRequest) -> Result<GenerationOutcome> {
        validate(request)?;

        let payload = serde_json::to_value(self.build_payload(request))
            .map_err(|e| SeedreamError::SerializationError(e.to_string()))?;

        log::info!("Generating images with model {}: {}", self.model, payload);
        let _timer = logger::timer("seedream image generation");

        let result = self.ark.post(GENERATIONS_ENDPOINT, &payload).await?;
        normalize_response(&result)
    }

    /// Like [`generate`](Self::generate), but an unrecognized response shape
    /// becomes an empty list (with a warning) instead of a distinct outcome.
    pub async fn generate_images(&self, request: &ImageGenerationRequest) -> Result<Vec<String>> {
        match self.generate(request).await? {
            GenerationOutcome::Images(urls) => {
                log::info!("Seedream returned {} image url(s)", urls.len());
                Ok(urls)
            }
            GenerationOutcome::Unrecognized(body) => {
                log::warn!("Unrecognized Seedream response, treating as no images: {}", body);
                Ok(Vec::new())
            }
        }
    }
}

fn validate(request: &ImageGenerationRequest) -> Result<()> {
    if request.prompt.trim().is_empty() {
        return Err(SeedreamError::RequestError("prompt must not be empty".into()));
    }
    if request.max_images == 0 {
        return Err(SeedreamError::RequestError(
            "max_images must be a positive integer".into(),
        ));
    }
    Ok(())
}

/// Flattens a vendor response into image URLs.
///
/// A `data` array yields one URL per item that carries one; an `error` or
/// `message` entry becomes a generation error; anything else is reported as
/// [`GenerationOutcome::Unrecognized`].
pub fn normalize_response(result: &Value) -> Result<GenerationOutcome> {
    let Some(map) = result.as_object() else {
        return Ok(GenerationOutcome::Unrecognized(result.clone()));
    };

    if let Some(items) = map.get("data").and_then(Value::as_array) {
        let urls = items.iter().filter_map(extract_url).collect();
        return Ok(GenerationOutcome::Images(urls));
    }

    let reported = map
        .get("error")
        .filter(|v| !v.is_null())
        .or_else(|| map.get("message").filter(|v| !v.is_null()));
    if let Some(err) = reported {
        return Err(SeedreamError::generation(vendor_message(err)));
    }

    Ok(GenerationOutcome::Unrecognized(result.clone()))
}

fn extract_url(item: &Value) -> Option<String> {
    match item {
        Value::String(url) => non_empty(url),
        Value::Object(obj) => URL_KEYS
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_str))
            .find_map(non_empty),
        _ => None,
    }
}

// Blank URLs are dropped; everything else is passed through as sent.
fn non_empty(raw: &str) -> Option<String> {
    (!raw.trim().is_empty()).then(|| raw.to_string())
}

// ARK nests errors as {"error": {"code": ..., "message": ...}}.
fn vendor_message(err: &Value) -> String {
    match err {
        Value::String(message) => message.clone(),
        Value::Object(obj) => {
            let message = obj.get("message").and_then(Value::as_str);
            let code = obj.get("code").and_then(Value::as_str);
            match (message, code) {
                (Some(message), Some(code)) => format!("{} ({})", message, code),
                (Some(message), None) => message.to_string(),
                _ => err.to_string(),
            }
        }
        other => other.to_string(),
    }
}
