use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Deserialize;

use crate::{
    byteplus::SeedreamClient,
    error::SeedreamError,
    models::{ImageGenerationRequest, ImageSize, DEFAULT_MAX_IMAGES},
    server::page::{self, PageState},
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub images_text: String,
    #[serde(default)]
    pub max_images: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub watermark: String,
}

impl GenerateForm {
    /// Non-blank, trimmed lines in their original order.
    pub fn reference_images(&self) -> Vec<String> {
        self.images_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }

    fn watermark(&self) -> bool {
        if self.watermark.trim().is_empty() {
            true
        } else {
            self.watermark.trim().eq_ignore_ascii_case("true")
        }
    }

    fn page(&self) -> PageState {
        let defaults = PageState::default();
        PageState {
            prompt: self.prompt.clone(),
            images_text: self.images_text.clone(),
            max_images: self
                .max_images
                .trim()
                .parse()
                .unwrap_or(defaults.max_images),
            size: if self.size.trim().is_empty() {
                defaults.size
            } else {
                self.size.trim().to_string()
            },
            watermark: self.watermark(),
            ..defaults
        }
    }

    pub fn to_request(&self) -> Result<ImageGenerationRequest, String> {
        if self.prompt.trim().is_empty() {
            return Err("Please enter a prompt.".to_string());
        }

        let max_images = match self.max_images.trim() {
            "" => DEFAULT_MAX_IMAGES,
            raw => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(format!("Number of images must be a positive integer, got '{}'.", raw)),
            },
        };

        let size = match self.size.trim() {
            "" => ImageSize::default(),
            raw => raw.parse::<ImageSize>()?,
        };

        Ok(ImageGenerationRequest::new(self.prompt.clone())
            .with_images(self.reference_images())
            .with_max_images(max_images)
            .with_size(size)
            .with_watermark(self.watermark()))
    }
}

fn html(status: StatusCode, state: &PageState) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(page::render(state))
}

pub async fn index() -> HttpResponse {
    html(StatusCode::OK, &PageState::default())
}

pub async fn generate(
    client: web::Data<SeedreamClient>,
    form: web::Form<GenerateForm>,
) -> HttpResponse {
    let form = form.into_inner();
    let mut state = form.page();

    let request = match form.to_request() {
        Ok(request) => request,
        Err(message) => {
            log::warn!("Rejected generation form: {}", message);
            state.error = Some(message);
            return html(StatusCode::BAD_REQUEST, &state);
        }
    };

    match client.generate_images(&request).await {
        Ok(urls) => {
            if urls.is_empty() {
                state.error = Some("No images were returned.".to_string());
            }
            state.urls = urls;
            html(StatusCode::OK, &state)
        }
        Err(err) => {
            log::error!("Image generation failed: {}", err);
            let status = match err {
                SeedreamError::RequestError(_) => StatusCode::BAD_REQUEST,
                SeedreamError::GenerationError { .. } => StatusCode::BAD_GATEWAY,
                SeedreamError::ConfigError(_) | SeedreamError::SerializationError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            state.error = Some(err.to_string());
            html(status, &state)
        }
    }
}
