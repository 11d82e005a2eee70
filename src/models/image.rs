use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_MAX_IMAGES: u32 = 3;
pub const DEFAULT_RESPONSE_FORMAT: &str = "url";

/// Output size token understood by Seedream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    OneK,
    #[default]
    TwoK,
    FourK,
    Pixels { width: u32, height: u32 },
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSize::OneK => write!(f, "1K"),
            ImageSize::TwoK => write!(f, "2K"),
            ImageSize::FourK => write!(f, "4K"),
            ImageSize::Pixels { width, height } => write!(f, "{}x{}", width, height),
        }
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        match token.to_ascii_uppercase().as_str() {
            "1K" => return Ok(ImageSize::OneK),
            "2K" => return Ok(ImageSize::TwoK),
            "4K" => return Ok(ImageSize::FourK),
            _ => {}
        }

        let (w, h) = token
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| format!("unsupported image size '{}'", token))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid width in image size '{}'", token))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid height in image size '{}'", token))?;
        if width == 0 || height == 0 {
            return Err(format!("image size '{}' must be non-zero", token));
        }
        Ok(ImageSize::Pixels { width, height })
    }
}

impl Serialize for ImageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub images: Vec<String>,
    pub max_images: u32,
    pub size: ImageSize,
    pub watermark: bool,
    /// Overrides the client's configured stream flag when set.
    pub stream: Option<bool>,
    pub response_format: String,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        ImageGenerationRequest {
            prompt: prompt.into(),
            images: Vec::new(),
            max_images: DEFAULT_MAX_IMAGES,
            size: ImageSize::default(),
            watermark: true,
            stream: None,
            response_format: DEFAULT_RESPONSE_FORMAT.to_string(),
        }
    }

    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_images(mut self, max_images: u32) -> Self {
        self.max_images = max_images;
        self
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_watermark(mut self, watermark: bool) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_response_format(mut self, response_format: impl Into<String>) -> Self {
        self.response_format = response_format.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SequentialOptions {
    pub max_images: u32,
}

/// Request body for `POST /images/generations`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeedreamPayload {
    pub model: String,
    pub prompt: String,
    // Absent and empty mean different things to the vendor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<String>>,
    pub sequential_image_generation: String,
    pub sequential_image_generation_options: SequentialOptions,
    pub response_format: String,
    pub size: ImageSize,
    pub stream: bool,
    pub watermark: bool,
}

/// Result of normalizing a vendor success response.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Images(Vec<String>),
    /// The body was neither a data listing nor an error report.
    Unrecognized(serde_json::Value),
}

impl GenerationOutcome {
    pub fn into_urls(self) -> Vec<String> {
        match self {
            GenerationOutcome::Images(urls) => urls,
            GenerationOutcome::Unrecognized(_) => Vec::new(),
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, GenerationOutcome::Unrecognized(_))
    }
}
