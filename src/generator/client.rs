//! ImageGenerator trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GenerateError;
use crate::catalog::SubjectGender;

/// An encoded image with its embedded media type
///
/// `data` is the base64 payload as received from (or sent to) the API;
/// the scheduler never decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    #[serde(rename = "media-type")]
    pub media_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn new(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Render as a `data:` URL for direct display
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Stateless image-generation client - each call is independent
///
/// This is the seam to the external API. The scheduler dispatches at most
/// one call at a time and only ever inspects a failure's message text (to
/// classify rate limiting); transport, authentication, and timeouts are
/// entirely the implementor's concern. The call is assumed to eventually
/// settle.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one stylized variant of `source`
    async fn generate(
        &self,
        source: &EncodedImage,
        subject: SubjectGender,
        style_directive: &str,
    ) -> Result<EncodedImage, GenerateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let image = EncodedImage::new("image/png", "aGVsbG8=");
        assert_eq!(image.to_data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_serialization_uses_kebab_case() {
        let image = EncodedImage::new("image/jpeg", "AAAA");
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("media-type"));

        let back: EncodedImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);
    }
}
