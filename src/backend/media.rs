use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Mime type attached to every image sent to the model.
pub const JPEG_MIME: &str = "image/jpeg";

/// An image sent inline with a request, as raw base64 plus its mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Build from a data URI (`data:image/jpeg;base64,...`) or a bare base64 string.
    ///
    /// Anything up to and including the first comma of a `data:` URI is dropped; the
    /// payload is always tagged `image/jpeg`. Returns `None` if no payload remains.
    ///
    /// ```
    /// use ayushlens::InlineImage;
    ///
    /// let image = InlineImage::from_data_uri("data:image/png;base64,QUJD").unwrap();
    /// assert_eq!(image.data, "QUJD");
    /// assert_eq!(image.mime_type, "image/jpeg");
    /// assert!(InlineImage::from_data_uri("data:image/jpeg;base64,").is_none());
    /// ```
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let trimmed = uri.trim();
        let payload = match trimmed.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(""),
            None => trimmed,
        };
        if payload.is_empty() {
            return None;
        }
        Some(Self {
            mime_type: JPEG_MIME.to_string(),
            data: payload.to_string(),
        })
    }

    /// Encode raw JPEG bytes.
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self {
            mime_type: JPEG_MIME.to_string(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Render back to a data URI, the form kept on a stored report.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
