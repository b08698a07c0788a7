//! Inline fallback encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode a payload as a self-contained `data:` URI.
pub fn to_data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_shape() {
        let uri = to_data_uri("image/png", b"abc");
        assert_eq!(uri, "data:image/png;base64,YWJj");
    }
}
