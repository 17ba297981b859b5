use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Image payload sent inline with a vision request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload without the `data:` prefix
    pub data: String,
}

/// Encode raw bytes as `data:<mime>;base64,<payload>`
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and payload.
///
/// Returns `None` for anything that is not a non-empty base64 data URL.
pub fn parse_data_url(url: &str) -> Option<InlineImage> {
    let rest = url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;

    if mime_type.is_empty() || data.is_empty() {
        return None;
    }

    Some(InlineImage {
        mime_type: mime_type.to_string(),
        data: data.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_data_url() {
        assert_eq!(
            encode_data_url("image/png", b"hello"),
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[test]
    fn test_parse_data_url() {
        let image = parse_data_url("data:image/webp;base64,aGVsbG8=").unwrap();
        assert_eq!(image.mime_type, "image/webp");
        assert_eq!(image.data, "aGVsbG8=");
    }

    #[test]
    fn test_parse_rejects_malformed_urls() {
        assert!(parse_data_url("https://example.com/cat.png").is_none());
        assert!(parse_data_url("data:image/png;base64,").is_none());
        assert!(parse_data_url("data:image/png,plain").is_none());
        assert!(parse_data_url("data:;base64,AAAA").is_none());
        assert!(parse_data_url("data:image/png;base64").is_none());
    }

    #[test]
    fn test_encoded_url_parses_back_to_payload() {
        let url = encode_data_url("image/jpeg", &[0xff, 0xd8, 0xff]);
        let image = parse_data_url(&url).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(image.data).unwrap(), vec![0xff, 0xd8, 0xff]);
    }
}
