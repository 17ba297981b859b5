//! HTTP transport for Gemini requests

use bytes::Bytes;
use rig::http_client::{
    self, HttpClientExt, LazyBody, MultipartForm, Request, Response, StreamingResponse,
};
use rig::wasm_compat::WasmCompatSend;
use serde_json::Value;
use std::future::Future;
use tracing::trace;

/// reqwest transport that sends every JSON body with unique keys.
///
/// rig writes `"safetySettings": null` ahead of the flattened additional
/// params, so a body carrying safety settings names the key twice. The last
/// occurrence wins, which is the list passed through `additional_params`.
#[derive(Debug, Clone, Default)]
pub struct GeminiHttpClient {
    inner: reqwest::Client,
}

impl GeminiHttpClient {
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

/// Re-encode a JSON object body so each key appears once. Anything else passes through untouched.
pub fn collapse_duplicate_keys(body: Bytes) -> Bytes {
    match serde_json::from_slice::<Value>(&body) {
        Ok(value @ Value::Object(_)) => match serde_json::to_vec(&value) {
            Ok(encoded) => Bytes::from(encoded),
            Err(_) => body,
        },
        _ => body,
    }
}

fn normalize<T: Into<Bytes>>(req: Request<T>) -> Request<Bytes> {
    let (parts, body) = req.into_parts();
    trace!(uri = %parts.uri.path(), "Normalizing Gemini request body");
    Request::from_parts(parts, collapse_duplicate_keys(body.into()))
}

impl HttpClientExt for GeminiHttpClient {
    fn send<T, U>(
        &self,
        req: Request<T>,
    ) -> impl Future<Output = http_client::Result<Response<LazyBody<U>>>> + WasmCompatSend + 'static
    where
        T: Into<Bytes>,
        T: WasmCompatSend,
        U: From<Bytes>,
        U: WasmCompatSend + 'static,
    {
        self.inner.send::<Bytes, U>(normalize(req))
    }

    fn send_multipart<U>(
        &self,
        req: Request<MultipartForm>,
    ) -> impl Future<Output = http_client::Result<Response<LazyBody<U>>>> + WasmCompatSend + 'static
    where
        U: From<Bytes>,
        U: WasmCompatSend + 'static,
    {
        self.inner.send_multipart::<U>(req)
    }

    fn send_streaming<T>(
        &self,
        req: Request<T>,
    ) -> impl Future<Output = http_client::Result<StreamingResponse>> + WasmCompatSend
    where
        T: Into<Bytes>,
    {
        self.inner.send_streaming::<Bytes>(normalize(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig::providers::gemini::completion::gemini_api_types::GenerateContentRequest;
    use serde_json::json;

    fn request_body(additional_params: Option<Value>) -> Vec<u8> {
        let request = GenerateContentRequest {
            contents: Vec::new(),
            tools: None,
            tool_config: None,
            generation_config: None,
            safety_settings: None,
            system_instruction: None,
            additional_params,
        };
        serde_json::to_vec(&request).unwrap()
    }

    fn occurrences(body: &[u8], key: &str) -> usize {
        String::from_utf8_lossy(body)
            .matches(&format!("\"{key}\":"))
            .count()
    }

    #[test]
    fn test_safety_settings_sent_once() {
        let settings = json!({
            "safetySettings": [
                { "category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE" }
            ]
        });
        let raw = request_body(Some(settings));
        assert_eq!(occurrences(&raw, "safetySettings"), 2);

        let sent = collapse_duplicate_keys(Bytes::from(raw));
        assert_eq!(occurrences(&sent, "safetySettings"), 1);

        let body: Value = serde_json::from_slice(&sent).unwrap();
        assert_eq!(
            body["safetySettings"][0]["category"],
            "HARM_CATEGORY_HARASSMENT"
        );
    }

    #[test]
    fn test_body_without_duplicates_keeps_its_fields() {
        let sent = collapse_duplicate_keys(Bytes::from(request_body(None)));
        let body: Value = serde_json::from_slice(&sent).unwrap();
        assert_eq!(body["contents"], json!([]));
        assert!(body["safetySettings"].is_null());
    }

    #[test]
    fn test_non_object_body_passes_through() {
        let raw = Bytes::from_static(b"not json");
        assert_eq!(collapse_duplicate_keys(raw.clone()), raw);
    }

    #[test]
    fn test_request_headers_survive_normalizing() {
        let req = Request::builder()
            .method("POST")
            .uri("https://example.test/v1beta/models/m:streamGenerateContent")
            .header("Content-Type", "application/json")
            .body(request_body(None))
            .unwrap();

        let normalized = normalize(req);
        assert_eq!(normalized.headers()["Content-Type"], "application/json");
        assert_eq!(normalized.uri().path(), "/v1beta/models/m:streamGenerateContent");
    }
}
