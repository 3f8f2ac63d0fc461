/// Deserialization tests for `generateContent` payloads shaped like the ones
/// the service actually returns.
#[cfg(test)]
mod unit {
    use crate::types::{GenerateRequest, GenerateResponse, GenerationConfig};

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).expect("failed to parse response")
    }

    #[test]
    fn parse_full_response() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "{\"description\": \"ok\"}"}]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 120,
                "candidatesTokenCount": 40,
                "totalTokenCount": 160
            }
        }"#;
        let response = parse(json);
        assert_eq!(response.reply_text(), r#"{"description": "ok"}"#);
        assert_eq!(
            response.candidates[0].finish_reason.as_deref(),
            Some("STOP")
        );
        assert_eq!(response.usage_metadata.unwrap().total_token_count, 160);
    }

    #[test]
    fn missing_candidates_fall_back_to_empty_object_text() {
        assert_eq!(parse("{}").reply_text(), "{}");
    }

    #[test]
    fn candidate_without_content_falls_back() {
        let response = parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        assert_eq!(response.reply_text(), "{}");
    }

    #[test]
    fn candidate_with_empty_parts_falls_back() {
        let response = parse(r#"{"candidates": [{"content": {"parts": []}}]}"#);
        assert_eq!(response.reply_text(), "{}");
    }

    #[test]
    fn request_serializes_camel_case_config() {
        let req = GenerateRequest::from_prompt("draft it", Some(GenerationConfig::default()));
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["contents"][0]["parts"][0]["text"], "draft it");
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(v["generationConfig"]["topK"], 40);
        assert!(v["contents"][0].get("role").is_none());
    }

    #[test]
    fn request_without_config_omits_the_key() {
        let req = GenerateRequest::from_prompt("draft it", None);
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("generationConfig").is_none());
        assert_eq!(req.prompt_text(), "draft it");
    }
}
