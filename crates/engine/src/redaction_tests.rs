use super::*;

#[test]
fn redacts_known_token_shapes_preserving_surroundings() {
    let r = Redactor::new();
    assert_eq!(
        r.redact_str("key is hf_abc123XYZ and that's it"),
        "key is hf_***REDACTED*** and that's it"
    );
    assert_eq!(
        r.redact_str("Authorization: Bearer eyJhbGciOi.abc-def"),
        "Authorization: Bearer ***REDACTED***"
    );
    assert_eq!(
        r.redact_str("see /Users/alice/projects/x"),
        "see /[HOME]/projects/x"
    );
    assert_eq!(
        r.redact_str("url?token=abcdef&other=1"),
        "url?token=***&other=1"
    );
}

#[test]
fn redacts_sensitive_keys_wholesale() {
    let r = Redactor::new();
    let value = serde_json::json!({
        "Authorization": "Bearer something",
        "nested": { "api_key": "xyz", "safe": "ok" }
    });
    let redacted = r.redact_value(&value);
    assert_eq!(redacted["Authorization"], "***REDACTED***");
    assert_eq!(redacted["nested"]["api_key"], "***REDACTED***");
    assert_eq!(redacted["nested"]["safe"], "ok");
}

#[test]
fn clamps_depth_beyond_ten() {
    let r = Redactor::new();
    let mut value = serde_json::json!("leaf");
    for _ in 0..15 {
        value = serde_json::json!({"nested": value});
    }
    let redacted = r.redact_value(&value);
    let mut cursor = &redacted;
    let mut saw_marker = false;
    for _ in 0..15 {
        if cursor == &Json::String(MAX_DEPTH_EXCEEDED.to_string()) {
            saw_marker = true;
            break;
        }
        cursor = &cursor["nested"];
    }
    assert!(saw_marker);
}

#[test]
fn strings_without_secrets_are_unchanged() {
    let r = Redactor::new();
    assert_eq!(r.redact_str("plain step 3/10 loss=0.42"), "plain step 3/10 loss=0.42");
}
