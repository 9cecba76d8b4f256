use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FocalError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FocalError::encoder_unavailable("x")
            .to_string()
            .contains("encoder unavailable:")
    );
    assert!(
        FocalError::encoding_failed("x")
            .to_string()
            .contains("encoding failed:")
    );
    assert!(
        FocalError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        FocalError::InsufficientAnchors { found: 1 }
            .to_string()
            .contains("found 1")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FocalError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn export_failures_are_retryable_but_alignment_is_not() {
    assert!(FocalError::encoder_unavailable("no ffmpeg").is_retryable());
    assert!(
        FocalError::EncodingTimeout {
            elapsed_ms: 10,
            limit_ms: 5
        }
        .is_retryable()
    );
    assert!(FocalError::Cancelled.is_retryable());
    assert!(!FocalError::InsufficientAnchors { found: 0 }.is_retryable());
    assert!(!FocalError::validation("bad").is_retryable());
}
