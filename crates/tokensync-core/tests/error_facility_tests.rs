use tokensync_core::errors::{ExError, ExErrorKind, TokenSyncError};
use tokensync_core_types::RequestId;

#[test]
fn test_policy_denied_verifiable_by_kind() {
    let err = TokenSyncError::PolicyDenied {
        policy: "strict".to_string(),
        reason: "1 broken alias(es), 0 circular reference(s)".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::PolicyDenied);
    assert_eq!(ex_err.code(), "ERR_POLICY_DENIED");
    assert!(ex_err.message().contains("strict policy"));
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "baseline.json");
    let err: TokenSyncError = io.into();
    assert_eq!(err.code(), "ERR_IO");
}

#[test]
fn test_serde_error_converts() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: TokenSyncError = parse_err.into();
    assert!(matches!(err, TokenSyncError::Serialization { .. }));
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::InvalidInput, "ERR_INVALID_INPUT"),
        (ExErrorKind::InvalidSnapshotFormat, "ERR_INVALID_SNAPSHOT_FORMAT"),
        (ExErrorKind::InvalidVersion, "ERR_INVALID_VERSION"),
        (ExErrorKind::InvalidChunkSize, "ERR_INVALID_CHUNK_SIZE"),
        (ExErrorKind::CorruptPayload, "ERR_CORRUPT_PAYLOAD"),
        (ExErrorKind::PolicyDenied, "ERR_POLICY_DENIED"),
        (ExErrorKind::Config, "ERR_CONFIG"),
        (ExErrorKind::DeterminismViolation, "ERR_DETERMINISM_VIOLATION"),
        (ExErrorKind::Io, "ERR_IO"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];

    let mut seen = std::collections::HashSet::new();
    for (kind, code) in kinds {
        assert_eq!(kind.code(), code);
        assert!(seen.insert(code), "duplicate code {code}");
    }
}

#[test]
fn test_display_includes_context() {
    let request_id = RequestId::from_string("req-1".to_string());
    let err = ExError::new(ExErrorKind::InvalidSnapshotFormat)
        .with_op("from_value")
        .with_message("entries must be an object")
        .with_path("colors.primary")
        .with_entry_key("k1")
        .with_request_id(request_id);

    let text = err.to_string();
    assert!(text.starts_with("[ERR_INVALID_SNAPSHOT_FORMAT] in operation 'from_value'"));
    assert!(text.contains("(path: colors.primary)"));
    assert!(text.contains("(entry: k1)"));
    assert!(text.contains("(request_id: req-1)"));
    assert_eq!(err.entry_key(), Some("k1"));
}

#[test]
fn test_source_chain() {
    let inner = ExError::new(ExErrorKind::CorruptPayload).with_message("EOF");
    let outer = ExError::new(ExErrorKind::Io)
        .with_op("load_baseline")
        .with_source(inner);

    let source = std::error::Error::source(&outer).expect("source");
    assert!(source.to_string().contains("ERR_CORRUPT_PAYLOAD"));
    assert_eq!(outer.source_error().map(|e| e.kind()), Some(ExErrorKind::CorruptPayload));
}
