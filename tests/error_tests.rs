#[cfg(test)]
mod error_tests {
    use ayushlens::{AnalysisError, LensError, StorageError, ValidationError};
    use std::time::Duration;

    #[test]
    fn test_analysis_reasons() {
        assert_eq!(AnalysisError::Transport("x".into()).reason(), "transport_error");
        assert_eq!(AnalysisError::InvalidResponse("x".into()).reason(), "invalid_response");
        assert_eq!(AnalysisError::Timeout(Duration::from_secs(1)).reason(), "timeout");
        assert_eq!(AnalysisError::Cancelled.reason(), "cancelled");
    }

    #[test]
    fn test_display_messages() {
        let err = AnalysisError::InvalidResponse("empty payload".to_string());
        assert_eq!(format!("{}", err), "Invalid response: empty payload");

        let err: LensError = ValidationError::EmptySymptoms.into();
        assert_eq!(format!("{}", err), "Please describe your symptoms.");

        let err = LensError::Config("GEMINI_API_KEY environment variable is not set".into());
        assert_eq!(
            format!("{}", err),
            "Configuration error: GEMINI_API_KEY environment variable is not set"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StorageError = io.into();
        match err {
            StorageError::Io(_) => {}
            other => panic!("Expected Io, got {:?}", other),
        }
        // io causes never compare equal
        let a: StorageError = std::io::Error::other("a").into();
        let b: StorageError = std::io::Error::other("a").into();
        assert_ne!(a, b);
    }

    #[test]
    fn test_lens_error_wraps_layers() {
        let err: LensError = AnalysisError::Cancelled.into();
        assert_eq!(err, LensError::Analysis(AnalysisError::Cancelled));

        let err: LensError = StorageError::Rejected("full".into()).into();
        assert_eq!(err, LensError::Storage(StorageError::Rejected("full".into())));
    }
}
