use pinpick_util::errors::PinpickError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = PinpickError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_config_error_display() {
    let err = PinpickError::Config {
        message: "bad bound".to_string(),
    };
    assert_eq!(err.to_string(), "Config error: bad bound");
}

#[test]
fn test_registry_error_display() {
    let err = PinpickError::Registry {
        message: "timeout".to_string(),
    };
    assert_eq!(err.to_string(), "Registry error: timeout");
}

#[test]
fn test_interpreter_error_display() {
    let err = PinpickError::Interpreter {
        message: "python3 missing".to_string(),
    };
    assert_eq!(err.to_string(), "Interpreter error: python3 missing");
}

#[test]
fn test_ledger_error_display() {
    let err = PinpickError::Ledger {
        message: "read-only".to_string(),
    };
    assert_eq!(err.to_string(), "Ledger error: read-only");
}

#[test]
fn test_generic_error_display() {
    let err = PinpickError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: PinpickError = io_err.into();
    assert!(matches!(err, PinpickError::Io(_)));
}
