use kiln_util::errors::KilnError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = KilnError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_manifest_error_display() {
    let err = KilnError::Manifest {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Manifest error: bad syntax");
}

#[test]
fn test_lockfile_error_display() {
    let err = KilnError::Lockfile {
        message: "truncated".to_string(),
    };
    assert_eq!(err.to_string(), "Lockfile error: truncated");
}

#[test]
fn test_registry_error_display() {
    let err = KilnError::Registry {
        message: "index missing".to_string(),
    };
    assert_eq!(err.to_string(), "Registry error: index missing");
}

#[test]
fn test_generic_error_display() {
    let err = KilnError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let kiln_err: KilnError = io_err.into();
    assert!(matches!(kiln_err, KilnError::Io(_)));
}
