//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError};

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(JsError::type_error("t").kind, ErrorKind::TypeError);
        assert_eq!(JsError::reference_error("r").kind, ErrorKind::ReferenceError);
        assert_eq!(JsError::range_error("g").kind, ErrorKind::RangeError);
    }

    #[test]
    fn test_display_prefixes_kind() {
        let error = JsError::reference_error("foo is not defined");
        assert_eq!(error.to_string(), "ReferenceError: foo is not defined");
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&JsError::type_error("x"));
    }

    #[test]
    fn test_error_clone_eq() {
        let a = JsError::new(ErrorKind::TypeError, "same");
        assert_eq!(a.clone(), a);
    }
}
