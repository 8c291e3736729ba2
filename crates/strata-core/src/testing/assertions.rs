//! Test assertion macros and helpers.

use crate::error::StrataError;
use crate::schema::SchemaRegistry;

/// Assert that a result is Ok.
///
/// # Example
///
/// ```ignore
/// let result = registry.add_field("inventory", 1, field);
/// assert_ok!(result);
/// assert_ok!(result, "rack_id should be added");
/// ```
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match &$expr {
            Ok(_) => (),
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match &$expr {
            Ok(_) => (),
            Err(e) => panic!("assertion failed: {}: expected Ok, got Err({:?})", format_args!($($arg)+), e),
        }
    };
}

/// Assert that a result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match &$expr {
            Err(_) => (),
            Ok(v) => panic!("assertion failed: expected Err, got Ok({:?})", v),
        }
    };
    ($expr:expr, $($arg:tt)+) => {
        match &$expr {
            Err(_) => (),
            Ok(v) => panic!("assertion failed: {}: expected Err, got Ok({:?})", format_args!($($arg)+), v),
        }
    };
}

/// Assert that an error matches a specific variant.
///
/// # Example
///
/// ```ignore
/// let result = registry.delete_collection("animals");
/// assert_err_variant!(result, StrataError::ConstraintViolation(_));
/// ```
#[macro_export]
macro_rules! assert_err_variant {
    ($expr:expr, $variant:pat) => {
        match &$expr {
            Err($variant) => (),
            Err(e) => panic!(
                "assertion failed: expected {}, got {:?}",
                stringify!($variant),
                e
            ),
            Ok(v) => panic!(
                "assertion failed: expected Err({}), got Ok({:?})",
                stringify!($variant),
                v
            ),
        }
    };
}

/// Assert the ordered field names of a collection (looked up by id or name).
///
/// # Example
///
/// ```ignore
/// assert_fields!(registry, "inventory", ["id", "concentration", "volume"]);
/// ```
#[macro_export]
macro_rules! assert_fields {
    ($registry:expr, $collection:expr, [$($name:expr),* $(,)?]) => {
        let expected: Vec<&str> = vec![$($name),*];
        let actual = $crate::testing::field_names(&$registry, $collection);
        assert_eq!(
            actual, expected,
            "field order mismatch in collection '{}'",
            $collection
        );
    };
}

// =========================================================================
// HELPER FUNCTIONS
// =========================================================================

/// Ordered field names of a collection, panicking if it does not exist.
pub fn field_names<'a>(registry: &'a SchemaRegistry, collection: &str) -> Vec<&'a str> {
    match registry.find_collection(collection) {
        Ok(c) => c.field_names(),
        Err(e) => panic!("assertion failed: {}", e),
    }
}

/// Check if an error message, or that of its root cause, contains a substring.
pub fn error_contains(error: &StrataError, substring: &str) -> bool {
    error.to_string().contains(substring) || error.root_cause().to_string().contains(substring)
}

/// Check if the innermost cause of an error is `NotFound`.
pub fn is_not_found(error: &StrataError) -> bool {
    matches!(error.root_cause(), StrataError::NotFound(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CollectionDef, FieldDef, FieldOptions};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::from_collections([CollectionDef::new("pbc_3615662572", "logs")
            .with_field(FieldDef::new("text1", "operator", FieldOptions::text()))
            .with_field(FieldDef::new("text2", "module", FieldOptions::text()))])
        .unwrap()
    }

    #[test]
    fn test_assert_ok_passes() {
        let result: Result<i32, StrataError> = Ok(42);
        assert_ok!(result);
    }

    #[test]
    #[should_panic(expected = "expected Ok")]
    fn test_assert_ok_fails() {
        let result: Result<i32, StrataError> = Err(StrataError::Conflict("dup".into()));
        assert_ok!(result);
    }

    #[test]
    fn test_assert_err_variant_passes() {
        let result: Result<(), StrataError> = Err(StrataError::NotFound("field".into()));
        assert_err!(result);
        assert_err_variant!(result, StrataError::NotFound(_));
    }

    #[test]
    #[should_panic(expected = "expected StrataError::Conflict")]
    fn test_assert_err_variant_wrong_variant() {
        let result: Result<(), StrataError> = Err(StrataError::NotFound("field".into()));
        assert_err_variant!(result, StrataError::Conflict(_));
    }

    #[test]
    fn test_assert_fields() {
        let reg = registry();
        assert_fields!(reg, "logs", ["operator", "module"]);
    }

    #[test]
    #[should_panic(expected = "field order mismatch")]
    fn test_assert_fields_wrong_order() {
        let reg = registry();
        assert_fields!(reg, "logs", ["module", "operator"]);
    }

    #[test]
    fn test_error_helpers() {
        let err = StrataError::transformation("m", StrataError::NotFound("field 'x'".into()));
        assert!(is_not_found(&err));
        assert!(error_contains(&err, "field 'x'"));
        assert!(!is_not_found(&StrataError::Conflict("x".into())));
    }
}
