use std::backtrace::Backtrace;
use rocket::http::Status;
use rocket::response::status::Custom;

pub(crate) fn sqlx_to_custom_error(err: sqlx::Error) -> Custom<String> {
    if let sqlx::Error::RowNotFound = err {
        return Custom(Status::NotFound, String::from("Record not found"));
    }
    error!("SQL Error: {err}\nbacktrace: {}", Backtrace::capture());
    Custom(Status::InternalServerError, format!("SQLx error: {}", err))
}
pub(crate) fn anyhow_to_custom_error(err: anyhow::Error) -> Custom<String> {
    error!("Error: {err}\nbacktrace: {}", Backtrace::capture());
    Custom(Status::InternalServerError, format!("Error: {}", err))
}
pub(crate) fn not_found(what: impl std::fmt::Display) -> Custom<String> {
    Custom(Status::NotFound, format!("{what} not found"))
}

/// Form-style truthiness, the same spellings Rocket accepts for `bool` form fields.
pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "on" | "true" | "yes" | "1")
}

/// Strips surrounding whitespace in place, text form fields are cleaned this way before validation.
pub(crate) fn strip(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

#[cfg(test)]
mod test {
    use super::{is_truthy, strip};

    #[test]
    fn test_is_truthy() {
        for s in ["on", "true", "TRUE", "yes", "1"] {
            assert!(is_truthy(s), "{s}");
        }
        for s in ["", "off", "false", "no", "0", "x"] {
            assert!(!is_truthy(s), "{s}");
        }
    }

    #[test]
    fn test_strip() {
        let mut s = String::from("  123 Main St \n");
        strip(&mut s);
        assert_eq!(s, "123 Main St");
        let mut s = String::from(" \t ");
        strip(&mut s);
        assert_eq!(s, "");
    }
}
