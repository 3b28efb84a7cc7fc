//! Request-scoped validation of submitted forms.
//!
//! A [`Validator`] collects one message per offending field plus any number of
//! form-level messages. The free functions are the checks handlers feed into
//! [`Validator::check_field`].

use regex::Regex;
use std::{collections::HashMap, sync::LazyLock};

/// Syntactic sanity check for email addresses. Says nothing about deliverability.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

#[derive(Debug, Default, Clone)]
pub struct Validator {
    field_errors: HashMap<String, String>,
    non_field_errors: Vec<String>,
}

impl Validator {
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` for `field` unless the field already has one.
    pub fn add_field_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

/// Forms that carry a [`Validator`]. The provided methods delegate to it.
pub trait Validated {
    fn validator(&self) -> &Validator;
    fn validator_mut(&mut self) -> &mut Validator;

    fn valid(&self) -> bool {
        self.validator().valid()
    }

    fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        self.validator_mut().check_field(ok, field, message);
    }

    fn add_field_error(&mut self, field: &str, message: &str) {
        self.validator_mut().add_field_error(field, message);
    }

    fn add_non_field_error(&mut self, message: &str) {
        self.validator_mut().add_non_field_error(message);
    }

    fn field_error(&self, field: &str) -> Option<&str> {
        self.validator().field_error(field)
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True if `value` holds at most `n` characters (code points, not bytes).
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True if `value` holds at least `n` characters (code points, not bytes).
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn permitted_value<T: PartialEq>(value: T, permitted: &[T]) -> bool {
    permitted.contains(&value)
}

pub fn permitted_int(value: i64, permitted: &[i64]) -> bool {
    permitted_value(value, permitted)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}
