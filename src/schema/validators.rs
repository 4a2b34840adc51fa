use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

pub const KEY_SET_ID_PREFIX: &str = "B2C_1A_";

pub static KEY_SET_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^B2C_1A_[a-zA-Z]+$").expect("valid key set id pattern"));

pub static KEY_SET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").expect("valid key set name pattern"));

pub const KEY_SET_ID_MESSAGE: &str =
    "must be prefixed with B2C_1A_ and must contain only alphanumeric characters";
pub const KEY_SET_NAME_MESSAGE: &str = "must contain only alphanumeric characters";

/// Single-value check applied to a configured string.
#[derive(Debug, Clone)]
pub enum Validator {
    Matches {
        pattern: &'static Lazy<Regex>,
        message: &'static str,
    },
    OneOf(&'static [&'static str]),
    LengthAtMost(usize),
}

impl Validator {
    pub fn key_set_id() -> Self {
        Validator::Matches {
            pattern: &KEY_SET_ID,
            message: KEY_SET_ID_MESSAGE,
        }
    }

    pub fn key_set_name() -> Self {
        Validator::Matches {
            pattern: &KEY_SET_NAME,
            message: KEY_SET_NAME_MESSAGE,
        }
    }

    /// Returns the failure detail, if any.
    pub fn check(&self, value: &str) -> Option<String> {
        match self {
            Validator::Matches { pattern, message } => {
                (!pattern.is_match(value)).then(|| format!("{message}, got: {value}"))
            }
            Validator::OneOf(allowed) => (!allowed.contains(&value))
                .then(|| format!("value must be one of: {allowed:?}, got: {value:?}")),
            Validator::LengthAtMost(max) => {
                let length = value.chars().count();
                (length > *max)
                    .then(|| format!("string length must be at most {max}, got: {length}"))
            }
        }
    }
}

impl Serialize for Validator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Validator::Matches { pattern, message } => {
                map.serialize_entry("regex", pattern.as_str())?;
                map.serialize_entry("message", message)?;
            }
            Validator::OneOf(allowed) => {
                map.serialize_entry("one_of", allowed)?;
            }
            Validator::LengthAtMost(max) => {
                map.serialize_entry("length_at_most", max)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_set_id_requires_prefix() {
        let validator = Validator::key_set_id();
        assert!(validator.check("B2C_1A_TestContainer").is_none());
        let detail = validator.check("TestContainer").expect("rejected");
        assert!(detail.starts_with(KEY_SET_ID_MESSAGE));
        assert!(validator.check("B2C_1A_Test_Container").is_some());
    }

    #[test]
    fn key_set_name_is_letters_only() {
        let validator = Validator::key_set_name();
        assert!(validator.check("Signing").is_none());
        assert!(validator.check("Signing2").is_some());
        assert!(validator.check("").is_some());
    }

    #[test]
    fn one_of_is_case_sensitive() {
        let validator = Validator::OneOf(&["sig", "enc"]);
        assert!(validator.check("sig").is_none());
        assert!(validator.check("SIG").is_some());
    }

    #[test]
    fn length_counts_characters() {
        let validator = Validator::LengthAtMost(3);
        assert!(validator.check("äöü").is_none());
        assert!(validator.check("abcd").is_some());
    }
}
