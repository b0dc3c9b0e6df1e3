//! Agent and action name validation.
//!
//! Names end up as path components when scripts and schemas are located
//! on disk, so they are restricted to a conservative character set.

use std::fmt;

/// Longest accepted agent or action name.
pub const MAX_NAME_LEN: usize = 64;

/// Error returned when an agent or action name is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidName {
    /// The name is empty
    Empty,
    /// The name is longer than [`MAX_NAME_LEN`]
    TooLong {
        /// Length of the rejected name
        len: usize,
    },
    /// The name contains a character outside `[A-Za-z0-9_-]`
    InvalidCharacter {
        /// The rejected name
        name: String,
        /// The first offending character
        character: char,
    },
}

impl fmt::Display for InvalidName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::TooLong { len } => {
                write!(f, "name is {len} characters long (max {MAX_NAME_LEN})")
            }
            Self::InvalidCharacter { name, character } => {
                write!(
                    f,
                    "name '{name}' contains invalid character '{character}'; \
                     only ASCII letters, digits, '_' and '-' are allowed"
                )
            }
        }
    }
}

impl std::error::Error for InvalidName {}

/// Validates an agent or action name.
///
/// # Errors
///
/// Returns an [`InvalidName`] describing the first rule the name breaks.
pub fn validate_name(name: &str) -> Result<(), InvalidName> {
    if name.is_empty() {
        return Err(InvalidName::Empty);
    }

    if name.len() > MAX_NAME_LEN {
        return Err(InvalidName::TooLong { len: name.len() });
    }

    if let Some(character) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(InvalidName::InvalidCharacter {
            name: name.to_string(),
            character,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        for name in ["package", "install", "puppet_run", "rpc-util", "A1"] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(validate_name(""), Err(InvalidName::Empty));
    }

    #[test]
    fn rejects_path_components() {
        for name in ["..", "a/b", "a\\b", "pkg.install", "name with space"] {
            assert!(
                matches!(validate_name(name), Err(InvalidName::InvalidCharacter { .. })),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong() {
        let name = "a".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(validate_name(&name), Err(InvalidName::TooLong { .. })));
        assert!(validate_name(&"a".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn rejects_non_ascii() {
        let result = validate_name("paquet\u{e9}");
        assert!(matches!(
            result,
            Err(InvalidName::InvalidCharacter { character: '\u{e9}', .. })
        ));
    }

    #[test]
    fn error_display_names_the_character() {
        let err = validate_name("a/b").unwrap_err();
        assert!(err.to_string().contains("'/'"));
    }
}
