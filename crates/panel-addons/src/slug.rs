use std::fmt;

use crate::error::InstallError;

/// URL- and filesystem-safe addon identifier.
///
/// A valid slug starts with an ASCII letter or digit and continues with
/// letters, digits, `-`, or `_`. Path separators, traversal sequences,
/// and anything else are rejected at parse time, before any I/O happens,
/// so a `Slug` can be joined onto the addons root without escaping it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn parse(input: &str) -> Result<Self, InstallError> {
        let mut chars = input.chars();

        let valid = match chars.next() {
            Some(first) => {
                first.is_ascii_alphanumeric()
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            }
            None => false,
        };

        if !valid {
            return Err(InstallError::InvalidSlug(input.to_owned()));
        }

        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
