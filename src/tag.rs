use std::fmt;
use thiserror::Error;

/// Returns true if the given string is a valid Haystack tag name:
/// a lowercase letter followed by letters, digits or underscores.
pub fn is_tag_name<T: AsRef<str>>(s: T) -> bool {
    let s = s.as_ref();
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A wrapper around a string which is a valid Haystack tag name.
/// Tag names are used for grid columns and for the keys of a `Dict`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TagName(String);

impl TagName {
    /// Create a new `TagName`.
    ///
    /// # Example
    /// ```rust
    /// use hayrack::TagName;
    /// let tag_name = TagName::new("siteRef".to_owned()).unwrap();
    /// assert_eq!(tag_name.as_ref(), "siteRef");
    /// ```
    pub fn new(s: String) -> Result<Self, ParseTagNameError> {
        if is_tag_name(&s) {
            Ok(TagName(s))
        } else {
            Err(ParseTagNameError { unparsable_tag_name: s })
        }
    }

    /// Consume this `TagName` and return the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for TagName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An error indicating that a string is not a valid tag name.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("Could not parse a tag name from the string '{unparsable_tag_name}'")]
pub struct ParseTagNameError {
    unparsable_tag_name: String,
}

#[cfg(test)]
mod test {
    use super::{is_tag_name, TagName};

    #[test]
    fn valid_tag_names() {
        assert!(is_tag_name("site"));
        assert!(is_tag_name("siteRef"));
        assert!(is_tag_name("geoCity2"));
        assert!(is_tag_name("a"));
        assert!(is_tag_name("under_score"));
    }

    #[test]
    fn invalid_tag_names() {
        assert!(!is_tag_name(""));
        assert!(!is_tag_name("Site"));
        assert!(!is_tag_name("2site"));
        assert!(!is_tag_name("bad-tag"));
        assert!(!is_tag_name("bad tag"));
        assert!(!is_tag_name("°C"));
    }

    #[test]
    fn new_rejects_bad_names() {
        assert!(TagName::new("BadTagName".to_owned()).is_err());
        let tag = TagName::new("goodTagName".to_owned()).unwrap();
        assert_eq!(tag.to_string(), "goodTagName");
    }
}
