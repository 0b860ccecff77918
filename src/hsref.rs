use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Returns true if the given string is a valid ref name: one or more
/// characters from the set `[A-Za-z0-9_:\-.~]`.
pub fn is_ref_name<T: AsRef<str>>(s: T) -> bool {
    let s = s.as_ref();
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-' | '.' | '~'))
}

/// A Haystack Ref: an identifier referring to another entity, with an
/// optional human-readable display value.
///
/// Two refs are equal only if both the name and the display value are
/// equal; ordering considers the name alone.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Ref {
    name: String,
    dis: Option<String>,
}

impl Ref {
    /// Create a new `Ref`. The name is validated at construction time.
    ///
    /// # Example
    /// ```rust
    /// use hayrack::Ref;
    /// let hsref = Ref::new("p:demo:r:1e85e02f".to_owned(), None).unwrap();
    /// assert_eq!(hsref.name(), "p:demo:r:1e85e02f");
    /// ```
    pub fn new(name: String, dis: Option<String>) -> Result<Self, ParseRefError> {
        if is_ref_name(&name) {
            Ok(Ref { name, dis })
        } else {
            Err(ParseRefError { unparsable_ref: name })
        }
    }

    /// Return the identifier part of this ref, without any `@` prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the display value of this ref, if present.
    pub fn dis(&self) -> Option<&str> {
        self.dis.as_deref()
    }

    /// Return true if this ref carries a display value.
    pub fn has_dis(&self) -> bool {
        self.dis.is_some()
    }

    /// Return this ref in the encoded JSON string form `r:<name>[ <dis>]`.
    pub fn to_encoded_json_string(&self) -> String {
        match &self.dis {
            Some(dis) => format!("r:{} {}", self.name, dis),
            None => format!("r:{}", self.name),
        }
    }

    /// Parse a `Ref` from the encoded JSON string form `r:<name>[ <dis>]`.
    pub fn from_encoded_json_string(s: &str) -> Result<Self, ParseRefError> {
        let trimmed = s.strip_prefix("r:").ok_or_else(|| ParseRefError {
            unparsable_ref: s.to_owned(),
        })?;
        let mut split = trimmed.splitn(2, ' ');
        let name = split.next().unwrap_or("");
        let dis = split.next().map(|d| d.to_owned());
        Ref::new(name.to_owned(), dis)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dis {
            Some(dis) => write!(f, "@{} {:?}", self.name, dis),
            None => write!(f, "@{}", self.name),
        }
    }
}

impl PartialOrd for Ref {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ref {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// An error indicating that a `Ref` could not be parsed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("Could not parse a Ref from the string '{unparsable_ref}'")]
pub struct ParseRefError {
    unparsable_ref: String,
}

#[cfg(test)]
mod test {
    use super::{is_ref_name, Ref};

    #[test]
    fn ref_names() {
        assert!(is_ref_name("abc-123"));
        assert!(is_ref_name("p:demo:r:1e85e02f-1a80b091"));
        assert!(is_ref_name("a.b~c_d"));
        assert!(!is_ref_name(""));
        assert!(!is_ref_name("has space"));
        assert!(!is_ref_name("@abc"));
    }

    #[test]
    fn equality_includes_dis() {
        let bare = Ref::new("abc".to_owned(), None).unwrap();
        let with_dis = Ref::new("abc".to_owned(), Some("Boiler 1".to_owned())).unwrap();
        assert_ne!(bare, with_dis);
        assert_eq!(bare, Ref::new("abc".to_owned(), None).unwrap());
    }

    #[test]
    fn ordering_uses_name_only() {
        let a = Ref::new("aaa".to_owned(), Some("Z".to_owned())).unwrap();
        let b = Ref::new("bbb".to_owned(), Some("A".to_owned())).unwrap();
        assert!(a < b);
    }

    #[test]
    fn json_encoding_round_trips() {
        let with_dis = Ref::new("abc".to_owned(), Some("Boiler 1".to_owned())).unwrap();
        assert_eq!(with_dis.to_encoded_json_string(), "r:abc Boiler 1");
        assert_eq!(
            Ref::from_encoded_json_string("r:abc Boiler 1").unwrap(),
            with_dis
        );

        let bare = Ref::from_encoded_json_string("r:abc").unwrap();
        assert_eq!(bare.to_encoded_json_string(), "r:abc");
        assert!(!bare.has_dis());
    }

    #[test]
    fn invalid_name_is_a_construction_failure() {
        assert!(Ref::new("not a ref".to_owned(), None).is_err());
        assert!(Ref::from_encoded_json_string("x:abc").is_err());
    }

    #[test]
    fn display_form() {
        let hsref = Ref::new("abc".to_owned(), Some("Boiler 1".to_owned())).unwrap();
        assert_eq!(hsref.to_string(), "@abc \"Boiler 1\"");
    }
}
