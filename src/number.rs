use crate::unit::canonical_unit;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// A Haystack Number: a 64-bit float with an optional unit label.
///
/// Units are opaque strings unless a unit registry has been installed
/// (see [`install_unit_registry`](crate::install_unit_registry)), in
/// which case unit labels are canonicalized before being compared. The
/// wire form always carries the original label.
///
/// Two numbers are equal only if their values and their units compare
/// equal; `NaN` never equals itself.
#[derive(Clone, Debug)]
pub struct Number {
    value: f64,
    unit: Option<String>,
}

impl Number {
    pub fn new(value: f64, unit: Option<String>) -> Self {
        Self { value, unit }
    }

    /// A unitless number.
    pub fn from_value(value: f64) -> Self {
        Self { value, unit: None }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Return this number in the zinc literal form, for example `42°C`,
    /// `-1.5`, `INF` or `NaN`. The unit is appended with no separator.
    pub fn to_zinc_string(&self) -> String {
        let value = match special_form(self.value) {
            Some(special) => special.to_owned(),
            None => format!("{}", self.value),
        };
        match &self.unit {
            Some(unit) => format!("{}{}", value, unit),
            None => value,
        }
    }

    /// Return this number in the encoded JSON string form, for example
    /// `n:42 °C` or `n:-INF`.
    pub fn to_encoded_json_string(&self) -> String {
        let value = match special_form(self.value) {
            Some(special) => special.to_owned(),
            None => format!("{}", self.value),
        };
        match &self.unit {
            Some(unit) => format!("n:{} {}", value, unit),
            None => format!("n:{}", value),
        }
    }

    /// Parse a `Number` from the encoded JSON string form `n:<value> <unit?>`.
    pub fn from_encoded_json_string(json_string: &str) -> Result<Self, ParseNumberError> {
        let body = json_string
            .strip_prefix("n:")
            .unwrap_or(json_string)
            .trim();
        let mut split = body.splitn(2, ' ');
        let number_str = split.next().unwrap_or("");
        let unit = split.next().map(|unit| unit.trim().to_owned());

        let value = match number_str {
            "INF" => f64::INFINITY,
            "-INF" => f64::NEG_INFINITY,
            "NaN" => f64::NAN,
            other => other
                .parse()
                .map_err(|_| ParseNumberError::from_str(body))?,
        };
        Ok(Number::new(value, unit))
    }

    fn canonical_unit(&self) -> Option<String> {
        self.unit.as_deref().map(canonical_unit)
    }

    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        // Normalize -0.0 so that equal values hash equally.
        let value = if self.value == 0.0 { 0.0 } else { self.value };
        value.to_bits().hash(state);
        self.canonical_unit().hash(state);
    }
}

fn special_form(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("INF")
    } else if value == f64::NEG_INFINITY {
        Some("-INF")
    } else {
        None
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.canonical_unit() == other.canonical_unit()
    }
}

impl PartialOrd for Number {
    /// Numbers are ordered by value when their units agree; numbers
    /// with differing units are not comparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.canonical_unit() == other.canonical_unit() {
            self.value.partial_cmp(&other.value)
        } else {
            None
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_zinc_string())
    }
}

/// An error indicating that a `Number` could not be parsed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("Could not parse a Number from the string '{unparsable_number}'")]
pub struct ParseNumberError {
    unparsable_number: String,
}

impl ParseNumberError {
    pub(crate) fn from_str(s: &str) -> Self {
        Self {
            unparsable_number: s.to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Number;

    #[test]
    fn from_encoded_json_string() {
        let unitless = "n:45.5";
        assert_eq!(
            Number::from_encoded_json_string(unitless).unwrap().value(),
            45.5
        );

        let unit = "n:73.2 °F";
        let number_with_unit = Number::from_encoded_json_string(unit).unwrap();
        assert_eq!(number_with_unit.value(), 73.2);
        assert_eq!(number_with_unit.unit(), Some("°F"));
    }

    #[test]
    fn special_values() {
        assert_eq!(
            Number::from_encoded_json_string("n:INF").unwrap().value(),
            f64::INFINITY
        );
        assert_eq!(
            Number::from_encoded_json_string("n:-INF m")
                .unwrap()
                .to_encoded_json_string(),
            "n:-INF m"
        );
        assert!(Number::from_encoded_json_string("n:NaN")
            .unwrap()
            .value()
            .is_nan());
    }

    #[test]
    fn equality_requires_matching_units() {
        let celsius = Number::new(21.5, Some("°C".to_owned()));
        let fahrenheit = Number::new(21.5, Some("°F".to_owned()));
        let unitless = Number::from_value(21.5);
        assert_ne!(celsius, fahrenheit);
        assert_ne!(celsius, unitless);
        assert_eq!(celsius, celsius.clone());
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        let nan = Number::from_value(f64::NAN);
        assert_ne!(nan, nan.clone());
    }

    #[test]
    fn ordering_across_units_is_undefined() {
        let kw = Number::new(5.0, Some("kW".to_owned()));
        let pct = Number::new(80.0, Some("%".to_owned()));
        assert_eq!(kw.partial_cmp(&pct), None);
        assert!(Number::new(5.0, Some("kW".to_owned())) < Number::new(6.0, Some("kW".to_owned())));
    }

    #[test]
    fn zinc_form() {
        assert_eq!(Number::new(42.0, Some("°C".to_owned())).to_zinc_string(), "42°C");
        assert_eq!(Number::from_value(3.14).to_zinc_string(), "3.14");
        assert_eq!(Number::from_value(f64::NEG_INFINITY).to_zinc_string(), "-INF");
    }
}
