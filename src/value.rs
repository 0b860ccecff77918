use crate::coord::Coord;
use crate::grid::Grid;
use crate::hsref::Ref;
use crate::number::Number;
use crate::tag::TagName;
use crate::xstr::XStr;
use chrono::DateTime;
use chrono_tz::Tz;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A `Dict` maps tag names to values. Iteration order is deterministic
/// (sorted by tag name) and equality ignores insertion order.
pub type Dict = BTreeMap<TagName, Value>;

/// A Haystack value: one of the closed set of scalar types, or a
/// `List`, `Dict` or nested `Grid`.
///
/// Equality is structural and value-preserving across codecs. The
/// string types (`Str`, `Uri`, `Bin`) are never equal to one another
/// even when the underlying text matches. The `Display` form is the
/// zinc literal, which is the canonical form for logging.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The absence of a value in a cell.
    Null,
    /// The singleton "tag present" sentinel.
    Marker,
    /// The singleton "not available" sentinel.
    Na,
    /// The singleton "delete this tag" sentinel, used in diff grids.
    Remove,
    Bool(bool),
    Number(Number),
    Str(String),
    /// Unicode text distinguished by type from `Str`.
    Uri(String),
    Ref(Ref),
    Date(chrono::NaiveDate),
    Time(chrono::NaiveTime),
    /// An instant with a time zone designator.
    DateTime(DateTime<Tz>),
    Coord(Coord),
    XStr(XStr),
    /// A MIME type tag, distinguished by type from `Str`.
    Bin(String),
    List(Vec<Value>),
    Dict(Dict),
    Grid(Box<Grid>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Value::Marker)
    }

    pub fn is_na(&self) -> bool {
        matches!(self, Value::Na)
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Value::Remove)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// The underlying float of a `Number`, for comparison convenience.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(|n| n.value())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Value::Uri(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_hs_ref(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<chrono::NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<chrono::NaiveTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<&DateTime<Tz>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_coord(&self) -> Option<&Coord> {
        match self {
            Value::Coord(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_xstr(&self) -> Option<&XStr> {
        match self {
            Value::XStr(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_bin(&self) -> Option<&str> {
        match self {
            Value::Bin(mime) => Some(mime),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_grid(&self) -> Option<&Grid> {
        match self {
            Value::Grid(g) => Some(g),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::zinc::dump_scalar(self))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null | Value::Marker | Value::Na | Value::Remove => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => n.hash_into(state),
            Value::Str(s) => s.hash(state),
            Value::Uri(u) => u.hash(state),
            Value::Ref(r) => r.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Time(t) => t.hash(state),
            Value::DateTime(dt) => {
                // Hash the instant only: equal instants in different
                // zones compare equal.
                dt.timestamp().hash(state);
                dt.timestamp_subsec_nanos().hash(state);
            }
            Value::Coord(c) => c.hash_into(state),
            Value::XStr(x) => x.hash(state),
            Value::Bin(mime) => mime.hash(state),
            Value::List(items) => items.hash(state),
            Value::Dict(dict) => dict.hash(state),
            Value::Grid(grid) => grid.hash(state),
        }
    }
}

impl PartialOrd for Value {
    /// The natural ordering of the scalar types, where one is defined.
    /// Values of different types are not comparable, and neither are
    /// numbers with differing units.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Uri(a), Value::Uri(b)) => a.partial_cmp(b),
            (Value::Ref(a), Value::Ref(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            (Value::Time(a), Value::Time(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::from_value(value))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl From<Coord> for Value {
    fn from(c: Coord) -> Self {
        Value::Coord(c)
    }
}

impl From<XStr> for Value {
    fn from(x: XStr) -> Self {
        Value::XStr(x)
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(d: chrono::NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<chrono::NaiveTime> for Value {
    fn from(t: chrono::NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<DateTime<Tz>> for Value {
    fn from(dt: DateTime<Tz>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Dict> for Value {
    fn from(dict: Dict) -> Self {
        Value::Dict(dict)
    }
}

impl From<Grid> for Value {
    fn from(grid: Grid) -> Self {
        Value::Grid(Box::new(grid))
    }
}

#[cfg(test)]
mod test {
    use super::Value;
    use crate::hsref::Ref;
    use crate::number::Number;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn string_types_are_disjoint() {
        let s = "http://example.com";
        assert_ne!(Value::Str(s.to_owned()), Value::Uri(s.to_owned()));
        assert_ne!(Value::Str(s.to_owned()), Value::Bin(s.to_owned()));
        assert_ne!(Value::Uri(s.to_owned()), Value::Bin(s.to_owned()));
    }

    #[test]
    fn singletons_are_equal_to_their_clones() {
        assert_eq!(Value::Marker, Value::Marker.clone());
        assert_eq!(Value::Na, Value::Na.clone());
        assert_eq!(Value::Remove, Value::Remove.clone());
        assert_ne!(Value::Marker, Value::Na);
    }

    #[test]
    fn equal_values_hash_equally() {
        let a = Value::Number(Number::new(42.0, Some("kW".to_owned())));
        let b = Value::Number(Number::new(42.0, Some("kW".to_owned())));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let r1 = Value::Ref(Ref::new("abc".to_owned(), Some("Boiler".to_owned())).unwrap());
        let r2 = Value::Ref(Ref::new("abc".to_owned(), Some("Boiler".to_owned())).unwrap());
        assert_eq!(hash_of(&r1), hash_of(&r2));

        let zero = Value::from(0.0);
        let neg_zero = Value::from(-0.0);
        assert_eq!(zero, neg_zero);
        assert_eq!(hash_of(&zero), hash_of(&neg_zero));
    }

    #[test]
    fn cross_type_comparison_is_undefined() {
        let number = Value::from(42.0);
        let string = Value::from("42");
        assert_eq!(number.partial_cmp(&string), None);

        let kw = Value::Number(Number::new(1.0, Some("kW".to_owned())));
        let pct = Value::Number(Number::new(1.0, Some("%".to_owned())));
        assert_eq!(kw.partial_cmp(&pct), None);
    }

    #[test]
    fn accessors() {
        let value = Value::from("hello");
        assert_eq!(value.as_str(), Some("hello"));
        assert_eq!(value.as_uri(), None);
        assert_eq!(Value::from(1.5).as_f64(), Some(1.5));
        assert!(Value::Marker.is_marker());
        assert!(!Value::Marker.is_na());
    }
}
