//! The Haystack filter language: a predicate over a single entity,
//! with path traversal through refs.
//!
//! ```text
//! filter   := or
//! or       := and  ("or"  and)*
//! and      := term ("and" term)*
//! term     := "not"? atom
//! atom     := "(" filter ")" | path (op scalar)?
//! op       := "==" | "!=" | "<" | "<=" | ">" | ">="
//! path     := id ("->" id)*
//! ```

use crate::err::ParseError;
use crate::hsref::Ref;
use crate::tag::TagName;
use crate::value::{Dict, Value};
use crate::zinc::{scan_scalar, scan_tag_name, Scanner};
use std::fmt;

/// A parsed filter expression.
///
/// # Example
/// ```rust
/// use hayrack::Filter;
///
/// let filter = Filter::parse("site and area > 1000m²").unwrap();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    expr: Expr,
}

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Has(Path),
    Cmp(Path, CmpOp, Value),
}

/// A tag path: one or more tag names joined by `->`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Path {
    segments: Vec<TagName>,
}

impl Path {
    pub fn segments(&self) -> &[TagName] {
        &self.segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.segments.iter().map(|seg| seg.as_ref()).collect();
        write!(f, "{}", parts.join("->"))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Filter {
    /// Parse a filter expression.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let mut scanner = Scanner::new(s);
        scanner.skip_spaces();
        let expr = parse_or(&mut scanner)?;
        scanner.skip_spaces();
        if !scanner.at_end() {
            return Err(scanner.error("unexpected content after filter"));
        }
        Ok(Filter { expr })
    }

    /// Evaluate this filter against an entity, with no ref resolution:
    /// any path that needs to traverse a ref evaluates to false.
    pub fn matches(&self, entity: &Dict) -> bool {
        self.matches_with(entity, &|_| None)
    }

    /// Evaluate this filter against an entity, resolving refs through
    /// the given lookup. A ref the lookup cannot resolve is not an
    /// error; the enclosing predicate is simply false.
    pub fn matches_with(&self, entity: &Dict, resolve: &dyn Fn(&Ref) -> Option<Dict>) -> bool {
        eval(&self.expr, entity, resolve)
    }
}

fn parse_or(s: &mut Scanner) -> Result<Expr, ParseError> {
    let mut left = parse_and(s)?;
    loop {
        s.skip_spaces();
        if !eat_keyword(s, "or") {
            return Ok(left);
        }
        s.skip_spaces();
        let right = parse_and(s)?;
        left = Expr::Or(Box::new(left), Box::new(right));
    }
}

fn parse_and(s: &mut Scanner) -> Result<Expr, ParseError> {
    let mut left = parse_term(s)?;
    loop {
        s.skip_spaces();
        if !eat_keyword(s, "and") {
            return Ok(left);
        }
        s.skip_spaces();
        let right = parse_term(s)?;
        left = Expr::And(Box::new(left), Box::new(right));
    }
}

fn parse_term(s: &mut Scanner) -> Result<Expr, ParseError> {
    s.skip_spaces();
    if eat_keyword(s, "not") {
        s.skip_spaces();
        let inner = parse_term(s)?;
        return Ok(Expr::Not(Box::new(inner)));
    }
    parse_atom(s)
}

fn parse_atom(s: &mut Scanner) -> Result<Expr, ParseError> {
    s.skip_spaces();
    if s.eat('(') {
        let expr = parse_or(s)?;
        s.skip_spaces();
        s.expect(')')?;
        return Ok(expr);
    }
    let path = parse_path(s)?;
    s.skip_spaces();
    let op = match parse_op(s) {
        Some(op) => op,
        None => return Ok(Expr::Has(path)),
    };
    s.skip_spaces();
    let literal = parse_literal(s)?;
    Ok(Expr::Cmp(path, op, literal))
}

fn parse_path(s: &mut Scanner) -> Result<Path, ParseError> {
    let mut segments = Vec::new();
    loop {
        let segment = scan_tag_name(s)?;
        if is_keyword(segment.as_ref()) {
            return Err(s.error(&format!("'{}' cannot be used as a tag name", segment)));
        }
        segments.push(segment);
        if s.starts_with("->") {
            s.bump();
            s.bump();
        } else {
            return Ok(Path { segments });
        }
    }
}

fn parse_op(s: &mut Scanner) -> Option<CmpOp> {
    const OPS: &[(&str, CmpOp)] = &[
        ("==", CmpOp::Eq),
        ("!=", CmpOp::Ne),
        ("<=", CmpOp::Le),
        (">=", CmpOp::Ge),
        ("<", CmpOp::Lt),
        (">", CmpOp::Gt),
    ];
    for (text, op) in OPS {
        if s.starts_with(text) {
            for _ in 0..text.len() {
                s.bump();
            }
            return Some(*op);
        }
    }
    None
}

fn parse_literal(s: &mut Scanner) -> Result<Value, ParseError> {
    // The filter grammar spells booleans out, unlike zinc's T and F.
    if eat_keyword(s, "true") {
        return Ok(Value::Bool(true));
    }
    if eat_keyword(s, "false") {
        return Ok(Value::Bool(false));
    }
    scan_scalar(s, 0)
}

fn is_keyword(word: &str) -> bool {
    matches!(word, "and" | "or" | "not" | "true" | "false")
}

fn eat_keyword(s: &mut Scanner, keyword: &str) -> bool {
    if !s.starts_with(keyword) {
        return false;
    }
    if let Some(c) = s.peek_at(keyword.len()) {
        if c.is_ascii_alphanumeric() || c == '_' {
            return false;
        }
    }
    for _ in 0..keyword.len() {
        s.bump();
    }
    true
}

fn eval(expr: &Expr, entity: &Dict, resolve: &dyn Fn(&Ref) -> Option<Dict>) -> bool {
    match expr {
        Expr::And(left, right) => eval(left, entity, resolve) && eval(right, entity, resolve),
        Expr::Or(left, right) => eval(left, entity, resolve) || eval(right, entity, resolve),
        Expr::Not(inner) => !eval(inner, entity, resolve),
        Expr::Has(path) => {
            path_value(path, entity, resolve).map_or(false, |value| !value.is_null())
        }
        Expr::Cmp(path, op, literal) => match path_value(path, entity, resolve) {
            Some(value) if !value.is_null() => compare(&value, *op, literal),
            // A missing (or explicitly Null) tag satisfies no comparison.
            _ => false,
        },
    }
}

/// Walk a path from the entity. Intermediate segments must be refs and
/// must resolve; the final segment's value is returned as-is.
fn path_value(path: &Path, entity: &Dict, resolve: &dyn Fn(&Ref) -> Option<Dict>) -> Option<Value> {
    let mut current = entity.clone();
    let last = path.segments.len() - 1;
    for (index, segment) in path.segments.iter().enumerate() {
        let value = current.get(segment.as_ref())?.clone();
        if index == last {
            return Some(value);
        }
        match value {
            Value::Ref(hsref) => current = resolve(&hsref)?,
            _ => return None,
        }
    }
    None
}

fn compare(value: &Value, op: CmpOp, literal: &Value) -> bool {
    use std::cmp::Ordering;
    match op {
        CmpOp::Eq => value == literal,
        CmpOp::Ne => value != literal,
        CmpOp::Lt => value.partial_cmp(literal) == Some(Ordering::Less),
        CmpOp::Le => matches!(
            value.partial_cmp(literal),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
        CmpOp::Gt => value.partial_cmp(literal) == Some(Ordering::Greater),
        CmpOp::Ge => matches!(
            value.partial_cmp(literal),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ),
    }
}

#[cfg(test)]
mod test {
    use super::Filter;
    use crate::hsref::Ref;
    use crate::number::Number;
    use crate::tag::TagName;
    use crate::value::{Dict, Value};
    use std::collections::HashMap;

    fn tag(name: &str) -> TagName {
        TagName::new(name.to_owned()).unwrap()
    }

    fn entity(pairs: Vec<(&str, Value)>) -> Dict {
        pairs
            .into_iter()
            .map(|(name, value)| (tag(name), value))
            .collect()
    }

    fn hsref(name: &str) -> Value {
        Value::Ref(Ref::new(name.to_owned(), None).unwrap())
    }

    #[test]
    fn has_and_missing() {
        let site = entity(vec![("site", Value::Marker), ("area", Value::from(10.0))]);
        assert!(Filter::parse("site").unwrap().matches(&site));
        assert!(!Filter::parse("equip").unwrap().matches(&site));
        assert!(Filter::parse("not equip").unwrap().matches(&site));
        assert!(!Filter::parse("not site").unwrap().matches(&site));
    }

    #[test]
    fn comparisons() {
        let point = entity(vec![
            ("curVal", Value::Number(Number::new(70.5, Some("°F".to_owned())))),
            ("dis", Value::from("Zone Temp")),
        ]);
        let matches = |filter: &str| Filter::parse(filter).unwrap().matches(&point);

        assert!(matches("curVal > 70°F"));
        assert!(matches("curVal >= 70.5°F"));
        assert!(matches("curVal < 71°F"));
        assert!(matches("curVal == 70.5°F"));
        assert!(matches("curVal != 71°F"));
        assert!(matches("dis == \"Zone Temp\""));

        // A unit mismatch makes ordered comparisons false, not errors.
        assert!(!matches("curVal > 70"));
        assert!(!matches("curVal > 70°C"));
        // Disjoint types: == is false, != is true.
        assert!(!matches("dis == 5"));
        assert!(matches("dis != 5"));
        // A missing tag satisfies no comparison.
        assert!(!matches("missingTag == 5"));
        assert!(!matches("missingTag != 5"));
    }

    #[test]
    fn boolean_literals_and_precedence() {
        let point = entity(vec![
            ("enabled", Value::Bool(true)),
            ("kind", Value::from("Bool")),
        ]);
        let matches = |filter: &str| Filter::parse(filter).unwrap().matches(&point);

        assert!(matches("enabled == true"));
        assert!(!matches("enabled == false"));
        // 'and' binds tighter than 'or'.
        assert!(matches("missing and missing or enabled"));
        assert!(!matches("missing and (missing or enabled)"));
        assert!(matches("not (missing and enabled)"));
    }

    #[test]
    fn path_traversal() {
        let equip = entity(vec![
            ("site", Value::Marker),
            ("equipRef", hsref("eq1")),
        ]);
        let mut others: HashMap<String, Dict> = HashMap::new();
        others.insert(
            "eq1".to_owned(),
            entity(vec![("siteRef", hsref("s1"))]),
        );
        others.insert(
            "s1".to_owned(),
            entity(vec![("geoCity", Value::from("Chicago"))]),
        );

        let resolve = |r: &Ref| others.get(r.name()).cloned();
        let filter =
            Filter::parse("site and equipRef->siteRef->geoCity == \"Chicago\"").unwrap();
        assert!(filter.matches_with(&equip, &resolve));

        // Different city: false.
        others.get_mut("s1").unwrap().insert(tag("geoCity"), Value::from("Detroit"));
        let resolve = |r: &Ref| others.get(r.name()).cloned();
        assert!(!filter.matches_with(&equip, &resolve));

        // Unresolvable ref: false, not an error.
        let resolve = |_: &Ref| None;
        assert!(!filter.matches_with(&equip, &resolve));
    }

    #[test]
    fn non_ref_intermediate_short_circuits_to_false() {
        let row = entity(vec![("a", Value::from("not a ref"))]);
        let filter = Filter::parse("a->b").unwrap();
        assert!(!filter.matches_with(&row, &|_| Some(Dict::new())));
    }

    #[test]
    fn filter_monotonicity() {
        let rows: Vec<Dict> = (0..20)
            .map(|i| {
                let mut row = entity(vec![("index", Value::from(i as f64))]);
                if i % 2 == 0 {
                    row.insert(tag("even"), Value::Marker);
                }
                if i % 3 == 0 {
                    row.insert(tag("third"), Value::Marker);
                }
                row
            })
            .collect();

        let count = |filter: &str| {
            let filter = Filter::parse(filter).unwrap();
            rows.iter().filter(|row| filter.matches(row)).count()
        };

        assert!(count("even and third") <= count("even"));
        assert!(count("even or third") >= count("even"));
    }

    #[test]
    fn ref_literals() {
        let row = entity(vec![("siteRef", hsref("s1"))]);
        assert!(Filter::parse("siteRef == @s1").unwrap().matches(&row));
        assert!(!Filter::parse("siteRef == @s2").unwrap().matches(&row));
    }

    #[test]
    fn malformed_filters_are_parse_errors() {
        assert!(Filter::parse("").is_err());
        assert!(Filter::parse("site and").is_err());
        assert!(Filter::parse("site ==").is_err());
        assert!(Filter::parse("(site").is_err());
        assert!(Filter::parse("site or or equip").is_err());
        assert!(Filter::parse("and site").is_err());
        assert!(Filter::parse("Site").is_err());
    }

    #[test]
    fn keywords_are_reserved() {
        assert!(Filter::parse("not").is_err());
        assert!(Filter::parse("true").is_err());
    }
}
