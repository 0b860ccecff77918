//! The JSON codec. JSON has no tag types of its own, so Haystack
//! scalars ride in strings with a two-character type prefix (`"n:42"`,
//! `"r:abc"`, …). Plain strings stay plain unless they would collide
//! with a prefix form, in which case they are dumped with the `s:`
//! prefix.

use crate::coord::Coord;
use crate::err::ParseError;
use crate::grid::Grid;
use crate::hsref::Ref;
use crate::number::Number;
use crate::tag::TagName;
use crate::tz;
use crate::value::{Dict, Value};
use crate::xstr::XStr;
use crate::zinc;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat};
use serde_json::{json, Map, Value as JsonValue};

/// Parse a grid from JSON text.
pub fn parse(s: &str) -> Result<Grid, ParseError> {
    let json: JsonValue = serde_json::from_str(s).map_err(|err| {
        ParseError::new(err.line() as u32, err.column() as u32, err.to_string())
    })?;
    parse_value(&json)
}

/// Parse a grid from an already-deserialized JSON value.
pub fn parse_value(json: &JsonValue) -> Result<Grid, ParseError> {
    let meta = json
        .get("meta")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| ParseError::no_pos("could not find a JSON object for 'meta'".to_owned()))?;
    let cols = json
        .get("cols")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| ParseError::no_pos("could not find a JSON array for 'cols'".to_owned()))?;
    let rows = json
        .get("rows")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| ParseError::no_pos("could not find a JSON array for 'rows'".to_owned()))?;

    let mut grid = Grid::new();
    for (key, value) in meta {
        if key == "ver" {
            let version = value.as_str().ok_or_else(|| {
                ParseError::no_pos("'ver' must be a JSON string".to_owned())
            })?;
            grid.set_version(version.to_owned());
        } else {
            grid.meta_mut().insert(tag_name(key)?, parse_scalar(value)?);
        }
    }

    for col in cols {
        let col = col.as_object().ok_or_else(|| {
            ParseError::no_pos(format!("expected a JSON object for col but found {}", col))
        })?;
        let name = col
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| ParseError::no_pos("col is missing a 'name'".to_owned()))?;
        let mut meta = Dict::new();
        for (key, value) in col {
            if key != "name" {
                meta.insert(tag_name(key)?, parse_scalar(value)?);
            }
        }
        grid.add_column(tag_name(name)?, meta)
            .map_err(|err| ParseError::no_pos(err.to_string()))?;
    }

    for row in rows {
        let row = row.as_object().ok_or_else(|| {
            ParseError::no_pos(format!("expected a JSON object for row but found {}", row))
        })?;
        let mut dict = Dict::new();
        for (key, value) in row {
            dict.insert(tag_name(key)?, parse_scalar(value)?);
        }
        grid.push_row_strict(dict)
            .map_err(|err| ParseError::no_pos(err.to_string()))?;
    }
    Ok(grid)
}

/// Parse a single scalar from its JSON encoding.
pub fn parse_scalar(json: &JsonValue) -> Result<Value, ParseError> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        // Servers in the wild emit raw JSON numbers for unitless values.
        JsonValue::Number(n) => {
            let value = n
                .as_f64()
                .ok_or_else(|| ParseError::no_pos(format!("number {} out of range", n)))?;
            Ok(Value::Number(Number::from_value(value)))
        }
        JsonValue::String(s) => parse_str(s),
        JsonValue::Array(items) => {
            let list = items
                .iter()
                .map(parse_scalar)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(list))
        }
        JsonValue::Object(obj) => {
            if obj.contains_key("meta") && obj.contains_key("cols") && obj.contains_key("rows") {
                return Ok(Value::Grid(Box::new(parse_value(json)?)));
            }
            let mut dict = Dict::new();
            for (key, value) in obj {
                dict.insert(tag_name(key)?, parse_scalar(value)?);
            }
            Ok(Value::Dict(dict))
        }
    }
}

fn tag_name(s: &str) -> Result<TagName, ParseError> {
    TagName::new(s.to_owned()).map_err(|err| ParseError::no_pos(err.to_string()))
}

/// Decode a prefixed JSON string. Strings whose first two characters
/// are not a known prefix are plain Haystack strings.
fn parse_str(s: &str) -> Result<Value, ParseError> {
    let mut chars = s.chars();
    let prefix = match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_ascii() && b == ':' => a,
        _ => return Ok(Value::Str(s.to_owned())),
    };
    let rest = &s[2..];
    match prefix {
        'm' => Ok(Value::Marker),
        'z' => Ok(Value::Na),
        // Legacy remove prefix.
        '-' => Ok(Value::Remove),
        'x' => {
            // "x:" is Remove; a second colon makes it an XStr.
            let mut split = rest.splitn(2, ':');
            match (split.next(), split.next()) {
                (Some(type_name), Some(data)) => {
                    let xstr = XStr::new(&XStr::encoding_for_type_name(type_name), data)
                        .map_err(|err| ParseError::no_pos(err.to_string()))?;
                    Ok(Value::XStr(xstr))
                }
                _ => Ok(Value::Remove),
            }
        }
        'n' => Number::from_encoded_json_string(s)
            .map(Value::Number)
            .map_err(|err| ParseError::no_pos(err.to_string())),
        'r' => Ref::from_encoded_json_string(s)
            .map(Value::Ref)
            .map_err(|err| ParseError::no_pos(err.to_string())),
        's' => Ok(Value::Str(rest.to_owned())),
        'd' => NaiveDate::parse_from_str(rest, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| ParseError::no_pos(format!("invalid date '{}'", rest))),
        'h' => parse_time(rest),
        't' => parse_date_time(rest),
        'u' => Ok(Value::Uri(rest.to_owned())),
        'c' => {
            let mut split = rest.splitn(2, ',');
            let lat = split.next().and_then(|v| v.parse::<f64>().ok());
            let lng = split.next().and_then(|v| v.parse::<f64>().ok());
            match (lat, lng) {
                (Some(lat), Some(lng)) => Ok(Value::Coord(Coord::new(lat, lng))),
                _ => Err(ParseError::no_pos(format!("invalid coord '{}'", rest))),
            }
        }
        'b' => Ok(Value::Bin(rest.to_owned())),
        _ => Ok(Value::Str(s.to_owned())),
    }
}

fn parse_time(s: &str) -> Result<Value, ParseError> {
    const FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M", "%k:%M:%S", "%k:%M"];
    for format in FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(s, format) {
            return Ok(Value::Time(time));
        }
    }
    Err(ParseError::no_pos(format!("invalid time '{}'", s)))
}

fn parse_date_time(s: &str) -> Result<Value, ParseError> {
    let mut split = s.splitn(2, ' ');
    let iso = split.next().unwrap_or("");
    let zone = split.next();

    let fixed = DateTime::parse_from_rfc3339(iso)
        .map_err(|_| ParseError::no_pos(format!("invalid datetime '{}'", iso)))?;
    let tz = match zone {
        Some(name) => tz::time_zone_by_name(name)
            .ok_or_else(|| ParseError::no_pos(format!("unknown time zone '{}'", name)))?,
        None => tz::time_zone_for_offset(fixed.offset().local_minus_utc()),
    };
    Ok(Value::DateTime(fixed.with_timezone(&tz)))
}

/// Dump a grid to its JSON encoding.
pub fn dump(grid: &Grid) -> JsonValue {
    let mut meta = Map::new();
    meta.insert("ver".to_owned(), json!(grid.version()));
    for (name, value) in grid.meta() {
        meta.insert(name.to_string(), dump_scalar(value));
    }

    let cols: Vec<JsonValue> = grid
        .cols()
        .iter()
        .map(|col| {
            let mut obj = Map::new();
            obj.insert("name".to_owned(), json!(col.name().as_ref()));
            for (name, value) in col.meta() {
                obj.insert(name.to_string(), dump_scalar(value));
            }
            JsonValue::Object(obj)
        })
        .collect();

    let rows: Vec<JsonValue> = grid
        .rows()
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for (name, value) in row {
                obj.insert(name.to_string(), dump_scalar(value));
            }
            JsonValue::Object(obj)
        })
        .collect();

    json!({ "meta": meta, "cols": cols, "rows": rows })
}

/// Dump a single scalar to its JSON encoding.
pub fn dump_scalar(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Marker => json!("m:"),
        Value::Na => json!("z:"),
        Value::Remove => json!("x:"),
        Value::Bool(b) => json!(b),
        Value::Number(n) => json!(n.to_encoded_json_string()),
        Value::Str(s) => {
            if is_ambiguous_str(s) {
                json!(format!("s:{}", s))
            } else {
                json!(s)
            }
        }
        Value::Uri(u) => json!(format!("u:{}", u)),
        Value::Ref(r) => json!(r.to_encoded_json_string()),
        Value::Date(d) => json!(format!("d:{}", d.format("%Y-%m-%d"))),
        Value::Time(t) => json!(format!("h:{}", zinc::dump_time(t))),
        Value::DateTime(dt) => json!(format!(
            "t:{} {}",
            dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            tz::short_name(&dt.timezone()),
        )),
        Value::Coord(c) => json!(format!("c:{},{}", c.lat(), c.lng())),
        Value::XStr(x) => json!(format!("x:{}:{}", x.type_name(), x.data_to_string())),
        Value::Bin(mime) => json!(format!("b:{}", mime)),
        Value::List(items) => JsonValue::Array(items.iter().map(dump_scalar).collect()),
        Value::Dict(dict) => {
            let mut obj = Map::new();
            for (name, value) in dict {
                obj.insert(name.to_string(), dump_scalar(value));
            }
            JsonValue::Object(obj)
        }
        Value::Grid(grid) => dump(grid),
    }
}

/// A plain string needs the `s:` prefix when its own first two
/// characters would read as a type prefix.
fn is_ambiguous_str(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(':')) => matches!(
            first,
            'm' | 'z' | 'x' | 'n' | 'r' | 's' | 'd' | 'h' | 't' | 'u' | 'c' | 'b' | '-'
        ),
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::{dump, dump_scalar, parse, parse_scalar};
    use crate::grid::Grid;
    use crate::hsref::Ref;
    use crate::number::Number;
    use crate::tag::TagName;
    use crate::value::{Dict, Value};
    use chrono::TimeZone;
    use chrono_tz::Tz;
    use serde_json::json;

    fn tag(name: &str) -> TagName {
        TagName::new(name.to_owned()).unwrap()
    }

    #[test]
    fn scalar_encodings() {
        let hsref = Ref::new("abc".to_owned(), Some("Boiler 1".to_owned())).unwrap();
        assert_eq!(dump_scalar(&Value::from(hsref)), json!("r:abc Boiler 1"));
        assert_eq!(dump_scalar(&Value::from(3.14)), json!("n:3.14"));
        assert_eq!(
            dump_scalar(&Value::Number(Number::new(
                f64::NEG_INFINITY,
                Some("m".to_owned())
            ))),
            json!("n:-INF m")
        );
        assert_eq!(dump_scalar(&Value::Marker), json!("m:"));
        assert_eq!(dump_scalar(&Value::Na), json!("z:"));
        assert_eq!(dump_scalar(&Value::Remove), json!("x:"));
        assert_eq!(dump_scalar(&Value::Bool(true)), json!(true));
    }

    #[test]
    fn plain_and_prefixed_strings() {
        assert_eq!(dump_scalar(&Value::from("hello")), json!("hello"));
        // A string that collides with a prefix form gets the s: prefix.
        assert_eq!(dump_scalar(&Value::from("n:not a number")), json!("s:n:not a number"));
        // An unknown prefix stays plain.
        assert_eq!(dump_scalar(&Value::from("w:whatever")), json!("w:whatever"));

        assert_eq!(parse_scalar(&json!("s:hello")).unwrap(), Value::from("hello"));
        assert_eq!(parse_scalar(&json!("w:whatever")).unwrap(), Value::from("w:whatever"));
        assert_eq!(parse_scalar(&json!("hello")).unwrap(), Value::from("hello"));
    }

    #[test]
    fn remove_and_xstr_share_a_prefix() {
        assert_eq!(parse_scalar(&json!("x:")).unwrap(), Value::Remove);
        let xstr = parse_scalar(&json!("x:Hex:deadbeef")).unwrap();
        assert_eq!(xstr.as_xstr().unwrap().encoding(), "hex");
        assert_eq!(dump_scalar(&xstr), json!("x:Hex:deadbeef"));
        // Legacy remove prefix is accepted on parse.
        assert_eq!(parse_scalar(&json!("-:")).unwrap(), Value::Remove);
    }

    #[test]
    fn date_time_scalars() {
        let dt = parse_scalar(&json!("t:2015-06-08T15:47:41-04:00 New_York")).unwrap();
        let expected = Tz::America__New_York.ymd(2015, 6, 8).and_hms(15, 47, 41);
        assert_eq!(dt, Value::DateTime(expected));
        assert_eq!(
            dump_scalar(&dt),
            json!("t:2015-06-08T15:47:41-04:00 New_York")
        );

        assert_eq!(
            parse_scalar(&json!("d:2014-12-01")).unwrap(),
            Value::Date(chrono::NaiveDate::from_ymd(2014, 12, 1))
        );
        assert_eq!(
            parse_scalar(&json!("h:23:59")).unwrap(),
            Value::Time(chrono::NaiveTime::from_hms(23, 59, 0))
        );
        assert_eq!(
            parse_scalar(&json!("h:3:59:15")).unwrap(),
            Value::Time(chrono::NaiveTime::from_hms(3, 59, 15))
        );
    }

    #[test]
    fn raw_json_values_are_accepted() {
        assert_eq!(parse_scalar(&json!(42)).unwrap(), Value::from(42.0));
        assert_eq!(parse_scalar(&json!(null)).unwrap(), Value::Null);
        assert_eq!(parse_scalar(&json!(false)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn grid_round_trip() {
        let mut grid = Grid::new();
        grid.meta_mut().insert(tag("watchId"), Value::from("w-1"));
        let mut row = Dict::new();
        row.insert(tag("id"), Value::from(Ref::new("a".to_owned(), None).unwrap()));
        row.insert(tag("site"), Value::Marker);
        row.insert(tag("area"), Value::Number(Number::new(100.0, Some("m²".to_owned()))));
        grid.push_row(row);

        let json = dump(&grid);
        assert_eq!(json["meta"]["ver"], json!("3.0"));
        let round_tripped = parse(&grid.to_json_string()).unwrap();
        assert_eq!(round_tripped, grid);
    }

    #[test]
    fn nested_structures_round_trip() {
        let mut inner = Grid::new();
        inner.push_row([(tag("a"), Value::from(1.0))].iter().cloned().collect::<Dict>());

        let mut dict = Dict::new();
        dict.insert(tag("nested"), Value::Marker);

        let mut row = Dict::new();
        row.insert(tag("list"), Value::List(vec![Value::from(1.0), Value::Marker]));
        row.insert(tag("dict"), Value::Dict(dict));
        row.insert(tag("grid"), Value::from(inner));

        let mut grid = Grid::new();
        grid.push_row(row);

        let round_tripped = parse(&grid.to_json_string()).unwrap();
        assert_eq!(round_tripped, grid);
    }

    #[test]
    fn unknown_row_column_is_an_error() {
        let text = r#"{"meta":{"ver":"3.0"},"cols":[{"name":"a"}],"rows":[{"b":1}]}"#;
        assert!(parse(text).is_err());
    }

    #[test]
    fn malformed_json_reports_position() {
        let err = parse("{\"meta\": nope}").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.col > 0);
    }
}
