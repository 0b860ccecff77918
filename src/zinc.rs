//! The zinc codec: Haystack's native compact text format and the
//! reference format for this crate. Zinc is the only format which
//! carries per-column metadata natively, so it is the format every
//! other codec's semantics are defined against; the CSV codec and the
//! filter parser reuse the scalar grammar implemented here.

use crate::coord::Coord;
use crate::err::ParseError;
use crate::grid::Grid;
use crate::hsref::Ref;
use crate::number::Number;
use crate::tag::TagName;
use crate::tz;
use crate::value::{Dict, Value};
use crate::xstr::XStr;
use chrono::{NaiveDate, NaiveTime, SecondsFormat, TimeZone, Timelike};

/// The maximum nesting depth for grids-within-grids.
const MAX_NESTING: usize = 32;

/// Parse a complete zinc grid.
pub fn parse(s: &str) -> Result<Grid, ParseError> {
    let mut scanner = Scanner::new(s);
    let grid = parse_grid(&mut scanner, 0)?;
    scanner.skip_blank();
    if !scanner.at_end() {
        return Err(scanner.error("unexpected content after grid"));
    }
    Ok(grid)
}

/// Parse a single zinc scalar from a complete string. This is the
/// entry point the CSV codec uses for its cells.
pub fn parse_scalar(s: &str) -> Result<Value, ParseError> {
    let mut scanner = Scanner::new(s);
    scanner.skip_spaces();
    let value = scan_scalar(&mut scanner, 0)?;
    scanner.skip_spaces();
    if !scanner.at_end() {
        return Err(scanner.error("unexpected content after scalar"));
    }
    Ok(value)
}

/// Dump a grid in the zinc format. The output always ends with a
/// newline, and re-parsing it produces an equal grid.
pub fn dump(grid: &Grid) -> String {
    let mut out = String::new();
    out.push_str("ver:");
    out.push_str(&dump_string(grid.version()));
    for (name, value) in grid.meta() {
        out.push(' ');
        dump_tag(&mut out, name, value);
    }
    out.push('\n');

    if grid.cols().is_empty() {
        // The placeholder column line for a grid with no columns.
        out.push_str("empty");
    } else {
        let mut first = true;
        for col in grid.cols() {
            if !first {
                out.push(',');
            }
            first = false;
            out.push_str(col.name().as_ref());
            for (name, value) in col.meta() {
                out.push(' ');
                dump_tag(&mut out, name, value);
            }
        }
    }
    out.push('\n');

    for row in grid.rows() {
        let cells: Vec<String> = grid
            .cols()
            .iter()
            .map(|col| match row.get(col.name().as_ref()) {
                Some(value) => dump_scalar(value),
                None => String::new(),
            })
            .collect();
        if cells.iter().all(|cell| cell.is_empty()) {
            // A fully empty line would read as the end of the grid.
            out.push('N');
            for _ in 1..cells.len() {
                out.push(',');
            }
        } else {
            out.push_str(&cells.join(","));
        }
        out.push('\n');
    }
    out
}

/// Dump a single value as a zinc literal.
pub fn dump_scalar(value: &Value) -> String {
    match value {
        Value::Null => "N".to_owned(),
        Value::Marker => "M".to_owned(),
        Value::Na => "NA".to_owned(),
        Value::Remove => "R".to_owned(),
        Value::Bool(true) => "T".to_owned(),
        Value::Bool(false) => "F".to_owned(),
        Value::Number(n) => n.to_zinc_string(),
        Value::Str(s) => dump_string(s),
        Value::Uri(u) => dump_uri(u),
        Value::Ref(r) => match r.dis() {
            Some(dis) => format!("@{} {}", r.name(), dump_string(dis)),
            None => format!("@{}", r.name()),
        },
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        Value::Time(t) => dump_time(t),
        Value::DateTime(dt) => format!(
            "{} {}",
            dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            tz::short_name(&dt.timezone()),
        ),
        Value::Coord(c) => c.to_zinc_string(),
        Value::XStr(x) => format!("{}({})", x.type_name(), dump_string(&x.data_to_string())),
        Value::Bin(mime) => format!("Bin({})", mime),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(dump_scalar).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Dict(dict) => {
            let mut parts = Vec::with_capacity(dict.len());
            for (name, value) in dict {
                let mut part = String::new();
                dump_tag(&mut part, name, value);
                parts.push(part);
            }
            format!("{{{}}}", parts.join(" "))
        }
        Value::Grid(grid) => format!("<<\n{}>>", dump(grid)),
    }
}

fn dump_tag(out: &mut String, name: &TagName, value: &Value) {
    out.push_str(name.as_ref());
    if !value.is_marker() {
        out.push(':');
        out.push_str(&dump_scalar(value));
    }
}

fn dump_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn dump_uri(u: &str) -> String {
    let mut out = String::with_capacity(u.len() + 2);
    out.push('`');
    for c in u.chars() {
        match c {
            '`' => out.push_str("\\`"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('`');
    out
}

pub(crate) fn dump_time(t: &NaiveTime) -> String {
    let mut out = t.format("%H:%M:%S").to_string();
    let nanos = t.nanosecond();
    if nanos > 0 && nanos < 1_000_000_000 {
        let frac = format!("{:09}", nanos);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// A character scanner with 1-based line and column tracking.
pub(crate) struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
}

impl Scanner {
    pub(crate) fn new(s: &str) -> Self {
        Scanner {
            chars: s.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, c: char) -> Result<(), ParseError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub(crate) fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }
    }

    /// Skip spaces, tabs and newlines.
    pub(crate) fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t') | Some('\n') | Some('\r')) {
            self.bump();
        }
    }

    fn at_newline(&self) -> bool {
        matches!(self.peek(), Some('\n') | Some('\r'))
    }

    fn expect_newline(&mut self) -> Result<(), ParseError> {
        if self.eat('\r') {
            self.eat('\n');
            Ok(())
        } else if self.eat('\n') {
            Ok(())
        } else {
            Err(self.error("expected end of line"))
        }
    }

    pub(crate) fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    pub(crate) fn error(&self, msg: &str) -> ParseError {
        let fragment: String = self.chars[self.pos.min(self.chars.len())..]
            .iter()
            .take(20)
            .take_while(|&&c| c != '\n')
            .collect();
        let msg = if fragment.is_empty() {
            msg.to_owned()
        } else {
            format!("{} near '{}'", msg, fragment)
        };
        ParseError::new(self.line, self.col, msg)
    }
}

fn parse_grid(s: &mut Scanner, depth: usize) -> Result<Grid, ParseError> {
    if depth > MAX_NESTING {
        return Err(s.error("grids nested too deeply"));
    }

    let id = scan_word(s)?;
    if id != "ver" {
        return Err(s.error("expected 'ver'"));
    }
    s.expect(':')?;
    if s.peek() != Some('"') {
        return Err(s.error("expected version string"));
    }
    let mut grid = Grid::new();
    grid.set_version(scan_string(s)?);

    // Remaining grid metadata on the version line.
    loop {
        s.skip_spaces();
        match s.peek() {
            None | Some('\n') | Some('\r') => break,
            Some(c) if c.is_ascii_lowercase() => {
                let (name, value) = scan_tag(s, depth)?;
                grid.meta_mut().insert(name, value);
            }
            _ => return Err(s.error("expected grid metadata tag")),
        }
    }
    s.expect_newline()?;

    // Column definitions.
    loop {
        let name = scan_tag_name(s)?;
        let mut meta = Dict::new();
        loop {
            s.skip_spaces();
            match s.peek() {
                Some(c) if c.is_ascii_lowercase() => {
                    let (tag_name, value) = scan_tag(s, depth)?;
                    meta.insert(tag_name, value);
                }
                _ => break,
            }
        }
        grid.add_column(name, meta)
            .map_err(|err| s.error(&err.to_string()))?;
        if !s.eat(',') {
            break;
        }
        s.skip_spaces();
    }

    let nested_close = |s: &Scanner| depth > 0 && s.starts_with(">>");
    if !s.at_end() && !nested_close(s) {
        s.expect_newline()?;
    }

    // Rows. The grid ends at EOF, at a blank line, or (when nested) at
    // the closing '>>'.
    let col_names: Vec<TagName> = grid.cols().iter().map(|col| col.name().clone()).collect();
    loop {
        if s.at_end() || nested_close(s) {
            break;
        }
        if s.at_newline() {
            s.expect_newline()?;
            break;
        }
        let row = parse_row(s, &col_names, depth)?;
        grid.push_row_strict(row)
            .map_err(|err| s.error(&err.to_string()))?;
        if s.at_end() || nested_close(s) {
            break;
        }
        s.expect_newline()?;
    }
    Ok(grid)
}

fn parse_row(s: &mut Scanner, col_names: &[TagName], depth: usize) -> Result<Dict, ParseError> {
    let mut row = Dict::new();
    let mut index = 0;
    loop {
        s.skip_spaces();
        let empty = matches!(s.peek(), None | Some(',') | Some('\n') | Some('\r'))
            || (depth > 0 && s.starts_with(">>"));
        let value = if empty {
            Value::Null
        } else {
            scan_scalar(s, depth)?
        };
        if index >= col_names.len() {
            return Err(s.error("row has more cells than columns"));
        }
        if !value.is_null() {
            row.insert(col_names[index].clone(), value);
        }
        index += 1;
        s.skip_spaces();
        if !s.eat(',') {
            break;
        }
    }
    Ok(row)
}

/// Scan one scalar value at the scanner's position.
pub(crate) fn scan_scalar(s: &mut Scanner, depth: usize) -> Result<Value, ParseError> {
    match s.peek() {
        None => Err(s.error("expected a scalar")),
        Some('"') => Ok(Value::Str(scan_string(s)?)),
        Some('`') => Ok(Value::Uri(scan_uri(s)?)),
        Some('@') => scan_ref(s),
        Some('[') => scan_list(s, depth),
        Some('{') => scan_dict(s, depth),
        Some('<') => scan_nested_grid(s, depth),
        Some('-') => {
            if s.starts_with("-INF") {
                for _ in 0..4 {
                    s.bump();
                }
                Ok(Value::Number(Number::from_value(f64::NEG_INFINITY)))
            } else {
                s.bump();
                scan_number(s, true)
            }
        }
        Some(c) if c.is_ascii_digit() => scan_digits_start(s),
        Some(c) if c.is_ascii_alphabetic() => scan_word_start(s),
        Some(c) => Err(s.error(&format!("unexpected character '{}'", c))),
    }
}

fn scan_word(s: &mut Scanner) -> Result<String, ParseError> {
    let mut word = String::new();
    match s.peek() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(s.error("expected an identifier")),
    }
    while let Some(c) = s.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            s.bump();
        } else {
            break;
        }
    }
    Ok(word)
}

pub(crate) fn scan_tag_name(s: &mut Scanner) -> Result<TagName, ParseError> {
    match s.peek() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return Err(s.error("expected a tag name")),
    }
    let word = scan_word(s)?;
    TagName::new(word).map_err(|err| s.error(&err.to_string()))
}

fn scan_tag(s: &mut Scanner, depth: usize) -> Result<(TagName, Value), ParseError> {
    let name = scan_tag_name(s)?;
    if s.eat(':') {
        let value = scan_scalar(s, depth)?;
        Ok((name, value))
    } else {
        Ok((name, Value::Marker))
    }
}

fn scan_string(s: &mut Scanner) -> Result<String, ParseError> {
    s.expect('"')?;
    let mut out = String::new();
    loop {
        match s.bump() {
            None | Some('\n') => return Err(s.error("unterminated string")),
            Some('"') => break,
            Some('\\') => out.push(scan_escape(s)?),
            Some(c) => out.push(c),
        }
    }
    Ok(out)
}

fn scan_escape(s: &mut Scanner) -> Result<char, ParseError> {
    match s.bump() {
        Some('b') => Ok('\u{8}'),
        Some('f') => Ok('\u{c}'),
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('t') => Ok('\t'),
        Some('"') => Ok('"'),
        Some('\\') => Ok('\\'),
        Some('$') => Ok('$'),
        Some('`') => Ok('`'),
        Some('u') => {
            let mut code = 0u32;
            for _ in 0..4 {
                let digit = s
                    .bump()
                    .and_then(|c| c.to_digit(16))
                    .ok_or_else(|| s.error("expected 4 hex digits in unicode escape"))?;
                code = code * 16 + digit;
            }
            char::from_u32(code).ok_or_else(|| s.error("invalid unicode escape"))
        }
        _ => Err(s.error("invalid escape sequence")),
    }
}

fn scan_uri(s: &mut Scanner) -> Result<String, ParseError> {
    s.expect('`')?;
    let mut out = String::new();
    loop {
        match s.bump() {
            None | Some('\n') => return Err(s.error("unterminated uri")),
            Some('`') => break,
            Some('\\') => match s.bump() {
                Some('`') => out.push('`'),
                Some('\\') => out.push('\\'),
                Some(c) => {
                    // Uris pass other escapes through verbatim.
                    out.push('\\');
                    out.push(c);
                }
                None => return Err(s.error("unterminated uri")),
            },
            Some(c) => out.push(c),
        }
    }
    Ok(out)
}

fn scan_ref(s: &mut Scanner) -> Result<Value, ParseError> {
    s.expect('@')?;
    let mut name = String::new();
    while let Some(c) = s.peek() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-' | '.' | '~') {
            name.push(c);
            s.bump();
        } else {
            break;
        }
    }
    let dis = if s.peek() == Some(' ') && s.peek_at(1) == Some('"') {
        s.bump();
        Some(scan_string(s)?)
    } else {
        None
    };
    let hsref = Ref::new(name, dis).map_err(|err| s.error(&err.to_string()))?;
    Ok(Value::Ref(hsref))
}

fn scan_list(s: &mut Scanner, depth: usize) -> Result<Value, ParseError> {
    s.expect('[')?;
    let mut items = Vec::new();
    s.skip_spaces();
    if s.eat(']') {
        return Ok(Value::List(items));
    }
    loop {
        s.skip_spaces();
        items.push(scan_scalar(s, depth)?);
        s.skip_spaces();
        if !s.eat(',') {
            break;
        }
    }
    s.expect(']')?;
    Ok(Value::List(items))
}

fn scan_dict(s: &mut Scanner, depth: usize) -> Result<Value, ParseError> {
    s.expect('{')?;
    let mut dict = Dict::new();
    loop {
        s.skip_spaces();
        match s.peek() {
            Some('}') => break,
            Some(c) if c.is_ascii_lowercase() => {
                let (name, value) = scan_tag(s, depth)?;
                dict.insert(name, value);
            }
            _ => return Err(s.error("expected a tag or '}' in dict")),
        }
    }
    s.expect('}')?;
    Ok(Value::Dict(dict))
}

fn scan_nested_grid(s: &mut Scanner, depth: usize) -> Result<Value, ParseError> {
    if !s.starts_with("<<") {
        return Err(s.error("expected '<<'"));
    }
    s.bump();
    s.bump();
    s.skip_blank();
    let grid = parse_grid(s, depth + 1)?;
    s.skip_blank();
    if !s.starts_with(">>") {
        return Err(s.error("expected '>>'"));
    }
    s.bump();
    s.bump();
    Ok(Value::Grid(Box::new(grid)))
}

/// Dispatch for scalars opening with a digit: a date, a datetime, a
/// time or a number. Dates versus numbers make this grammar context
/// sensitive, so decide by lookahead before consuming anything.
fn scan_digits_start(s: &mut Scanner) -> Result<Value, ParseError> {
    let digits_then = |s: &Scanner, n: usize, c: char| {
        (0..n).all(|i| s.peek_at(i).map_or(false, |d| d.is_ascii_digit()))
            && s.peek_at(n) == Some(c)
    };
    if digits_then(s, 4, '-') {
        scan_date_or_date_time(s)
    } else if digits_then(s, 2, ':') {
        Ok(Value::Time(scan_time(s)?))
    } else {
        scan_number(s, false)
    }
}

fn scan_fixed_digits(s: &mut Scanner, n: usize, what: &str) -> Result<u32, ParseError> {
    let mut out = 0u32;
    for _ in 0..n {
        let digit = s
            .peek()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| s.error(&format!("expected {}", what)))?;
        s.bump();
        out = out * 10 + digit;
    }
    Ok(out)
}

fn scan_date(s: &mut Scanner) -> Result<NaiveDate, ParseError> {
    let year = scan_fixed_digits(s, 4, "a 4-digit year")?;
    s.expect('-')?;
    let month = scan_fixed_digits(s, 2, "a 2-digit month")?;
    s.expect('-')?;
    let day = scan_fixed_digits(s, 2, "a 2-digit day")?;
    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(|| s.error("invalid date"))
}

fn scan_time(s: &mut Scanner) -> Result<NaiveTime, ParseError> {
    let hour = scan_fixed_digits(s, 2, "a 2-digit hour")?;
    s.expect(':')?;
    let minute = scan_fixed_digits(s, 2, "a 2-digit minute")?;
    let second = if s.eat(':') {
        scan_fixed_digits(s, 2, "a 2-digit second")?
    } else {
        0
    };
    let mut nanos = 0u32;
    if s.peek() == Some('.') && s.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
        s.bump();
        let mut scale = 100_000_000u32;
        while let Some(digit) = s.peek().and_then(|c| c.to_digit(10)) {
            // Digits beyond nanosecond precision are consumed and dropped.
            if scale > 0 {
                nanos += digit * scale;
                scale /= 10;
            }
            s.bump();
        }
    }
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
        .ok_or_else(|| s.error("invalid time"))
}

fn scan_date_or_date_time(s: &mut Scanner) -> Result<Value, ParseError> {
    let date = scan_date(s)?;
    if !s.eat('T') {
        return Ok(Value::Date(date));
    }
    let time = scan_time(s)?;

    let offset_seconds = if s.eat('Z') {
        0
    } else {
        let sign = match s.bump() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Err(s.error("expected 'Z' or a UTC offset")),
        };
        let hours = scan_fixed_digits(s, 2, "2-digit offset hours")?;
        s.expect(':')?;
        let minutes = scan_fixed_digits(s, 2, "2-digit offset minutes")?;
        sign * (hours as i32 * 3600 + minutes as i32 * 60)
    };

    // An optional zone name follows after a single space. Zone names
    // start with an uppercase letter, which keeps them distinct from a
    // following metadata tag.
    let zone = if s.peek() == Some(' ')
        && s.peek_at(1).map_or(false, |c| c.is_ascii_uppercase())
    {
        s.bump();
        let mut name = String::new();
        while let Some(c) = s.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '/' | '+' | '-') {
                name.push(c);
                s.bump();
            } else {
                break;
            }
        }
        Some(name)
    } else {
        None
    };

    let tz = match zone {
        Some(name) => tz::time_zone_by_name(&name)
            .ok_or_else(|| s.error(&format!("unknown time zone '{}'", name)))?,
        None => tz::time_zone_for_offset(offset_seconds),
    };

    // The offset pins the instant; the zone (named or derived) then
    // re-expresses it, so a name that disagrees with the offset wins.
    let utc = date.and_time(time) - chrono::Duration::seconds(offset_seconds as i64);
    Ok(Value::DateTime(tz.from_utc_datetime(&utc)))
}

fn is_unit_char(c: char) -> bool {
    // Any character above 0x7f is a unit character, which covers the
    // likes of ° and ².
    c.is_ascii_alphabetic() || matches!(c, '%' | '_' | '/' | '$') || (c as u32) > 0x7f
}

fn scan_number(s: &mut Scanner, negative: bool) -> Result<Value, ParseError> {
    let mut text = String::new();
    if negative {
        text.push('-');
    }
    let mut any_digits = false;
    while let Some(c) = s.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            any_digits = true;
            s.bump();
        } else if c == '_' {
            // Thousands separators are stripped.
            s.bump();
        } else {
            break;
        }
    }
    if !any_digits {
        return Err(s.error("expected a number"));
    }
    if s.peek() == Some('.') && s.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
        text.push('.');
        s.bump();
        while let Some(c) = s.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                s.bump();
            } else if c == '_' {
                s.bump();
            } else {
                break;
            }
        }
    }
    // 'e' opens an exponent only when digits follow; otherwise it is a
    // unit letter, e.g. `10erg`.
    if matches!(s.peek(), Some('e') | Some('E')) {
        let exponent = match s.peek_at(1) {
            Some(c) if c.is_ascii_digit() => true,
            Some('+') | Some('-') => s.peek_at(2).map_or(false, |c| c.is_ascii_digit()),
            _ => false,
        };
        if exponent {
            text.push('e');
            s.bump();
            match s.peek() {
                Some('+') | Some('-') => {
                    text.push(s.bump().expect("sign was just peeked"));
                }
                _ => {}
            }
            while let Some(c) = s.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    s.bump();
                } else {
                    break;
                }
            }
        }
    }
    let value: f64 = text
        .parse()
        .map_err(|_| s.error(&format!("invalid number '{}'", text)))?;

    let mut unit = String::new();
    while let Some(c) = s.peek() {
        if is_unit_char(c) {
            unit.push(c);
            s.bump();
        } else {
            break;
        }
    }
    let unit = if unit.is_empty() { None } else { Some(unit) };
    Ok(Value::Number(Number::new(value, unit)))
}

/// Dispatch for scalars opening with a letter: the bare keyword tokens
/// plus the parenthesized `C(..)`, `Bin(..)` and XStr forms.
fn scan_word_start(s: &mut Scanner) -> Result<Value, ParseError> {
    let word = scan_word(s)?;
    match word.as_str() {
        "M" => Ok(Value::Marker),
        "R" => Ok(Value::Remove),
        "N" => Ok(Value::Null),
        "NA" => Ok(Value::Na),
        "T" => Ok(Value::Bool(true)),
        "F" => Ok(Value::Bool(false)),
        "INF" => Ok(Value::Number(Number::from_value(f64::INFINITY))),
        "NaN" => Ok(Value::Number(Number::from_value(f64::NAN))),
        "C" if s.peek() == Some('(') => scan_coord(s),
        "Bin" if s.peek() == Some('(') => scan_bin(s),
        _ if word.chars().next().map_or(false, |c| c.is_ascii_uppercase())
            && s.peek() == Some('(') =>
        {
            scan_xstr(s, &word)
        }
        _ => Err(s.error(&format!("unexpected token '{}'", word))),
    }
}

fn scan_float(s: &mut Scanner) -> Result<f64, ParseError> {
    let mut text = String::new();
    while let Some(c) = s.peek() {
        if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
            text.push(c);
            s.bump();
        } else {
            break;
        }
    }
    text.parse()
        .map_err(|_| s.error(&format!("invalid number '{}'", text)))
}

fn scan_coord(s: &mut Scanner) -> Result<Value, ParseError> {
    s.expect('(')?;
    s.skip_spaces();
    let lat = scan_float(s)?;
    s.skip_spaces();
    s.expect(',')?;
    s.skip_spaces();
    let lng = scan_float(s)?;
    s.skip_spaces();
    s.expect(')')?;
    Ok(Value::Coord(Coord::new(lat, lng)))
}

fn scan_bin(s: &mut Scanner) -> Result<Value, ParseError> {
    s.expect('(')?;
    let mime = if s.peek() == Some('"') {
        scan_string(s)?
    } else {
        let mut mime = String::new();
        while let Some(c) = s.peek() {
            if c == ')' || c == '\n' {
                break;
            }
            mime.push(c);
            s.bump();
        }
        mime
    };
    s.expect(')')?;
    Ok(Value::Bin(mime))
}

fn scan_xstr(s: &mut Scanner, type_name: &str) -> Result<Value, ParseError> {
    s.expect('(')?;
    if s.peek() != Some('"') {
        return Err(s.error("expected a quoted string in XStr"));
    }
    let data = scan_string(s)?;
    s.expect(')')?;
    let xstr = XStr::new(&XStr::encoding_for_type_name(type_name), &data)
        .map_err(|err| s.error(&err.to_string()))?;
    Ok(Value::XStr(xstr))
}
