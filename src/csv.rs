//! The CSV codec. CSV is the lossy format: no grid metadata, no
//! per-column metadata, no nested grids. Cells delegate to the zinc
//! scalar grammar, so anything zinc can write in one token survives a
//! trip through CSV.

use crate::err::{Error, ParseError};
use crate::grid::Grid;
use crate::hsref::Ref;
use crate::tag::TagName;
use crate::value::{Dict, Value};
use crate::zinc;
use ::csv::{ReaderBuilder, WriterBuilder};

/// Parse a grid from CSV text. The first row is the column names.
pub fn parse(s: &str) -> Result<Grid, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(s.as_bytes());
    let mut records = reader.records();

    let headers = match records.next() {
        Some(record) => record.map_err(csv_error)?,
        None => return Ok(Grid::new()),
    };
    let mut grid = Grid::new();
    for header in headers.iter() {
        let name = TagName::new(header.to_owned())
            .map_err(|err| ParseError::new(1, 1, err.to_string()))?;
        grid.add_column(name, Dict::new())
            .map_err(|err| ParseError::new(1, 1, err.to_string()))?;
    }
    let col_names: Vec<TagName> = grid.cols().iter().map(|col| col.name().clone()).collect();

    for (row_index, record) in records.enumerate() {
        let record = record.map_err(csv_error)?;
        let line = row_index as u32 + 2;
        let mut row = Dict::new();
        for (cell_index, cell) in record.iter().enumerate() {
            let value = parse_cell(cell);
            if value.is_null() {
                continue;
            }
            if cell_index >= col_names.len() {
                return Err(ParseError::new(
                    line,
                    cell_index as u32 + 1,
                    "row has more cells than headers".to_owned(),
                ));
            }
            row.insert(col_names[cell_index].clone(), value);
        }
        grid.push_row_strict(row)
            .map_err(|err| ParseError::new(line, 1, err.to_string()))?;
    }
    Ok(grid)
}

/// Decode a single CSV cell.
fn parse_cell(cell: &str) -> Value {
    match cell {
        "" => Value::Null,
        "\u{2713}" => Value::Marker,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Some(body) = cell.strip_prefix('@') {
                let mut split = body.splitn(2, ' ');
                let name = split.next().unwrap_or("");
                let dis = split.next().map(|dis| dis.to_owned());
                if let Ok(hsref) = Ref::new(name.to_owned(), dis) {
                    return Value::Ref(hsref);
                }
            }
            match zinc::parse_scalar(cell) {
                Ok(value) => value,
                // Anything the zinc grammar rejects is a plain string.
                Err(_) => Value::Str(cell.to_owned()),
            }
        }
    }
}

/// Dump a grid as CSV with RFC-4180 quoting. Grid and column metadata
/// are dropped; nested grids flatten to a `<grid>` placeholder.
pub fn dump(grid: &Grid) -> Result<String, Error> {
    let mut writer = WriterBuilder::new().from_writer(vec![]);

    writer
        .write_record(grid.col_name_strs())
        .map_err(|err| Error::Io(err.to_string()))?;

    for row in grid.rows() {
        let cells: Vec<String> = grid
            .cols()
            .iter()
            .map(|col| cell_string(row.get(col.name().as_ref())))
            .collect();
        writer
            .write_record(cells)
            .map_err(|err| Error::Io(err.to_string()))?;
    }

    match writer.into_inner() {
        Ok(bytes) => Ok(String::from_utf8(bytes)
            .expect("bytes should be UTF8 since all input was UTF8")),
        Err(err) => Err(Error::Io(err.error().to_string())),
    }
}

fn cell_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Marker) => "\u{2713}".to_owned(),
        Some(Value::Bool(true)) => "true".to_owned(),
        Some(Value::Bool(false)) => "false".to_owned(),
        Some(Value::Ref(r)) => match r.dis() {
            Some(dis) => format!("@{} {}", r.name(), dis),
            None => format!("@{}", r.name()),
        },
        Some(Value::Str(s)) => {
            // Bare only when reading the bare text back yields the same
            // string; otherwise fall back to the quoted zinc form.
            if parse_cell(s) == Value::Str(s.to_owned()) {
                s.clone()
            } else {
                zinc::dump_scalar(&Value::Str(s.clone()))
            }
        }
        Some(Value::Grid(_)) => "<grid>".to_owned(),
        Some(other) => zinc::dump_scalar(other),
    }
}

fn csv_error(err: ::csv::Error) -> ParseError {
    let line = err
        .position()
        .map(|position| position.line() as u32)
        .unwrap_or(0);
    ParseError::new(line, 0, err.to_string())
}
