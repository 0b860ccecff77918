use crate::err::{Error, SchemaError};
use crate::filter::Filter;
use crate::hsref::Ref;
use crate::tag::TagName;
use crate::value::{Dict, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// The current Zinc schema version.
pub const VER_3_0: &str = "3.0";

/// One grid column: a name plus its metadata tags.
#[derive(Clone, Debug, Hash, PartialEq)]
pub struct Col {
    name: TagName,
    meta: Dict,
}

impl Col {
    pub fn new(name: TagName, meta: Dict) -> Self {
        Col { name, meta }
    }

    pub fn name(&self) -> &TagName {
        &self.name
    }

    pub fn meta(&self) -> &Dict {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Dict {
        &mut self.meta
    }
}

/// A Haystack Grid: an ordered table of tagged rows with grid-level and
/// per-column metadata.
///
/// Column insertion order is the canonical iteration order and defines
/// the zinc and CSV output order. Rows are `Dict`s which may omit any
/// column; an omitted cell reads as `Null`.
#[derive(Clone, Debug, Hash, PartialEq)]
pub struct Grid {
    version: String,
    meta: Dict,
    cols: Vec<Col>,
    rows: Vec<Dict>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Create a new empty grid with the default version and no columns.
    pub fn new() -> Self {
        Grid {
            version: VER_3_0.to_owned(),
            meta: Dict::new(),
            cols: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Create a new grid with the given columns, in order.
    pub fn new_with_cols<I>(col_names: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = TagName>,
    {
        let mut grid = Grid::new();
        for name in col_names {
            grid.add_column(name, Dict::new())?;
        }
        Ok(grid)
    }

    /// Create a grid from rows alone. The columns are the union of the
    /// row keys, sorted alphabetically.
    pub fn from_rows(rows: Vec<Dict>) -> Self {
        let mut grid = Grid::new();
        let mut keys: Vec<TagName> = rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        for key in keys {
            grid.cols.push(Col::new(key, Dict::new()));
        }
        for row in rows {
            grid.push_row(row);
        }
        grid
    }

    /// Build the conventional 1-row error grid: an `err` marker plus a
    /// display message and optional trace in the grid metadata.
    pub fn new_err(msg: &str, trace: Option<&str>) -> Self {
        let mut grid = Grid::new();
        grid.meta.insert(tag("err"), Value::Marker);
        grid.meta.insert(tag("dis"), Value::Str(msg.to_owned()));
        if let Some(trace) = trace {
            grid.meta.insert(tag("errTrace"), Value::Str(trace.to_owned()));
        }
        grid
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn set_version(&mut self, version: String) {
        self.version = version;
    }

    /// The metadata for the grid.
    pub fn meta(&self) -> &Dict {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Dict {
        &mut self.meta
    }

    /// The columns of the grid, in order.
    pub fn cols(&self) -> &[Col] {
        &self.cols
    }

    /// The column names of the grid, in order.
    pub fn col_names(&self) -> Vec<&TagName> {
        self.cols.iter().map(|col| col.name()).collect()
    }

    /// The column names of the grid as string slices, in order.
    pub fn col_name_strs(&self) -> Vec<&str> {
        self.cols.iter().map(|col| col.name().as_ref()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.cols.iter().any(|col| col.name().as_ref() == name)
    }

    /// Mutable access to a column, for editing its metadata.
    pub fn col_mut(&mut self, name: &str) -> Option<&mut Col> {
        self.cols.iter_mut().find(|col| col.name().as_ref() == name)
    }

    /// Append a new column. Duplicate names are a schema violation.
    pub fn add_column(&mut self, name: TagName, meta: Dict) -> Result<(), SchemaError> {
        if self.has_column(name.as_ref()) {
            return Err(SchemaError(format!("duplicate column '{}'", name)));
        }
        self.cols.push(Col::new(name, meta));
        Ok(())
    }

    /// Rename a column. Row cells move to the new name.
    pub fn rename_column(&mut self, from: &str, to: TagName) -> Result<(), SchemaError> {
        if !self.has_column(from) {
            return Err(SchemaError(format!("no column '{}'", from)));
        }
        if from != to.as_ref() && self.has_column(to.as_ref()) {
            return Err(SchemaError(format!("duplicate column '{}'", to)));
        }
        for row in &mut self.rows {
            if let Some(value) = row.remove(from) {
                row.insert(to.clone(), value);
            }
        }
        let col = self
            .cols
            .iter_mut()
            .find(|col| col.name().as_ref() == from)
            .expect("column presence was checked above");
        col.name = to;
        Ok(())
    }

    /// Reorder the columns. `order` must name every column exactly once.
    pub fn reorder_columns(&mut self, order: &[&str]) -> Result<(), SchemaError> {
        if order.len() != self.cols.len() {
            return Err(SchemaError(format!(
                "reorder lists {} columns, grid has {}",
                order.len(),
                self.cols.len()
            )));
        }
        let mut reordered = Vec::with_capacity(self.cols.len());
        for &name in order {
            let position = self
                .cols
                .iter()
                .position(|col| col.name().as_ref() == name)
                .ok_or_else(|| SchemaError(format!("no column '{}'", name)))?;
            reordered.push(self.cols.remove(position));
        }
        self.cols = reordered;
        Ok(())
    }

    /// Append a row. Columns the row does not mention read as `Null`;
    /// tags the grid has no column for are registered as new columns in
    /// first-seen order. `Null` cells are dropped (an absent cell and a
    /// `Null` cell are the same thing).
    pub fn push_row(&mut self, row: Dict) {
        let row = strip_nulls(row);
        for name in row.keys() {
            if !self.has_column(name.as_ref()) {
                self.cols.push(Col::new(name.clone(), Dict::new()));
            }
        }
        self.rows.push(row);
    }

    /// Append a row, rejecting tags outside the declared columns. This
    /// is the codec parsers' entry point.
    pub(crate) fn push_row_strict(&mut self, row: Dict) -> Result<(), SchemaError> {
        let row = strip_nulls(row);
        for name in row.keys() {
            if !self.has_column(name.as_ref()) {
                return Err(SchemaError(format!("row references unknown column '{}'", name)));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a sequence of rows.
    pub fn extend<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = Dict>,
    {
        for row in rows {
            self.push_row(row);
        }
    }

    /// The rows of the grid, in insertion order.
    pub fn rows(&self) -> &[Dict] {
        &self.rows
    }

    /// Iterate over the rows in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Dict> {
        self.rows.iter()
    }

    /// Look up a row by index.
    pub fn row(&self, index: usize) -> Option<&Dict> {
        self.rows.get(index)
    }

    /// The `id` cell of a row, unchanged, if the row has one.
    pub fn row_id(&self, index: usize) -> Option<&Value> {
        self.rows.get(index).and_then(|row| row.get("id"))
    }

    /// The number of rows in the grid.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Sort the rows with a comparator function. This sort is stable.
    pub fn sort_rows<F>(&mut self, compare: F)
    where
        F: FnMut(&Dict, &Dict) -> Ordering,
    {
        self.rows.sort_by(compare);
    }

    /// Add a new column, or overwrite an existing column, by mapping
    /// each row to a new cell value.
    pub fn add_col<F>(&mut self, col_name: TagName, f: F)
    where
        F: Fn(&mut Dict) -> Value,
    {
        for row in &mut self.rows {
            let value = f(row);
            if value.is_null() {
                row.remove(col_name.as_ref());
            } else {
                row.insert(col_name.clone(), value);
            }
        }
        if !self.has_column(col_name.as_ref()) {
            self.cols.push(Col::new(col_name, Dict::new()));
        }
    }

    /// Return a vector containing the values in the given column.
    pub fn col_to_vec(&self, col_name: &str) -> Vec<Option<&Value>> {
        self.rows.iter().map(|row| row.get(col_name)).collect()
    }

    /// Returns true if the grid appears to be an error grid.
    pub fn is_error(&self) -> bool {
        matches!(self.meta.get("err"), Some(Value::Marker))
    }

    /// Return the error trace if present.
    pub fn error_trace(&self) -> Option<String> {
        match self.meta.get("errTrace") {
            Some(Value::Str(trace)) => Some(trace.clone()),
            _ => None,
        }
    }

    /// Return the rows matching a filter. Ref tags are resolved against
    /// this grid's own `id` column, so paths like `siteRef->geoCity`
    /// work when the referenced entity is a row of the same grid.
    pub fn filter_rows(&self, filter: &Filter) -> Vec<&Dict> {
        let by_id: HashMap<&str, &Dict> = self
            .rows
            .iter()
            .filter_map(|row| {
                row.get("id")
                    .and_then(Value::as_hs_ref)
                    .map(|id| (id.name(), row))
            })
            .collect();
        let resolve = |hsref: &Ref| by_id.get(hsref.name()).map(|row| (*row).clone());
        self.rows
            .iter()
            .filter(|row| filter.matches_with(row, &resolve))
            .collect()
    }

    /// Return a new grid with the same version, metadata and columns,
    /// keeping only the rows matching the filter.
    pub fn filter(&self, filter: &Filter) -> Grid {
        let rows = self
            .filter_rows(filter)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        Grid {
            version: self.version.clone(),
            meta: self.meta.clone(),
            cols: self.cols.clone(),
            rows,
        }
    }

    /// Return the zinc representation of the grid.
    pub fn to_zinc_string(&self) -> String {
        crate::zinc::dump(self)
    }

    /// Return the JSON representation of the grid.
    pub fn to_json_value(&self) -> serde_json::Value {
        crate::json::dump(self)
    }

    /// Return the string representation of the JSON encoding.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&self.to_json_value())
            .expect("serializing grid to String should never fail")
    }

    /// Return a pretty formatted string of the JSON encoding.
    pub fn to_json_string_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value())
            .expect("serializing grid to String should never fail")
    }

    /// Return a string containing the CSV representation of the grid.
    /// Grid and column metadata are not representable in CSV and are
    /// dropped; nested grids are flattened to a placeholder.
    pub fn to_csv_string(&self) -> Result<String, Error> {
        crate::csv::dump(self)
    }
}

impl<'a> IntoIterator for &'a Grid {
    type Item = &'a Dict;
    type IntoIter = std::slice::Iter<'a, Dict>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn strip_nulls(mut row: Dict) -> Dict {
    row.retain(|_, value| !value.is_null());
    row
}

fn tag(name: &str) -> TagName {
    TagName::new(name.to_owned()).expect("literal tag names are valid")
}

#[cfg(test)]
mod test {
    use super::{tag, Grid};
    use crate::tag::TagName;
    use crate::value::{Dict, Value};

    fn row(pairs: Vec<(&str, Value)>) -> Dict {
        pairs
            .into_iter()
            .map(|(name, value)| (tag(name), value))
            .collect()
    }

    #[test]
    fn push_row_registers_columns_in_first_seen_order() {
        let mut grid = Grid::new();
        grid.push_row(row(vec![("id", Value::from("a")), ("dis", Value::from("A"))]));
        grid.push_row(row(vec![("area", Value::from(100.0))]));
        assert_eq!(grid.col_name_strs(), vec!["dis", "id", "area"]);
        assert_eq!(grid.size(), 2);
    }

    #[test]
    fn missing_columns_read_as_null() {
        let mut grid = Grid::new_with_cols(vec![tag("a"), tag("b")]).unwrap();
        grid.push_row(row(vec![("a", Value::from(1.0))]));
        assert_eq!(grid.rows()[0].get("b"), None);
    }

    #[test]
    fn null_cells_are_dropped() {
        let mut grid = Grid::new();
        grid.push_row(row(vec![("a", Value::from(1.0)), ("b", Value::Null)]));
        assert!(!grid.rows()[0].contains_key("b"));
        // The column is not registered either: a Null cell and an
        // absent cell are the same thing.
        assert_eq!(grid.col_name_strs(), vec!["a"]);
    }

    #[test]
    fn duplicate_column_is_a_schema_error() {
        let mut grid = Grid::new();
        grid.add_column(tag("id"), Dict::new()).unwrap();
        assert!(grid.add_column(tag("id"), Dict::new()).is_err());
    }

    #[test]
    fn strict_push_rejects_unknown_columns() {
        let mut grid = Grid::new_with_cols(vec![tag("a")]).unwrap();
        let result = grid.push_row_strict(row(vec![("b", Value::from(2.0))]));
        assert!(result.is_err());
        assert_eq!(grid.size(), 0);
    }

    #[test]
    fn rename_column_moves_cells() {
        let mut grid = Grid::new();
        grid.push_row(row(vec![("old", Value::from("x"))]));
        grid.rename_column("old", tag("new")).unwrap();
        assert_eq!(grid.col_name_strs(), vec!["new"]);
        assert_eq!(grid.rows()[0].get("new"), Some(&Value::from("x")));
        assert!(grid.rename_column("missing", tag("other")).is_err());
    }

    #[test]
    fn reorder_columns() {
        let mut grid = Grid::new_with_cols(vec![tag("a"), tag("b"), tag("c")]).unwrap();
        grid.reorder_columns(&["c", "a", "b"]).unwrap();
        assert_eq!(grid.col_name_strs(), vec!["c", "a", "b"]);
        assert!(grid.reorder_columns(&["c", "a"]).is_err());
        assert!(grid.reorder_columns(&["c", "a", "nope"]).is_err());
    }

    #[test]
    fn add_col() {
        let mut grid = Grid::new();
        grid.push_row(row(vec![("id", Value::from("abcd1234")), ("dis", Value::from("Hello World"))]));
        grid.push_row(row(vec![("id", Value::from("cdef5678")), ("dis", Value::from("Hello Kitty"))]));

        let new_col = TagName::new("newCol".to_owned()).unwrap();
        grid.add_col(new_col, |row| {
            let id = row.get("id").and_then(Value::as_str).unwrap().to_owned();
            let dis = row.get("dis").and_then(Value::as_str).unwrap();
            Value::from(id + dis)
        });

        assert_eq!(
            grid.rows()[0].get("newCol").and_then(Value::as_str),
            Some("abcd1234Hello World")
        );
        assert!(grid.has_column("newCol"));
    }

    #[test]
    fn col_to_vec() {
        let mut grid = Grid::new();
        grid.push_row(row(vec![("id", Value::from("a"))]));
        grid.push_row(row(vec![("different", Value::from("thing"))]));
        grid.push_row(row(vec![("id", Value::from("b"))]));

        let col = grid.col_to_vec("id");
        assert_eq!(col[0].unwrap().as_str(), Some("a"));
        assert!(col[1].is_none());
        assert_eq!(col[2].unwrap().as_str(), Some("b"));
    }

    #[test]
    fn sort_rows() {
        let mut grid = Grid::new();
        for id in &["b", "d", "a", "c"] {
            grid.push_row(row(vec![("id", Value::from(*id))]));
        }
        grid.sort_rows(|row1, row2| {
            let str1 = row1.get("id").and_then(Value::as_str).unwrap();
            let str2 = row2.get("id").and_then(Value::as_str).unwrap();
            str1.cmp(str2)
        });
        let ids = grid
            .col_to_vec("id")
            .into_iter()
            .map(|cell| cell.unwrap().as_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn from_rows_sorts_the_union_of_keys() {
        let grid = Grid::from_rows(vec![
            row(vec![("id", Value::from("a")), ("dis", Value::from("A"))]),
            row(vec![("area", Value::from(1.0))]),
        ]);
        assert_eq!(grid.col_name_strs(), vec!["area", "dis", "id"]);
        assert_eq!(grid.size(), 2);
        assert_eq!(grid.row(1).unwrap().get("area"), Some(&Value::from(1.0)));

        let ids: Vec<Option<&Value>> = grid.iter().map(|r| r.get("id")).collect();
        assert_eq!(ids[0], Some(&Value::from("a")));
        assert_eq!(ids[1], None);
    }

    #[test]
    fn error_grids() {
        let grid = Grid::new_err("something broke", Some("trace line"));
        assert!(grid.is_error());
        assert_eq!(grid.error_trace(), Some("trace line".to_owned()));
        assert!(!Grid::new().is_error());
    }

    #[test]
    fn row_id_returns_the_cell_unchanged() {
        let mut grid = Grid::new();
        let id = crate::hsref::Ref::new("xyz".to_owned(), None).unwrap();
        grid.push_row(row(vec![("id", Value::from(id.clone()))]));
        assert_eq!(grid.row_id(0), Some(&Value::from(id)));
        assert_eq!(grid.row_id(1), None);
    }
}
