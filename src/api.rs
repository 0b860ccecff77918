//! The provider contract: the capability set collaborators (HTTP
//! dispatchers, persistence layers) program against. The core defines
//! the grid shapes and parsing conventions; it does not dispatch
//! anything itself.

use crate::err::Error;
use crate::format::Format;
use crate::grid::Grid;
use crate::hsref::Ref;
use crate::number::Number;
use crate::range::HisReadRange;
use crate::tag::TagName;
use crate::value::{Dict, Value};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use url::Url;

type Result<T> = std::result::Result<T, Error>;

/// The Haystack operations a data provider can serve.
///
/// Every operation speaks grids. The expected shapes follow the
/// Haystack REST conventions:
///
/// * `about` returns a 1-row grid with `haystackVersion`, `tz`,
///   `serverName`, `serverTime`, `serverBootTime`, `productName`,
///   `productUri`, `productVersion`, `moduleName` and `moduleVersion`.
/// * `formats` returns one row per mime type with `receive`/`send`
///   markers; the default implementation lists this crate's codecs.
/// * `his_read` returns a `ts`/`val` grid covering the resolved range.
pub trait HaystackProvider {
    /// Basic server information, as a 1-row grid.
    fn about(&self, base_url: &Url) -> Result<Grid>;

    /// The operations supported by this provider.
    fn ops(&self) -> Result<Grid> {
        Ok(default_ops_grid())
    }

    /// The mime types this provider can read and write.
    fn formats(&self) -> Result<Grid> {
        Ok(default_formats_grid())
    }

    /// Read entities by id, or by filter with an optional row limit
    /// and column selection.
    fn read(
        &self,
        limit: Option<usize>,
        select: Option<&str>,
        ids: Option<&[Ref]>,
        filter: Option<&str>,
        version: Option<DateTime<Utc>>,
    ) -> Result<Grid>;

    /// Navigate the provider's entity hierarchy.
    fn nav(&self, nav_id: Option<&str>) -> Result<Grid>;

    /// Open a watch over a set of entities.
    fn watch_sub(
        &self,
        watch_dis: &str,
        watch_id: Option<&str>,
        ids: &[Ref],
        lease: Option<Number>,
    ) -> Result<Grid>;

    /// Close a watch, or remove entities from it.
    fn watch_unsub(&self, watch_id: &str, ids: &[Ref], close: bool) -> Result<Grid>;

    /// Poll a watch for changed entities.
    fn watch_poll(&self, watch_id: &str, refresh: bool) -> Result<Grid>;

    /// Read the writable priority array of a point.
    fn point_write_read(&self, id: &Ref, version: Option<DateTime<Utc>>) -> Result<Grid>;

    /// Write to one level of a point's priority array.
    #[allow(clippy::too_many_arguments)]
    fn point_write_write(
        &self,
        id: &Ref,
        level: u8,
        val: Value,
        who: Option<&str>,
        duration: Option<Number>,
        version: Option<DateTime<Utc>>,
    ) -> Result<Grid>;

    /// Read history data for a point over a range.
    fn his_read(
        &self,
        id: &Ref,
        range: &HisReadRange,
        version: Option<DateTime<Utc>>,
    ) -> Result<Grid>;

    /// Write a time series grid to a point's history.
    fn his_write(
        &self,
        id: &Ref,
        time_series: &Grid,
        version: Option<DateTime<Utc>>,
    ) -> Result<Grid>;

    /// Invoke a user action on an entity.
    fn invoke_action(&self, id: &Ref, action: &str, params: &Dict) -> Result<Grid>;

    /// The distinct values in use for a tag.
    fn values_for_tag(
        &self,
        tag: &TagName,
        version: Option<DateTime<Utc>>,
    ) -> Result<Vec<Value>>;

    /// The known versions of the underlying data set.
    fn versions(&self) -> Result<Vec<DateTime<Utc>>>;

    /// The provider's time zone, which date ranges resolve against.
    fn get_tz(&self) -> Tz;
}

/// The grid a provider advertises when it supports exactly this
/// crate's operations.
pub fn default_ops_grid() -> Grid {
    const OPS: &[(&str, &str)] = &[
        ("about", "Summary information for server"),
        ("ops", "Operations supported by this server"),
        ("formats", "Grid data formats supported by this server"),
        ("read", "Read entities by id or filter"),
        ("nav", "Navigate the entity hierarchy"),
        ("watchSub", "Subscribe to entity changes"),
        ("watchUnsub", "Unsubscribe from entity changes"),
        ("watchPoll", "Poll a watch for changes"),
        ("pointWrite", "Read or write a point priority array"),
        ("hisRead", "Read time series data"),
        ("hisWrite", "Write time series data"),
        ("invokeAction", "Invoke an action on an entity"),
    ];
    let mut grid = Grid::new();
    for (name, summary) in OPS {
        let mut row = Dict::new();
        row.insert(tag("name"), Value::from(*name));
        row.insert(tag("summary"), Value::from(*summary));
        grid.push_row(row);
    }
    grid
}

/// The standard 3-row formats grid: every codec in this crate can both
/// receive and send.
pub fn default_formats_grid() -> Grid {
    let mut grid = Grid::new();
    for format in &[Format::Zinc, Format::Json, Format::Csv] {
        let mut row = Dict::new();
        row.insert(tag("mime"), Value::from(format.mime()));
        row.insert(tag("receive"), Value::Marker);
        row.insert(tag("send"), Value::Marker);
        grid.push_row(row);
    }
    grid
}

fn tag(name: &str) -> TagName {
    TagName::new(name.to_owned()).expect("literal tag names are valid")
}
