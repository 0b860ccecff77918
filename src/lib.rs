//! # Overview
//! This crate provides the Project Haystack data model: the tagged
//! scalar types, the `Grid` container, codecs for the zinc, JSON and
//! CSV interchange formats, the Haystack filter language, and the
//! `hisRead` date-range shortcuts.
//!
//! Every codec round-trips the full data model it can represent: a
//! grid dumped to zinc or JSON and parsed back compares equal, and the
//! same holds for CSV over metadata-free grids.
//!
//! # Example Usage
//!
//! ```rust
//! use hayrack::{zinc, Filter};
//!
//! let grid = zinc::parse(
//!     "ver:\"3.0\"\nid,site,geoCity\n@s1,M,\"Chicago\"\n@s2,M,\"Detroit\"\n",
//! )
//! .unwrap();
//!
//! let filter = Filter::parse("site and geoCity == \"Chicago\"").unwrap();
//! let matching = grid.filter_rows(&filter);
//! assert_eq!(matching.len(), 1);
//!
//! // Hand the same grid to another codec:
//! println!("{}", grid.to_json_string_pretty());
//! ```
//!
//! The scalar universe lives in the [`Value`] enum; rows and metadata
//! are [`Dict`]s keyed by validated [`TagName`]s. Collaborators which
//! serve the Haystack REST operations implement [`HaystackProvider`]
//! and use [`format::negotiate`] to pick a wire format.

mod api;
mod coord;
pub mod csv;
mod err;
mod filter;
pub mod format;
mod grid;
mod hsref;
pub mod json;
mod number;
mod range;
mod tag;
pub mod tz;
mod unit;
mod value;
mod xstr;
pub mod zinc;

pub use api::{default_formats_grid, default_ops_grid, HaystackProvider};
pub use coord::Coord;
pub use err::{Error, ParseError, SchemaError};
pub use filter::{Filter, Path};
pub use format::{negotiate, Format, MIME_CSV, MIME_JSON, MIME_ZINC};
pub use grid::{Col, Grid, VER_3_0};
pub use hsref::{is_ref_name, ParseRefError, Ref};
pub use number::{Number, ParseNumberError};
pub use range::{DateRange, HisReadRange};
pub use tag::{is_tag_name, ParseTagNameError, TagName};
pub use unit::{install_unit_registry, UnitRegistry};
pub use value::{Dict, Value};
pub use xstr::{ParseXStrError, XStr};
