//! Row mapping: turning column/value rows into caller-defined records.
//!
//! A record type lists its fields together with struct-tag style annotations
//! (`db:"id" json:"id"`). For a given tag key the mapper resolves each field's
//! column name once per type, then copies and coerces values out of every row.
//!
//! - `record`: the `Record`/`Field`/`Destination` traits record types implement
//! - `descriptor`: tag parsing and the cached column to field association
//! - `coerce`: the per-type conversion rules
//! - `mapper`: applying a descriptor to rows
//! - `scalar`: single-column reads

mod coerce;
mod descriptor;
mod macros;
mod mapper;
mod record;
mod scalar;

pub use coerce::{parse_bool, parse_integer, parse_timestamp};
pub use descriptor::{ColumnBinding, RecordDescriptor, describe, lookup_tag, tag_column};
pub(crate) use mapper::apply;
pub use mapper::RowMapper;
pub use record::{Destination, Field, FieldDecl, FieldSlot, Record, Shape};
pub use scalar::FromRowValue;
