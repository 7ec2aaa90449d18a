use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

/// A declared field of a record type: its Rust name and its raw annotation string.
///
/// The annotation uses the struct-tag convention of space separated
/// `key:"value"` pairs, where a value may carry comma separated options after
/// the column name: `db:"created_at,omitempty" json:"created"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub tags: &'static str,
}

impl FieldDecl {
    #[must_use]
    pub const fn new(name: &'static str, tags: &'static str) -> Self {
        Self { name, tags }
    }
}

/// Mutable access to a record field, tagged with the coercion rule that applies to it.
#[derive(Debug)]
pub enum FieldSlot<'a> {
    Int64(&'a mut i64),
    Int32(&'a mut i32),
    Text(&'a mut String),
    Bool(&'a mut bool),
    Timestamp(&'a mut DateTime<Utc>),
    /// A field type with no coercion rule; the mapper leaves it alone.
    Unsupported,
}

impl FieldSlot<'_> {
    /// Name of the target type, for error messages.
    #[must_use]
    pub fn target_name(&self) -> &'static str {
        match self {
            FieldSlot::Int64(_) => "i64",
            FieldSlot::Int32(_) => "i32",
            FieldSlot::Text(_) => "String",
            FieldSlot::Bool(_) => "bool",
            FieldSlot::Timestamp(_) => "DateTime<Utc>",
            FieldSlot::Unsupported => "unsupported",
        }
    }
}

/// Field types the mapper knows how to write into.
pub trait Field {
    fn slot(&mut self) -> FieldSlot<'_>;
}

impl Field for i64 {
    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Int64(self)
    }
}

impl Field for i32 {
    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Int32(self)
    }
}

impl Field for String {
    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Text(self)
    }
}

impl Field for bool {
    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Bool(self)
    }
}

impl Field for DateTime<Utc> {
    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Timestamp(self)
    }
}

macro_rules! unsupported_fields {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Field for $ty {
                fn slot(&mut self) -> FieldSlot<'_> {
                    FieldSlot::Unsupported
                }
            }
        )*
    };
}

unsupported_fields!(f64, f32, Vec<u8>, JsonValue, NaiveDateTime);

impl<T> Field for Option<T> {
    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Unsupported
    }
}

/// A record type rows can be mapped into.
///
/// Usually generated with [`record!`](crate::record); a hand-written impl
/// lists the fields in declaration order and hands out a [`FieldSlot`] per index:
///
/// ```rust
/// use sql_record::mapping::{Field, FieldDecl, FieldSlot, Record};
///
/// #[derive(Default)]
/// struct Tag {
///     id: i64,
///     label: String,
/// }
///
/// impl Record for Tag {
///     fn fields() -> &'static [FieldDecl] {
///         const FIELDS: &[FieldDecl] = &[
///             FieldDecl::new("id", r#"db:"id""#),
///             FieldDecl::new("label", r#"db:"label""#),
///         ];
///         FIELDS
///     }
///
///     fn field_mut(&mut self, index: usize) -> Option<FieldSlot<'_>> {
///         match index {
///             0 => Some(self.id.slot()),
///             1 => Some(self.label.slot()),
///             _ => None,
///         }
///     }
/// }
/// sql_record::record_destination!(Tag);
/// ```
pub trait Record: Default + 'static {
    /// Declared fields, in declaration order.
    fn fields() -> &'static [FieldDecl];

    /// Slot for the field at `index` in [`Record::fields`].
    fn field_mut(&mut self, index: usize) -> Option<FieldSlot<'_>>;
}

/// What kind of value a fetch is writing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single record
    Record,
    /// A growable sequence of records
    Sequence,
}

impl Shape {
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Shape::Record => "a record reference",
            Shape::Sequence => "a sequence of record references",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Record => f.write_str("record"),
            Shape::Sequence => f.write_str("sequence"),
        }
    }
}

/// Something a fetch can write into: one record, or a sequence of them.
pub trait Destination {
    type Record: Record;

    fn shape(&self) -> Shape;

    fn as_record_mut(&mut self) -> Option<&mut Self::Record> {
        None
    }

    fn as_sequence_mut(&mut self) -> Option<&mut Vec<Self::Record>> {
        None
    }
}

impl<T: Record> Destination for Vec<T> {
    type Record = T;

    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn as_sequence_mut(&mut self) -> Option<&mut Vec<T>> {
        Some(self)
    }
}
