use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use regex::Regex;

use super::record::{FieldDecl, Record};

/// Annotation value that explicitly excludes a field from mapping.
const EXCLUDED: &str = "-";

// key:"value" pairs; the value may contain backslash escaped quotes.
static TAG_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s:"]+):"((?:[^"\\]|\\.)*)""#).expect("tag pattern is a valid regex")
});

type DescriptorCacheMap =
    LazyLock<Mutex<HashMap<(TypeId, String), Arc<RecordDescriptor>>>>;

static DESCRIPTORS: DescriptorCacheMap = LazyLock::new(|| Mutex::new(HashMap::new()));

/// Find the value stored under `key` in a struct-tag style annotation.
///
/// Only the first occurrence of `key` counts. The value is unquoted: `\"` yields
/// `"`, `\\` yields `\`, and `\n`, `\t`, `\r` the matching control characters.
#[must_use]
pub fn lookup_tag<'a>(tags: &'a str, key: &str) -> Option<Cow<'a, str>> {
    TAG_PAIR
        .captures_iter(tags)
        .find(|caps| caps.get(1).is_some_and(|k| k.as_str() == key))
        .and_then(|caps| caps.get(2))
        .map(|m| unescape(m.as_str()))
}

fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

fn primary_name(value: &str) -> &str {
    value.split(',').next().unwrap_or_default().trim()
}

/// Column name a field is annotated with under `key`, with options stripped.
///
/// Returns `None` when the field has no annotation for `key`, an empty name,
/// or the exclusion marker `-`.
#[must_use]
pub fn tag_column<'a>(tags: &'a str, key: &str) -> Option<Cow<'a, str>> {
    let name = match lookup_tag(tags, key)? {
        Cow::Borrowed(value) => Cow::Borrowed(primary_name(value)),
        Cow::Owned(value) => Cow::Owned(primary_name(&value).to_string()),
    };
    if name.is_empty() || name == EXCLUDED {
        None
    } else {
        Some(name)
    }
}

/// One column feeding one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    pub column: String,
    pub field_index: usize,
    pub field_name: &'static str,
}

/// Column to field association for one record type under one tag key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDescriptor {
    bindings: Vec<ColumnBinding>,
}

impl RecordDescriptor {
    /// Build the descriptor from declared fields. Fields without a usable
    /// annotation are left out; bindings keep declaration order.
    #[must_use]
    pub fn build(fields: &[FieldDecl], tag_key: &str) -> Self {
        let bindings = fields
            .iter()
            .enumerate()
            .filter_map(|(field_index, decl)| {
                tag_column(decl.tags, tag_key).map(|column| ColumnBinding {
                    column: column.into_owned(),
                    field_index,
                    field_name: decl.name,
                })
            })
            .collect();
        Self { bindings }
    }

    #[must_use]
    pub fn bindings(&self) -> &[ColumnBinding] {
        &self.bindings
    }

    /// Field bound to `column`, if any.
    #[must_use]
    pub fn binding_for(&self, column: &str) -> Option<&ColumnBinding> {
        self.bindings.iter().find(|b| b.column == column)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Descriptor for `T` under `tag_key`, built on first use and cached for the process.
#[must_use]
pub fn describe<T: Record>(tag_key: &str) -> Arc<RecordDescriptor> {
    let key = (TypeId::of::<T>(), tag_key.to_string());
    let mut cache = match DESCRIPTORS.lock() {
        Ok(guard) => guard,
        // Clear the poison and continue with the recovered data
        Err(poisoned) => poisoned.into_inner(),
    };
    Arc::clone(
        cache
            .entry(key)
            .or_insert_with(|| Arc::new(RecordDescriptor::build(T::fields(), tag_key))),
    )
}
