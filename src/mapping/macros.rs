/// Declare a record struct together with its column annotations.
///
/// Each field may be followed by `=> "<annotation>"`, a struct-tag style string
/// such as `r#"db:"id" json:"id""#`. Fields without an annotation are never mapped.
/// The struct must implement `Default`.
///
/// ```rust
/// use chrono::{DateTime, Utc};
///
/// sql_record::record! {
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct User {
///         pub id: i64 => r#"db:"id""#,
///         pub name: String => r#"db:"name,omitempty""#,
///         pub active: bool => r#"db:"active""#,
///         pub created: DateTime<Utc> => r#"db:"created""#,
///         pub password_hash: String => r#"db:"-""#,
///         pub cached_label: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::mapping::Record for $name {
            fn fields() -> &'static [$crate::mapping::FieldDecl] {
                const FIELDS: &[$crate::mapping::FieldDecl] = &[
                    $(
                        $crate::mapping::FieldDecl::new(
                            stringify!($field),
                            concat!("" $(, $tag)?),
                        ),
                    )*
                ];
                FIELDS
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_mut(&mut self, index: usize) -> Option<$crate::mapping::FieldSlot<'_>> {
                let mut position = 0_usize;
                $(
                    if index == position {
                        return Some($crate::mapping::Field::slot(&mut self.$field));
                    }
                    position += 1;
                )*
                None
            }
        }

        $crate::record_destination!($name);
    };
}

/// Let a type that implements [`Record`](crate::mapping::Record) by hand be
/// used as a single-record fetch destination.
#[macro_export]
macro_rules! record_destination {
    ($name:ty) => {
        impl $crate::mapping::Destination for $name {
            type Record = $name;

            fn shape(&self) -> $crate::mapping::Shape {
                $crate::mapping::Shape::Record
            }

            fn as_record_mut(&mut self) -> Option<&mut $name> {
                Some(self)
            }
        }
    };
}
