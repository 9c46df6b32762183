/// Declares a record type.
///
/// Each field is written `name: Type = descriptor`, where the descriptor is a
/// [`Field`](crate::Field) expression. The generated struct holds one
/// `pub Option<Type>` per field, in declaration order, and implements
/// [`Record`](crate::Record). The table name is the struct name unless an
/// `as "table"` clause follows it.
///
/// The schema is compiled the first time it is needed. An invalid
/// declaration (no primary key, two primary keys, a repeated field) panics
/// at that point; call [`register`](crate::register) at startup to surface
/// it early.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(as $table:literal)? {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty = $desc:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: ::std::option::Option<$ty>,
            )+
        }

        impl $crate::Record for $name {
            fn schema() -> &'static $crate::TableSchema {
                static SCHEMA: ::std::sync::OnceLock<$crate::TableSchema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    let builder = $crate::SchemaBuilder::new(stringify!($name))
                        $(.table($table))?
                        $(.field(stringify!($field), $desc))+;
                    match builder.build() {
                        Ok(schema) => schema,
                        Err(err) => panic!("invalid record type `{}`: {}", stringify!($name), err),
                    }
                })
            }

            fn get(
                &self,
                field: &str,
            ) -> ::std::result::Result<::std::option::Option<$crate::Value>, $crate::OrmError> {
                match field {
                    $(
                        stringify!($field) => Ok(self.$field.clone().map($crate::Value::from)),
                    )+
                    _ => Err($crate::OrmError::UnknownField {
                        table: <Self as $crate::Record>::schema().table().to_string(),
                        field: field.to_string(),
                    }),
                }
            }

            fn set(
                &mut self,
                field: &str,
                value: $crate::Value,
            ) -> ::std::result::Result<(), $crate::OrmError> {
                match field {
                    $(
                        stringify!($field) => {
                            self.$field =
                                <::std::option::Option<$ty> as $crate::FromValue>::from_value(value)?;
                            Ok(())
                        }
                    )+
                    _ => Err($crate::OrmError::UnknownField {
                        table: <Self as $crate::Record>::schema().table().to_string(),
                        field: field.to_string(),
                    }),
                }
            }
        }
    };
}
