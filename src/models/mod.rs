/// Declare a row status enum backed by a PostgreSQL enum type
macro_rules! pg_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $type_name:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Default,
            serde::Serialize, serde::Deserialize, sqlx::Type,
        )]
        #[sqlx(type_name = $type_name, rename_all = "snake_case")]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const TYPE_NAME: &'static str = $type_name;
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($label => Ok($name::$variant),)+
                    other => Err(format!("Unknown {}: {}", $type_name, other)),
                }
            }
        }

        impl From<$name> for $crate::query_log::FieldValue {
            fn from(value: $name) -> Self {
                $crate::query_log::FieldValue::Enum {
                    type_name: $type_name,
                    value: value.as_str(),
                }
            }
        }
    };
}

pub mod customer;
pub mod notification;
pub mod order;
pub mod product;
pub mod saved_filter;
pub mod settings;
pub mod shipment;
pub mod supplier;

pub use customer::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use saved_filter::*;
pub use settings::*;
pub use shipment::*;
pub use supplier::*;
