pub mod admin_user;
pub mod content_item;
pub mod content_source;
pub mod media;
pub mod page;
pub mod post;
pub mod transcript;
pub mod user_interaction;

pub use admin_user::{AdminRole, AdminUser};
pub use content_item::{ContentItem, ContentItemView, ContentStatus, ContentType};
pub use content_source::{ContentSource, SourceType};
pub use media::Media;
pub use page::Page;
pub use post::Post;
pub use transcript::Transcript;
pub use user_interaction::{InteractionType, UserInteraction, Viewer};

/// Closed set of values stored in a TEXT column. Parsing is
/// case-insensitive; the stored spelling is whatever `as_str` returns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let raw = raw.trim();
                $(
                    if raw.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!(
                    "invalid {}: '{}' (expected one of {})",
                    stringify!($name),
                    raw,
                    [$($text),+].join(", ")
                ))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use text_enum;
