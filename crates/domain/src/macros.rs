//! Macro for wire-named enums
//!
//! Commands and results carry their kinds and statuses as lowercase strings.
//! This macro generates `as_str`, an `ALL` table, `Display` and `FromStr` from
//! one variant-to-name mapping, so the wire names live in exactly one place.
//!
//! # Example
//!
//! ```rust
//! use gasoline_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Phase {
//!     Queued,
//!     Running,
//! }
//!
//! impl_wire_name_conversions!(Phase {
//!     Queued => "queued",
//!     Running => "running",
//! });
//!
//! assert_eq!(Phase::Running.as_str(), "running");
//! assert_eq!("queued".parse::<Phase>(), Ok(Phase::Queued));
//! ```

/// Implements `as_str`, `ALL`, `Display` and `FromStr` for a fieldless enum
///
/// Parsing is exact: wire names are matched byte-for-byte, so `"Execute"` is
/// not the same command as `"execute"`.
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$enum_name] = &[$($enum_name::$variant),+];

            /// Wire name of this variant
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
