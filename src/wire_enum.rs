//! Integer-backed protocol enumerations.
//!
//! A wire enum occupies a single integer slot. Decoding is total: integers
//! the local schema does not know still produce a value
//! (`Unrecognized(raw)`) and encode back to the same integer, so messages
//! from a peer on a newer schema survive a decode/encode cycle.
//!
//! The (de)serialization path is written by hand in [`proto_enum!`] rather
//! than derived. Derived impls for enums encode variant names or
//! externally-tagged objects, never the bare integer.

use crate::hash::StructuralHash;

/// Contract shared by every wire enum.
pub trait ProtoEnum: Copy + Eq + Ord + std::hash::Hash + StructuralHash {
    /// Build from a wire integer. Never fails.
    fn from_raw(raw: i32) -> Self;

    /// The wire integer.
    fn raw(&self) -> i32;

    /// Whether the value is one of the declared variants.
    fn is_known(&self) -> bool;
}

/// Declare a wire enum.
///
/// Each declared variant carries its wire integer. The macro adds an
/// `Unrecognized(i32)` catch-all and implements [`ProtoEnum`], equality,
/// ordering and hashing by raw integer, `From<i32>`, `From<Enum> for i32`,
/// `Display`, [`StructuralHash`] and single-integer serde impls.
///
/// ```
/// use chatwire::proto_enum;
/// use chatwire::wire_enum::ProtoEnum;
///
/// proto_enum! {
///     pub enum FocusType {
///         Unknown = 0,
///         Focused = 1,
///         Unfocused = 2,
///     }
/// }
///
/// assert_eq!(FocusType::from_raw(1), FocusType::Focused);
/// assert_eq!(FocusType::from_raw(9).raw(), 9);
/// assert_eq!(serde_json::to_string(&FocusType::Unfocused).unwrap(), "2");
/// ```
#[macro_export]
macro_rules! proto_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
            /// A value this schema version does not declare.
            Unrecognized(i32),
        }

        impl $name {
            /// All declared variants in declaration order.
            pub const VARIANTS: &'static [$name] = &[$($name::$variant),+];

            /// Declared variant name, or `"Unrecognized"`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)+
                    $name::Unrecognized(_) => "Unrecognized",
                }
            }
        }

        impl $crate::wire_enum::ProtoEnum for $name {
            fn from_raw(raw: i32) -> Self {
                match raw {
                    $($value => $name::$variant,)+
                    other => $name::Unrecognized(other),
                }
            }

            fn raw(&self) -> i32 {
                match self {
                    $($name::$variant => $value,)+
                    $name::Unrecognized(raw) => *raw,
                }
            }

            fn is_known(&self) -> bool {
                !matches!(
                    <Self as $crate::wire_enum::ProtoEnum>::from_raw(
                        <Self as $crate::wire_enum::ProtoEnum>::raw(self)
                    ),
                    $name::Unrecognized(_)
                )
            }
        }

        impl ::std::cmp::PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                $crate::wire_enum::ProtoEnum::raw(self) == $crate::wire_enum::ProtoEnum::raw(other)
            }
        }

        impl ::std::cmp::Eq for $name {}

        impl ::std::cmp::PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<::std::cmp::Ordering> {
                Some(::std::cmp::Ord::cmp(self, other))
            }
        }

        impl ::std::cmp::Ord for $name {
            fn cmp(&self, other: &Self) -> ::std::cmp::Ordering {
                $crate::wire_enum::ProtoEnum::raw(self).cmp(&$crate::wire_enum::ProtoEnum::raw(other))
            }
        }

        impl ::std::hash::Hash for $name {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                ::std::hash::Hash::hash(&$crate::wire_enum::ProtoEnum::raw(self), state);
            }
        }

        impl $crate::hash::StructuralHash for $name {
            fn structural_hash(&self) -> u64 {
                $crate::hash::StructuralHash::structural_hash(&$crate::wire_enum::ProtoEnum::raw(self))
            }
        }

        impl ::std::convert::From<i32> for $name {
            fn from(raw: i32) -> Self {
                <Self as $crate::wire_enum::ProtoEnum>::from_raw(raw)
            }
        }

        impl ::std::convert::From<$name> for i32 {
            fn from(value: $name) -> i32 {
                $crate::wire_enum::ProtoEnum::raw(&value)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $name::Unrecognized(raw) => write!(f, "Unrecognized({})", raw),
                    known => f.write_str(known.as_str()),
                }
            }
        }

        impl $crate::__serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__serde::Serializer,
            {
                serializer.serialize_i32($crate::wire_enum::ProtoEnum::raw(self))
            }
        }

        impl<'de> $crate::__serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__serde::Deserializer<'de>,
            {
                let raw = <i32 as $crate::__serde::Deserialize>::deserialize(deserializer)?;
                Ok(<Self as $crate::wire_enum::ProtoEnum>::from_raw(raw))
            }
        }
    };
}
