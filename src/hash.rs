//! Deterministic structural hashing.
//!
//! Protocol values are hashed from their contents with a DJB2-style fold:
//!
//! ```text
//! h = 5381
//! for each element e:  h = (h << 5) + h + contribution(e)     (wrapping)
//! ```
//!
//! The same fold is used for sequences, mappings and message fields, so
//! every message type hashes under one uniform contract. Unlike
//! `std::collections::hash_map::DefaultHasher`, the result is stable across
//! processes, which lets hashes serve as persisted dedup keys.
//!
//! Containers:
//!
//! - `None` contributes `0`; `Some(v)` contributes one fold step over
//!   `hash(v)`, so a present zero never collides with an absent field.
//! - Sequences fold their elements in order.
//! - Mappings fold `hash(key) + hash(value)` per entry in ascending key
//!   order. `HashMap` entries are sorted first so the result does not depend
//!   on the map's iteration order.

use std::collections::{BTreeMap, HashMap};

/// Initial value of every fold.
pub const SEED: u64 = 5381;

/// A value with a content-derived, process-independent hash.
///
/// Equal values must produce equal hashes.
pub trait StructuralHash {
    fn structural_hash(&self) -> u64;
}

/// One fold step.
#[inline]
pub fn fold_step(hash: u64, contribution: u64) -> u64 {
    (hash << 5).wrapping_add(hash).wrapping_add(contribution)
}

/// Fold a sequence of contributions starting from [`SEED`].
pub fn combine<I>(contributions: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    contributions.into_iter().fold(SEED, fold_step)
}

/// Hash an optional value.
pub fn hash_optional<T: StructuralHash + ?Sized>(value: Option<&T>) -> u64 {
    match value {
        Some(v) => fold_step(SEED, v.structural_hash()),
        None => 0,
    }
}

/// Hash a sequence in iteration order.
pub fn hash_sequence<'a, T, I>(items: I) -> u64
where
    T: StructuralHash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    combine(items.into_iter().map(StructuralHash::structural_hash))
}

/// Hash mapping entries in the order given.
///
/// Callers are responsible for a stable order; the container impls below
/// sort by key.
pub fn hash_entries<'a, K, V, I>(entries: I) -> u64
where
    K: StructuralHash + 'a,
    V: StructuralHash + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    combine(
        entries
            .into_iter()
            .map(|(k, v)| k.structural_hash().wrapping_add(v.structural_hash())),
    )
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {
        $(impl StructuralHash for $t {
            #[inline]
            fn structural_hash(&self) -> u64 {
                *self as u64
            }
        })*
    };
}

macro_rules! impl_signed {
    ($($t:ty),*) => {
        $(impl StructuralHash for $t {
            #[inline]
            fn structural_hash(&self) -> u64 {
                *self as i64 as u64
            }
        })*
    };
}

impl_unsigned!(u8, u16, u32, u64, usize);
impl_signed!(i8, i16, i32, i64, isize);

impl StructuralHash for bool {
    fn structural_hash(&self) -> u64 {
        u64::from(*self)
    }
}

impl StructuralHash for char {
    fn structural_hash(&self) -> u64 {
        u64::from(u32::from(*self))
    }
}

impl StructuralHash for f64 {
    fn structural_hash(&self) -> u64 {
        // 0.0 == -0.0, so both must hash alike.
        if *self == 0.0 {
            0
        } else {
            self.to_bits()
        }
    }
}

impl StructuralHash for f32 {
    fn structural_hash(&self) -> u64 {
        f64::from(*self).structural_hash()
    }
}

impl StructuralHash for str {
    fn structural_hash(&self) -> u64 {
        combine(self.bytes().map(u64::from))
    }
}

impl StructuralHash for String {
    fn structural_hash(&self) -> u64 {
        self.as_str().structural_hash()
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for &T {
    fn structural_hash(&self) -> u64 {
        (**self).structural_hash()
    }
}

impl<T: StructuralHash + ?Sized> StructuralHash for Box<T> {
    fn structural_hash(&self) -> u64 {
        (**self).structural_hash()
    }
}

impl<T: StructuralHash> StructuralHash for Option<T> {
    fn structural_hash(&self) -> u64 {
        hash_optional(self.as_ref())
    }
}

impl<T: StructuralHash> StructuralHash for [T] {
    fn structural_hash(&self) -> u64 {
        hash_sequence(self)
    }
}

impl<T: StructuralHash> StructuralHash for Vec<T> {
    fn structural_hash(&self) -> u64 {
        hash_sequence(self)
    }
}

impl<K: StructuralHash, V: StructuralHash> StructuralHash for BTreeMap<K, V> {
    fn structural_hash(&self) -> u64 {
        hash_entries(self)
    }
}

impl<K, V, S> StructuralHash for HashMap<K, V, S>
where
    K: StructuralHash + Ord,
    V: StructuralHash,
{
    fn structural_hash(&self) -> u64 {
        let mut entries: Vec<(&K, &V)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        hash_entries(entries)
    }
}

/// Implement [`StructuralHash`] and `std::hash::Hash` for a message type by
/// folding the listed fields in order.
///
/// Every field that takes part in equality must be listed.
///
/// ```
/// use chatwire::structural_hash;
///
/// #[derive(PartialEq)]
/// struct Participant {
///     gaia_id: Option<String>,
///     chat_id: Option<String>,
/// }
///
/// structural_hash!(Participant { gaia_id, chat_id });
/// ```
#[macro_export]
macro_rules! structural_hash {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::hash::StructuralHash for $ty {
            fn structural_hash(&self) -> u64 {
                $crate::hash::combine([
                    $($crate::hash::StructuralHash::structural_hash(&self.$field)),*
                ])
            }
        }

        impl ::std::hash::Hash for $ty {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                state.write_u64($crate::hash::StructuralHash::structural_hash(self));
            }
        }
    };
}
