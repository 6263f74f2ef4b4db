//! Generational identifiers and typed handles

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// An identifier made of an index and a generation counter
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id {
    /// Lower 32 bits: index, upper 32 bits: generation
    bits: u64,
}

impl Id {
    /// Create an ID from index and generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            bits: (generation as u64) << 32 | index as u64,
        }
    }

    /// Get the index portion
    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits as u32
    }

    /// Get the generation portion
    #[inline]
    pub const fn generation(&self) -> u32 {
        (self.bits >> 32) as u32
    }

    /// Same index, next generation
    #[inline]
    pub const fn bumped(&self) -> Self {
        Self::new(self.index(), self.generation().wrapping_add(1))
    }

    #[inline]
    pub const fn to_bits(&self) -> u64 {
        self.bits
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Monotonic ID source. Indices start at 1 so a zeroed id never aliases a live one.
pub struct IdGenerator {
    next: AtomicU32,
}

impl IdGenerator {
    /// Create a new ID generator
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Generate the next unique ID
    pub fn next(&self) -> Id {
        Id::new(self.next.fetch_add(1, Ordering::Relaxed), 0)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Declare a typed handle wrapping an [`Id`], with its own generator.
///
/// ```
/// portal_core::define_id!(
///     /// Handle to a widget
///     WidgetId
/// );
///
/// let a = WidgetId::next();
/// let b = WidgetId::next();
/// assert_ne!(a, b);
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub $crate::Id);

        impl $name {
            /// Allocate a fresh handle
            pub fn next() -> Self {
                static GENERATOR: $crate::IdGenerator = $crate::IdGenerator::new();
                Self(GENERATOR.next())
            }

            /// Get the inner ID
            pub fn id(&self) -> $crate::Id {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_id!(
        /// Test handle
        ProbeId
    );

    #[test]
    fn test_id_parts() {
        let id = Id::new(42, 7);
        assert_eq!(id.index(), 42);
        assert_eq!(id.generation(), 7);
        assert_eq!(Id::from_bits(id.to_bits()), id);
    }

    #[test]
    fn test_bumped_keeps_index() {
        let id = Id::new(3, 0).bumped();
        assert_eq!(id.index(), 3);
        assert_eq!(id.generation(), 1);
    }

    #[test]
    fn test_generator_starts_at_one() {
        let gen = IdGenerator::new();
        assert_eq!(gen.next().index(), 1);
        assert_eq!(gen.next().index(), 2);
    }

    #[test]
    fn test_typed_ids_are_distinct() {
        let a = ProbeId::next();
        let b = ProbeId::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("ProbeId#"));
    }
}
