//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two value
/// objects with the same attribute values are the same value. A computed
/// stock adjustment is a value object; an order or a product is an entity.
///
/// The trait requires `Clone` (values are copied, not referenced),
/// `PartialEq` (compared by attributes) and `Debug` (logging, testing).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
