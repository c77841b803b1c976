//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Identity can be scoped: an order line, for example, is identified by its
/// product id *within* its owning order (composite key with the order).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
