//! Access and invocation policies for member descriptors

/// Whether a property can be written through reflection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    /// Getter and setter
    #[default]
    ReadWrite,
    /// Getter only
    ReadOnly,
}

/// How a method hands its result back to the caller
///
/// There is no by-reference policy: a `Variant` owns its value and cannot
/// borrow from the instance. Methods that need to hand out shared state
/// return an `Arc<T>`, which the variant stores as a pointer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodPolicy {
    /// The result is boxed into a variant of the declared return type
    #[default]
    ReturnValue,
    /// The result is dropped and the call yields an empty variant
    DiscardReturn,
}
