//! Results of operations that keep going past individual failures.

/// The outcome of an operation that completed while some of its parts failed.
/// The `Vec<E>` holds the failures that were skipped along the way, such as
/// rule lines that did not compile.
pub type PartialSuccess<T, E> = ( T, Vec<E> );
