//! Testing utilities and harness for the fiber reconciliation engine

pub mod testing;

// Re-export testing utilities
pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use fiber_core::{element, text_element, Element, Mutation, WorkStatus};
}
