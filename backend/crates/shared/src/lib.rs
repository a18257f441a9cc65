//! Shared Kernel
//!
//! Vocabulary shared by every backend crate:
//! - The unified error type and its HTTP classification
//! - Typed identifiers for quiz entities
//!
//! Only things whose meaning is the same in every crate belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
