//! Request-side domain types with validation at construction
//!
//! Invalid input returns ValidationError, never a panic.

pub mod account;
pub mod course;
pub mod pagination;
pub mod validation;

pub use account::{Email, Role, Username};
pub use course::{validate_capacity, validate_time_slot, CourseCode, MAX_CAPACITY};
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use validation::{required_text, ValidationError};
