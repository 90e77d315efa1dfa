//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs for list operations (no N+1)
//! - Handles conflicts via the unique indexes (no check-then-insert)
//! - Uses transactions for multi-step operations

pub mod accounts;
pub mod courses;
pub mod enrollments;
pub mod lecturers;

pub use accounts::{Account, AccountChanges, AccountRepo, NewAccount};
pub use courses::{Course, CourseChanges, CourseRepo, NewCourse};
pub use enrollments::{Enrollment, EnrollmentReceipt, EnrollmentRepo};
pub use lecturers::{Lecturer, LecturerChanges, LecturerRepo, NewLecturer};
