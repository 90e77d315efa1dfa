//! API routes

pub mod accounts;
pub mod analytics;
pub mod courses;
pub mod health;
pub mod lecturers;
