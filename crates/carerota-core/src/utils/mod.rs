//! Utility functions for pagination, calendar ranges and display formatting.

pub mod calendar;
pub mod format;
pub mod pagination;

// Re-export commonly used items at module level
pub use calendar::{CalendarView, DateRange};
pub use format::{format_date, format_phone, truncate_string};
pub use pagination::{paginate, Pagination};
