//! Change filtering by field-group patterns and priority.

pub mod change_filter;
pub mod pattern;

pub use change_filter::ChangeFilter;
pub use pattern::FieldPattern;
