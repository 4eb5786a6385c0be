//! Shared helpers with no knowledge of categories or tasks.

pub mod html;
pub mod mime;
pub mod path;
