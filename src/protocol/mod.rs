//! Protocol constants and header helpers shared by the request and response paths.
//!
//! - **[constants]** - API version, header names, status codes
//! - **headers** - Custom property name mangling and value cleanup

pub mod constants;
mod headers;

pub use headers::{is_reserved_header, normalize_property_name, trim_property_value};
