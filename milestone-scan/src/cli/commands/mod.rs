// Command implementations

pub mod capabilities;
pub mod extract;
pub mod timeline;
pub mod validate;
