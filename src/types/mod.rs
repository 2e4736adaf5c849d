mod models;
mod role;
mod section;

pub use models::*;
pub use role::Role;
pub use section::Section;
