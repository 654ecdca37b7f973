//! Utilities: string interning, output paths, runtime constants

pub mod constants;
mod intern;
pub mod path;

pub use constants::{MAX_RESOURCE_ID_LEN, PROVIDER_TIMEOUT};
pub use intern::intern;
