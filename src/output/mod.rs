// Output: result persistence and terminal display.

pub mod json;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod terminal;
