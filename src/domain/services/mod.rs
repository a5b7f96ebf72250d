mod artifacts;
mod conversation;
mod sessions;

pub use artifacts::*;
pub use conversation::*;
pub use sessions::*;
