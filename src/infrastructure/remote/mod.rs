mod ssh;

pub use ssh::*;
