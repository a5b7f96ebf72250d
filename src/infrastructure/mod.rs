pub mod backends;
pub mod observers;
pub mod remote;
pub mod render;
