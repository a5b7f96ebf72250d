mod process;
mod renderer;

pub use process::*;
pub use renderer::*;
