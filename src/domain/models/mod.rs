mod artifact;
mod backend;
mod error;
mod event;
mod interaction;
mod observer;
mod process;
mod request;
mod response;
mod session;
mod slash_commands;

pub use artifact::*;
pub use backend::*;
pub use error::*;
pub use event::*;
pub use interaction::*;
pub use observer::*;
pub use process::*;
pub use request::*;
pub use response::*;
pub use session::*;
pub use slash_commands::*;
