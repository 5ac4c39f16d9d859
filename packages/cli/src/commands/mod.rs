pub mod compile;
pub mod init;
pub mod render;

pub use compile::{compile, CompileArgs};
pub use init::{init, InitArgs};
pub use render::{render, RenderArgs};
