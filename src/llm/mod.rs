pub mod client;
pub mod parse;
pub mod prompts;

pub use client::*;
pub use parse::*;
pub use prompts::*;
