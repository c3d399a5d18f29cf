pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod http;
pub mod tokenizer;

pub use endpoints::*;
pub use error::*;
pub use gateway::*;
pub use http::*;
pub use tokenizer::*;
