pub mod chunk;
pub mod feedback;
pub mod scores;
pub mod transcript;

pub use chunk::*;
pub use feedback::*;
pub use scores::*;
pub use transcript::*;
