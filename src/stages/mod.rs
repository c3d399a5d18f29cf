pub mod stage0_normalize;
pub mod stage1_chunk;
pub mod stage2_aggregate;
pub mod stage_rewrite;
pub mod stage_select;

pub use stage0_normalize::*;
pub use stage1_chunk::*;
pub use stage2_aggregate::*;
pub use stage_rewrite::*;
pub use stage_select::*;
