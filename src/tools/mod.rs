//! Runners for the external executables the harness drives: the quartet
//! search tool, the ASTRAL jar and the RAxML RF backend. All invocations are
//! synchronous and capture combined stdout/stderr; none of them has a
//! timeout, so a hung tool hangs the harness.

pub mod astral;
pub mod raxml;
pub mod traits;
pub mod treesearch;

pub use astral::Astral;
pub use raxml::RaxmlRf;
pub use traits::{CapturedRun, SpeciesTreeTool};
pub use treesearch::Treesearch;
