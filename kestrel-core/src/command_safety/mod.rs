//! Command security: classifies shell commands as blocked, allowed, or
//! requiring confirmation before `run_command`/`run_tests` execute them.

pub mod allowlist;
pub mod classifier;
pub mod dangerous;

pub use classifier::{classify, tokenize, CommandClass};
