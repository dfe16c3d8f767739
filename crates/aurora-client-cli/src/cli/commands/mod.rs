//! CLI command handlers, one per file.

mod call;
mod clusters;
mod completions;
mod methods;
mod url;

pub use call::{parse_args, run_call};
pub use clusters::run_clusters;
pub use completions::run_completions;
pub use methods::run_methods;
pub use url::run_url;
