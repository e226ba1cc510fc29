pub mod error;
pub mod logging;

pub use error::{AnalysisError, ErrorCategory};
pub use logging::setup_logging;
