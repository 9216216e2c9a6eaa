mod process;
mod run;
mod segment;
mod traits;
pub mod types;

pub use process::ProcessBackend;
pub use run::run_stream;
pub use segment::segment_path;
pub use traits::{CaptureBackend, CaptureSession};
pub use types::{CaptureOutcome, CaptureStartArgs, RunnerSettings};
