//! Text prompt to picture, through one external prediction provider.
//!
//! A failed or missing picture is never an error for callers: every path that
//! cannot produce an image ends in `None`.

pub mod backend;
pub mod generator;
pub mod replicate;

pub use backend::{FetchedAsset, ImageBackend, ImageError, Prediction, PredictionStatus};
pub use generator::{BatchOutcome, GeneratedImage, ImageGenerator, ImagePrompt, PollPolicy};
pub use replicate::ReplicateBackend;
