//! Audio side of a render: beat tracking, beat-to-duration mapping and fitting the track to the
//! assembled timeline.

pub mod beats;
pub mod durations;
pub mod reconcile;

pub use beats::{BeatTimeline, BeatTracker, BeatTrackerConfig, estimate_tempo_bpm};
pub use durations::{DurationSequence, convert_to_durations};
pub use reconcile::{AudioReconciler, ReconciledAudio};
