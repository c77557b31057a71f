//! Loading and writing the files a render touches: source photographs, the fixed image assets,
//! fonts, and the audio track.

pub mod images;
pub mod media;
pub(crate) mod text;
