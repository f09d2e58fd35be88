mod audio;
mod ids;

pub use audio::{AudioBuffer, AudioFormat, SampleRate};
pub use ids::AssetId;
