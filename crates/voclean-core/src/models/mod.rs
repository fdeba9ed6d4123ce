pub mod recording;

pub use recording::{Recording, RecordingResponse, RecordingStatus};
