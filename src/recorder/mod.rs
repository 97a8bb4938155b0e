pub mod artifact;
pub mod channel;
pub mod media;

pub use artifact::{Artifact, Blob, FileObjectUrls, MemoryObjectUrls, ObjectUrls};
pub use channel::{ChannelBindings, ChannelRecorder};
pub use media::{
    parse_pcm_mime, pcm_mime, MediaChunk, MediaRecorder, PcmMediaRecorder, PcmRecorderFactory,
    RecorderFactory,
};
