pub mod device;
pub mod file;
pub mod stream;

pub use device::{AcquisitionState, CaptureDevices, DeviceAcquirer, RemoteAudioSource};
pub use file::{AudioFile, FileCaptureDevices, FileRemoteAudio};
pub use stream::{AudioFrame, CaptureStream, Channel};
