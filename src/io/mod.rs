// Purpose - external interfaces: the audio output seam

pub mod backend;

pub use backend::{AudioBackend, BackendError, NullBackend, SampleRef, VoiceGroup};
