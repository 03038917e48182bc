//! Hi-C domain primitives: chromosome sets, contact pairs, sample manifests and contact count files.

pub mod genome;
pub mod manifest;
pub mod contacts;
pub mod combine;

pub use genome::{ChromSet, ChromPair, ContactType};
pub use manifest::{Sample, SampleList};
