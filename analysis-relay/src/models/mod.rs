pub mod upload;

pub use upload::{Upload, UploadError};
