pub mod commandline;
pub mod configuration;
pub mod context;
pub mod error;
pub mod playback;
pub mod resume;
pub mod session;
pub mod types;
pub mod utils;
