pub mod controller;
pub mod controls;
pub mod error;
pub mod headless;
pub mod rate;
pub mod state;
pub mod subtitle;
pub mod surface;
pub mod volume;
