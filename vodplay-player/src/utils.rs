#[cfg(test)]
pub mod fake_surface;
#[cfg(test)]
pub mod fake_watch_history;
pub mod time_source;
