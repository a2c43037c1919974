pub mod coordinator;
pub mod http;
pub mod watch_history;
