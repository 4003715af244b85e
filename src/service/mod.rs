pub mod event_cache;
pub mod signature;
pub mod status_formatter;
