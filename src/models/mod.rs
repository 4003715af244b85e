pub mod event;
pub mod interaction;
