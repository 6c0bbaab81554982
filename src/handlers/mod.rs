pub mod debug_handlers;
pub mod event_handlers;
pub mod health_handlers;
