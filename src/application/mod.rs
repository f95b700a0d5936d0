pub mod alert_engine;
pub mod bootstrap;
pub mod notifier;
pub mod scanning;
