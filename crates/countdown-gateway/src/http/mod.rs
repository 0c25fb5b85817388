pub mod health;
pub mod timers;
