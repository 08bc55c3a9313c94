pub mod checker;
pub mod prober;
pub mod scheduler;
