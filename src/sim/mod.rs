pub mod event;
pub mod flow;
pub mod particles;
pub mod resolve;
pub mod scheduler;
pub mod session;
