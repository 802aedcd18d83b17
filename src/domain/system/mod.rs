pub mod calc_task;
pub mod link;
pub mod session;
pub mod system;
pub mod transmission;
pub mod unit;
