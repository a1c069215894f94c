pub mod applications;
pub mod files;
pub mod health;
pub mod storage_events;
pub mod submissions;
