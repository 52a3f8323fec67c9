pub mod attendance;
pub mod class_session;
pub mod student;
