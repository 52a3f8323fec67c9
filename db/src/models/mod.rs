pub mod attendance_record;
pub mod class_session;
pub mod student;

pub use attendance_record::Entity as AttendanceRecord;
pub use class_session::Entity as ClassSession;
pub use student::Entity as Student;
