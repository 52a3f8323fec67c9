pub mod m202603010001_create_students;
pub mod m202603010002_create_classes;
pub mod m202603010003_create_attendance_records;
