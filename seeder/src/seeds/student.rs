use crate::seed::Seeder;
use chrono::Utc;
use db::AttendanceError;
use db::models::student::{Model, NewStudent};
use fake::{
    Fake,
    faker::internet::en::SafeEmail,
    faker::name::en::{FirstName, LastName},
};
use sea_orm::DatabaseConnection;
use util::config;

pub struct StudentSeeder;

#[async_trait::async_trait]
impl Seeder for StudentSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), AttendanceError> {
        let prefix = config::student_code_prefix();
        let now = Utc::now();

        // Fixed students
        for (code, first, last) in [
            ("STU20240001", "Ada", "Lovelace"),
            ("STU20240002", "Alan", "Turing"),
        ] {
            let input = NewStudent {
                first_name: first.into(),
                last_name: last.into(),
                email: Some(format!("{}@example.com", first.to_lowercase())),
                student_code: Some(code.into()),
            };
            match Model::create(db, input, &prefix, now).await {
                Ok(_) => {}
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e),
            }
        }

        // Random students. Generated codes share the timestamp, so collisions are skipped.
        for _ in 0..10 {
            let input = NewStudent {
                first_name: FirstName().fake(),
                last_name: LastName().fake(),
                email: Some(SafeEmail().fake()),
                student_code: None,
            };
            match Model::create(db, input, &prefix, now).await {
                Ok(_) => {}
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
