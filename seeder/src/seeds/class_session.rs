use crate::seed::Seeder;
use chrono::{Duration, NaiveTime, Utc};
use db::AttendanceError;
use db::models::class_session::{Model, NewClass};
use sea_orm::DatabaseConnection;
use util::config;

pub struct ClassSeeder;

#[async_trait::async_trait]
impl Seeder for ClassSeeder {
    async fn seed(&self, db: &DatabaseConnection) -> Result<(), AttendanceError> {
        let today = Utc::now().date_naive();
        let classes = [
            ("Lab A", today - Duration::days(2), (9, 0), Some(30)),
            ("Lecture: Data Structures", today - Duration::days(1), (11, 30), None),
            ("Tutorial 3", today + Duration::days(1), (14, 0), Some(20)),
        ];

        for (name, date, (h, m), capacity) in classes {
            let Some(time) = NaiveTime::from_hms_opt(h, m, 0) else {
                continue;
            };
            let input = NewClass {
                name: name.into(),
                class_date: date,
                class_time: time,
                capacity,
            };
            Model::create(db, input, config::default_class_capacity(), Utc::now()).await?;
        }
        Ok(())
    }
}
