use crate::seed::{Seeder, run_seeder};
use crate::seeds::{
    attendance::AttendanceSeeder, class_session::ClassSeeder, student::StudentSeeder,
};
use migration::Migrator;
use sea_orm_migration::MigratorTrait;

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(&db, None).await {
        eprintln!("Failed to apply migrations: {e}");
        std::process::exit(1);
    }

    let seeders: Vec<(Box<dyn Seeder + Send + Sync>, &str)> = vec![
        (Box::new(StudentSeeder), "Student"),
        (Box::new(ClassSeeder), "Class"),
        (Box::new(AttendanceSeeder), "Attendance"),
    ];

    for (seeder, name) in seeders {
        run_seeder(seeder.as_ref(), name, &db).await;
    }
}
