//! Integration tests for the eduride-store crate.
//!
//! These run the full lifecycle (migrations, seeding, cross-entity
//! relationships) against a real SQLite database on disk via tempfile.

use eduride_store::{
    AdminStore, BusStore, Database, DriverStore, FeedbackStore, LocationStore, NewBus, NewFeedback,
    NewLocation, NewRoute, NewSchedule, NewStop, RouteStore, ScheduleStore, StoreError,
    StudentStore, UserType, migration, seed_defaults, verify_password,
};

// ═══════════════════════════════════════════════════════════════════════
//  Database lifecycle
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn database_open_and_migrate_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("eduride.db");

    let db = Database::open_and_migrate(db_path.clone()).await.unwrap();
    assert_eq!(db.schema_version().await.unwrap(), migration::latest_version());
    assert!(db.ping().await);

    // The parent directory is created on demand.
    assert!(db_path.exists());
}

#[tokio::test]
async fn connect_accepts_sqlite_urls() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:///{}", dir.path().join("url.db").display());

    let db = Database::connect(&url).await.unwrap();
    assert_eq!(BusStore::new(db).count().await.unwrap(), 0);
    assert!(dir.path().join("url.db").exists());
}

#[tokio::test]
async fn seeded_accounts_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("seeded.db");

    let db1 = Database::open_and_migrate(db_path.clone()).await.unwrap();
    let report = seed_defaults(&db1).await.unwrap();
    assert_eq!(report.created.len(), 4);
    drop(db1);

    // Migrating and seeding again is a no-op.
    let db2 = Database::open_and_migrate(db_path).await.unwrap();
    assert!(seed_defaults(&db2).await.unwrap().is_empty());

    let admins = AdminStore::new(db2.clone());
    let (admin, hash) = admins.credentials("admin").await.unwrap().unwrap();
    assert_eq!(admin.name, "Administrator");
    assert!(verify_password("admin123", &hash).unwrap());

    let students = StudentStore::new(db2);
    let (student, _) = students.credentials("student@tce.edu").await.unwrap().unwrap();
    assert_eq!(student.roll_number, "TCE2025001");
}

// ═══════════════════════════════════════════════════════════════════════
//  Fleet lifecycle (on-disk database)
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn route_bus_schedule_and_location_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_and_migrate(dir.path().join("fleet.db"))
        .await
        .unwrap();
    seed_defaults(&db).await.unwrap();

    let routes = RouteStore::new(db.clone());
    let route = routes
        .create(NewRoute {
            route_name: "Route 1".into(),
            description: Some("Campus to Periyar".into()),
            stops: vec![
                NewStop {
                    stop_name: "Periyar Bus Stand".into(),
                    latitude: 9.9160,
                    longitude: 78.1119,
                    order: 2,
                },
                NewStop {
                    stop_name: "TCE Main Gate".into(),
                    latitude: 9.8825,
                    longitude: 78.0815,
                    order: 1,
                },
            ],
        })
        .await
        .unwrap();
    let route_id = route.route.id;

    let buses = BusStore::new(db.clone());
    let bus = buses
        .create(NewBus {
            bus_number: "TCE-01".into(),
            capacity: 52,
            model: "Tata Starbus".into(),
            registration_number: "TN-58-AB-0001".into(),
        })
        .await
        .unwrap();

    let schedules = ScheduleStore::new(db.clone());
    let schedule = schedules
        .create(NewSchedule {
            bus_id: bus.id,
            route_id,
            departure_time: "07:30".into(),
            days_of_week: vec!["Monday".into(), "Friday".into()],
            status: None,
        })
        .await
        .unwrap();
    assert_eq!(schedule.route_name, "Route 1");

    // A scheduled route may not be deleted out from under its schedule.
    assert!(matches!(
        routes.delete(route_id).await,
        Err(StoreError::Conflict { .. })
    ));

    let driver = DriverStore::new(db.clone())
        .get_by_email("driver@tce.edu")
        .await
        .unwrap()
        .unwrap();
    let locations = LocationStore::new(db.clone());
    locations
        .record(NewLocation {
            bus_id: bus.id,
            driver_id: driver.id,
            latitude: 9.90,
            longitude: 78.09,
            speed: Some(30.0),
        })
        .await
        .unwrap();
    assert!(locations.latest_for_bus(bus.id).await.unwrap().is_some());

    // Removing the schedule releases the route, and deleting it drops its stops.
    assert!(schedules.delete(schedule.id).await.unwrap());
    assert!(routes.delete(route_id).await.unwrap());
    assert_eq!(routes.stop_count(route_id).await.unwrap(), 0);
}

#[tokio::test]
async fn feedback_summary_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_and_migrate(dir.path().join("feedback.db"))
        .await
        .unwrap();
    let store = FeedbackStore::new(db);

    for (rating, category) in [(5, "service"), (3, "route"), (4, "service")] {
        store
            .create(NewFeedback {
                user_id: 1,
                user_type: UserType::Student,
                rating,
                category: category.into(),
                message: "ok".into(),
            })
            .await
            .unwrap();
    }

    let summary = store.summary(5).await.unwrap();
    assert_eq!(summary.total_feedback, 3);
    assert_eq!(summary.average_rating, 4.0);
    assert_eq!(summary.recent_feedback.len(), 3);
    assert_eq!(store.list(0, 100).await.unwrap(), store.list(0, 100).await.unwrap());
}
