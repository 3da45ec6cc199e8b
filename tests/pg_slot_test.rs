//! Slot uniqueness against a real Postgres. Run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use time::macros::datetime;
use uuid::Uuid;

use barbershop::{
    appointments::{
        repo::{AppointmentRepository, PgAppointmentRepository},
        repo_types::AppointmentStatus,
        services::AppointmentService,
    },
    auth::{
        repo::{PgUserRepository, UserRepository},
        repo_types::NewUser,
    },
    db,
    error::AppError,
};

async fn pool() -> sqlx::PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .unwrap();
    db::migrate(&pool).await.unwrap();
    pool
}

async fn seed_user(pool: &sqlx::PgPool) -> Uuid {
    let users = PgUserRepository::new(pool.clone());
    users
        .create(NewUser {
            name: "Slot Tester".into(),
            email: format!("{}@slots.test", Uuid::new_v4()),
            phone: "555-0199".into(),
            password_hash: "not-a-real-hash".into(),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs a running Postgres"]
async fn concurrent_bookings_leave_one_winner() {
    let pool = pool().await;
    let user = seed_user(&pool).await;
    let repo = Arc::new(PgAppointmentRepository::new(pool.clone()));
    let svc = Arc::new(AppointmentService::new(
        repo.clone() as Arc<dyn AppointmentRepository>
    ));
    // A fresh barber per run keeps reruns against the same database independent.
    let barber = format!("barber-{}", Uuid::new_v4());
    let slot = datetime!(2030-06-01 10:00 UTC);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = svc.clone();
        let barber = barber.clone();
        handles.push(tokio::spawn(async move {
            svc.create(user, slot, "haircut".into(), barber).await
        }));
    }

    let mut ok = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);

    let active: Vec<_> = repo
        .list(Some(user))
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.barber == barber && a.status.occupies_slot())
        .collect();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
#[ignore = "needs a running Postgres"]
async fn canceling_frees_the_slot_in_the_index() {
    let pool = pool().await;
    let user = seed_user(&pool).await;
    let svc = AppointmentService::new(Arc::new(PgAppointmentRepository::new(pool)));
    let barber = format!("barber-{}", Uuid::new_v4());
    let slot = datetime!(2030-06-02 14:30 UTC);

    let first = svc
        .create(user, slot, "shave".into(), barber.clone())
        .await
        .unwrap();
    svc.update_status(first.id, "CANCELED").await.unwrap();

    let second = svc
        .create(user, slot, "shave".into(), barber.clone())
        .await
        .unwrap();
    assert_eq!(second.status, AppointmentStatus::Scheduled);

    // Reactivating the canceled booking would double-book the slot.
    let err = svc.update_status(first.id, "SCHEDULED").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[ignore = "needs a running Postgres"]
async fn booking_for_a_missing_user_is_not_found() {
    let pool = pool().await;
    let svc = AppointmentService::new(Arc::new(PgAppointmentRepository::new(pool)));
    let err = svc
        .create(
            Uuid::new_v4(),
            datetime!(2030-06-03 09:00 UTC),
            "haircut".into(),
            "bob".into(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
