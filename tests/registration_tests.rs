mod common;

use chrono::{Duration, TimeZone, Utc};
use volunteer::config::Config;
use volunteer::database::{self, registrations_repo, users_repo};
use volunteer::error::AppError;
use volunteer::models::{CampaignStatus, RegistrationStatus, UserRole};
use volunteer::services::registration_service;

use common::{
    assert_counters_consistent, current_volunteers, seed_campaign, seed_user, test_pool,
    CampaignSeed,
};

#[tokio::test]
async fn register_takes_a_seat_and_stores_notes() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open()).await;

    let registration = registration_service::register_campaign(
        &pool,
        &volunteer,
        &campaign,
        Some("  bringing gloves  "),
        Utc::now(),
    )
    .await
    .unwrap();

    assert_eq!(registration.status, RegistrationStatus::Registered);
    assert_eq!(registration.notes.as_deref(), Some("bringing gloves"));
    assert_eq!(current_volunteers(&pool, &campaign).await, 1);
    assert_counters_consistent(&pool).await;
}

#[tokio::test]
async fn second_registration_for_same_pair_is_a_duplicate() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open()).await;

    registration_service::register_campaign(&pool, &volunteer, &campaign, None, Utc::now())
        .await
        .unwrap();
    let err = registration_service::register_campaign(&pool, &volunteer, &campaign, None, Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DuplicateRegistration), "got {err:?}");
    assert!(!err.is_retryable());
    assert_eq!(current_volunteers(&pool, &campaign).await, 1);
}

#[tokio::test]
async fn duplicate_is_reported_before_full() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open().with_seats(1)).await;

    registration_service::register_campaign(&pool, &volunteer, &campaign, None, Utc::now())
        .await
        .unwrap();
    let err = registration_service::register_campaign(&pool, &volunteer, &campaign, None, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateRegistration), "got {err:?}");
}

#[tokio::test]
async fn single_seat_handoff_between_two_volunteers() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let a = seed_user(&pool, UserRole::Volunteer).await;
    let b = seed_user(&pool, UserRole::Volunteer).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open().with_seats(1)).await;
    let now = Utc::now();

    registration_service::register_campaign(&pool, &a, &campaign, None, now)
        .await
        .unwrap();
    assert_eq!(current_volunteers(&pool, &campaign).await, 1);

    let err = registration_service::register_campaign(&pool, &b, &campaign, None, now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CampaignFull), "got {err:?}");

    let cancelled = registration_service::cancel_registration(&pool, &a, &campaign, now)
        .await
        .unwrap();
    assert_eq!(cancelled.message, "Registration cancelled");
    assert_eq!(current_volunteers(&pool, &campaign).await, 0);

    registration_service::register_campaign(&pool, &b, &campaign, None, now)
        .await
        .unwrap();
    assert_eq!(current_volunteers(&pool, &campaign).await, 1);
    assert_counters_consistent(&pool).await;
}

#[tokio::test]
async fn registration_after_start_is_closed_even_with_free_seats() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;
    let started = seed_campaign(
        &pool,
        &org,
        CampaignSeed::open()
            .with_status(CampaignStatus::Ongoing)
            .with_window(Utc::now() - Duration::hours(1), None),
    )
    .await;

    let err = registration_service::register_campaign(&pool, &volunteer, &started, None, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RegistrationWindowClosed), "got {err:?}");

    // exactly at the start instant counts as started
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open()).await;
    let start = volunteer::database::campaigns_repo::load_campaign_by_id(&pool, &campaign)
        .await
        .unwrap()
        .unwrap()
        .start_date;
    let err = registration_service::register_campaign(&pool, &volunteer, &campaign, None, start)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RegistrationWindowClosed), "got {err:?}");
    assert_eq!(current_volunteers(&pool, &campaign).await, 0);
}

#[tokio::test]
async fn only_approved_or_ongoing_campaigns_accept_registrations() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;

    for status in [
        CampaignStatus::Pending,
        CampaignStatus::Rejected,
        CampaignStatus::Completed,
    ] {
        let campaign = seed_campaign(&pool, &org, CampaignSeed::open().with_status(status)).await;
        let err =
            registration_service::register_campaign(&pool, &volunteer, &campaign, None, Utc::now())
                .await
                .unwrap_err();
        assert!(
            matches!(err, AppError::InvalidCampaignState(s) if s == status),
            "got {err:?}"
        );
    }

    let ongoing = seed_campaign(
        &pool,
        &org,
        CampaignSeed::open().with_status(CampaignStatus::Ongoing),
    )
    .await;
    registration_service::register_campaign(&pool, &volunteer, &ongoing, None, Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn register_requires_existing_campaign_and_volunteer_role() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open()).await;

    let err = registration_service::register_campaign(&pool, &volunteer, "missing", None, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Campaign")), "got {err:?}");

    let err = registration_service::register_campaign(&pool, &org, &campaign, None, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
    assert_eq!(current_volunteers(&pool, &campaign).await, 0);
}

#[tokio::test]
async fn cancel_requires_registration_and_open_window() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open()).await;

    let err = registration_service::cancel_registration(&pool, &volunteer, &campaign, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Registration")), "got {err:?}");

    registration_service::register_campaign(&pool, &volunteer, &campaign, None, Utc::now())
        .await
        .unwrap();

    let after_start = Utc::now() + Duration::days(1) + Duration::minutes(1);
    let err = registration_service::cancel_registration(&pool, &volunteer, &campaign, after_start)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RegistrationWindowClosed), "got {err:?}");

    // rolled back: the seat and the row are both still there
    assert_eq!(current_volunteers(&pool, &campaign).await, 1);
    assert!(registrations_repo::load_registration(&pool, &campaign, &volunteer)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn counter_matches_ledger_after_mixed_register_and_cancel() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open().with_seats(3)).await;
    let now = Utc::now();

    let mut volunteers = Vec::new();
    for _ in 0..5 {
        volunteers.push(seed_user(&pool, UserRole::Volunteer).await);
    }

    let mut full_rejections = 0;
    for v in &volunteers {
        match registration_service::register_campaign(&pool, v, &campaign, None, now).await {
            Ok(_) => {}
            Err(AppError::CampaignFull) => full_rejections += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }
    assert_eq!(full_rejections, 2);
    assert_eq!(current_volunteers(&pool, &campaign).await, 3);

    registration_service::cancel_registration(&pool, &volunteers[1], &campaign, now)
        .await
        .unwrap();
    registration_service::register_campaign(&pool, &volunteers[4], &campaign, None, now)
        .await
        .unwrap();
    registration_service::cancel_registration(&pool, &volunteers[0], &campaign, now)
        .await
        .unwrap();

    let live = registrations_repo::list_for_campaign(&pool, &campaign)
        .await
        .unwrap();
    assert_eq!(live.len(), 2);
    assert_eq!(current_volunteers(&pool, &campaign).await, 2);
    assert_counters_consistent(&pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_never_overfill_the_last_seat() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database_url: format!("sqlite://{}", dir.path().join("campaigns.db").display()),
        host: "127.0.0.1".to_string(),
        port: 0,
        database_max_connections: 8,
        database_busy_timeout: std::time::Duration::from_secs(10),
    };
    let pool = database::connect(&config).await.unwrap();
    database::migrate(&pool).await.unwrap();

    let org = seed_user(&pool, UserRole::Organization).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open().with_seats(3)).await;

    // two seats already taken, one left
    for _ in 0..2 {
        let v = seed_user(&pool, UserRole::Volunteer).await;
        registration_service::register_campaign(&pool, &v, &campaign, None, Utc::now())
            .await
            .unwrap();
    }

    let mut contenders = Vec::new();
    for _ in 0..8 {
        contenders.push(seed_user(&pool, UserRole::Volunteer).await);
    }

    let mut handles = Vec::new();
    for v in contenders {
        let pool = pool.clone();
        let campaign = campaign.clone();
        handles.push(tokio::spawn(async move {
            registration_service::register_campaign(&pool, &v, &campaign, None, Utc::now()).await
        }));
    }

    let mut successes = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::CampaignFull) => full += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(full, 7);
    assert_eq!(current_volunteers(&pool, &campaign).await, 3);
    assert_counters_consistent(&pool).await;
}

#[tokio::test]
async fn marking_attended_awards_points_once() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open()).await;

    let registration =
        registration_service::register_campaign(&pool, &volunteer, &campaign, None, Utc::now())
            .await
            .unwrap();

    for _ in 0..2 {
        let updated = registration_service::update_registration_status(
            &pool,
            &org,
            &registration.registration_id,
            RegistrationStatus::Attended,
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, RegistrationStatus::Attended);
    }

    let user = users_repo::load_user(&pool, &volunteer).await.unwrap().unwrap();
    assert_eq!(user.points, 10);
    // attended registrations still hold their seat
    assert_eq!(current_volunteers(&pool, &campaign).await, 1);
    assert_counters_consistent(&pool).await;
}

#[tokio::test]
async fn only_the_owning_organization_updates_registration_status() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let other_org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;
    let campaign = seed_campaign(&pool, &org, CampaignSeed::open()).await;
    let registration =
        registration_service::register_campaign(&pool, &volunteer, &campaign, None, Utc::now())
            .await
            .unwrap();

    let err = registration_service::update_registration_status(
        &pool,
        &other_org,
        &registration.registration_id,
        RegistrationStatus::Attended,
        Utc::now(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    let err = registration_service::update_registration_status(
        &pool,
        &org,
        "missing",
        RegistrationStatus::Attended,
        Utc::now(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Registration")), "got {err:?}");

    let user = users_repo::load_user(&pool, &volunteer).await.unwrap().unwrap();
    assert_eq!(user.points, 0);
}

#[tokio::test]
async fn listing_registrations_is_scoped_to_owner_and_volunteer() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let other_org = seed_user(&pool, UserRole::Organization).await;
    let volunteer = seed_user(&pool, UserRole::Volunteer).await;
    let first = seed_campaign(&pool, &org, CampaignSeed::open()).await;
    let second = seed_campaign(&pool, &org, CampaignSeed::open()).await;

    registration_service::register_campaign(&pool, &volunteer, &first, None, Utc::now())
        .await
        .unwrap();
    registration_service::register_campaign(&pool, &volunteer, &second, None, Utc::now())
        .await
        .unwrap();

    let for_campaign = registration_service::list_campaign_registrations(&pool, &org, &first)
        .await
        .unwrap();
    assert_eq!(for_campaign.len(), 1);
    assert_eq!(for_campaign[0].volunteer_id, volunteer);

    let err = registration_service::list_campaign_registrations(&pool, &other_org, &first)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    let mine = registration_service::list_volunteer_registrations(&pool, &volunteer)
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
}

#[tokio::test]
async fn listings_follow_registration_time_within_one_second() {
    let pool = test_pool().await;
    let org = seed_user(&pool, UserRole::Organization).await;
    let start = Utc.with_ymd_and_hms(2099, 3, 1, 9, 0, 0).unwrap();
    let campaign = seed_campaign(
        &pool,
        &org,
        CampaignSeed::open().with_window(start, Some(start + Duration::hours(4))),
    )
    .await;
    let base = Utc.with_ymd_and_hms(2099, 2, 1, 10, 0, 0).unwrap();

    let mut expected = Vec::new();
    for offset_ms in [300, 100, 200] {
        let v = seed_user(&pool, UserRole::Volunteer).await;
        registration_service::register_campaign(
            &pool,
            &v,
            &campaign,
            None,
            base + Duration::milliseconds(offset_ms),
        )
        .await
        .unwrap();
        expected.push((offset_ms, v));
    }
    expected.sort();
    let expected: Vec<String> = expected.into_iter().map(|(_, v)| v).collect();

    let listed: Vec<String> =
        registration_service::list_campaign_registrations(&pool, &org, &campaign)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.volunteer_id)
            .collect();
    assert_eq!(listed, expected);
}
