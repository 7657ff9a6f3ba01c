//! End-to-end tests through the host-facing `VetScanCore` object.

use vetscan_core::{
    open_database, open_database_in_memory, FfiAppointmentUpdate, FfiNewAppointment, FfiNewUser,
    FfiOwnerInput, FfiPetInput, VetScanCore, VetScanError,
};

fn new_user(username: &str, role: &str) -> FfiNewUser {
    FfiNewUser {
        username: username.to_string(),
        email: format!("{}@clinic.example", username),
        password: "correct horse".to_string(),
        first_name: "Test".to_string(),
        last_name: username.to_string(),
        role: role.to_string(),
        clinic_id: None,
    }
}

/// Admin token, vet id and pet id on a fresh clinic.
fn setup(core: &VetScanCore) -> (String, String, String) {
    core.bootstrap_admin(new_user("admin", "admin")).unwrap();
    let token = core
        .login("admin".to_string(), "correct horse".to_string())
        .unwrap()
        .token;

    let vet = core
        .create_veterinarian(token.clone(), new_user("house", "veterinarian"), None, None)
        .unwrap();
    let owner = core
        .create_owner(
            token.clone(),
            FfiOwnerInput {
                first_name: "Ana".to_string(),
                last_name: "Silva".to_string(),
                email: "ana@example.com".to_string(),
                phone: None,
                address: None,
            },
        )
        .unwrap();
    let pet = core
        .create_pet(
            token.clone(),
            FfiPetInput {
                owner_id: owner.owner_id,
                name: "Rex".to_string(),
                species: "canine".to_string(),
                breed: None,
                sex: None,
                date_of_birth: Some("2020-01-15".to_string()),
                weight_kg: Some(24.5),
            },
        )
        .unwrap();

    (token, vet.user.user_id, pet.pet_id)
}

fn appointment(vet_id: &str, pet_id: &str, start: &str) -> FfiNewAppointment {
    FfiNewAppointment {
        pet_id: pet_id.to_string(),
        veterinarian_id: vet_id.to_string(),
        start_time: start.to_string(),
        duration_minutes: Some(30),
        appointment_type: "checkup".to_string(),
        notes: None,
        estimated_cost_cents: None,
    }
}

#[test]
fn test_booking_flow() {
    let core = open_database_in_memory().unwrap();
    let (token, vet_id, pet_id) = setup(&core);

    let first = core
        .create_appointment(token.clone(), appointment(&vet_id, &pet_id, "2030-03-04T10:00:00Z"))
        .unwrap();
    assert_eq!(first.end_time, "2030-03-04T10:30:00+00:00");

    // Same instant expressed with an offset still collides
    let err = core
        .create_appointment(
            token.clone(),
            appointment(&vet_id, &pet_id, "2030-03-04T12:15:00+02:00"),
        )
        .unwrap_err();
    assert!(matches!(err, VetScanError::Conflict(_)));

    core.create_appointment(token.clone(), appointment(&vet_id, &pet_id, "2030-03-04T10:30:00Z"))
        .unwrap();

    let updated = core
        .update_appointment(
            token.clone(),
            first.appointment_id.clone(),
            FfiAppointmentUpdate {
                notes: Some("fasting".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.notes.as_deref(), Some("fasting"));

    let day = core
        .list_appointments_for_veterinarian_on(token.clone(), vet_id.clone(), "2030-03-04".to_string())
        .unwrap();
    assert_eq!(day.len(), 2);

    let csv = core
        .export_schedule_csv(
            token,
            "2030-03-04T00:00:00Z".to_string(),
            "2030-03-05T00:00:00Z".to_string(),
            Some(vet_id),
        )
        .unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("appointment_id,start,end,"));
    assert!(csv.lines().nth(1).unwrap().starts_with(&first.appointment_id));
    assert!(csv.contains("Rex,canine,Ana Silva,Dr. Test house,checkup,scheduled"));
}

#[test]
fn test_bad_timestamp_is_validation_error() {
    let core = open_database_in_memory().unwrap();
    let (token, vet_id, pet_id) = setup(&core);

    let err = core
        .create_appointment(token, appointment(&vet_id, &pet_id, "next tuesday"))
        .unwrap_err();
    assert!(matches!(err, VetScanError::Validation(_)));
}

#[test]
fn test_calls_require_valid_token() {
    let core = open_database_in_memory().unwrap();
    let (token, _, pet_id) = setup(&core);

    assert!(matches!(
        core.get_pet("not-a-token".to_string(), pet_id.clone()),
        Err(VetScanError::Unauthorized(_))
    ));

    core.logout(token.clone()).unwrap();
    assert!(matches!(
        core.get_pet(token, pet_id),
        Err(VetScanError::Unauthorized(_))
    ));
}

#[test]
fn test_login_failures_are_indistinguishable() {
    let core = open_database_in_memory().unwrap();
    setup(&core);

    let wrong_password = core
        .login("admin".to_string(), "wrong password".to_string())
        .unwrap_err();
    let unknown_user = core
        .login("nobody".to_string(), "correct horse".to_string())
        .unwrap_err();
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    assert!(matches!(wrong_password, VetScanError::Unauthorized(_)));
}

#[test]
fn test_retired_user_loses_access() {
    let core = open_database_in_memory().unwrap();
    let (admin_token, _, _) = setup(&core);

    let desk = core
        .create_user(admin_token.clone(), new_user("desk", "receptionist"))
        .unwrap();
    let desk_token = core
        .login("desk".to_string(), "correct horse".to_string())
        .unwrap()
        .token;

    // Receptionists cannot manage staff
    assert!(matches!(
        core.create_user(desk_token.clone(), new_user("other", "receptionist")),
        Err(VetScanError::Forbidden(_))
    ));
    // Nor write clinical records
    assert!(matches!(
        core.list_consultations(desk_token.clone(), "any".to_string()),
        Err(VetScanError::Forbidden(_))
    ));

    core.retire_user(admin_token, desk.user_id).unwrap();
    assert!(matches!(
        core.whoami(desk_token),
        Err(VetScanError::Unauthorized(_))
    ));
    assert!(core
        .login("desk".to_string(), "correct horse".to_string())
        .is_err());
}

#[test]
fn test_pet_age_and_duplicate_owner() {
    let core = open_database_in_memory().unwrap();
    let (token, _, pet_id) = setup(&core);

    let age = core
        .pet_age(token.clone(), pet_id, Some("2022-04-20".to_string()))
        .unwrap();
    assert_eq!(age, "2 years, 3 months");

    let err = core
        .create_owner(
            token,
            FfiOwnerInput {
                first_name: "Other".to_string(),
                last_name: "Person".to_string(),
                email: "Ana@Example.com".to_string(),
                phone: None,
                address: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, VetScanError::Conflict(_)));
}

#[test]
fn test_reopen_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db").to_string_lossy().into_owned();

    {
        let core = open_database(path.clone()).unwrap();
        setup(&core);
    }

    let core = open_database(path).unwrap();
    let token = core
        .login("admin".to_string(), "correct horse".to_string())
        .unwrap()
        .token;
    assert_eq!(core.list_veterinarians(token).unwrap().len(), 1);
}
