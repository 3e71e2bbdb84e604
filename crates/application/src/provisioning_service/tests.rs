use chrono::Utc;

use feedesk_core::{AccountError, AppError};
use feedesk_domain::{Capability, InvitationSnapshot, Role};

use super::{BootstrapAdminRequest, SignupCredentials, SignupProfile};
use crate::test_support::{Harness, capability_names};

const PASSWORD: &str = "fee-portal-Passphrase";

fn credentials(email: &str) -> SignupCredentials {
    SignupCredentials {
        email: email.to_owned(),
        password: PASSWORD.to_owned(),
    }
}

fn student_profile(roll_number: Option<&str>) -> SignupProfile {
    SignupProfile {
        name: "Asha Rao".to_owned(),
        roll_number: roll_number.map(str::to_owned),
        employee_id: None,
    }
}

fn account_error(result: Result<impl std::fmt::Debug, AppError>) -> AccountError {
    match result {
        Err(AppError::Account(error)) => error,
        other => panic!("expected an account error, got {other:?}"),
    }
}

async fn pending_student(harness: &Harness, email: &str) -> (InvitationSnapshot, String) {
    let (_, token) = harness
        .backend
        .add_invitation(
            email,
            Role::Student,
            "CSE",
            Utc::now() + chrono::Duration::days(7),
        )
        .await;
    let snapshot = harness
        .invitations
        .validate(&token)
        .await
        .unwrap_or_else(|error| panic!("validation failed: {error}"));
    (snapshot, token)
}

#[tokio::test]
async fn provision_creates_account_and_consumes_invitation() {
    let harness = Harness::new().await;
    let (snapshot, token) = pending_student(&harness, "a@x.edu").await;

    let account = harness
        .provisioning
        .provision(&snapshot, credentials("a@x.edu"), student_profile(Some("21cs001")))
        .await
        .unwrap_or_else(|error| panic!("provision failed: {error}"));

    assert_eq!(account.role, Role::Student);
    assert_eq!(account.department_id.as_ref().map(|d| d.as_str()), Some("CSE"));

    let profile = harness
        .backend
        .profiles
        .lock()
        .await
        .iter()
        .find(|profile| profile.id == account.identity_id)
        .cloned()
        .unwrap_or_else(|| panic!("profile missing"));
    assert_eq!(profile.roll_number.as_deref(), Some("21CS001"));
    assert_eq!(profile.email, "a@x.edu");
    assert!(profile.is_active);

    let status = harness
        .invitations
        .check_token(&token)
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    assert!(!status.is_valid);
    assert_eq!(status.error_message, Some("already used"));

    let user = harness.resolve(account.identity_id).await;
    assert!(capability_names(&user).contains(Capability::ViewFeeRecords.as_str()));
    assert!(harness.backend.actions().await.contains(&"account.provisioned"));
}

#[tokio::test]
async fn provision_twice_reports_already_used() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "b@x.edu").await;

    assert!(
        harness
            .provisioning
            .provision(&snapshot, credentials("b@x.edu"), student_profile(Some("R1")))
            .await
            .is_ok()
    );

    let second = harness
        .provisioning
        .provision(&snapshot, credentials("b@x.edu"), student_profile(Some("R1")))
        .await;
    assert_eq!(account_error(second), AccountError::InvitationAlreadyUsed);
    assert_eq!(harness.backend.identities.lock().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_provisioning_yields_exactly_one_account() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "c@x.edu").await;

    let first = {
        let provisioning = harness.provisioning.clone();
        let snapshot = snapshot.clone();
        tokio::spawn(async move {
            provisioning
                .provision(&snapshot, credentials("c@x.edu"), student_profile(Some("R2")))
                .await
        })
    };
    let second = {
        let provisioning = harness.provisioning.clone();
        let snapshot = snapshot.clone();
        tokio::spawn(async move {
            provisioning
                .provision(&snapshot, credentials("c@x.edu"), student_profile(Some("R2")))
                .await
        })
    };

    let outcomes = [
        first.await.unwrap_or_else(|_| panic!("first task panicked")),
        second.await.unwrap_or_else(|_| panic!("second task panicked")),
    ];
    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(successes, 1);
    for outcome in &outcomes {
        if let Err(error) = outcome {
            assert!(matches!(
                error,
                AppError::Account(
                    AccountError::InvitationAlreadyUsed | AccountError::DuplicateAccount
                )
            ));
        }
    }

    assert_eq!(harness.backend.identities.lock().await.len(), 1);
    assert_eq!(harness.backend.profiles.lock().await.len(), 1);

    let third = harness
        .provisioning
        .provision(&snapshot, credentials("c@x.edu"), student_profile(Some("R2")))
        .await;
    assert_eq!(account_error(third), AccountError::InvitationAlreadyUsed);
}

#[tokio::test]
async fn student_without_roll_number_is_incomplete() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "d@x.edu").await;

    let result = harness
        .provisioning
        .provision(&snapshot, credentials("d@x.edu"), student_profile(None))
        .await;

    assert!(matches!(
        account_error(result),
        AccountError::ProfileIncomplete(_)
    ));
    assert!(harness.backend.identities.lock().await.is_empty());
}

#[tokio::test]
async fn invited_roll_number_completes_profile() {
    let harness = Harness::new().await;
    let (invitation, token) = harness
        .backend
        .add_invitation("e@x.edu", Role::Student, "CSE", Utc::now() + chrono::Duration::days(1))
        .await;
    harness
        .backend
        .update_invitation(invitation.id, |row| row.roll_number = Some("21CS042".to_owned()))
        .await;
    let snapshot = harness
        .invitations
        .validate(&token)
        .await
        .unwrap_or_else(|error| panic!("validation failed: {error}"));

    let account = harness
        .provisioning
        .provision(&snapshot, credentials("e@x.edu"), student_profile(None))
        .await
        .unwrap_or_else(|error| panic!("provision failed: {error}"));

    let profiles = harness.backend.profiles.lock().await.clone();
    let profile = profiles
        .iter()
        .find(|profile| profile.id == account.identity_id)
        .unwrap_or_else(|| panic!("profile missing"));
    assert_eq!(profile.roll_number.as_deref(), Some("21CS042"));
}

#[tokio::test]
async fn fresh_invitation_row_decides_role_and_department() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "f@x.edu").await;
    harness
        .backend
        .update_invitation(snapshot.id, |row| {
            row.role = Role::Faculty;
            row.employee_id = Some("EMP-77".to_owned());
        })
        .await;

    let account = harness
        .provisioning
        .provision(&snapshot, credentials("f@x.edu"), student_profile(Some("R9")))
        .await
        .unwrap_or_else(|error| panic!("provision failed: {error}"));

    assert_eq!(account.role, Role::Faculty);
}

#[tokio::test]
async fn invitation_revoked_after_validation_is_rejected() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "g@x.edu").await;
    harness
        .backend
        .update_invitation(snapshot.id, |row| row.is_active = false)
        .await;

    let result = harness
        .provisioning
        .provision(&snapshot, credentials("g@x.edu"), student_profile(Some("R3")))
        .await;

    assert_eq!(account_error(result), AccountError::InvitationExpired);
}

#[tokio::test]
async fn email_must_match_invitation() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "h@x.edu").await;

    let result = harness
        .provisioning
        .provision(&snapshot, credentials("other@x.edu"), student_profile(Some("R4")))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn existing_identity_is_a_duplicate_account() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "i@x.edu").await;
    harness
        .backend
        .add_user("i@x.edu", Role::Student, Some("CSE"))
        .await;

    let result = harness
        .provisioning
        .provision(&snapshot, credentials("i@x.edu"), student_profile(Some("R5")))
        .await;

    assert_eq!(account_error(result), AccountError::DuplicateAccount);
    assert!(harness.backend.invitation(snapshot.id).await.used_at.is_none());
}

#[tokio::test]
async fn profile_failure_rolls_back_identity() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "j@x.edu").await;
    harness
        .backend
        .set_faults(|faults| faults.profile_write = true)
        .await;

    let result = harness
        .provisioning
        .provision(&snapshot, credentials("j@x.edu"), student_profile(Some("R6")))
        .await;

    assert!(matches!(
        account_error(result),
        AccountError::ProvisionPartialFailure(_)
    ));
    assert!(harness.backend.identities.lock().await.is_empty());
    assert!(harness.backend.invitation(snapshot.id).await.used_at.is_none());

    harness
        .backend
        .set_faults(|faults| faults.profile_write = false)
        .await;
    assert!(
        harness
            .provisioning
            .provision(&snapshot, credentials("j@x.edu"), student_profile(Some("R6")))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn consumption_failure_rolls_back_account() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "k@x.edu").await;
    harness
        .backend
        .set_faults(|faults| faults.mark_used = true)
        .await;

    let result = harness
        .provisioning
        .provision(&snapshot, credentials("k@x.edu"), student_profile(Some("R7")))
        .await;

    assert!(matches!(
        account_error(result),
        AccountError::ProvisionPartialFailure(_)
    ));
    assert!(harness.backend.identities.lock().await.is_empty());
    assert!(harness.backend.profiles.lock().await.is_empty());
    assert!(harness.backend.user_roles.lock().await.is_empty());
}

#[tokio::test]
async fn weak_password_is_rejected_before_any_write() {
    let harness = Harness::new().await;
    let (snapshot, _) = pending_student(&harness, "l@x.edu").await;

    let result = harness
        .provisioning
        .provision(
            &snapshot,
            SignupCredentials {
                email: "l@x.edu".to_owned(),
                password: "short".to_owned(),
            },
            student_profile(Some("R8")),
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(harness.backend.identities.lock().await.is_empty());
}

fn bootstrap_request(token: &str, email: &str) -> BootstrapAdminRequest {
    BootstrapAdminRequest {
        token: token.to_owned(),
        email: email.to_owned(),
        password: PASSWORD.to_owned(),
        name: "First Admin".to_owned(),
        employee_id: "adm-001".to_owned(),
    }
}

#[tokio::test]
async fn bootstrap_creates_first_admin_only_once() {
    let harness = Harness::new().await;

    let wrong_token = harness
        .provisioning
        .bootstrap_admin(bootstrap_request("nope", "root@x.edu"))
        .await;
    assert!(matches!(wrong_token, Err(AppError::Unauthorized(_))));

    let account = harness
        .provisioning
        .bootstrap_admin(bootstrap_request("bootstrap-secret", "root@x.edu"))
        .await
        .unwrap_or_else(|error| panic!("bootstrap failed: {error}"));
    assert_eq!(account.role, Role::Admin);
    assert!(account.department_id.is_none());

    let admin = harness.resolve(account.identity_id).await;
    assert!(admin.allows(
        Capability::ManageUsers,
        &feedesk_domain::AccessContext::unscoped()
    ));

    let again = harness
        .provisioning
        .bootstrap_admin(bootstrap_request("bootstrap-secret", "second@x.edu"))
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}
