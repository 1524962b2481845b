mod common;

use common::{account, connected, eth};
use delance_core::{PaymentRequest, RequestStatus, Role, ValidationFailure};

#[tokio::test]
async fn test_request_and_approval_walkthrough() {
    // Connect: viewer bound to A.
    let (ledger, service) = connected("10").await;
    let state = service.snapshot();
    assert_eq!(state.bound_signer(), Some(&account(0)));
    assert_eq!(state.balance().to_string(), "10.0");
    assert!(state.requests().is_empty());

    // Freelancer B.
    service.select_role(Role::Freelancer).await.unwrap();
    let state = service.snapshot();
    assert_eq!(state.bound_signer(), Some(&account(1)));
    assert_eq!(state.balance(), eth("10"));
    assert!(state.requests().is_empty());

    // Create a request.
    service
        .create_request("Design logo", "1.5")
        .await
        .expect("Should create request");
    let state = service.snapshot();
    assert_eq!(
        state.requests(),
        &[PaymentRequest::new("Design logo", eth("1.5"), true)]
    );
    assert_eq!(state.requests()[0].status(), RequestStatus::Pending);

    // Employer A sees the same list.
    service.select_role(Role::Employer).await.unwrap();
    let state = service.snapshot();
    assert_eq!(state.bound_signer(), Some(&account(0)));
    assert_eq!(state.requests().len(), 1);
    assert_eq!(state.pending_requests().count(), 1);

    // Approve it.
    service.approve_request(0).await.expect("Should approve");
    let state = service.snapshot();
    assert!(!state.requests()[0].locked);
    assert_eq!(state.requests()[0].status(), RequestStatus::Approved);
    assert_eq!(state.balance().to_string(), "8.5");
    assert_eq!(state.pending_requests().count(), 0);

    // Only the two writes reached the ledger.
    assert_eq!(ledger.submission_count().await, 2);
}

#[tokio::test]
async fn test_over_balance_request_is_refused_locally() {
    let (ledger, service) = connected("10").await;
    service.select_role(Role::Freelancer).await.unwrap();

    let err = service.create_request("Full redesign", "20.0").await.unwrap_err();
    match err.as_validation() {
        Some(ValidationFailure::InsufficientBalance { remaining, .. }) => {
            assert_eq!(remaining.to_string(), "10.0");
        }
        other => panic!("expected insufficient balance, got {:?}", other),
    }
    assert_eq!(ledger.submission_count().await, 0);
    assert!(service.snapshot().requests().is_empty());
}

#[tokio::test]
async fn test_subscribers_see_confirmed_writes() {
    let (_ledger, service) = connected("10").await;
    service.select_role(Role::Freelancer).await.unwrap();

    let mut rx = service.subscribe();
    service.create_request("First", "1").await.unwrap();

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert!(!state.is_busy());
    assert_eq!(state.requests().len(), 1);
    assert_eq!(state.balance(), eth("10"));
}
