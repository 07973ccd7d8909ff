// Behavior tests for the command wrappers and the polling coordinator,
// driven through a scripted client.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::MockClient;
use totalconnect2mqtt::alarm::{AlarmPanel, PanelCommand};
use totalconnect2mqtt::client::{ArmKind, ClientError, share};
use totalconnect2mqtt::coordinator::{Coordinator, UpdateEvent};
use totalconnect2mqtt::error::CommandError;

const LOCATION: u32 = 123456;
const PARTITION: u8 = 1;

fn panel_with(client: MockClient, code_required: bool) -> (AlarmPanel, Arc<Coordinator>) {
    let coordinator = Arc::new(Coordinator::new(share(client)));
    let panel = AlarmPanel::new(Arc::clone(&coordinator), LOCATION, PARTITION, code_required);
    (panel, coordinator)
}

#[tokio::test]
async fn wrong_code_fails_locally_without_any_client_call() {
    let client = MockClient::new();
    let log = client.log_handle();
    let (panel, _coordinator) = panel_with(client, true);

    let err = panel
        .execute(PanelCommand::Disarm, Some("0000"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::InvalidPin));

    let log = log.lock().unwrap();
    assert_eq!(log.disarm_calls, 0);
    assert!(log.arm_calls.is_empty());
}

#[tokio::test]
async fn missing_code_fails_locally_when_required() {
    let client = MockClient::new();
    let log = client.log_handle();
    let (panel, _coordinator) = panel_with(client, true);

    let err = panel
        .execute(PanelCommand::ArmAway, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::InvalidPin));
    assert!(log.lock().unwrap().arm_calls.is_empty());
}

#[tokio::test]
async fn no_code_needed_when_not_required() {
    let client = MockClient::new();
    let log = client.log_handle();
    let (panel, _coordinator) = panel_with(client, false);

    panel.execute(PanelCommand::Disarm, None).await.unwrap();
    assert_eq!(log.lock().unwrap().disarm_calls, 1);
}

#[tokio::test]
async fn instant_arm_skips_code_check_even_when_required() {
    let client = MockClient::new();
    let log = client.log_handle();
    let (panel, _coordinator) = panel_with(client, true);

    panel
        .execute(PanelCommand::ArmAwayInstant, None)
        .await
        .unwrap();
    assert_eq!(log.lock().unwrap().arm_calls, vec![ArmKind::AwayInstant]);
}

#[tokio::test]
async fn successful_command_forces_exactly_one_refresh() {
    let client = MockClient::new();
    let log = client.log_handle();
    let (panel, coordinator) = panel_with(client, false);

    // Hour-long interval: any refresh that happens is the forced one.
    let run = Arc::clone(&coordinator);
    let poll_task = tokio::spawn(async move { run.run(Duration::from_secs(3600)).await });

    panel
        .execute(PanelCommand::ArmNight, Some("1234"))
        .await
        .unwrap();

    let mut waited = Duration::ZERO;
    while log.lock().unwrap().refresh_calls < 1 && waited < Duration::from_secs(2) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    // One forced refresh and no more.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(log.lock().unwrap().refresh_calls, 1);
    assert_eq!(log.lock().unwrap().arm_calls, vec![ArmKind::StayNight]);

    poll_task.abort();
}

#[tokio::test]
async fn failed_command_does_not_force_a_refresh() {
    let client = MockClient::failing_commands(ClientError::CommandRejected { code: -4502 });
    let log = client.log_handle();
    let (panel, coordinator) = panel_with(client, false);

    let run = Arc::clone(&coordinator);
    let poll_task = tokio::spawn(async move { run.run(Duration::from_secs(3600)).await });

    let err = panel
        .execute(PanelCommand::ArmHome, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Failed { .. }));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(log.lock().unwrap().refresh_calls, 0);

    poll_task.abort();
}

#[tokio::test]
async fn rejected_command_names_the_device() {
    let client = MockClient::failing_commands(ClientError::CommandRejected { code: -4502 });
    let (panel, _coordinator) = panel_with(client, false);

    let err = panel
        .execute(PanelCommand::Disarm, None)
        .await
        .unwrap_err();
    let CommandError::Failed { device, .. } = err else {
        panic!("expected named-device failure, got {err:?}");
    };
    assert_eq!(device, "Demo House Security Panel");
}

#[tokio::test]
async fn remote_code_rejection_triggers_reauth_once() {
    let client = MockClient::failing_commands(ClientError::InvalidCode);
    let log = client.log_handle();
    let (panel, coordinator) = panel_with(client, false);
    let mut events = coordinator.subscribe();

    let err = panel
        .execute(PanelCommand::Disarm, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::UsercodeRejected));
    // The blocking call was made — this is a remote rejection, not the
    // local pin check.
    assert_eq!(log.lock().unwrap().disarm_calls, 1);
    assert_eq!(events.try_recv(), Ok(UpdateEvent::ReauthRequired));

    // A second rejection while still latched stays quiet.
    let _ = panel.execute(PanelCommand::Disarm, None).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn auth_failure_stops_scheduled_polling() {
    // Every refresh fails authentication; the poll loop must hit it once
    // and stop, not hammer the service.
    let client = MockClient::failing_refresh(vec![
        ClientError::Authentication,
        ClientError::Authentication,
        ClientError::Authentication,
    ]);
    let log = client.log_handle();
    let coordinator = Arc::new(Coordinator::new(share(client)));
    let mut events = coordinator.subscribe();

    let run = Arc::clone(&coordinator);
    let poll_task = tokio::spawn(async move { run.run(Duration::from_millis(50)).await });

    // Give the loop time for several would-be ticks.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(poll_task.is_finished(), "poll loop should stop on auth failure");
    assert_eq!(log.lock().unwrap().refresh_calls, 1);
    assert_eq!(events.try_recv(), Ok(UpdateEvent::ReauthRequired));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn transient_failure_keeps_polling() {
    let client = MockClient::failing_refresh(vec![ClientError::ServiceUnavailable]);
    let log = client.log_handle();
    let coordinator = Arc::new(Coordinator::new(share(client)));
    let mut events = coordinator.subscribe();

    let run = Arc::clone(&coordinator);
    let poll_task = tokio::spawn(async move { run.run(Duration::from_millis(50)).await });

    let mut waited = Duration::ZERO;
    while log.lock().unwrap().refresh_calls < 2 && waited < Duration::from_secs(2) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    assert!(!poll_task.is_finished(), "transient failures must not stop the loop");
    assert!(log.lock().unwrap().refresh_calls >= 2);

    // First tick failed, second succeeded.
    assert_eq!(events.try_recv(), Ok(UpdateEvent::UpdateFailed));
    assert_eq!(events.try_recv(), Ok(UpdateEvent::Updated));

    poll_task.abort();
}
