mod common;

use common::{test_config, FakeWorld, PROJECT_PREFIX};
use flow_automation::config::Config;
use flow_automation::error::{AppError, SessionError};
use flow_automation::human::{InteractionSimulator, Operator, SimulatorBounds};
use flow_automation::services::{LoginState, SessionManager};
use tokio_test::{assert_err, assert_ok};

fn session(world: &FakeWorld, config: &Config) -> SessionManager {
    SessionManager::new(
        Box::new(world.launcher()),
        &config.browser_state_dir,
        config.login_settings(),
    )
}

fn operator() -> Operator {
    Operator::new(InteractionSimulator::seeded(11, SimulatorBounds::default()))
}

#[tokio::test(start_paused = true)]
async fn fresh_profile_walks_every_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let world = FakeWorld::new();
    let mut session = session(&world, &config);
    let mut operator = operator();

    assert_ok!(session.start().await);
    assert_ok!(session.login(None, &mut operator).await);

    assert_eq!(
        session.login_trace(),
        &[
            LoginState::Unauthenticated,
            LoginState::AwaitingCreationForm,
            LoginState::AwaitingCredentials,
            LoginState::AwaitingSecret,
            LoginState::Authenticated,
            LoginState::Ready,
        ]
    );
    let location = session.current_location().await.unwrap();
    assert!(location.starts_with(PROJECT_PREFIX));
}

#[tokio::test(start_paused = true)]
async fn persisted_profile_skips_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let world = FakeWorld::new();
    let mut session = session(&world, &config);
    let mut operator = operator();

    session.start().await.unwrap();
    session.login(None, &mut operator).await.unwrap();
    session.teardown().await;
    assert!(!session.is_started());

    session.start().await.unwrap();
    session.login(None, &mut operator).await.unwrap();
    assert_eq!(
        session.login_trace(),
        &[
            LoginState::Unauthenticated,
            LoginState::Authenticated,
            LoginState::Ready,
        ]
    );
    assert_eq!(world.state().launches.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn discarded_profile_requires_full_login() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let world = FakeWorld::new();
    let mut session = session(&world, &config);
    let mut operator = operator();

    session.start().await.unwrap();
    session.login(None, &mut operator).await.unwrap();
    session.teardown().await;
    assert_ok!(session.discard_profile().await);
    assert!(!session.profile_dir().exists());
    // 再删一次也没关系
    assert_ok!(session.discard_profile().await);

    session.start().await.unwrap();
    session.login(None, &mut operator).await.unwrap();
    assert_eq!(session.login_trace().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn missing_input_without_target_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let world = FakeWorld::new();
    world.configure(|s| s.never_ready = true);
    let mut session = session(&world, &config);
    let mut operator = operator();

    session.start().await.unwrap();
    let err = assert_err!(session.login(None, &mut operator).await);
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        AppError::Session(SessionError::SurfaceNeverReady { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn missing_input_with_target_is_left_to_the_caller() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let world = FakeWorld::new();
    world.configure(|s| s.never_ready = true);
    let mut session = session(&world, &config);
    let mut operator = operator();

    let target = format!("{}42", PROJECT_PREFIX);
    session.start().await.unwrap();
    assert_ok!(session.login(Some(&target), &mut operator).await);
    assert_eq!(session.login_trace().last(), Some(&LoginState::Ready));
    assert_eq!(world.state().gotos.last(), Some(&target));
}

#[tokio::test]
async fn login_before_start_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let world = FakeWorld::new();
    let mut session = session(&world, &config);

    let err = assert_err!(session.login(None, &mut operator()).await);
    assert!(matches!(err, AppError::Session(SessionError::NotStarted)));
    assert!(!err.is_fatal());
}
