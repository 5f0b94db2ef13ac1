mod common;

use std::time::Duration;

use common::{test_config, FakeWorld, PROJECT_PREFIX};
use flow_automation::browser::Affordance;
use flow_automation::error::{AppError, RecoveryStage};
use flow_automation::human::{InteractionSimulator, Operator, SimulatorBounds};
use flow_automation::services::project_settings::set_outputs_per_prompt;
use flow_automation::services::{RecoveryManager, SessionManager};

struct Rig {
    _dir: tempfile::TempDir,
    world: FakeWorld,
    session: SessionManager,
    operator: Operator,
    recovery: RecoveryManager,
}

async fn logged_in_rig(configure: impl FnOnce(&mut common::WorldState)) -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let world = FakeWorld::new();
    world.configure(configure);

    let mut session = SessionManager::new(
        Box::new(world.launcher()),
        &config.browser_state_dir,
        config.login_settings(),
    );
    let mut operator = Operator::new(InteractionSimulator::seeded(3, SimulatorBounds::default()));
    session.start().await.unwrap();
    session.login(None, &mut operator).await.unwrap();

    Rig {
        _dir: dir,
        world,
        session,
        operator,
        recovery: RecoveryManager::new(config.recovery_policy()),
    }
}

#[tokio::test(start_paused = true)]
async fn recovering_twice_returns_to_the_same_project() {
    let mut rig = logged_in_rig(|_| {}).await;
    let target = rig.session.current_location().await.unwrap();
    assert!(target.starts_with(PROJECT_PREFIX));

    let first = rig.recovery.recover(&mut rig.session, &mut rig.operator).await.unwrap();
    let second = rig.recovery.recover(&mut rig.session, &mut rig.operator).await.unwrap();
    assert_eq!(first.as_deref(), Some(target.as_str()));
    assert_eq!(second.as_deref(), Some(target.as_str()));

    let driver = rig.session.driver().unwrap();
    assert!(driver.is_visible(Affordance::PromptInput).await.unwrap());
    assert_eq!(driver.current_url().await.unwrap(), Some(target));

    let state = rig.world.state();
    assert_eq!(state.launches.len(), 3);
    assert_eq!(state.closes, 2);
    // 没有新建项目，设置在两次重建后都恢复了
    assert_eq!(state.projects, 1);
    assert_eq!(state.outputs, vec![(2, 1), (3, 1)]);
}

#[tokio::test(start_paused = true)]
async fn recovery_wipes_the_profile() {
    let mut rig = logged_in_rig(|_| {}).await;
    rig.recovery.recover(&mut rig.session, &mut rig.operator).await.unwrap();
    // 被清空的用户数据意味着重新走完整登录
    assert_eq!(rig.session.login_trace().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn relaunch_failure_is_reported_with_its_stage() {
    let mut rig = logged_in_rig(|s| {
        s.fail_launches.insert(2);
    })
    .await;
    let target = rig.session.current_location().await.unwrap();

    let err = rig
        .recovery
        .recover(&mut rig.session, &mut rig.operator)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Recovery {
            stage: RecoveryStage::Relaunch,
            ..
        }
    ));
    assert!(!err.is_fatal());
    assert!(!rig.session.is_started());

    // 驱动已不在，恢复目标来自记住的地址
    let resumed = rig.recovery.recover(&mut rig.session, &mut rig.operator).await.unwrap();
    assert_eq!(resumed, Some(target));
    assert!(rig.session.is_started());
}

#[tokio::test(start_paused = true)]
async fn settings_failure_fails_the_recovery() {
    let mut rig = logged_in_rig(|s| {
        s.hide_settings_on.insert(2);
    })
    .await;

    let err = rig
        .recovery
        .recover(&mut rig.session, &mut rig.operator)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Recovery {
            stage: RecoveryStage::RestoreSettings,
            ..
        }
    ));
    assert!(rig.world.state().outputs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn settings_popup_that_renders_late_is_waited_for() {
    let mut rig = logged_in_rig(|s| s.popup_delay = Duration::from_millis(1500)).await;

    let driver = rig.session.driver().unwrap();
    set_outputs_per_prompt(driver, &mut rig.operator, 2).await.unwrap();
    assert_eq!(rig.world.state().outputs, vec![(1, 2)]);

    // 恢复后同样要等弹层
    rig.recovery.recover(&mut rig.session, &mut rig.operator).await.unwrap();
    assert_eq!(rig.world.state().outputs, vec![(1, 2), (2, 1)]);
}

#[tokio::test(start_paused = true)]
async fn settings_popup_that_never_renders_times_out() {
    let mut rig = logged_in_rig(|s| s.popup_delay = Duration::from_secs(60)).await;

    let driver = rig.session.driver().unwrap();
    let err = set_outputs_per_prompt(driver, &mut rig.operator, 1)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Outputs per prompt"));
    assert!(rig.world.state().outputs.is_empty());
}
