//! Integration tests for convex-deploy
//!
//! These spawn real `sh` scripts on a pty. Scripts that answer prompts turn
//! off terminal echo first so the driver only sees what the script prints.

#![cfg(unix)]

use convex_deploy::convex::{self, ACCOUNT_RULE, DEVICE_RULE, LOGIN_RULE, PROJECT_RULE};
use convex_deploy::{Driver, DriverError, Responder, Rule, Session, SessionBuilder, Trigger};
use std::future::pending;
use std::io;
use std::time::{Duration, Instant};
use tokio_test::assert_ok;

fn script(builder: SessionBuilder, body: &str) -> Session {
    builder
        .spawn_argv("sh", &["-c", body])
        .expect("Failed to spawn sh")
}

async fn interrupt_after(delay: Duration) -> io::Result<()> {
    tokio::time::sleep(delay).await;
    Ok(())
}

fn convex_driver() -> Driver {
    Driver::new(convex::responder().expect("Invalid rules")).poll_interval(Duration::from_millis(20))
}

#[tokio::test]
async fn test_immediate_exit_without_output() {
    let session = Session::spawn("true").expect("Failed to spawn");
    let mut echo = Vec::new();

    let transcript = assert_ok!(convex_driver().run(session, &mut echo, pending::<io::Result<()>>()).await);

    assert!(transcript.exchanges.is_empty());
    assert!(!transcript.interrupted);
    assert!(transcript.exit_status.success());
}

#[tokio::test]
async fn test_exit_code_reported() {
    let session = script(Session::builder(), "exit 3");
    let mut echo = Vec::new();

    let transcript = assert_ok!(convex_driver().run(session, &mut echo, pending::<io::Result<()>>()).await);

    assert_eq!(transcript.exit_status.exit_code(), 3);
    assert!(!transcript.exit_status.success());
}

#[tokio::test]
async fn test_login_and_account_answered_once() {
    let session = script(
        Session::builder(),
        "stty -echo; \
         printf 'Would you like to login to your account? '; read a; echo \"login=$a\"; \
         printf 'Try Convex without an account? '; read b; echo \"account=$b\"; \
         sleep 1",
    );
    let mut echo = Vec::new();

    let transcript = assert_ok!(convex_driver().run(session, &mut echo, pending::<io::Result<()>>()).await);

    assert!(transcript.output.contains("login=n"), "output: {:?}", transcript.output);
    assert!(transcript.output.contains("account=y"), "output: {:?}", transcript.output);
    assert_eq!(transcript.fire_count(LOGIN_RULE), 1);
    assert_eq!(transcript.fire_count(ACCOUNT_RULE), 1);

    let order: Vec<&str> = transcript.exchanges.iter().map(|e| e.rule.as_str()).collect();
    assert_eq!(order, vec![LOGIN_RULE, ACCOUNT_RULE]);

    let echoed = String::from_utf8_lossy(&echo);
    assert!(echoed.contains("[Auto-responding: No - Try without account]"));
    assert!(echoed.contains("[Auto-responding: Yes - Try without account]"));
    assert!(echoed.contains("login=n"));
}

#[tokio::test]
async fn test_device_name_refires_while_visible() {
    let session = script(
        Session::builder(),
        "stty -echo; printf 'Device name: '; read d; echo \"device=$d\"; sleep 1",
    );
    let mut echo = Vec::new();

    let transcript = assert_ok!(convex_driver().run(session, &mut echo, pending::<io::Result<()>>()).await);

    assert!(transcript.output.contains("device=stepperslife-server"));
    // Answered for the prompt, then again for the output that followed it
    assert!(transcript.fire_count(DEVICE_RULE) >= 2);
    assert!(transcript
        .exchanges
        .iter()
        .all(|e| e.response == b"stepperslife-server\n"));
}

#[tokio::test]
async fn test_project_name_prompt() {
    let session = script(
        Session::builder(),
        "stty -echo; printf '? Project Name: '; read p; echo \"project=$p\"; sleep 1",
    );
    let mut echo = Vec::new();

    let transcript = assert_ok!(convex_driver().run(session, &mut echo, pending::<io::Result<()>>()).await);

    assert!(transcript.output.contains("project=stepperslife"));
    assert!(transcript.fire_count(PROJECT_RULE) >= 1);
}

#[tokio::test]
async fn test_interrupt_terminates_child() {
    let session = Session::spawn("sleep 30").expect("Failed to spawn");
    let mut echo = Vec::new();
    let start = Instant::now();

    let transcript = assert_ok!(
        convex_driver()
            .interrupt_notice(convex::INTERRUPT_NOTICE)
            .run(session, &mut echo, interrupt_after(Duration::from_millis(300)))
            .await
    );

    assert!(transcript.interrupted);
    assert!(!transcript.exit_status.success());
    assert!(start.elapsed() < Duration::from_secs(10));

    let echoed = String::from_utf8_lossy(&echo);
    assert!(echoed.contains("Deployment interrupted by user"), "echo: {:?}", echoed);
}

#[tokio::test]
async fn test_failed_interrupt_handler_keeps_running() {
    let session = script(Session::builder(), "sleep 0.5; exit 4");
    let mut echo = Vec::new();
    let broken = async { Err(io::Error::other("signal handler unavailable")) };

    let transcript = assert_ok!(
        convex_driver()
            .interrupt_notice(convex::INTERRUPT_NOTICE)
            .run(session, &mut echo, broken)
            .await
    );

    assert!(!transcript.interrupted);
    assert_eq!(transcript.exit_status.exit_code(), 4);
    assert!(!String::from_utf8_lossy(&echo).contains("interrupted"));
}

#[tokio::test]
async fn test_undecodable_chunk_does_not_answer_again() {
    let session = script(
        Session::builder(),
        "stty -echo; printf 'Device name: '; sleep 0.5; printf '\\377'; sleep 0.5",
    );
    let mut echo = Vec::new();

    let transcript = assert_ok!(convex_driver().run(session, &mut echo, pending::<io::Result<()>>()).await);

    assert_eq!(transcript.output, "Device name: ");
    assert_eq!(transcript.fire_count(DEVICE_RULE), 1);
}

#[tokio::test]
async fn test_close_sends_newline_to_waiting_child() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out = dir.path().join("answer.txt");

    let builder = Session::builder().env("ANSWER_FILE", out.to_string_lossy());
    let mut session = script(builder, "read x; echo \"got=[$x]\" > \"$ANSWER_FILE\"");

    // Nothing is sent; closing the pty writer ends the pending read
    assert_ok!(session.close().await);

    let answer = std::fs::read_to_string(&out).expect("Child did not write its answer");
    assert_eq!(answer.trim(), "got=[]");
}

#[tokio::test]
async fn test_cleared_env_is_empty_for_child() {
    let builder = Session::builder()
        .env("DEPLOY_PROBE", "secret")
        .clear_env("DEPLOY_PROBE");
    let session = script(builder, "echo \"probe=[$DEPLOY_PROBE]\"; sleep 1");
    let mut echo = Vec::new();

    let transcript = assert_ok!(
        Driver::new(Responder::new(Vec::new()))
            .poll_interval(Duration::from_millis(20))
            .run(session, &mut echo, pending::<io::Result<()>>())
            .await
    );

    assert!(transcript.output.contains("probe=[]"), "output: {:?}", transcript.output);
}

#[tokio::test]
async fn test_child_runs_in_configured_directory() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let marker = dir
        .path()
        .file_name()
        .and_then(|name| name.to_str())
        .expect("Temp dir has no name")
        .to_string();

    let session = script(Session::builder().cwd(dir.path()), "pwd; sleep 1");
    let mut echo = Vec::new();

    let transcript = assert_ok!(
        Driver::new(Responder::new(Vec::new()))
            .poll_interval(Duration::from_millis(20))
            .run(session, &mut echo, pending::<io::Result<()>>())
            .await
    );

    assert!(transcript.output.contains(&marker), "output: {:?}", transcript.output);
}

#[tokio::test]
async fn test_custom_rules() {
    let responder = Responder::new(vec![Rule::new(
        "confirm",
        Trigger::regex(r"Continue\? \[y/N\]").expect("Invalid regex"),
        "y\n",
    )
    .expect("Invalid rule")
    .once()]);

    let session = script(
        Session::builder(),
        "stty -echo; printf 'Continue? [y/N] '; read c; echo \"answer=$c\"; sleep 1",
    );
    let mut echo = Vec::new();

    let transcript = assert_ok!(
        Driver::new(responder)
            .poll_interval(Duration::from_millis(20))
            .run(session, &mut echo, pending::<io::Result<()>>())
            .await
    );

    assert!(transcript.output.contains("answer=y"));
    assert_eq!(transcript.fire_count("confirm"), 1);
}

#[tokio::test]
async fn test_send_line_and_try_read() {
    let mut session = script(
        Session::builder(),
        "stty -echo; read x; echo \"got=$x\"; sleep 1",
    );

    session.send_line("hello").await.expect("Failed to send");

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut output = String::new();
    while !output.contains("got=hello") && Instant::now() < deadline {
        match session.try_read() {
            Some(chunk) => output.push_str(&String::from_utf8_lossy(&chunk)),
            None => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }

    assert!(output.contains("got=hello"), "output: {:?}", output);
    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_close_reaps_exactly_once() {
    let mut session = Session::spawn("true").expect("Failed to spawn");

    let deadline = Instant::now() + Duration::from_secs(5);
    while !session.has_exited().expect("Failed to poll") {
        assert!(Instant::now() < deadline, "child did not exit");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let status = assert_ok!(session.close().await);
    assert!(status.success());
    assert!(session.is_closed());

    assert!(matches!(session.close().await, Err(DriverError::ProcessExited)));
    assert!(matches!(session.send(b"x").await, Err(DriverError::ProcessExited)));
}

#[tokio::test]
async fn test_try_read_when_silent() {
    let mut session = Session::spawn("sleep 5").expect("Failed to spawn");

    assert!(session.try_read().is_none());
    assert!(!session.has_exited().expect("Failed to poll"));

    session.terminate().expect("Failed to terminate");
    let status = assert_ok!(session.close().await);
    assert!(!status.success());
}

#[test]
fn test_empty_command() {
    let result = Session::spawn("   ");
    assert!(matches!(result, Err(DriverError::Spawn(_))));
}

#[test]
fn test_missing_program() {
    let result = Session::spawn("convex-deploy-no-such-program-0x2a");
    assert!(matches!(result, Err(DriverError::Spawn(_))));
}
