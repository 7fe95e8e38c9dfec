use crate::{
    Camera, CameraId, EncoderSettings, LOG_FILE_NAME, OutputAllocator, ProcessHandle, Recorder,
    RecorderError, SessionOutcome, SessionStatus, SessionTask,
};

use std::{path::Path, time::Duration};

#[cfg(unix)]
use super::sh_encoder;
#[cfg(unix)]
use crate::recording::{EncoderProcess, open_log};

const BASE_URL: &str = "http://localhost:3030";

fn camera(id: u64) -> Camera {
    Camera::new(CameraId(id), format!("Camera {}", id), "rtsp://10.0.0.1/stream")
}

fn recorder(root: &Path, encoder: EncoderSettings) -> Recorder {
    Recorder::new(root, BASE_URL, encoder)
}

/// Waits until the session leaves the reserved state.
#[allow(clippy::unwrap_used)]
async fn settled(task: &SessionTask) -> SessionStatus {
    let mut rx = task.subscribe();
    let status = tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|s| *s != SessionStatus::Reserved),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    status
}

/// WHAT: Stop on an idle camera returns NotActive
/// WHY: Stop must not invent or mutate state
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_idle_camera_when_stopping_then_not_active() {
    // Given: A recorder with no sessions
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), EncoderSettings::default());

    // When: Stopping camera 99
    let result = recorder.stop(CameraId(99));

    // Then: NotActive and the registry is still empty
    assert!(matches!(result, Err(RecorderError::NotActive { .. })));
    assert!(!recorder.is_recording(CameraId(99)));
    assert!(recorder.registry().is_empty());
}

/// WHAT: Start, duplicate start, stop, start again
/// WHY: Covers the full accept/reject/release cycle for one camera
#[cfg(unix)]
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_camera_7_when_start_stop_start_then_slot_cycles() {
    // Given: A recorder with a long-running encoder
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), sh_encoder("exec sleep 30"));
    let camera = camera(7);

    // When/Then: First start is accepted
    let first = recorder.start(&camera).unwrap();
    assert!(recorder.is_recording(CameraId(7)));

    // When/Then: Immediate second start is rejected
    let second = recorder.start(&camera);
    assert!(matches!(second, Err(RecorderError::AlreadyActive { .. })));

    // When/Then: Stop succeeds and the camera is idle at once
    recorder.stop(CameraId(7)).unwrap();
    assert!(!recorder.is_recording(CameraId(7)));

    // When/Then: Third start is accepted
    let third = recorder.start(&camera).unwrap();
    assert!(recorder.is_recording(CameraId(7)));

    // Cleanup: Stop and let both tasks wind down
    recorder.stop(CameraId(7)).unwrap();
    assert!(matches!(first.wait().await, SessionOutcome::Stopped { .. }));
    assert!(matches!(third.wait().await, SessionOutcome::Stopped { .. }));
    assert!(recorder.registry().is_empty());
}

/// WHAT: Concurrent starts for one camera yield exactly one acceptance
/// WHY: At most one encoder may run per camera
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[allow(clippy::unwrap_used)]
async fn given_concurrent_starts_when_racing_then_exactly_one_accepted() {
    // Given: A shared recorder
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), sh_encoder("exec sleep 30"));

    // When: 16 tasks start camera 3 at once
    let attempts: Vec<_> = (0..16)
        .map(|_| {
            let recorder = recorder.clone();
            tokio::spawn(async move { recorder.start(&camera(3)) })
        })
        .collect();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(task) => accepted.push(task),
            Err(e) => rejected.push(e),
        }
    }

    // Then: One winner, fifteen AlreadyActive
    assert_eq!(accepted.len(), 1);
    assert_eq!(rejected.len(), 15);
    assert!(
        rejected
            .iter()
            .all(|e| matches!(e, RecorderError::AlreadyActive { .. }))
    );

    recorder.stop(CameraId(3)).unwrap();
    for task in accepted {
        task.wait().await;
    }
}

/// WHAT: Stopping a running session frees the camera before the process exits
/// WHY: Stop is synchronous and does not wait for the encoder
#[cfg(unix)]
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_running_session_when_stopping_then_idle_immediately() {
    // Given: A session whose encoder is running
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), sh_encoder("exec sleep 30"));
    let task = recorder.start(&camera(1)).unwrap();
    let status = settled(&task).await;
    assert!(matches!(status, SessionStatus::Running { .. }));

    // When: Stopping
    recorder.stop(CameraId(1)).unwrap();

    // Then: Idle right away, and the task reports a stop
    assert!(!recorder.is_recording(CameraId(1)));
    let outcome = task.wait().await;
    assert!(matches!(
        outcome,
        SessionOutcome::Stopped {
            recording_id: Some(_)
        }
    ));
}

/// WHAT: An encoder that exits on its own releases the slot
/// WHY: Sessions are self-cleaning and the camera can be restarted
#[cfg(unix)]
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_encoder_exits_when_waiting_then_slot_released_and_restartable() {
    // Given: An encoder that fails immediately
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), sh_encoder("exit 1"));
    let task = recorder.start(&camera(2)).unwrap();

    // When: The session ends by itself
    let outcome = task.wait().await;

    // Then: Exit reported, slot gone, restart accepted
    assert!(matches!(
        outcome,
        SessionOutcome::Exited {
            code: Some(1),
            success: false,
            ..
        }
    ));
    assert!(!recorder.is_recording(CameraId(2)));
    let again = recorder.start(&camera(2)).unwrap();
    again.wait().await;
}

/// WHAT: The encoder receives the HLS arguments and its output is logged
/// WHY: The log file is the only trace of what the encoder did
#[cfg(unix)]
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_echoing_encoder_when_recording_then_arguments_in_log() {
    // Given: An encoder that prints its arguments and exits
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), sh_encoder(r#"echo "$@""#));

    // When: Recording camera 4 to completion
    let outcome = recorder.start(&camera(4)).unwrap().wait().await;

    // Then: The log in the recording directory holds the invocation
    assert!(matches!(outcome, SessionOutcome::Exited { success: true, .. }));
    let SessionOutcome::Exited { recording_id, .. } = outcome else {
        return;
    };
    assert!(recording_id.starts_with("4-"));
    let log = std::fs::read_to_string(root.path().join(&recording_id).join(LOG_FILE_NAME)).unwrap();
    assert!(log.contains("-i rtsp://10.0.0.1/stream"));
    assert!(log.contains(&format!(
        "-hls_base_url {}/api/v1/recordings/{}/segments/",
        BASE_URL, recording_id
    )));
}

/// WHAT: Spawn failures are accepted by start and reported by the task
/// WHY: Asynchronous failures never reach the start caller
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_missing_encoder_when_starting_then_accepted_then_failed() {
    // Given: Settings pointing at a missing program
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(
        root.path(),
        EncoderSettings {
            program: "/nonexistent/encoder".into(),
            leading_args: Vec::new(),
        },
    );

    // When: Starting
    let task = recorder.start(&camera(5)).unwrap();
    let outcome = task.wait().await;

    // Then: The task failed and released the slot
    assert!(matches!(outcome, SessionOutcome::Failed { .. }));
    assert!(!recorder.is_recording(CameraId(5)));
}

/// WHAT: Allocation failures release the slot
/// WHY: A failed session must not block the camera
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unwritable_root_when_starting_then_failed_and_released() {
    // Given: A recordings root that is a regular file
    let base = tempfile::tempdir().unwrap();
    let root = base.path().join("file");
    std::fs::write(&root, b"x").unwrap();
    let recorder = recorder(&root, EncoderSettings::default());

    // When: Starting
    let outcome = recorder.start(&camera(6)).unwrap().wait().await;

    // Then: Failed, camera idle
    assert!(matches!(outcome, SessionOutcome::Failed { .. }));
    assert!(!recorder.is_recording(CameraId(6)));
}

/// WHAT: Stop during the reservation window wins over the spawn
/// WHY: The spawned encoder must be killed, never left orphaned
#[cfg(unix)]
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_reserved_slot_when_stopped_before_spawn_then_encoder_killed() {
    // Given: A start whose task has not run yet (single-threaded runtime)
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), sh_encoder("exec sleep 30"));
    let task = recorder.start(&camera(8)).unwrap();
    assert_eq!(task.status(), SessionStatus::Reserved);

    // When: Stopping before the task gets to attach
    recorder.stop(CameraId(8)).unwrap();

    // Then: The task kills its encoder and reports a stop
    let outcome = task.wait().await;
    assert!(matches!(
        outcome,
        SessionOutcome::Stopped {
            recording_id: Some(_)
        }
    ));
    assert!(!recorder.is_recording(CameraId(8)));
}

/// WHAT: An old task never releases a newer session's slot
/// WHY: Stop followed by a quick restart must keep the new session
#[cfg(unix)]
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_restart_before_old_task_runs_when_old_task_ends_then_new_slot_kept() {
    // Given: Start, stop and restart before any task has run
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), sh_encoder("exec sleep 30"));
    let old = recorder.start(&camera(9)).unwrap();
    recorder.stop(CameraId(9)).unwrap();
    let new = recorder.start(&camera(9)).unwrap();

    // When: The old task finishes
    let outcome = old.wait().await;

    // Then: It was stopped and the new session still holds the camera
    assert!(matches!(outcome, SessionOutcome::Stopped { .. }));
    assert!(recorder.is_recording(CameraId(9)));
    assert!(matches!(settled(&new).await, SessionStatus::Running { .. }));

    recorder.stop(CameraId(9)).unwrap();
    new.wait().await;
}

/// WHAT: stop_all ends every session
/// WHY: Shutdown must not leave encoders running
#[cfg(unix)]
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_two_sessions_when_stopping_all_then_none_active() {
    // Given: Two running sessions
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), sh_encoder("exec sleep 30"));
    let a = recorder.start(&camera(10)).unwrap();
    let b = recorder.start(&camera(11)).unwrap();
    assert_eq!(recorder.active_cameras(), vec![CameraId(10), CameraId(11)]);

    // When: Stopping all
    recorder.stop_all();

    // Then: Nothing active, both tasks stopped
    assert!(recorder.active_cameras().is_empty());
    assert!(matches!(a.wait().await, SessionOutcome::Stopped { .. }));
    assert!(matches!(b.wait().await, SessionOutcome::Stopped { .. }));
}

/// WHAT: Stop succeeds and frees the camera when the encoder cannot be signalled
/// WHY: A lost signal must never leave a camera stuck as recording
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unreachable_encoder_when_stopping_then_ok_and_released() {
    // Given: Camera 12 with a process handle whose owner is already gone
    let root = tempfile::tempdir().unwrap();
    let recorder = recorder(root.path(), EncoderSettings::default());
    let session_id = recorder.registry().reserve(CameraId(12)).unwrap();
    let output = OutputAllocator::new(root.path()).location_for(CameraId(12), 1000);
    recorder
        .registry()
        .attach_process(CameraId(12), session_id, output, ProcessHandle::detached(CameraId(12)))
        .unwrap();

    // When: Stopping it
    let result = recorder.stop(CameraId(12));

    // Then: Stop reports success and the slot is gone
    assert!(result.is_ok());
    assert!(!recorder.is_recording(CameraId(12)));
}

/// WHAT: Two encoder runs into the same recording directory share one log
/// WHY: Same-second restarts reuse the directory and must not erase history
#[cfg(unix)]
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_same_recording_dir_when_encoding_twice_then_log_keeps_both_runs() {
    // Given: One output location reused for two runs
    let root = tempfile::tempdir().unwrap();
    let allocator = OutputAllocator::new(root.path());

    // When: Each run opens the log and writes a line
    for script in ["echo first-run", "echo second-run"] {
        let output = allocator.allocate_at(CameraId(4), 1_792_374_201).await.unwrap();
        let log = open_log(&output).await.unwrap();
        let settings = sh_encoder(script);
        let (mut process, _handle) =
            EncoderProcess::spawn(&settings, CameraId(4), &settings.leading_args, log).unwrap();
        process.wait().await.unwrap();
    }

    // Then: Both lines are present in order
    let log =
        std::fs::read_to_string(root.path().join("4-1792374201").join(LOG_FILE_NAME)).unwrap();
    assert_eq!(log, "first-run\nsecond-run\n");
}
