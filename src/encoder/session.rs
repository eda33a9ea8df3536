//! Encoder recording session
//!
//! Owns the FFmpeg child for its whole life:
//! 1. Spawning it with stdin held open.
//! 2. Blocking until a stop message arrives or the encoder exits by itself.
//! 3. Shutting it down: quit byte, then terminate, then kill, each stage
//!    bounded by a timeout so stopping never hangs.
//!
//! Matroska output survives an abrupt kill, but a graceful quit leaves a
//! complete, seekable file, so it is always tried first.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use super::invocation::EncoderInvocation;
use super::process::{EncoderChild, EncoderExit, EncoderProcess};
use crate::error::{RecorderError, RecorderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownTimeouts {
    /// Time the encoder gets to exit after the quit byte.
    pub graceful: Duration,
    /// Time the encoder gets to exit after the terminate signal.
    pub forced: Duration,
    /// How often a running session checks for a self-exited encoder.
    pub poll_interval: Duration,
}

impl Default for ShutdownTimeouts {
    fn default() -> Self {
        Self {
            graceful: Duration::from_secs(10),
            forced: Duration::from_secs(5),
            poll_interval: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    StoppingGraceful,
    StoppingForced,
    Terminated,
}

/// Which step of the shutdown sequence ended the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPath {
    /// Exited without being asked, e.g. a duration-limited recording.
    Exited,
    Graceful,
    Forced,
    Killed,
}

impl std::fmt::Display for ShutdownPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownPath::Exited => write!(f, "encoder finished on its own"),
            ShutdownPath::Graceful => write!(f, "graceful quit"),
            ShutdownPath::Forced => write!(f, "terminated"),
            ShutdownPath::Killed => write!(f, "killed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMessage {
    Stop,
}

#[derive(Debug, Clone)]
pub struct RecordingOutcome {
    pub output_path: PathBuf,
    pub shutdown: ShutdownPath,
    /// Missing when the encoder was killed and had not been reaped yet.
    pub exit: Option<EncoderExit>,
    pub recorded_for: Duration,
}

pub struct RecordingSession<P: EncoderProcess = EncoderChild> {
    process: P,
    started_at: Instant,
    output_path: PathBuf,
    state: SessionState,
}

impl RecordingSession<EncoderChild> {
    /// Spawns the encoder. A failed spawn leaves nothing behind.
    pub fn start(program: &Path, invocation: &EncoderInvocation) -> RecorderResult<Self> {
        info!("Starting encoder: {}", invocation.command_line(program));
        let process =
            EncoderChild::spawn(program, invocation).map_err(|source| RecorderError::LaunchFailed {
                path: program.to_path_buf(),
                source,
            })?;
        Ok(Self::from_process(process, invocation.output_path()))
    }
}

impl<P: EncoderProcess> RecordingSession<P> {
    /// Wraps an already running encoder.
    pub fn from_process(process: P, output_path: &Path) -> Self {
        let mut session = Self {
            process,
            started_at: Instant::now(),
            output_path: output_path.to_path_buf(),
            state: SessionState::NotStarted,
        };
        session.transition(SessionState::Running);
        session
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pid(&self) -> u32 {
        self.process.id()
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Blocks until `stop` delivers a message (or all senders are gone), then
    /// shuts the encoder down. Returns early if the encoder exits first; an
    /// early exit with a failure status is `EncoderFailed`.
    pub fn wait_for_stop(
        mut self,
        stop: &Receiver<SessionMessage>,
        timeouts: &ShutdownTimeouts,
    ) -> RecorderResult<RecordingOutcome> {
        loop {
            match stop.recv_timeout(timeouts.poll_interval) {
                Ok(SessionMessage::Stop) => {
                    info!("Stop requested");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Stop channel closed, stopping");
                    break;
                }
                Err(RecvTimeoutError::Timeout) => match self.process.try_wait() {
                    Ok(Some(exit)) if exit.success() => {
                        info!("Encoder exited on its own");
                        return Ok(self.finish(ShutdownPath::Exited, Some(exit)));
                    }
                    Ok(Some(exit)) => {
                        error!("Encoder exited unexpectedly ({:?})", exit.code);
                        self.transition(SessionState::Terminated);
                        return Err(RecorderError::EncoderFailed { code: exit.code });
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Failed to poll encoder: {}", e),
                },
            }
        }

        self.stop(timeouts)
    }

    /// Runs the shutdown sequence now.
    ///
    /// Only a failed final kill is an error; everything before it escalates.
    pub fn stop(mut self, timeouts: &ShutdownTimeouts) -> RecorderResult<RecordingOutcome> {
        // An interactive Ctrl+C reaches the encoder too and it may already be
        // finalizing; that still counts as a requested stop.
        if let Ok(Some(exit)) = self.process.try_wait() {
            return Ok(self.finish(ShutdownPath::Graceful, Some(exit)));
        }

        self.transition(SessionState::StoppingGraceful);
        info!("Sending quit to encoder");
        if let Err(e) = self.process.send_quit() {
            warn!("Failed to send quit to encoder: {}", e);
        }
        if let Some(exit) = self.wait_for_exit(timeouts.graceful) {
            return Ok(self.finish(ShutdownPath::Graceful, Some(exit)));
        }

        self.transition(SessionState::StoppingForced);
        warn!(
            "Encoder still running after {:?}, terminating",
            timeouts.graceful
        );
        if let Err(e) = self.process.terminate() {
            warn!("Failed to terminate encoder: {}", e);
        }
        if let Some(exit) = self.wait_for_exit(timeouts.forced) {
            return Ok(self.finish(ShutdownPath::Forced, Some(exit)));
        }

        warn!("Encoder still running after {:?}, killing", timeouts.forced);
        if let Err(source) = self.process.kill() {
            return match self.process.try_wait() {
                Ok(Some(exit)) => Ok(self.finish(ShutdownPath::Forced, Some(exit))),
                _ => Err(RecorderError::TerminationFailed {
                    pid: self.process.id(),
                    source,
                }),
            };
        }
        let exit = self.wait_for_exit(timeouts.poll_interval);
        Ok(self.finish(ShutdownPath::Killed, exit))
    }

    fn wait_for_exit(&mut self, timeout: Duration) -> Option<EncoderExit> {
        match self.process.wait_timeout(timeout) {
            Ok(exit) => exit,
            Err(e) => {
                warn!("Failed to wait for encoder: {}", e);
                None
            }
        }
    }

    fn finish(mut self, shutdown: ShutdownPath, exit: Option<EncoderExit>) -> RecordingOutcome {
        self.transition(SessionState::Terminated);
        info!("Encoder stopped: {}", shutdown);
        RecordingOutcome {
            output_path: self.output_path,
            shutdown,
            exit,
            recorded_for: self.started_at.elapsed(),
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;
    use std::sync::mpsc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Quit,
        Terminate,
        Kill,
    }

    type Timeline = Rc<RefCell<Vec<(Duration, Call)>>>;

    /// Encoder double on a virtual clock. Waiting advances the clock instead
    /// of sleeping.
    struct SimulatedEncoder {
        now: Duration,
        exit_at: Option<Duration>,
        quit_delay: Option<Duration>,
        terminate_delay: Option<Duration>,
        kill_fails: bool,
        exit_code: Option<i32>,
        timeline: Timeline,
    }

    impl SimulatedEncoder {
        fn new(timeline: &Timeline) -> Self {
            Self {
                now: Duration::ZERO,
                exit_at: None,
                quit_delay: None,
                terminate_delay: None,
                kill_fails: false,
                exit_code: Some(0),
                timeline: Rc::clone(timeline),
            }
        }

        fn schedule_exit(&mut self, at: Duration) {
            self.exit_at = Some(self.exit_at.map_or(at, |current| current.min(at)));
        }

        fn exit(&self) -> EncoderExit {
            EncoderExit {
                code: self.exit_code,
            }
        }
    }

    impl EncoderProcess for SimulatedEncoder {
        fn id(&self) -> u32 {
            4242
        }

        fn send_quit(&mut self) -> io::Result<()> {
            self.timeline.borrow_mut().push((self.now, Call::Quit));
            if let Some(delay) = self.quit_delay {
                self.schedule_exit(self.now + delay);
            }
            Ok(())
        }

        fn try_wait(&mut self) -> io::Result<Option<EncoderExit>> {
            Ok(match self.exit_at {
                Some(at) if at <= self.now => Some(self.exit()),
                _ => None,
            })
        }

        fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<EncoderExit>> {
            match self.exit_at {
                Some(at) if at <= self.now + timeout => {
                    self.now = self.now.max(at);
                    Ok(Some(self.exit()))
                }
                _ => {
                    self.now += timeout;
                    Ok(None)
                }
            }
        }

        fn terminate(&mut self) -> io::Result<()> {
            self.timeline.borrow_mut().push((self.now, Call::Terminate));
            if let Some(delay) = self.terminate_delay {
                self.schedule_exit(self.now + delay);
            }
            Ok(())
        }

        fn kill(&mut self) -> io::Result<()> {
            self.timeline.borrow_mut().push((self.now, Call::Kill));
            if self.kill_fails {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            let now = self.now;
            self.schedule_exit(now);
            Ok(())
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn session(encoder: SimulatedEncoder) -> RecordingSession<SimulatedEncoder> {
        RecordingSession::from_process(encoder, Path::new("capture.mkv"))
    }

    fn fast_poll() -> ShutdownTimeouts {
        ShutdownTimeouts {
            poll_interval: Duration::from_millis(1),
            ..ShutdownTimeouts::default()
        }
    }

    #[test]
    fn test_new_session_is_running() {
        let timeline = Timeline::default();
        let s = session(SimulatedEncoder::new(&timeline));
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.pid(), 4242);
        assert_eq!(s.output_path(), Path::new("capture.mkv"));
    }

    #[test]
    fn test_prompt_quit_is_graceful() {
        let timeline = Timeline::default();
        let mut encoder = SimulatedEncoder::new(&timeline);
        encoder.quit_delay = Some(secs(3));

        let outcome = session(encoder).stop(&ShutdownTimeouts::default()).unwrap();

        assert_eq!(outcome.shutdown, ShutdownPath::Graceful);
        assert_eq!(outcome.output_path, PathBuf::from("capture.mkv"));
        assert_eq!(*timeline.borrow(), vec![(secs(0), Call::Quit)]);
    }

    #[test]
    fn test_slow_quit_gets_terminated_at_graceful_boundary() {
        let timeline = Timeline::default();
        let mut encoder = SimulatedEncoder::new(&timeline);
        encoder.quit_delay = Some(secs(15));

        let outcome = session(encoder).stop(&ShutdownTimeouts::default()).unwrap();

        assert_eq!(outcome.shutdown, ShutdownPath::Forced);
        assert_eq!(
            *timeline.borrow(),
            vec![(secs(0), Call::Quit), (secs(10), Call::Terminate)]
        );
    }

    #[test]
    fn test_unresponsive_encoder_is_killed_after_both_timeouts() {
        let timeline = Timeline::default();
        let encoder = SimulatedEncoder::new(&timeline);

        let outcome = session(encoder).stop(&ShutdownTimeouts::default()).unwrap();

        assert_eq!(outcome.shutdown, ShutdownPath::Killed);
        let calls = timeline.borrow();
        assert_eq!(
            *calls,
            vec![
                (secs(0), Call::Quit),
                (secs(10), Call::Terminate),
                (secs(15), Call::Kill),
            ]
        );
        let last = calls.last().map(|(at, _)| *at).unwrap_or_default();
        assert!(last <= secs(10) + secs(5));
        assert!(outcome.exit.is_some());
    }

    #[test]
    fn test_terminate_honored_within_forced_window() {
        let timeline = Timeline::default();
        let mut encoder = SimulatedEncoder::new(&timeline);
        encoder.terminate_delay = Some(secs(2));

        let outcome = session(encoder).stop(&ShutdownTimeouts::default()).unwrap();

        assert_eq!(outcome.shutdown, ShutdownPath::Forced);
        assert!(!timeline.borrow().iter().any(|(_, c)| *c == Call::Kill));
    }

    #[test]
    fn test_failed_kill_is_termination_failure() {
        let timeline = Timeline::default();
        let mut encoder = SimulatedEncoder::new(&timeline);
        encoder.kill_fails = true;

        let err = session(encoder)
            .stop(&ShutdownTimeouts::default())
            .unwrap_err();

        assert!(matches!(err, RecorderError::TerminationFailed { pid: 4242, .. }));
    }

    #[test]
    fn test_stop_message_triggers_shutdown() {
        let timeline = Timeline::default();
        let mut encoder = SimulatedEncoder::new(&timeline);
        encoder.quit_delay = Some(secs(1));
        let (tx, rx) = mpsc::channel();
        tx.send(SessionMessage::Stop).unwrap();

        let outcome = session(encoder).wait_for_stop(&rx, &fast_poll()).unwrap();

        assert_eq!(outcome.shutdown, ShutdownPath::Graceful);
        assert_eq!(*timeline.borrow(), vec![(secs(0), Call::Quit)]);
    }

    #[test]
    fn test_dropped_sender_stops_session() {
        let timeline = Timeline::default();
        let mut encoder = SimulatedEncoder::new(&timeline);
        encoder.quit_delay = Some(secs(1));
        let (tx, rx) = mpsc::channel::<SessionMessage>();
        drop(tx);

        let outcome = session(encoder).wait_for_stop(&rx, &fast_poll()).unwrap();
        assert_eq!(outcome.shutdown, ShutdownPath::Graceful);
    }

    #[test]
    fn test_self_exiting_encoder_needs_no_shutdown() {
        let timeline = Timeline::default();
        let mut encoder = SimulatedEncoder::new(&timeline);
        encoder.exit_at = Some(Duration::ZERO);
        let (_tx, rx) = mpsc::channel::<SessionMessage>();

        let outcome = session(encoder).wait_for_stop(&rx, &fast_poll()).unwrap();

        assert_eq!(outcome.shutdown, ShutdownPath::Exited);
        assert_eq!(outcome.exit, Some(EncoderExit { code: Some(0) }));
        assert!(timeline.borrow().is_empty());
    }

    #[test]
    fn test_encoder_failing_on_its_own_is_an_error() {
        let timeline = Timeline::default();
        let mut encoder = SimulatedEncoder::new(&timeline);
        encoder.exit_at = Some(Duration::ZERO);
        encoder.exit_code = Some(1);
        let (_tx, rx) = mpsc::channel::<SessionMessage>();

        let err = session(encoder).wait_for_stop(&rx, &fast_poll()).unwrap_err();

        assert!(matches!(err, RecorderError::EncoderFailed { code: Some(1) }));
        assert!(timeline.borrow().is_empty());
    }

    #[test]
    fn test_encoder_already_gone_when_stop_runs_is_graceful() {
        let timeline = Timeline::default();
        let mut encoder = SimulatedEncoder::new(&timeline);
        encoder.exit_at = Some(Duration::ZERO);
        encoder.exit_code = Some(255);

        let outcome = session(encoder).stop(&ShutdownTimeouts::default()).unwrap();

        assert_eq!(outcome.shutdown, ShutdownPath::Graceful);
        assert_eq!(outcome.exit, Some(EncoderExit { code: Some(255) }));
        assert!(timeline.borrow().is_empty());
    }

    #[test]
    fn test_launch_failure_is_synchronous() {
        let invocation = crate::encoder::invocation::build_invocation(
            crate::capture::Rectangle::new(0, 0, 2, 2),
            &crate::app::config::CaptureParameters::default(),
            Path::new("capture.mkv"),
        );
        let missing = Path::new("/nonexistent/dir/ffmpeg-missing");

        match RecordingSession::start(missing, &invocation) {
            Err(RecorderError::LaunchFailed { path, .. }) => assert_eq!(path, missing),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("nonexistent encoder started"),
        }
    }

    #[cfg(unix)]
    mod real_process {
        use super::*;
        use std::process::{Command, Stdio};

        fn short_timeouts() -> ShutdownTimeouts {
            ShutdownTimeouts {
                graceful: Duration::from_millis(300),
                forced: Duration::from_millis(300),
                poll_interval: Duration::from_millis(10),
            }
        }

        fn spawn_sh(script: &str) -> RecordingSession {
            let mut child = Command::new("sh")
                .args(["-c", script])
                .stdin(Stdio::piped())
                .spawn()
                .unwrap();
            let stdin = child.stdin.take();
            RecordingSession::from_process(
                EncoderChild::from_parts(child, stdin),
                Path::new("capture.mkv"),
            )
        }

        #[test]
        fn test_quit_byte_stops_reader() {
            let outcome = spawn_sh("head -c 1 >/dev/null")
                .stop(&short_timeouts())
                .unwrap();
            assert_eq!(outcome.shutdown, ShutdownPath::Graceful);
        }

        #[test]
        fn test_ignoring_quit_is_terminated_in_bounded_time() {
            let started = Instant::now();
            let outcome = spawn_sh("exec sleep 30").stop(&short_timeouts()).unwrap();
            assert_eq!(outcome.shutdown, ShutdownPath::Forced);
            assert!(started.elapsed() < Duration::from_secs(3));
        }

        #[test]
        fn test_ignoring_terminate_is_killed() {
            let started = Instant::now();
            let outcome = spawn_sh("trap '' TERM; while :; do sleep 1; done")
                .stop(&short_timeouts())
                .unwrap();
            assert_eq!(outcome.shutdown, ShutdownPath::Killed);
            assert!(started.elapsed() < Duration::from_secs(3));
        }
    }
}
