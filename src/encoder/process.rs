//! The encoder child process
//!
//! The lifecycle controller only talks to the encoder through
//! [`EncoderProcess`], so the shutdown state machine can be driven by a
//! simulated process in tests.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::time::Duration;

use log::debug;
use wait_timeout::ChildExt;

use super::invocation::EncoderInvocation;

/// FFmpeg stops recording and finalizes the container when it reads `q`.
pub const QUIT_SEQUENCE: &[u8] = b"q";

/// How an encoder process ended, as far as the OS reported it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderExit {
    /// `None` when the process died from a signal.
    pub code: Option<i32>,
}

impl EncoderExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for EncoderExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

pub trait EncoderProcess {
    fn id(&self) -> u32;

    /// Ask the encoder to finish writing and exit on its own.
    fn send_quit(&mut self) -> io::Result<()>;

    /// Non-blocking exit check.
    fn try_wait(&mut self) -> io::Result<Option<EncoderExit>>;

    /// Block for at most `timeout` waiting for exit.
    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<EncoderExit>>;

    /// Polite termination request (SIGTERM on Unix).
    fn terminate(&mut self) -> io::Result<()>;

    /// Unconditional kill.
    fn kill(&mut self) -> io::Result<()>;
}

/// A spawned FFmpeg with its stdin held open for the quit sequence.
pub struct EncoderChild {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl EncoderChild {
    pub fn spawn(program: &Path, invocation: &EncoderInvocation) -> io::Result<Self> {
        let mut child = Command::new(program)
            .args(invocation.args())
            .stdin(Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take();
        debug!("Spawned encoder pid {}", child.id());
        Ok(Self { child, stdin })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(child: Child, stdin: Option<ChildStdin>) -> Self {
        Self { child, stdin }
    }
}

impl EncoderProcess for EncoderChild {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn send_quit(&mut self) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "encoder stdin is closed"))?;
        stdin.write_all(QUIT_SEQUENCE)?;
        stdin.flush()
    }

    fn try_wait(&mut self) -> io::Result<Option<EncoderExit>> {
        Ok(self.child.try_wait()?.map(EncoderExit::from))
    }

    fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<EncoderExit>> {
        Ok(self.child.wait_timeout(timeout)?.map(EncoderExit::from))
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> io::Result<()> {
        let pid = self.child.id() as libc::pid_t;
        if unsafe { libc::kill(pid, libc::SIGTERM) } == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> io::Result<()> {
        // No softer signal exists for console processes here.
        self.child.kill()
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }
}
