use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command as ProcessCommand, Stdio};
#[cfg(unix)]
use std::sync::atomic::{AtomicI32, Ordering};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

/// Signals that end a session when they reach us.
#[cfg(unix)]
const FORWARDED_SIGNALS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGTERM, libc::SIGQUIT];

#[cfg(unix)]
static PENDING_SIGNAL: AtomicI32 = AtomicI32::new(0);

#[cfg(unix)]
extern "C" fn record_signal(signum: libc::c_int) {
    PENDING_SIGNAL.store(signum, Ordering::SeqCst);
}

#[cfg(unix)]
struct ScopedSigaction {
    signum: libc::c_int,
    old_action: libc::sigaction,
}

#[cfg(unix)]
impl ScopedSigaction {
    fn record(signum: libc::c_int) -> io::Result<Self> {
        unsafe {
            let mut new_action: libc::sigaction = std::mem::zeroed();
            new_action.sa_sigaction =
                record_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            libc::sigemptyset(&mut new_action.sa_mask);
            new_action.sa_flags = libc::SA_RESTART;

            let mut old_action: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(signum, &new_action, &mut old_action) != 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(Self { signum, old_action })
        }
    }
}

#[cfg(unix)]
impl Drop for ScopedSigaction {
    fn drop(&mut self) {
        unsafe {
            let _ = libc::sigaction(self.signum, &self.old_action, std::ptr::null_mut());
        }
    }
}

/// Keeps interrupt capture installed until dropped.
#[derive(Default)]
pub(crate) struct CaptureGuard {
    #[cfg(unix)]
    _actions: Vec<ScopedSigaction>,
}

/// Where the signal listener learns about interrupts.
pub(crate) trait InterruptSource: Sync {
    fn capture(&self) -> io::Result<CaptureGuard>;

    /// Returns the signal received since the last call, if any.
    fn take_pending(&self) -> Option<i32>;
}

/// Interrupts delivered to this process by the OS.
#[derive(Debug, Default)]
pub(crate) struct OsInterrupts;

impl InterruptSource for OsInterrupts {
    #[cfg(unix)]
    fn capture(&self) -> io::Result<CaptureGuard> {
        PENDING_SIGNAL.store(0, Ordering::SeqCst);
        let mut actions = Vec::with_capacity(FORWARDED_SIGNALS.len());
        for signum in FORWARDED_SIGNALS {
            actions.push(ScopedSigaction::record(signum)?);
        }
        Ok(CaptureGuard { _actions: actions })
    }

    #[cfg(not(unix))]
    fn capture(&self) -> io::Result<CaptureGuard> {
        Ok(CaptureGuard::default())
    }

    #[cfg(unix)]
    fn take_pending(&self) -> Option<i32> {
        let signum = PENDING_SIGNAL.swap(0, Ordering::SeqCst);
        (signum != 0).then_some(signum)
    }

    #[cfg(not(unix))]
    fn take_pending(&self) -> Option<i32> {
        None
    }
}

#[cfg(unix)]
pub(crate) fn forward_signal(pid: u32, signum: i32) -> io::Result<()> {
    if unsafe { libc::kill(pid as libc::pid_t, signum) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn forward_signal(pid: u32, signum: i32) -> io::Result<()> {
    let _ = (pid, signum);
    Ok(())
}

/// The external player and the speed every session uses.
#[derive(Debug, Clone)]
pub(crate) struct Player {
    bin: PathBuf,
    speed: f32,
}

impl Player {
    pub(crate) fn new(bin: impl Into<PathBuf>, speed: f32) -> Self {
        Self {
            bin: bin.into(),
            speed,
        }
    }

    pub(crate) fn bin(&self) -> &Path {
        &self.bin
    }

    pub(crate) fn args(&self, media_url: &str, start_at: u64) -> Vec<String> {
        let mut args = vec![
            "--no-video".to_string(),
            media_url.to_string(),
            format!("--speed={:.2}", self.speed),
        ];
        if start_at > 0 {
            args.push(format!("--start={start_at}"));
        }
        args
    }

    pub(crate) fn spawn(&self, media_url: &str, start_at: u64) -> io::Result<Child> {
        let mut cmd = ProcessCommand::new(&self.bin);
        cmd.args(self.args(media_url, start_at))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        unsafe {
            cmd.pre_exec(|| {
                for signum in FORWARDED_SIGNALS {
                    libc::signal(signum, libc::SIG_DFL);
                }
                Ok(())
            });
        }

        cmd.spawn()
    }
}
