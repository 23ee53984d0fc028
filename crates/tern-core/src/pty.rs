//! Unix PTY handling
//!
//! Opens a pseudo-terminal pair, forks, and executes the child with the
//! slave side as its controlling terminal. The parent keeps the master fd
//! for the I/O loop.

use std::ffi::CString;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};

use thiserror::Error;

/// Size of a single PTY read, and the parser's working chunk.
pub const READ_BUF_SIZE: usize = 1024;

/// Shell used when none is configured and $SHELL is unset.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Fallback home directory when $HOME is unset.
const FALLBACK_HOME: &str = "/root";

/// Errors that can occur with PTY operations
#[derive(Error, Debug)]
pub enum PtyError {
    #[error("failed to open pty: {0}")]
    Open(#[source] io::Error),

    #[error("fork failed: {0}")]
    Fork(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no child process")]
    NotRunning,
}

/// PTY configuration
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Initial terminal size
    pub cols: u16,
    pub rows: u16,
    /// Command and arguments to execute. Empty means the configured shell.
    pub command: Vec<String>,
    /// Shell to run when no command is given (None = $SHELL, then the
    /// stock default)
    pub shell: Option<String>,
    /// Value for the TERM environment variable
    pub term: String,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            command: Vec::new(),
            shell: None,
            term: "xterm-256color".to_string(),
        }
    }
}

/// Master side of a PTY with the child process it drives
#[derive(Debug)]
pub struct Pty {
    master_fd: RawFd,
    master: File,
    child_pid: libc::pid_t,
    exit_status: Option<i32>,
}

impl Pty {
    /// Open a PTY pair and spawn the configured child on the slave side
    pub fn spawn(config: &PtyConfig) -> Result<Self, PtyError> {
        unsafe { Self::open_and_fork(config) }
    }

    /// Get the child process ID
    pub fn child_pid(&self) -> libc::pid_t {
        self.child_pid
    }

    /// Write data to the PTY
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.master.write_all(data)
    }

    /// Read data from the PTY (blocking)
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.master.read(buf)
    }

    /// Tell the kernel (and through it the child) the new window size
    pub fn resize(&self, rows: u16, cols: u16) -> io::Result<()> {
        let size = libc::winsize {
            ws_row: rows,
            ws_col: cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };

        let ret = unsafe { libc::ioctl(self.master_fd, libc::TIOCSWINSZ, &size) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    /// Reap the child without blocking. Returns the exit status when it has
    /// exited: the plain code for a clean exit, 128 + signal otherwise.
    pub fn try_wait(&mut self) -> Option<i32> {
        if self.exit_status.is_some() {
            return self.exit_status;
        }

        let mut status: libc::c_int = 0;
        let ret = unsafe { libc::waitpid(self.child_pid, &mut status, libc::WNOHANG) };
        if ret == self.child_pid {
            self.exit_status = Some(decode_status(status));
        }
        self.exit_status
    }

    /// Wait for the child process to exit
    pub fn wait(&mut self) -> io::Result<i32> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }

        let mut status: libc::c_int = 0;
        loop {
            let ret = unsafe { libc::waitpid(self.child_pid, &mut status, 0) };
            if ret == self.child_pid {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }

        let code = decode_status(status);
        self.exit_status = Some(code);
        Ok(code)
    }

    /// Send a signal to the child process
    pub fn kill(&self, signal: i32) -> io::Result<()> {
        let ret = unsafe { libc::kill(self.child_pid, signal) };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    /// Duplicate the master fd into an independent reader, so a blocking
    /// reader can run while the original handle keeps writing
    pub fn try_clone_reader(&self) -> io::Result<File> {
        let new_fd = unsafe { libc::dup(self.master_fd) };
        if new_fd < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(unsafe { File::from_raw_fd(new_fd) })
        }
    }

    unsafe fn open_and_fork(config: &PtyConfig) -> Result<Self, PtyError> {
        let mut master_fd: libc::c_int = 0;
        let mut slave_fd: libc::c_int = 0;

        let ret = libc::openpty(
            &mut master_fd,
            &mut slave_fd,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        );
        if ret < 0 {
            return Err(PtyError::Open(io::Error::last_os_error()));
        }

        let size = libc::winsize {
            ws_row: config.rows,
            ws_col: config.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        libc::ioctl(slave_fd, libc::TIOCSWINSZ, &size);

        let pid = libc::fork();
        if pid < 0 {
            libc::close(master_fd);
            libc::close(slave_fd);
            return Err(PtyError::Fork(io::Error::last_os_error()));
        }

        if pid == 0 {
            // Child: exec_child never returns.
            Self::exec_child(slave_fd, master_fd, config);
        }

        // Parent
        libc::close(slave_fd);

        Ok(Self {
            master_fd,
            master: File::from_raw_fd(master_fd),
            child_pid: pid,
            exit_status: None,
        })
    }

    /// Runs in the forked child: wire the slave fd up as the controlling
    /// terminal, set the environment, and exec
    unsafe fn exec_child(slave_fd: RawFd, master_fd: RawFd, config: &PtyConfig) -> ! {
        libc::close(master_fd);

        if libc::setsid() < 0 {
            libc::_exit(1);
        }
        if libc::ioctl(slave_fd, libc::TIOCSCTTY, 0) < 0 {
            libc::_exit(1);
        }

        if libc::dup2(slave_fd, libc::STDIN_FILENO) < 0
            || libc::dup2(slave_fd, libc::STDOUT_FILENO) < 0
            || libc::dup2(slave_fd, libc::STDERR_FILENO) < 0
        {
            libc::_exit(1);
        }
        if slave_fd > libc::STDERR_FILENO {
            libc::close(slave_fd);
        }

        set_env("TERM", &config.term);
        set_env("PS1", "$ ");

        // The child starts in the user's home directory, with a fallback
        // when HOME is missing from the environment.
        let home = std::env::var("HOME").unwrap_or_else(|_| {
            set_env("HOME", FALLBACK_HOME);
            FALLBACK_HOME.to_string()
        });
        if let Ok(home_c) = CString::new(home) {
            libc::chdir(home_c.as_ptr());
        }

        // An explicit command runs as given; otherwise the shell, with -i
        // only when it is the stock default.
        let argv: Vec<String> = if config.command.is_empty() {
            let shell = config
                .shell
                .clone()
                .or_else(|| std::env::var("SHELL").ok())
                .unwrap_or_else(|| DEFAULT_SHELL.to_string());
            if shell == DEFAULT_SHELL {
                vec![shell, "-i".to_string()]
            } else {
                vec![shell]
            }
        } else {
            config.command.clone()
        };

        let args_c: Vec<CString> = argv
            .iter()
            .filter_map(|a| CString::new(a.as_str()).ok())
            .collect();
        if args_c.is_empty() {
            libc::_exit(1);
        }
        let mut args_ptrs: Vec<*const libc::c_char> = args_c.iter().map(|a| a.as_ptr()).collect();
        args_ptrs.push(std::ptr::null());

        libc::execvp(args_ptrs[0], args_ptrs.as_ptr());

        // Exec failed.
        libc::_exit(127);
    }
}

fn set_env(key: &str, value: &str) {
    if let (Ok(k), Ok(v)) = (CString::new(key), CString::new(value)) {
        unsafe {
            libc::setenv(k.as_ptr(), v.as_ptr(), 1);
        }
    }
}

fn decode_status(status: libc::c_int) -> i32 {
    if libc::WIFEXITED(status) {
        libc::WEXITSTATUS(status)
    } else if libc::WIFSIGNALED(status) {
        128 + libc::WTERMSIG(status)
    } else {
        1
    }
}

impl AsRawFd for Pty {
    fn as_raw_fd(&self) -> RawFd {
        self.master_fd
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        if self.exit_status.is_none() {
            let _ = self.kill(libc::SIGHUP);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_wait() {
        let config = PtyConfig {
            command: vec!["/bin/sh".into(), "-c".into(), "exit 7".into()],
            ..Default::default()
        };

        let mut pty = Pty::spawn(&config).expect("failed to create PTY");
        assert!(pty.child_pid() > 0);
        assert_eq!(pty.wait().expect("failed to wait"), 7);
    }

    #[test]
    fn test_signalled_child_maps_to_128_plus_signal() {
        let config = PtyConfig {
            command: vec!["/bin/sh".into(), "-c".into(), "kill -TERM $$".into()],
            ..Default::default()
        };

        let mut pty = Pty::spawn(&config).expect("failed to create PTY");
        assert_eq!(pty.wait().expect("failed to wait"), 128 + libc::SIGTERM);
    }

    #[test]
    fn test_read_write_round_trip() {
        let config = PtyConfig {
            command: vec!["/bin/cat".into()],
            ..Default::default()
        };

        let mut pty = Pty::spawn(&config).expect("failed to create PTY");
        pty.write(b"ping\n").expect("failed to write");

        let mut buf = [0u8; READ_BUF_SIZE];
        let n = pty.read(&mut buf).expect("failed to read");
        assert!(n > 0);

        pty.kill(libc::SIGTERM).expect("failed to kill");
        let _ = pty.wait();
    }

    #[test]
    fn test_term_env_reaches_child() {
        let config = PtyConfig {
            command: vec!["/bin/sh".into(), "-c".into(), "printf %s \"$TERM\"".into()],
            term: "dumb".into(),
            ..Default::default()
        };

        let mut pty = Pty::spawn(&config).expect("failed to create PTY");
        let mut out = Vec::new();
        let mut buf = [0u8; READ_BUF_SIZE];
        loop {
            match pty.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
            }
        }
        let _ = pty.wait();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("dumb"));
    }
}
