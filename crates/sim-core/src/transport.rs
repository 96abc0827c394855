//! Pseudo-terminal serial endpoint.
//!
//! The simulator holds the master side of a PTY pair; whatever attaches to
//! the slave device sees a plain serial line. The pair is switched to raw
//! mode at allocation so the line discipline neither echoes nor translates
//! bytes, and the master is non-blocking so register callbacks never stall.
//!
//! Allocation failure is not fatal: the transport degrades to a disabled
//! endpoint that reports no pending bytes and swallows writes.

#![allow(unsafe_code)]

use std::ffi::CStr;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct Endpoint {
    master: OwnedFd,
    slave_path: PathBuf,
}

/// Master side of a PTY pair acting as the serial line.
#[derive(Debug)]
pub struct PtyTransport {
    endpoint: Option<Endpoint>,
}

impl PtyTransport {
    /// Allocates a PTY pair, returning a disabled transport on failure.
    #[must_use]
    pub fn open() -> Self {
        allocate().map_or_else(
            |err| {
                log::warn!("pty allocation failed, serial transport disabled: {err}");
                Self { endpoint: None }
            },
            |endpoint| {
                log::info!("serial line ready, peer end at {}", endpoint.slave_path.display());
                Self {
                    endpoint: Some(endpoint),
                }
            },
        )
    }

    /// Creates a transport with no serial line attached.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { endpoint: None }
    }

    /// Returns `true` when a serial line is attached.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Returns the slave device path peers should open, when enabled.
    #[must_use]
    pub fn slave_path(&self) -> Option<&Path> {
        self.endpoint.as_ref().map(|ep| ep.slave_path.as_path())
    }

    /// Returns the number of bytes waiting to be read from the line.
    #[must_use]
    pub fn bytes_available(&self) -> usize {
        let Some(endpoint) = &self.endpoint else {
            return 0;
        };
        let mut pending: libc::c_int = 0;
        let rc = unsafe {
            libc::ioctl(
                endpoint.master.as_raw_fd(),
                libc::FIONREAD,
                std::ptr::addr_of_mut!(pending),
            )
        };
        if rc < 0 {
            return 0;
        }
        usize::try_from(pending).unwrap_or(0)
    }

    /// Reads whatever is currently pending into `buf`, returning the count.
    ///
    /// Returns 0 when nothing is pending, the line dropped, or the
    /// transport is disabled.
    pub fn read_nonblocking(&self, buf: &mut [u8]) -> usize {
        let Some(endpoint) = &self.endpoint else {
            return 0;
        };
        let n = unsafe {
            libc::read(
                endpoint.master.as_raw_fd(),
                buf.as_mut_ptr().cast::<libc::c_void>(),
                buf.len(),
            )
        };
        usize::try_from(n).unwrap_or(0)
    }

    /// Reads a single pending byte, if there is one.
    #[must_use]
    pub fn read_byte(&self) -> Option<u8> {
        let mut byte = [0u8; 1];
        (self.read_nonblocking(&mut byte) == 1).then_some(byte[0])
    }

    /// Sends one byte down the line, best effort.
    pub fn write_byte(&self, byte: u8) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };
        let buf = [byte];
        let n = unsafe {
            libc::write(
                endpoint.master.as_raw_fd(),
                buf.as_ptr().cast::<libc::c_void>(),
                1,
            )
        };
        if n != 1 {
            log::debug!("serial write dropped a byte: {}", io::Error::last_os_error());
        }
    }
}

fn allocate() -> io::Result<Endpoint> {
    let raw = unsafe { libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY) };
    if raw < 0 {
        return Err(io::Error::last_os_error());
    }
    let master = unsafe { OwnedFd::from_raw_fd(raw) };

    if unsafe { libc::grantpt(master.as_raw_fd()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::unlockpt(master.as_raw_fd()) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let slave_path = slave_name(master.as_raw_fd())?;
    set_nonblocking(master.as_raw_fd())?;
    set_raw_mode(master.as_raw_fd())?;

    Ok(Endpoint { master, slave_path })
}

fn slave_name(master: RawFd) -> io::Result<PathBuf> {
    let mut buf: [libc::c_char; 128] = [0; 128];
    let rc = unsafe { libc::ptsname_r(master, buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return Err(io::Error::from_raw_os_error(rc));
    }
    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Ok(PathBuf::from(name.to_string_lossy().into_owned()))
}

fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn set_raw_mode(fd: RawFd) -> io::Result<()> {
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, std::ptr::addr_of_mut!(termios)) } != 0 {
        return Err(io::Error::last_os_error());
    }
    unsafe { libc::cfmakeraw(std::ptr::addr_of_mut!(termios)) };
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, std::ptr::addr_of!(termios)) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
