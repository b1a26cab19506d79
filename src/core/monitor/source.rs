//! Where the sampler gets its raw text.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{MonitorError, Result};

use super::logins::LoginSession;

const DEFAULT_CLOCK_TICKS: u64 = 100;
const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Read access to kernel-exposed metrics. Names are relative to the proc
/// root (`"stat"`, `"42/cmdline"`).
pub trait MetricSource {
    fn read(&self, name: &str) -> io::Result<String>;

    /// At most `limit` bytes of `name`.
    fn read_bytes(&self, name: &str, limit: usize) -> io::Result<Vec<u8>>;

    /// Numeric entries of the proc root.
    fn pids(&self) -> io::Result<Vec<u32>>;

    /// Active user sessions, unsorted.
    fn logins(&self) -> Vec<LoginSession>;

    /// Bytes available to unprivileged users on the filesystem at `mount_point`.
    fn available_space(&self, mount_point: &str) -> io::Result<u64>;

    fn clock_ticks(&self) -> u64;

    fn page_size(&self) -> u64;

    /// Path shown in status messages for `name`.
    fn display_path(&self, name: &str) -> String {
        name.to_string()
    }
}

/// The live `/proc` filesystem, or any directory laid out like it.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
    clock_ticks: u64,
    page_size: u64,
}

impl ProcFs {
    /// Open `root`. Fails when its `version` file cannot be read, which
    /// means there is nothing to monitor.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let version = fs::read_to_string(root.join("version"))
            .map_err(|_| MonitorError::ProcUnavailable(root.clone()))?;
        log::info!("Using {} ({})", root.display(), version.trim());
        Ok(Self {
            root,
            clock_ticks: native::clock_ticks().unwrap_or(DEFAULT_CLOCK_TICKS),
            page_size: native::page_size().unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

impl MetricSource for ProcFs {
    fn read(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(name))
    }

    fn read_bytes(&self, name: &str, limit: usize) -> io::Result<Vec<u8>> {
        let file = File::open(self.root.join(name))?;
        let mut buf = Vec::with_capacity(limit);
        file.take(limit as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn pids(&self) -> io::Result<Vec<u32>> {
        let mut pids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) {
                if pid != 0 {
                    pids.push(pid);
                }
            }
        }
        Ok(pids)
    }

    fn logins(&self) -> Vec<LoginSession> {
        native::logins()
    }

    fn available_space(&self, mount_point: &str) -> io::Result<u64> {
        native::available_space(mount_point)
    }

    fn clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    fn display_path(&self, name: &str) -> String {
        self.root.join(name).display().to_string()
    }
}

#[cfg(unix)]
mod native {
    use std::ffi::CString;
    use std::io;

    use crate::core::monitor::logins::LoginSession;

    pub fn clock_ticks() -> Option<u64> {
        // SAFETY: sysconf has no preconditions.
        let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        u64::try_from(ticks).ok().filter(|&t| t > 0)
    }

    pub fn page_size() -> Option<u64> {
        // SAFETY: sysconf has no preconditions.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        u64::try_from(size).ok().filter(|&s| s > 0)
    }

    pub fn available_space(mount_point: &str) -> io::Result<u64> {
        let path = CString::new(mount_point)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: statvfs is plain data; the kernel fills it on success.
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::statvfs(path.as_ptr(), &mut stat) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::unnecessary_cast)]
        Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
    }

    #[cfg(target_os = "linux")]
    pub fn logins() -> Vec<LoginSession> {
        let mut sessions = Vec::new();
        // SAFETY: the utmpx cursor is only walked from the sampler, and each
        // entry is copied out before the next call overwrites it.
        unsafe {
            libc::setutxent();
            loop {
                let entry = libc::getutxent();
                if entry.is_null() {
                    break;
                }
                let entry = &*entry;
                if entry.ut_type != libc::USER_PROCESS {
                    continue;
                }
                sessions.push(LoginSession::new(
                    c_field(&entry.ut_user),
                    c_field(&entry.ut_host),
                ));
            }
            libc::endutxent();
        }
        sessions
    }

    #[cfg(not(target_os = "linux"))]
    pub fn logins() -> Vec<LoginSession> {
        Vec::new()
    }

    /// Fixed-size utmp fields are not always NUL-terminated.
    #[cfg(target_os = "linux")]
    fn c_field(field: &[libc::c_char]) -> String {
        let bytes: Vec<u8> = field
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(not(unix))]
mod native {
    use std::io;

    use crate::core::monitor::logins::LoginSession;

    pub fn clock_ticks() -> Option<u64> {
        None
    }

    pub fn page_size() -> Option<u64> {
        None
    }

    pub fn available_space(_mount_point: &str) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "free space is not available on this platform",
        ))
    }

    pub fn logins() -> Vec<LoginSession> {
        Vec::new()
    }
}
