//! Host introspection for the report header.
//!
//! Hostname, OS name, kernel release, uptime, logged-in users and the online
//! core count. Every lookup degrades to a placeholder instead of failing.

use std::fs;
use std::path::Path;

use crate::collectors::{read_per_core_ticks, read_proc_file};
use crate::config::DEFAULT_PROC_ROOT;
use crate::error::CollectError;

/// Static facts about the host shown in the header.
#[derive(Debug, Clone, PartialEq)]
pub struct HostInfo {
    pub hostname: String,
    pub os_name: String,
    pub kernel: String,
    pub machine: String,
    pub uptime_seconds: Option<f64>,
    pub logged_in_users: Option<usize>,
    pub cores: usize,
}

impl HostInfo {
    pub fn gather(proc_root: &Path) -> Self {
        let (kernel, machine) = match read_uname_info() {
            Ok((_, release, _, machine)) => (release, machine),
            Err(e) => {
                tracing::debug!("uname failed: {}", e);
                ("unknown".to_string(), "unknown".to_string())
            }
        };

        HostInfo {
            hostname: read_hostname(),
            os_name: read_os_name(),
            kernel,
            machine,
            uptime_seconds: read_uptime(proc_root).ok(),
            logged_in_users: count_logged_in_users(),
            cores: online_cores(proc_root),
        }
    }
}

pub fn read_hostname() -> String {
    nix::unistd::gethostname()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// `PRETTY_NAME` from os-release, falling back to `NAME` and then "Linux".
pub fn read_os_name() -> String {
    ["/etc/os-release", "/usr/lib/os-release"]
        .iter()
        .find_map(|p| fs::read_to_string(p).ok())
        .and_then(|content| parse_os_release(&content))
        .unwrap_or_else(|| "Linux".to_string())
}

pub fn parse_os_release(content: &str) -> Option<String> {
    let value_of = |key: &str| {
        content.lines().find_map(|line| {
            let (k, v) = line.split_once('=')?;
            (k.trim() == key).then(|| v.trim().trim_matches('"').trim_matches('\'').to_string())
        })
    };

    value_of("PRETTY_NAME")
        .filter(|v| !v.is_empty())
        .or_else(|| value_of("NAME"))
}

/// Reads system uptime in seconds from /proc/uptime.
///
/// Format: "<uptime_seconds> <idle_seconds>"
pub fn read_uptime(proc_root: &Path) -> Result<f64, CollectError> {
    let (path, content) = read_proc_file(proc_root, "uptime")?;

    content
        .split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| CollectError::malformed(path, "no uptime value"))
}

/// Formats seconds as "3 days, 04:05" or "04:05".
pub fn format_uptime(seconds: f64) -> String {
    let total_minutes = (seconds.max(0.0) as u64) / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    match days {
        0 => format!("{:02}:{:02}", hours, minutes),
        1 => format!("1 day, {:02}:{:02}", hours, minutes),
        d => format!("{} days, {:02}:{:02}", d, hours, minutes),
    }
}

/// Number of online CPUs.
///
/// For the live `/proc` this is sysconf, falling back to the `cpuN` lines of
/// /proc/stat. Any other proc root is taken at its word, so a fixture tree
/// reports its own core count.
pub fn online_cores(proc_root: &Path) -> usize {
    let from_stat = || read_per_core_ticks(proc_root).map(|cores| cores.len()).ok();

    if proc_root != Path::new(DEFAULT_PROC_ROOT) {
        if let Some(cores) = from_stat().filter(|&n| n > 0) {
            return cores;
        }
    }

    // SAFETY: sysconf has no memory-safety preconditions; -1 signals an error.
    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if online > 0 {
        return online as usize;
    }

    from_stat().unwrap_or(1).max(1)
}

/// Counts USER_PROCESS records in the utmp database.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub fn count_logged_in_users() -> Option<usize> {
    let mut count = 0;

    // SAFETY: the utmpx iteration functions are only called from this one
    // thread; each returned record is read before the next call.
    unsafe {
        libc::setutxent();
        loop {
            let entry = libc::getutxent();
            if entry.is_null() {
                break;
            }
            if (*entry).ut_type == libc::USER_PROCESS {
                count += 1;
            }
        }
        libc::endutxent();
    }

    Some(count)
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
pub fn count_logged_in_users() -> Option<usize> {
    None
}

/// Reads system information from uname syscall.
/// Returns (sysname, release, version, machine).
pub fn read_uname_info() -> Result<(String, String, String, String), String> {
    use std::ffi::CStr;
    use std::mem;

    // SAFETY: libc::utsname only holds c_char arrays, valid when zeroed, and
    // uname NUL-terminates every field it fills.
    unsafe {
        let mut utsname: libc::utsname = mem::zeroed();
        if libc::uname(&mut utsname) != 0 {
            return Err("Failed to call uname".to_string());
        }

        let field = |ptr: *const libc::c_char| CStr::from_ptr(ptr).to_string_lossy().into_owned();

        Ok((
            field(utsname.sysname.as_ptr()),
            field(utsname.release.as_ptr()),
            field(utsname.version.as_ptr()),
            field(utsname.machine.as_ptr()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_os_release() {
        let content = "NAME=\"Debian GNU/Linux\"\nPRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\nID=debian\n";
        assert_eq!(
            parse_os_release(content).as_deref(),
            Some("Debian GNU/Linux 12 (bookworm)")
        );
        assert_eq!(parse_os_release("NAME=Alpine\n").as_deref(), Some("Alpine"));
        assert_eq!(parse_os_release("ID=x\n"), None);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(59.0), "00:00");
        assert_eq!(format_uptime(3_725.0), "01:02");
        assert_eq!(format_uptime(90_000.0), "1 day, 01:00");
        assert_eq!(format_uptime(3.0 * 86_400.0 + 300.0), "3 days, 00:05");
    }

    #[test]
    fn test_read_uptime_fixture() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("uptime"), "12345.67 54321.00\n").unwrap();
        assert!((read_uptime(dir.path()).unwrap() - 12345.67).abs() < 1e-6);
    }

    #[test]
    fn test_online_cores_from_fixture_stat() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("stat"),
            "cpu 4 0 4 40 0 0 0\ncpu0 1 0 1 10 0 0 0\ncpu1 1 0 1 10 0 0 0\ncpu2 1 0 1 10 0 0 0\n",
        )
        .unwrap();
        assert_eq!(online_cores(dir.path()), 3);
    }

    #[test]
    fn test_online_cores_positive() {
        assert!(online_cores(Path::new("/nonexistent")) >= 1);
    }

    #[test]
    fn test_uname_release_not_empty() {
        let (sysname, release, _, _) = read_uname_info().unwrap();
        assert_eq!(sysname, "Linux");
        assert!(!release.is_empty());
    }
}
