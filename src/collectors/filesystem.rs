//! Filesystem usage for mounted filesystems.
//!
//! Mount points come from `<proc_root>/mounts`; sizes come from `statvfs`.

use std::collections::HashSet;
use std::path::Path;

use super::read_proc_file;
use crate::error::CollectError;

/// Usage of one mounted filesystem, in KiB.
#[derive(Debug, Clone, PartialEq)]
pub struct FilesystemUsage {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
    pub size_kb: u64,
    pub used_kb: u64,
    pub available_kb: u64,
    /// Percentage of the space available to unprivileged users that is in use,
    /// rounded up the way `df` does.
    pub use_pct: u64,
}

/// A parsed /proc/mounts entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
}

/// Parses /proc/mounts content, dropping filesystems that are never reported
/// and repeated mounts of the same device.
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    let mut seen = HashSet::new();
    let mut mounts = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }

        let entry = MountEntry {
            device: unescape_mount_field(parts[0]),
            mount_point: unescape_mount_field(parts[1]),
            fstype: parts[2].to_string(),
        };

        if should_skip_filesystem(&entry.device, &entry.fstype, &entry.mount_point) {
            continue;
        }
        if !seen.insert(entry.device.clone()) {
            continue;
        }

        mounts.push(entry);
    }

    mounts
}

/// Reads usage for every reportable mounted filesystem.
///
/// Filesystems that cannot be stat'ed (stale NFS, permission) are left out.
pub fn read_filesystems(proc_root: &Path) -> Result<Vec<FilesystemUsage>, CollectError> {
    let (_, content) = read_proc_file(proc_root, "mounts")?;

    let mut stats = Vec::new();
    for mount in parse_mounts(&content) {
        match get_statvfs_stats(&mount.mount_point) {
            Ok((size_kb, used_kb, available_kb)) => {
                if size_kb == 0 {
                    continue;
                }
                stats.push(FilesystemUsage {
                    use_pct: use_percent(used_kb, available_kb),
                    device: mount.device,
                    mount_point: mount.mount_point,
                    fstype: mount.fstype,
                    size_kb,
                    used_kb,
                    available_kb,
                });
            }
            Err(e) => {
                tracing::debug!("Skipping {}: {}", mount.mount_point, e);
            }
        }
    }

    Ok(stats)
}

/// `used / (used + available)` rounded up, as `df` computes Use%.
pub fn use_percent(used_kb: u64, available_kb: u64) -> u64 {
    let denominator = used_kb + available_kb;
    if denominator == 0 {
        return 0;
    }
    (used_kb * 100).div_ceil(denominator)
}

/// Checks if a filesystem should be skipped based on device, type and mount point.
fn should_skip_filesystem(device: &str, fstype: &str, mount_point: &str) -> bool {
    // Skip pseudo/virtual filesystems
    let skip_types = [
        "proc",
        "sysfs",
        "devpts",
        "devtmpfs",
        "tmpfs",
        "cgroup",
        "cgroup2",
        "pstore",
        "bpf",
        "debugfs",
        "tracefs",
        "fusectl",
        "configfs",
        "securityfs",
        "hugetlbfs",
        "mqueue",
        "autofs",
        "binfmt_misc",
        "squashfs",
        "nsfs",
        "overlay",
    ];

    if skip_types.contains(&fstype) {
        return true;
    }

    if device == "udev" || device.starts_with("/dev/loop") || device.starts_with("/dev/ram") {
        return true;
    }

    // Skip system mount points
    mount_point.starts_with("/proc")
        || mount_point.starts_with("/sys")
        || mount_point.starts_with("/dev")
        || mount_point.starts_with("/run")
}

/// Decodes the octal escapes (`\040` for space) the kernel uses in mount fields.
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Gets (size, used, available) in KiB using libc statvfs.
fn get_statvfs_stats(path: &str) -> Result<(u64, u64, u64), String> {
    use std::ffi::CString;
    use std::mem;

    let c_path = CString::new(path).map_err(|e| format!("Invalid path: {}", e))?;

    // SAFETY: statvfs only writes into the zeroed struct we own; c_path is a
    // valid NUL-terminated string for the duration of the call.
    let stat = unsafe {
        let mut stat: libc::statvfs = mem::zeroed();
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return Err(format!("statvfs failed for {}", path));
        }
        stat
    };

    let block_size = stat.f_frsize as u64;
    let size = block_size * stat.f_blocks as u64;
    let free = block_size * stat.f_bfree as u64;
    let available = block_size * stat.f_bavail as u64;

    Ok((size / 1024, size.saturating_sub(free) / 1024, available / 1024))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUNTS: &str = "sysfs /sys sysfs rw 0 0\n\
                          proc /proc proc rw 0 0\n\
                          udev /dev devtmpfs rw 0 0\n\
                          /dev/nvme0n1p2 / ext4 rw 0 0\n\
                          tmpfs /tmp tmpfs rw 0 0\n\
                          /dev/loop3 /snap/core/1 squashfs ro 0 0\n\
                          /dev/nvme0n1p2 /var/lib/docker ext4 rw 0 0\n\
                          /dev/sdb1 /mnt/my\\040disk xfs rw 0 0\n";

    #[test]
    fn test_parse_mounts_filters_and_dedupes() {
        let mounts = parse_mounts(MOUNTS);
        let points: Vec<&str> = mounts.iter().map(|m| m.mount_point.as_str()).collect();
        assert_eq!(points, vec!["/", "/mnt/my disk"]);
    }

    #[test]
    fn test_should_skip_filesystem() {
        assert!(should_skip_filesystem("proc", "proc", "/proc"));
        assert!(should_skip_filesystem("tmpfs", "tmpfs", "/dev/shm"));
        assert!(should_skip_filesystem("udev", "devtmpfs", "/dev"));
        assert!(should_skip_filesystem("/dev/loop0", "ext4", "/media/img"));
        assert!(!should_skip_filesystem("/dev/sda1", "ext4", "/"));
        assert!(!should_skip_filesystem("/dev/sdb1", "xfs", "/data"));
    }

    #[test]
    fn test_use_percent_rounds_up() {
        assert_eq!(use_percent(0, 0), 0);
        assert_eq!(use_percent(50, 50), 50);
        assert_eq!(use_percent(1, 999), 1);
        assert_eq!(use_percent(900, 100), 90);
    }

    #[test]
    fn test_unescape_mount_field() {
        assert_eq!(unescape_mount_field("/mnt/a\\040b"), "/mnt/a b");
        assert_eq!(unescape_mount_field("/plain"), "/plain");
        assert_eq!(unescape_mount_field("/trailing\\"), "/trailing\\");
    }

    #[test]
    fn test_read_filesystems_with_root_mount() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mounts"), "rootfs / ext4 rw 0 0\n").unwrap();

        let stats = read_filesystems(dir.path()).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].mount_point, "/");
        assert!(stats[0].use_pct <= 100);
    }
}
