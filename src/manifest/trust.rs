//! Trust policy for `enabled.local.json`.
//!
//! The local override file is untracked, so before its contents may change
//! what the init script sources it must be a regular file owned by the
//! current user and writable by nobody else. Callers treat any
//! [`TrustViolation`] as "no local file" after logging it.
use std::path::Path;

use crate::error::TrustViolation;

/// Decides whether a local override file may be read.
#[cfg_attr(test, mockall::automock)]
pub trait LocalOverrideTrustPolicy {
    /// Check the file's metadata without reading it.
    ///
    /// # Errors
    ///
    /// Returns the [`TrustViolation`] describing why the file is refused.
    fn verify(&self, path: &Path) -> Result<(), TrustViolation>;

    /// Verify the file and return its contents.
    ///
    /// # Errors
    ///
    /// Returns the [`TrustViolation`] describing why the file is refused, or
    /// [`TrustViolation::Inaccessible`] if it cannot be read.
    fn read_trusted(&self, path: &Path) -> Result<Vec<u8>, TrustViolation> {
        self.verify(path)?;
        Ok(std::fs::read(path)?)
    }
}

/// The policy for the host operating system.
#[cfg(unix)]
#[must_use]
pub fn platform_policy() -> Box<dyn LocalOverrideTrustPolicy> {
    Box::new(UnixTrustPolicy::current_user())
}

/// The policy for the host operating system.
#[cfg(not(unix))]
#[must_use]
pub fn platform_policy() -> Box<dyn LocalOverrideTrustPolicy> {
    Box::new(WindowsTrustPolicy)
}

/// Ownership and permission-bit checks on Unix.
#[cfg(unix)]
#[derive(Debug, Clone, Copy)]
pub struct UnixTrustPolicy {
    uid: u32,
}

#[cfg(unix)]
impl UnixTrustPolicy {
    /// Trust files owned by the effective user of this process.
    #[must_use]
    pub fn current_user() -> Self {
        Self {
            uid: effective_uid(),
        }
    }

    /// Trust files owned by `uid`.
    #[must_use]
    pub const fn for_uid(uid: u32) -> Self {
        Self { uid }
    }

    fn check(&self, meta: &std::fs::Metadata) -> Result<(), TrustViolation> {
        use std::os::unix::fs::MetadataExt as _;

        if !meta.file_type().is_file() {
            return Err(TrustViolation::NotRegularFile);
        }
        if meta.uid() != self.uid {
            return Err(TrustViolation::NotOwned {
                owner: meta.uid(),
                current: self.uid,
            });
        }
        let mode = meta.mode() & 0o777;
        if mode & 0o022 != 0 {
            return Err(TrustViolation::Writable { mode });
        }
        Ok(())
    }
}

#[cfg(unix)]
impl LocalOverrideTrustPolicy for UnixTrustPolicy {
    fn verify(&self, path: &Path) -> Result<(), TrustViolation> {
        self.check(&std::fs::symlink_metadata(path)?)
    }

    /// Opens with `O_NOFOLLOW` and re-checks the opened handle, so a file
    /// swapped in after [`verify`](Self::verify) is never read.
    fn read_trusted(&self, path: &Path) -> Result<Vec<u8>, TrustViolation> {
        use std::io::Read as _;
        use std::os::unix::fs::{MetadataExt as _, OpenOptionsExt as _};

        let before = std::fs::symlink_metadata(path)?;
        self.check(&before)?;

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOFOLLOW | libc::O_NONBLOCK)
            .open(path)
            .map_err(|e| {
                if e.raw_os_error() == Some(libc::ELOOP) {
                    TrustViolation::NotRegularFile
                } else {
                    TrustViolation::Inaccessible(e)
                }
            })?;
        let after = file.metadata()?;
        if after.dev() != before.dev() || after.ino() != before.ino() {
            return Err(TrustViolation::Replaced);
        }
        self.check(&after)?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn effective_uid() -> u32 {
    // SAFETY: geteuid takes no arguments, touches no memory we own and cannot fail.
    unsafe { libc::geteuid() }
}

/// Conservative policy for hosts without Unix ownership bits.
///
/// ACL inspection is not implemented, so after rejecting links and
/// non-regular files every file is refused as [`TrustViolation::Unverifiable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsTrustPolicy;

impl LocalOverrideTrustPolicy for WindowsTrustPolicy {
    fn verify(&self, path: &Path) -> Result<(), TrustViolation> {
        let meta = std::fs::symlink_metadata(path)?;
        if meta.file_type().is_symlink() || !meta.file_type().is_file() {
            return Err(TrustViolation::NotRegularFile);
        }
        #[cfg(windows)]
        {
            use std::os::windows::fs::MetadataExt as _;
            const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x400;
            if meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0 {
                return Err(TrustViolation::NotRegularFile);
            }
        }
        Err(TrustViolation::Unverifiable)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn windows_policy_never_trusts() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("enabled.local.json");
        std::fs::write(&file, "{}").unwrap();
        assert!(matches!(
            WindowsTrustPolicy.verify(&file),
            Err(TrustViolation::Unverifiable)
        ));
        assert!(WindowsTrustPolicy.read_trusted(&file).is_err());
    }

    #[test]
    fn windows_policy_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            WindowsTrustPolicy.verify(dir.path()),
            Err(TrustViolation::NotRegularFile)
        ));
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use std::os::unix::fs::{MetadataExt as _, PermissionsExt as _};
        use std::path::PathBuf;

        fn local_file(dir: &tempfile::TempDir, mode: u32) -> PathBuf {
            let file = dir.path().join("enabled.local.json");
            std::fs::write(&file, r#"{"features":[]}"#).unwrap();
            std::fs::set_permissions(&file, std::fs::Permissions::from_mode(mode)).unwrap();
            file
        }

        #[test]
        fn accepts_private_regular_file() {
            let dir = tempfile::tempdir().unwrap();
            let file = local_file(&dir, 0o644);
            let policy = UnixTrustPolicy::current_user();
            policy.verify(&file).unwrap();
            assert_eq!(policy.read_trusted(&file).unwrap(), br#"{"features":[]}"#);
        }

        #[test]
        fn rejects_world_writable() {
            let dir = tempfile::tempdir().unwrap();
            let file = local_file(&dir, 0o646);
            let err = UnixTrustPolicy::current_user().verify(&file).unwrap_err();
            assert!(matches!(err, TrustViolation::Writable { mode: 0o646 }));
            assert_eq!(
                err.to_string(),
                "file is group or world writable (permissions: 646)"
            );
        }

        #[test]
        fn rejects_group_writable() {
            let dir = tempfile::tempdir().unwrap();
            let file = local_file(&dir, 0o664);
            assert!(matches!(
                UnixTrustPolicy::current_user().read_trusted(&file),
                Err(TrustViolation::Writable { .. })
            ));
        }

        #[test]
        fn rejects_other_owner() {
            let dir = tempfile::tempdir().unwrap();
            let file = local_file(&dir, 0o600);
            let owner = std::fs::metadata(&file).unwrap().uid();
            let err = UnixTrustPolicy::for_uid(owner.wrapping_add(1))
                .verify(&file)
                .unwrap_err();
            assert!(matches!(err, TrustViolation::NotOwned { owner: o, .. } if o == owner));
        }

        #[test]
        fn rejects_symlink_even_to_trusted_file() {
            let dir = tempfile::tempdir().unwrap();
            let target = local_file(&dir, 0o600);
            let link = dir.path().join("link.json");
            std::os::unix::fs::symlink(&target, &link).unwrap();
            let policy = UnixTrustPolicy::current_user();
            assert!(matches!(
                policy.verify(&link),
                Err(TrustViolation::NotRegularFile)
            ));
            assert!(matches!(
                policy.read_trusted(&link),
                Err(TrustViolation::NotRegularFile)
            ));
        }

        #[test]
        fn missing_file_is_inaccessible() {
            let dir = tempfile::tempdir().unwrap();
            assert!(matches!(
                UnixTrustPolicy::current_user().verify(&dir.path().join("nope")),
                Err(TrustViolation::Inaccessible(_))
            ));
        }
    }
}
