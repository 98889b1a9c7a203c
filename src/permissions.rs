//! Conversion between textual octal permissions and mode bits.

use std::fmt;
use std::path::Path;

use crate::error::{OpError, OpResult};

/// Owner/group/other read-write-execute bits, always within `0..=0o777`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionValue(u32);

impl PermissionValue {
    pub const MAX: u32 = 0o777;

    /// Build a value from raw mode bits; anything above `0o777` is rejected.
    pub fn new(bits: u32) -> Option<Self> {
        (bits <= Self::MAX).then_some(Self(bits))
    }

    /// Keep only the permission bits of a full `st_mode`.
    pub fn from_mode(mode: u32) -> Self {
        Self(mode & Self::MAX)
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PermissionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0o{:o}", self.0)
    }
}

/// Parse user input such as `755` or `0o644`.
pub fn decode(text: &str) -> OpResult<PermissionValue> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
        .unwrap_or(trimmed);

    let invalid = || OpError::InvalidPermissionFormat {
        value: text.to_string(),
    };

    // from_str_radix accepts a leading sign, octal permissions never carry one
    if digits.is_empty() || !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return Err(invalid());
    }

    let bits = u32::from_str_radix(digits, 8).map_err(|_| invalid())?;
    PermissionValue::new(bits).ok_or_else(invalid)
}

/// Canonical three digit form, e.g. `"755"` or `"044"`.
pub fn encode(value: PermissionValue) -> String {
    format!("{:03o}", value.bits())
}

/// Read the permission bits of `path`.
pub async fn read(path: &Path) -> OpResult<PermissionValue> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| OpError::io("get_permissions", path, e))?;
    Ok(from_metadata(&metadata))
}

/// Apply `value` to `path`.
pub async fn apply(path: &Path, value: PermissionValue) -> OpResult<()> {
    let permissions = to_permissions(path, value).await?;
    tokio::fs::set_permissions(path, permissions)
        .await
        .map_err(|e| OpError::io("set_permissions", path, e))
}

#[cfg(unix)]
fn from_metadata(metadata: &std::fs::Metadata) -> PermissionValue {
    use std::os::unix::fs::PermissionsExt;
    PermissionValue::from_mode(metadata.permissions().mode())
}

// Without mode bits only the read-only flag exists: report it as 0o444/0o666
// (0o555/0o777 for directories).
#[cfg(not(unix))]
fn from_metadata(metadata: &std::fs::Metadata) -> PermissionValue {
    let exec = if metadata.is_dir() { 0o111 } else { 0 };
    let bits = if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    };
    PermissionValue::from_mode(bits | exec)
}

#[cfg(unix)]
async fn to_permissions(_path: &Path, value: PermissionValue) -> OpResult<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::Permissions::from_mode(value.bits()))
}

// The owner write bit decides the read-only flag, everything else is dropped.
#[cfg(not(unix))]
async fn to_permissions(path: &Path, value: PermissionValue) -> OpResult<std::fs::Permissions> {
    let mut permissions = tokio::fs::metadata(path)
        .await
        .map_err(|e| OpError::io("set_permissions", path, e))?
        .permissions();
    permissions.set_readonly(value.bits() & 0o200 == 0);
    Ok(permissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn decodes_plain_and_prefixed_octal() {
        assert_eq!(decode("755").map(PermissionValue::bits).ok(), Some(0o755));
        assert_eq!(decode("0o644").map(PermissionValue::bits).ok(), Some(0o644));
        assert_eq!(decode(" 700\n").map(PermissionValue::bits).ok(), Some(0o700));
        assert_eq!(decode("0").map(PermissionValue::bits).ok(), Some(0));
    }

    #[test]
    fn rejects_malformed_input() {
        for text in ["", "abc", "789", "1000", "-7", "-0", "+7", "0o", "7 5 5", "7_5_5"] {
            let err = decode(text).err().map(|e| e.kind());
            assert_eq!(
                err,
                Some(ErrorKind::InvalidPermissionFormat),
                "input {text:?}"
            );
        }
    }

    #[test]
    fn every_octal_triplet_round_trips() {
        for bits in 0..=PermissionValue::MAX {
            let text = format!("{bits:03o}");
            let decoded = decode(&text).ok();
            assert_eq!(decoded.map(encode), Some(text.clone()));
            assert_eq!(decoded.and_then(|v| decode(&encode(v)).ok()), decoded);
        }
    }

    #[test]
    fn display_uses_octal_prefix() {
        assert_eq!(PermissionValue::from_mode(0o100644).to_string(), "0o644");
        assert!(PermissionValue::new(0o1000).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn apply_then_read_returns_same_bits() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("file");
        std::fs::write(&path, b"x")?;

        for text in ["600", "640", "755", "444"] {
            apply(&path, decode(text)?).await?;
            assert_eq!(encode(read(&path).await?), text);
        }
        Ok(())
    }
}
