use crate::TransferError;

/// Longest display name the file manager accepts, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Validates a display name chosen for a file inside a drive.
///
/// Rejects:
/// - Empty or whitespace-only names
/// - `.` and `..`
/// - Path separators (`/` or `\`)
/// - Control characters
/// - Names longer than [`MAX_NAME_LEN`] bytes
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    if name.trim().is_empty() {
        return Err(TransferError::InvalidName("empty name".into()));
    }

    if name == "." || name == ".." {
        return Err(TransferError::InvalidName(format!("reserved name: {name}")));
    }

    if name.contains(['/', '\\']) {
        return Err(TransferError::InvalidName(format!(
            "path separators not allowed: {name}"
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(TransferError::InvalidName(
            "control characters not allowed".into(),
        ));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(TransferError::InvalidName(format!(
            "name longer than {MAX_NAME_LEN} bytes"
        )));
    }

    Ok(())
}
