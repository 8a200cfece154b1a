//! Helpers for recording command output

/// Maximum number of output bytes kept in a command failure record
pub const MAX_FAILURE_OUTPUT: usize = 1024;

/// Keep only the last `max_bytes` of `output`, never splitting a UTF-8 character.
pub fn truncate_tail(output: &str, max_bytes: usize) -> &str {
    if output.len() <= max_bytes {
        return output;
    }

    let mut start = output.len() - max_bytes;
    while !output.is_char_boundary(start) {
        start += 1;
    }
    &output[start..]
}
