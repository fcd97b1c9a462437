//! Exit codes for the `liv` binary.
//! These codes are part of the public contract; scripts branch on them.

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_INVALID: i32 = 1; // Validation or integrity check failed
pub const EXIT_INTERNAL_ERROR: i32 = 2; // I/O, config or archive decoding error
