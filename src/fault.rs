//! Programming-fault handling.
//!
//! A fault means an invariant the rest of the code relies on has already
//! been violated -- the caller contract on `find_or_create_6to4`, or the
//! belt-and-braces re-check in [`crate::substitute::SubstituteMapper`].
//! There is no recovery path; the process logs why and exits.

/// Logs `message` at error level and terminates the process.
///
/// Never returns -- this is the crash handler for conditions that are only
/// reachable through a bug elsewhere in the program.
pub fn fault(message: &str) -> ! {
    log::error!("programming fault: {message}");
    std::process::exit(70); // EX_SOFTWARE
}
