//! Functional programming utilities.

/// Run `action` when `predicate` holds, short-circuiting with its error.
pub fn when<T, F>(predicate: bool, action: F) -> Result<(), T>
where
    F: FnOnce() -> Result<(), T>,
{
    if predicate {
        action()
    } else {
        Ok(())
    }
}
