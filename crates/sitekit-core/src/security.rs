//! Security manager handle.

use std::fmt;

/// Handle to the platform's security subsystem.
///
/// The pipeline never calls into it; it only hands the reference to services
/// that ask for one.
pub trait SecurityManager: Send + Sync + fmt::Debug {
    /// Name of the security realm this manager guards.
    fn realm(&self) -> &str;
}
