/// Whether the platform lets this process use Bluetooth
///
/// Consulted before production discovery and connection. Closures returning `bool` are gates too,
/// so callers can plug in their own permission check.
pub trait PermissionGate: Send + Sync {
    fn has_bluetooth_capability(&self) -> bool;
}

/// A gate that always allows Bluetooth access
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn has_bluetooth_capability(&self) -> bool {
        true
    }
}

impl<F> PermissionGate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn has_bluetooth_capability(&self) -> bool {
        self()
    }
}
