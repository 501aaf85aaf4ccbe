pub type Result<T> = std::result::Result<T, Error>;

/// An error from the scanner engine
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The permission gate refused Bluetooth access
    #[error("Bluetooth permission is required")]
    PermissionDenied,

    /// This build or platform has no serial transport
    #[error("No serial transport is available on this build")]
    TransportUnavailable,

    /// A command or scan was issued without a connected device
    #[error("No device connected")]
    NoActiveConnection,

    /// `connect` was called while a connection already exists
    #[error("A device is already connected")]
    AlreadyConnected,

    /// Another connect, command, or disconnect is still in flight
    #[error("Another operation is already in progress")]
    OperationInProgress,

    /// One of the adapter configuration commands failed
    #[error("Failed to initialize OBD2 communication at command `{command}`")]
    InitializationFailed {
        command: String,
        #[source]
        source: Box<Error>,
    },

    /// The adapter did not finish answering a command within the deadline
    #[error("Command `{command}` timed out after {timeout_ms}ms")]
    CommandTimeout { command: String, timeout_ms: u64 },

    /// An error occurred in the underlying [TransportStrategy](crate::device::TransportStrategy)
    #[error("Device error: `{0:?}`")]
    Device(DeviceError),
}

#[derive(Debug)]
pub struct DeviceError(crate::device::Error);

impl DeviceError {
    /// The transport-level error that caused this failure
    pub fn inner(&self) -> &crate::device::Error {
        &self.0
    }
}

impl From<crate::device::Error> for Error {
    fn from(e: crate::device::Error) -> Self {
        Error::Device(DeviceError(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        crate::device::Error::from(e).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_failure_names_the_command() {
        let err = Error::InitializationFailed {
            command: "ATL0".to_owned(),
            source: Box::new(Error::CommandTimeout {
                command: "ATL0".to_owned(),
                timeout_ms: 5000,
            }),
        };
        assert_eq!(
            err.to_string(),
            "Failed to initialize OBD2 communication at command `ATL0`"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("Command `ATL0` timed out after 5000ms")
        );
    }

    #[test]
    fn io_errors_become_device_errors() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(
            err,
            Error::Device(ref d) if matches!(d.inner(), crate::device::Error::IO(_))
        ));
    }
}
