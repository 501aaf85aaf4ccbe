//! The single adapter connection and its state machine
//!
//! ```text
//! Disconnected --connect--> Connecting --ok--> Connected --disconnect--> Disconnecting
//!      ^                        |                                             |
//!      +-------- failure -------+---------------------------------------------+
//! ```
//!
//! Only one operation may run against the connection at a time. Instead of queueing, an
//! overlapping call fails with [OperationInProgress](crate::Error::OperationInProgress).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::commands::{DtcCode, DtcTable, VehicleIdentity, VehicleProfile};
use crate::device::{initialize, with_deadline, Device, TransportStrategy};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    /// Opening the link and configuring the adapter
    Connecting,
    Connected,
    Disconnecting,
}

/// The open link: the device and the transport it was opened with
#[derive(Clone)]
struct Link {
    device: Device,
    transport: Arc<dyn TransportStrategy>,
}

struct Slot {
    state: ConnectionState,
    busy: bool,
    link: Option<Link>,
}

/// Owner of the one active adapter connection
pub struct ConnectionManager {
    slot: Arc<Mutex<Slot>>,
    command_timeout: Duration,
}

/// Marks the connection busy for as long as it lives
///
/// With `rollback` set, dropping it also returns the connection to `Disconnected`. That covers
/// failed connects, finished disconnects and futures that were dropped half way through. A link
/// left in `opened` when the guard drops is closed on a background task, and the connection
/// stays busy until that close has finished.
struct BusyGuard<'a> {
    manager: &'a ConnectionManager,
    rollback: bool,
    opened: Option<Link>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.manager.slot();
        if self.rollback {
            slot.state = ConnectionState::Disconnected;
            slot.link = None;
        }
        slot.busy = match self.opened.take() {
            Some(link) => close_abandoned(self.manager.slot.clone(), link),
            None => false,
        };
    }
}

/// Close a link whose connect was dropped, returning whether the slot stays busy meanwhile
fn close_abandoned(slot: Arc<Mutex<Slot>>, link: Link) -> bool {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = link.transport.close(&link.device).await {
                    warn!("close_abandoned: closing {} failed: {}", link.device.address, e);
                }
                slot.lock().unwrap_or_else(PoisonError::into_inner).busy = false;
            });
            true
        }
        Err(_) => {
            warn!(
                "close_abandoned: no runtime to close {}, it stays open until the next connect",
                link.device.address
            );
            false
        }
    }
}

impl ConnectionManager {
    pub fn new(command_timeout: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                state: ConnectionState::Disconnected,
                busy: false,
                link: None,
            })),
            command_timeout,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ConnectionState {
        self.slot().state
    }

    /// Whether a connect, command, scan or disconnect is in flight
    pub fn is_busy(&self) -> bool {
        self.slot().busy
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// The connected device, marked as connected
    pub fn connected_device(&self) -> Option<Device> {
        let slot = self.slot();
        match (&slot.state, &slot.link) {
            (ConnectionState::Connected, Some(link)) => Some(link.device.with_connected(true)),
            _ => None,
        }
    }

    /// Fail the way [connect](Self::connect) would if the connection is busy or not
    /// disconnected
    pub fn check_available(&self) -> Result<()> {
        let slot = self.slot();
        if slot.busy {
            Err(Error::OperationInProgress)
        } else if slot.state != ConnectionState::Disconnected {
            Err(Error::AlreadyConnected)
        } else {
            Ok(())
        }
    }

    /// Open `device` through `transport` and configure the adapter
    ///
    /// Success is only reported once initialization has finished; if it fails the link is
    /// closed again and the initialization error is returned. Dropping the future part way
    /// leaves the manager `Disconnected` and closes an already opened link in the background.
    pub async fn connect(
        &self,
        device: &Device,
        transport: Arc<dyn TransportStrategy>,
    ) -> Result<Device> {
        {
            let mut slot = self.slot();
            if slot.busy {
                return Err(Error::OperationInProgress);
            }
            if slot.state != ConnectionState::Disconnected {
                return Err(Error::AlreadyConnected);
            }
            slot.state = ConnectionState::Connecting;
            slot.busy = true;
        }
        let mut guard = BusyGuard {
            manager: self,
            rollback: true,
            opened: None,
        };

        info!("Connecting to {} ({})", device.display_name, device.address);
        transport.open(device).await?;
        guard.opened = Some(Link {
            device: device.clone(),
            transport: transport.clone(),
        });

        if transport.needs_initialization() {
            if let Err(e) = initialize(transport.as_ref(), device, self.command_timeout).await {
                if let Err(close_err) = transport.close(device).await {
                    warn!("connect: closing {} failed: {}", device.address, close_err);
                }
                guard.opened = None;
                return Err(e);
            }
        }

        {
            let mut slot = self.slot();
            slot.state = ConnectionState::Connected;
            slot.link = Some(Link {
                device: device.clone(),
                transport,
            });
        }
        guard.rollback = false;
        guard.opened = None;

        info!("Connected to {}", device.display_name);
        Ok(device.with_connected(true))
    }

    /// Close the connection; a no-op when already disconnected
    ///
    /// The manager ends up disconnected even if the transport fails to close, in which case
    /// the transport's error is returned.
    pub async fn disconnect(&self) -> Result<()> {
        let link = {
            let mut slot = self.slot();
            if slot.busy {
                return Err(Error::OperationInProgress);
            }
            match slot.link.take() {
                Some(link) => {
                    slot.state = ConnectionState::Disconnecting;
                    slot.busy = true;
                    link
                }
                None => {
                    slot.state = ConnectionState::Disconnected;
                    return Ok(());
                }
            }
        };
        let _guard = BusyGuard {
            manager: self,
            rollback: true,
            opened: None,
        };

        info!("Disconnecting from {}", link.device.display_name);
        link.transport.close(&link.device).await
    }

    /// Claim the connection for one operation
    fn begin(&self) -> Result<(Link, BusyGuard<'_>)> {
        let mut slot = self.slot();
        if slot.busy {
            return Err(Error::OperationInProgress);
        }
        let link = match (&slot.state, &slot.link) {
            (ConnectionState::Connected, Some(link)) => link.clone(),
            _ => return Err(Error::NoActiveConnection),
        };
        slot.busy = true;
        Ok((
            link,
            BusyGuard {
                manager: self,
                rollback: false,
                opened: None,
            },
        ))
    }

    /// Send one command and return the adapter's raw response
    pub async fn send(&self, command: &str) -> Result<String> {
        let (link, _guard) = self.begin()?;
        with_deadline(
            command,
            self.command_timeout,
            link.transport.send(&link.device, command),
        )
        .await
    }

    pub(crate) async fn read_stored_codes(&self, table: &DtcTable) -> Result<Vec<DtcCode>> {
        let (link, _guard) = self.begin()?;
        link.transport
            .read_stored_codes(&link.device, table, self.command_timeout)
            .await
    }

    pub(crate) async fn identify_vehicle(&self) -> Result<Option<VehicleProfile>> {
        let (link, _guard) = self.begin()?;
        link.transport
            .identify_vehicle(&link.device, self.command_timeout)
            .await
    }

    pub(crate) async fn read_vin(&self) -> Result<Option<VehicleIdentity>> {
        let (link, _guard) = self.begin()?;
        link.transport
            .read_vin(&link.device, self.command_timeout)
            .await
    }
}
