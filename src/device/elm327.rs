use log::{debug, error, info, trace};
use std::{future::Future, time::Duration};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{Device, Error, Result, TransportStrategy};

/// Character the ELM327 prints when it is ready for the next command
pub const PROMPT: u8 = b'>';

/// Adapter configuration run once on every new connection, in order
///
/// Reset, echo off, linefeeds off, spaces off, headers on, automatic protocol selection.
pub const INIT_SEQUENCE: [&str; 6] = ["ATZ", "ATE0", "ATL0", "ATS0", "ATH1", "ATSP0"];

/// Bytes written to the adapter for `command`
///
/// The ELM327 executes a command when it sees a carriage return; nothing else is escaped.
pub fn frame_command(command: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(command.len() + 1);
    data.extend_from_slice(command.as_bytes());
    data.push(b'\r');
    data
}

/// Read data until the ELM327's prompt character is printed
///
/// Carriage returns become line breaks, while line feeds and NUL bytes are dropped. The prompt
/// itself is not part of the returned text. Running out of input before the prompt arrives is a
/// communication error.
pub async fn read_until_prompt<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut response = Vec::new();
    let mut buf = [0u8; 16];
    loop {
        let len = reader.read(&mut buf).await?;
        if len == 0 {
            return Err(Error::Communication(format!(
                "read_until_prompt: input ended before prompt (got {:?})",
                String::from_utf8_lossy(&response)
            )));
        }
        trace!(
            "read_until_prompt: values {:?}",
            std::str::from_utf8(&buf[0..len])
        );
        for b in &buf[0..len] {
            match *b {
                PROMPT => {
                    let text = String::from_utf8_lossy(&response);
                    return Ok(text.trim().to_owned());
                }
                b'\r' => response.push(b'\n'),
                b'\n' | b'\0' => {}
                b => response.push(b),
            }
        }
    }
}

/// How long to wait for the rest of an abandoned reply before sending the next command
pub const RESYNC_WINDOW: Duration = Duration::from_millis(500);

/// A byte stream to an ELM327, kept in step with the adapter's prompt
///
/// When an exchange is abandoned part way (its future dropped on a deadline) the adapter keeps
/// answering, and the tail of that answer would be read as the reply to the next command. The
/// next exchange therefore first discards everything up to the stale prompt.
pub struct Elm327Stream<S> {
    stream: S,
    interrupted: bool,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Elm327Stream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            interrupted: false,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Whether the last exchange did not read its reply to the end
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Discard the rest of an abandoned reply
    ///
    /// Gives up after [RESYNC_WINDOW] when no prompt arrives.
    pub async fn resync(&mut self) -> Result<()> {
        if !self.interrupted {
            return Ok(());
        }
        match tokio::time::timeout(RESYNC_WINDOW, read_until_prompt(&mut self.stream)).await {
            Ok(Ok(stale)) => debug!("resync: discarded stale reply {:?}", stale),
            Ok(Err(e)) => return Err(e),
            Err(_) => debug!("resync: no stale prompt within {:?}", RESYNC_WINDOW),
        }
        self.interrupted = false;
        Ok(())
    }

    /// Write one framed command and read its reply up to the prompt
    pub async fn exchange(&mut self, command: &str) -> Result<String> {
        self.resync().await?;

        self.interrupted = true;
        trace!("exchange: sending {:?}", command);
        self.stream.write_all(&frame_command(command)).await?;
        self.stream.flush().await?;
        let response = read_until_prompt(&mut self.stream).await?;
        self.interrupted = false;

        debug!("Sent command {:?} and got response {:?}", command, response);
        Ok(response)
    }
}

/// Run `exchange`, failing with [CommandTimeout](crate::Error::CommandTimeout) once `timeout`
/// elapses
pub(crate) async fn with_deadline<F>(
    command: &str,
    timeout: Duration,
    exchange: F,
) -> crate::Result<String>
where
    F: Future<Output = crate::Result<String>>,
{
    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(crate::Error::CommandTimeout {
            command: command.to_owned(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Configure a freshly opened adapter
///
/// Stops at the first command that fails; there is no retry, the caller reconnects instead.
pub(crate) async fn initialize(
    transport: &dyn TransportStrategy,
    device: &Device,
    timeout: Duration,
) -> crate::Result<()> {
    info!("Initializing ELM327 on {}", device.address);

    for command in INIT_SEQUENCE {
        let result = with_deadline(command, timeout, transport.send(device, command))
            .await
            .and_then(|response| check_accepted(command, response));

        match result {
            Ok(response) => debug!("initialize: {} got response {:?}", command, response),
            Err(e) => {
                error!("OBD2 initialization error for command {}: {}", command, e);
                return Err(crate::Error::InitializationFailed {
                    command: command.to_owned(),
                    source: Box::new(e),
                });
            }
        }
    }

    info!("ELM327 on {} initialized", device.address);
    Ok(())
}

/// The ELM327 answers `?` to commands it does not understand
fn check_accepted(command: &str, response: String) -> crate::Result<String> {
    if response.trim() == "?" {
        Err(Error::Communication(format!("adapter rejected command {:?}", command)).into())
    } else {
        Ok(response)
    }
}
