use log::{debug, trace, warn};
use thiserror::Error;

use crate::{
    DEFAULT_UNIT_ID, MODBUS_TCP_DEFAULT_PORT, READ_HOLDING_REGISTERS, Transport, TransportError,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot allocate session: endpoint is empty")]
    AllocationFailed,

    #[error("Invalid port: {0} < 1 or {0} > 65535")]
    InvalidPort(i32),

    #[error("Invalid unit id: {0} < 0 or {0} > 255")]
    InvalidUnit(i32),

    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] TransportError),

    #[error("Read failed: {0}")]
    ReadFailed(#[source] TransportError),

    #[error("Invalid start address: {0} < 0 or {0} > 65535")]
    InvalidAddress(i32),

    #[error("Invalid register count: {0} < 1 or {0} > 65535")]
    InvalidCount(i32),

    #[error("Invalid range: {0} + {1} = {2} > 65536")]
    RangeOverflow(i32, i32, i32),

    #[error("Operation {operation} not allowed in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Connected,
    Closed,
}

pub struct SessionBuilder {
    endpoint: Option<String>,
    port: Option<i32>,
    unit: Option<i32>,
}

impl SessionBuilder {
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn port(mut self, port: i32) -> Self {
        self.port = Some(port);
        self
    }

    pub fn unit(mut self, unit: i32) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Validates the inputs and binds the transport. No network I/O happens
    /// here; the returned session is in [`SessionState::Created`].
    pub fn build<T: Transport>(self, transport: T) -> Result<Session<T>, SessionError> {
        let endpoint = match self.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint,
            _ => return Err(SessionError::AllocationFailed),
        };
        let port = match self.port {
            Some(port) => {
                if port < 1 || port > 65535 {
                    return Err(SessionError::InvalidPort(port));
                }
                port as u16
            }
            None => MODBUS_TCP_DEFAULT_PORT,
        };
        let unit_id = match self.unit {
            Some(unit) => validate_unit(unit)?,
            None => DEFAULT_UNIT_ID,
        };
        Ok(Session {
            transport,
            endpoint,
            port,
            unit_id,
            state: SessionState::Created,
        })
    }
}

fn validate_unit(unit: i32) -> Result<u8, SessionError> {
    if unit < 0 || unit > 255 {
        return Err(SessionError::InvalidUnit(unit));
    }
    Ok(unit as u8)
}

/// One logical connection to one remote unit.
///
/// Register reads are valid only while connected; every operation checks the
/// current state and fails with [`SessionError::InvalidState`] before
/// touching the transport. A transition either completes or the state stays
/// exactly where it was. Calls take `&mut self`, so concurrent use of one
/// session does not compile; independent sessions are fully independent.
pub struct Session<T: Transport> {
    transport: T,
    endpoint: String,
    port: u16,
    unit_id: u8,
    state: SessionState,
}

impl<T: Transport> Session<T> {
    pub fn builder() -> SessionBuilder {
        SessionBuilder {
            endpoint: None,
            port: None,
            unit: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Selects the unit addressed by subsequent reads. Does not change state.
    pub fn set_unit(&mut self, unit: i32) -> Result<(), SessionError> {
        self.unit_id = validate_unit(unit)?;
        Ok(())
    }

    /// Performs the transport handshake. On failure the session stays in
    /// [`SessionState::Created`] and connecting may be attempted again.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Created {
            return Err(SessionError::InvalidState {
                operation: "connect",
                state: self.state,
            });
        }
        match self.transport.connect(&self.endpoint, self.port) {
            Ok(()) => {
                debug!("connected to {}:{}", self.endpoint, self.port);
                self.state = SessionState::Connected;
                Ok(())
            }
            Err(cause) => {
                warn!("connect to {}:{} failed: {}", self.endpoint, self.port, cause);
                Err(SessionError::ConnectionFailed(cause))
            }
        }
    }

    /// Reads `count` consecutive holding registers starting at `start_addr`,
    /// returned in address order. One transport request, no retry.
    pub fn read_registers(&mut self, start_addr: i32, count: i32) -> Result<Vec<u16>, SessionError> {
        if self.state != SessionState::Connected {
            return Err(SessionError::InvalidState {
                operation: "read_registers",
                state: self.state,
            });
        }
        if start_addr < 0 || start_addr > 65535 {
            return Err(SessionError::InvalidAddress(start_addr));
        }
        if count < 1 || count > 65535 {
            return Err(SessionError::InvalidCount(count));
        }
        let end_addr = start_addr + count;
        if end_addr > 65536 {
            return Err(SessionError::RangeOverflow(start_addr, count, end_addr));
        }

        trace!(
            "reading {} registers at {} from unit {}",
            count, start_addr, self.unit_id
        );
        let words = self
            .transport
            .request(
                self.unit_id,
                READ_HOLDING_REGISTERS,
                start_addr as u16,
                count as u16,
            )
            .map_err(|cause| {
                warn!("read at {} from unit {} failed: {}", start_addr, self.unit_id, cause);
                SessionError::ReadFailed(cause)
            })?;
        if words.len() != count as usize {
            return Err(SessionError::ReadFailed(TransportError::MalformedResponse(
                format!("expected {} registers, got {}", count, words.len()),
            )));
        }
        Ok(words)
    }

    /// Releases the transport connection. Closing an already-closed session
    /// is a caller error.
    pub fn close(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Created | SessionState::Connected => {
                self.transport.close();
                debug!("closed session to {}:{}", self.endpoint, self.port);
                self.state = SessionState::Closed;
                Ok(())
            }
            SessionState::Closed => Err(SessionError::InvalidState {
                operation: "close",
                state: self.state,
            }),
        }
    }

    /// Consumes the session, closing the connection first if still open.
    /// Using or freeing a session twice does not compile.
    pub fn free(mut self) {
        if self.state != SessionState::Closed {
            let _ = self.close();
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            self.transport.close();
            self.state = SessionState::Closed;
        }
    }
}
