// lib.rs

mod codec;
mod session;

pub use codec::{
    CodecError, QuadAssembly, convert_registers, convert_registers_with, registers_to_f32,
    registers_to_u32,
};
pub use session::{Session, SessionBuilder, SessionError, SessionState};

/// Standard Modbus-over-TCP port.
pub const MODBUS_TCP_DEFAULT_PORT: u16 = 502;

/// Function code for reading holding registers.
pub const READ_HOLDING_REGISTERS: u8 = 0x03;

/// Unit id used until the caller selects one (Modbus TCP backend default).
pub const DEFAULT_UNIT_ID: u8 = 0xFF;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Unit did not respond")]
    NoResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),
}

/// Backend carrying framed Modbus request/response exchanges.
///
/// Implementations own the socket, the PDU framing and any timeout or retry
/// policy. The session layer never sees raw bytes, only register words.
pub trait Transport {
    fn connect(&mut self, endpoint: &str, port: u16) -> Result<(), TransportError>;

    /// One synchronous exchange: `count` consecutive registers starting at
    /// `start_addr`, returned in address order.
    fn request(
        &mut self,
        unit_id: u8,
        function: u8,
        start_addr: u16,
        count: u16,
    ) -> Result<Vec<u16>, TransportError>;

    fn close(&mut self);
}
