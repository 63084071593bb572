//! Configuration for query splitting.
//!
//! [`SplitConfig`] carries the few knobs that change what a session stores.
//! The defaults reproduce a plain query dump of `MySQL` traffic on its
//! standard port.

use crate::frame::QUERY_OPCODE;

/// Options applied to every session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitConfig {
    /// Store server responses next to the queries they answer.
    pub save_responses: bool,
    /// Port identifying the server side of a connection.
    pub server_port: u16,
    /// Opcode of the packets stored as requests.
    pub query_opcode: u8,
}

impl SplitConfig {
    /// Standard `MySQL` server port.
    pub const DEFAULT_SERVER_PORT: u16 = 3306;

    /// Enable or disable response capture.
    #[must_use]
    pub const fn with_responses(mut self, save_responses: bool) -> Self {
        self.save_responses = save_responses;
        self
    }

    /// Override the server port used for role assignment.
    #[must_use]
    pub const fn with_server_port(mut self, server_port: u16) -> Self {
        self.server_port = server_port;
        self
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            save_responses: false,
            server_port: Self::DEFAULT_SERVER_PORT,
            query_opcode: QUERY_OPCODE,
        }
    }
}
