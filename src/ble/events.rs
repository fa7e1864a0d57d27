//! Radio-stack event variants
//!
//! The stack reports every asynchronous occurrence as one [`StackEvent`].
//! Dispatch over the closed enum is exhaustively checked; stack event codes
//! without a variant here map to [`StackEvent::Unknown`] so newer stack
//! revisions cannot break the dispatcher.

/// Stack-assigned identifier for an active link to one central.
///
/// Unique for the lifetime of the connection; may be reused after a
/// disconnect.
pub type ConnectionHandle = u16;

/// Handle addressing one attribute in the registered GATT table.
pub type AttributeHandle = u16;

/// An asynchronous event reported by the radio stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEvent {
    /// A central connected.
    CentralConnect { conn: ConnectionHandle },

    /// A central disconnected. Duplicate reports for the same handle are
    /// tolerated.
    CentralDisconnect { conn: ConnectionHandle },

    /// A central wrote to `attr`. The written value stays in the stack's
    /// attribute store until read back.
    GattsWrite {
        conn: ConnectionHandle,
        attr: AttributeHandle,
    },

    /// An event kind this firmware does not recognise; always ignored.
    Unknown { id: u8 },
}
