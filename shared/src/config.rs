use std::time::Duration;

/// Runtime tunables for a synchronized session. Both sides of a connection
/// must agree on every field that shapes the wire format (send rates, caps,
/// buffer lengths); the defaults are the engine's reference values.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Server ticks per outgoing state packet.
    pub server_send_rate: u32,
    /// Client ticks per outgoing command packet.
    pub client_send_rate: u32,
    /// Most recent commands carried per command update.
    pub command_send_count: usize,
    /// Outgoing command queue capacity per controlled entity.
    pub command_buffer_count: usize,
    /// Capacity of the tick-indexed dejitter rings.
    pub dejitter_buffer_length: usize,
    /// Freshness window for client view entries, in ticks.
    pub view_ticks: u32,
    /// 32-bit chunks in the received-sequence history window.
    pub history_chunks: usize,
    /// Initial byte capacity of packet scratch buffers.
    pub data_buffer_size: usize,
    /// Hard byte cap for one datagram payload.
    pub packcap_message_total: usize,
    /// Byte budget reserved early in every packet for reliable events.
    pub packcap_early_events: usize,
    /// Byte budget for the C2S command section.
    pub packcap_commands: usize,
    /// Per-entity byte cap within the S2C delta section.
    pub maxsize_entity: usize,
    /// Per-event byte cap within the event section.
    pub maxsize_event: usize,
    /// Per-command-update byte cap within the C2S command section.
    pub maxsize_commandupdate: usize,
    /// Seconds of one simulation tick; used only to turn transport RTT
    /// into a tick offset for remote-clock estimation.
    pub tick_duration: f32,
    /// How long a silent connection is kept before it is dropped.
    pub disconnect_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_send_rate: 2,
            client_send_rate: 2,
            command_send_count: 40,
            command_buffer_count: 40,
            dejitter_buffer_length: 50,
            view_ticks: 100,
            history_chunks: 6,
            data_buffer_size: 2048,
            packcap_message_total: 1200,
            packcap_early_events: 370,
            packcap_commands: 670,
            maxsize_entity: 100,
            maxsize_event: 100,
            maxsize_commandupdate: 335,
            tick_duration: 1.0 / 60.0,
            disconnect_timeout: Duration::from_secs(10),
        }
    }
}
