pub mod client;
pub mod serialization;
pub mod stats;

pub use client::{
    DEFAULT_TRAPPER_PORT, POLL_INTERVAL, RESPONSE_BUFFER_SIZE, SenderConfig, SenderError,
    ZabbixSender,
};
pub use serialization::{
    SENDER_DATA_REQUEST, SenderRequest, SenderResponse, SerializationError, decode_response,
    encode_request,
};
pub use stats::{AtomicSenderStats, SenderStats};
