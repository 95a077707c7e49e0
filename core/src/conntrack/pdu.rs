//! Minimal packet view for the dispatch layer.

use crate::events::AppLayerEvents;
use crate::flow::Direction;

/// The slice of decoded-packet state the application layer consumes:
/// payload, flow direction, and the anomaly events attached to this packet.
#[derive(Debug)]
pub struct Packet {
    pub payload: Vec<u8>,
    /// Direction of this packet relative to the flow.
    pub direction: Direction,
    /// Anomaly events recorded against this packet.
    pub events: AppLayerEvents,
}

impl Packet {
    pub fn new(direction: Direction, payload: impl Into<Vec<u8>>) -> Self {
        Packet {
            payload: payload.into(),
            direction,
            events: AppLayerEvents::default(),
        }
    }
}
