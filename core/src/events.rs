//! Packet-attached application-layer anomaly events.

use strum_macros::{AsRefStr, EnumString};

/// Anomaly conditions observed by the dispatcher. Diagnostic only; they are
/// attached to the triggering packet, not the flow, and never change a
/// dispatch outcome by themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AppLayerEvent {
    /// The two directions of a flow detected different protocols.
    MismatchProtocolBothDirections,
    /// First payload arrived in a direction the parser does not accept.
    WrongDirectionFirstData,
    /// Only one direction ever produced a detection verdict.
    DetectProtocolOnlyOneDirection,
}

/// Append-only event list carried by a packet.
#[derive(Debug, Default)]
pub struct AppLayerEvents {
    events: Vec<AppLayerEvent>,
}

impl AppLayerEvents {
    pub fn set_raw(&mut self, event: AppLayerEvent) {
        self.events.push(event);
    }

    pub fn contains(&self, event: AppLayerEvent) -> bool {
        self.events.contains(&event)
    }

    pub fn as_slice(&self) -> &[AppLayerEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn list_is_append_only() {
        let mut events = AppLayerEvents::default();
        assert!(events.is_empty());

        events.set_raw(AppLayerEvent::WrongDirectionFirstData);
        events.set_raw(AppLayerEvent::WrongDirectionFirstData);
        assert_eq!(events.len(), 2);
        assert!(events.contains(AppLayerEvent::WrongDirectionFirstData));
        assert!(!events.contains(AppLayerEvent::MismatchProtocolBothDirections));
    }

    #[test]
    fn event_names_round_trip() {
        for event in [
            AppLayerEvent::MismatchProtocolBothDirections,
            AppLayerEvent::WrongDirectionFirstData,
            AppLayerEvent::DetectProtocolOnlyOneDirection,
        ] {
            assert_eq!(AppLayerEvent::from_str(event.as_ref()).unwrap(), event);
        }
        assert_eq!(
            AppLayerEvent::WrongDirectionFirstData.as_ref(),
            "wrong_direction_first_data"
        );
    }
}
