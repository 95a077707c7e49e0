//! Per-flow application-layer state.
//!
//! A [`Flow`] records, for each direction, the detected protocol and where
//! detection stands in its lifecycle. The lifecycle is an explicit
//! [`DetectState`] machine; flow-wide conditions such as "inspection is
//! off" are derived from it rather than stored as separate bits.

use crate::conntrack::StreamFlags;
use crate::protocols::{AppProto, Transport};

/// Opaque flow identifier, used where a back-reference would otherwise be
/// a pointer into the flow table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowId(pub u64);

/// Direction of travel relative to the connection originator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToServer,
    ToClient,
}

impl Direction {
    #[inline]
    pub fn flip(self) -> Direction {
        match self {
            Direction::ToServer => Direction::ToClient,
            Direction::ToClient => Direction::ToServer,
        }
    }

    /// The direction as a stream flag mask.
    #[inline]
    pub fn flag(self) -> StreamFlags {
        match self {
            Direction::ToServer => StreamFlags::ToServer,
            Direction::ToClient => StreamFlags::ToClient,
        }
    }
}

/// Lifecycle of protocol detection for one direction of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectState {
    /// No payload inspected yet.
    #[default]
    Initial,
    /// Stream-start data seen, probing under way.
    InProgress,
    /// A verdict was rolled back; probing restarts on a later chunk.
    NeedsRetry,
    /// Every probe spent without a verdict.
    Exhausted,
    /// Settled; payload in this direction is parser-bound.
    Parsing,
    /// App-layer inspection switched off.
    Disabled,
}

impl DetectState {
    /// No further detection will run for this direction.
    #[inline]
    pub fn settled(self) -> bool {
        matches!(
            self,
            DetectState::Exhausted | DetectState::Parsing | DetectState::Disabled
        )
    }
}

#[derive(Debug, Default, Clone)]
struct DirAppState {
    alproto: AppProto,
    detect: DetectState,
    /// Pattern matcher has exhausted its chance.
    pm_done: bool,
    /// Probing parser has exhausted its chance.
    pp_done: bool,
    /// Leading bytes of the next chunk already consumed by detection but
    /// not yet by parsing.
    scanned: u32,
}

/// The engine's bidirectional conversation record, reduced to the fields
/// the application layer reads and writes.
#[derive(Debug)]
pub struct Flow {
    pub transport: Transport,
    /// Canonical protocol for the flow once agreed.
    pub alproto: AppProto,
    ts: DirAppState,
    tc: DirAppState,
}

impl Flow {
    pub fn new(transport: Transport) -> Self {
        Flow {
            transport,
            alproto: AppProto::UNKNOWN,
            ts: DirAppState::default(),
            tc: DirAppState::default(),
        }
    }

    #[inline]
    fn dir(&self, dir: Direction) -> &DirAppState {
        match dir {
            Direction::ToServer => &self.ts,
            Direction::ToClient => &self.tc,
        }
    }

    #[inline]
    fn dir_mut(&mut self, dir: Direction) -> &mut DirAppState {
        match dir {
            Direction::ToServer => &mut self.ts,
            Direction::ToClient => &mut self.tc,
        }
    }

    /// Detected protocol for one direction.
    pub fn alproto_dir(&self, dir: Direction) -> AppProto {
        self.dir(dir).alproto
    }

    pub(crate) fn set_alproto_dir(&mut self, dir: Direction, proto: AppProto) {
        self.dir_mut(dir).alproto = proto;
    }

    pub fn detect_state(&self, dir: Direction) -> DetectState {
        self.dir(dir).detect
    }

    pub(crate) fn set_detect_state(&mut self, dir: Direction, state: DetectState) {
        self.dir_mut(dir).detect = state;
    }

    /// Bytes of the next chunk already covered by a previous detection pass.
    pub fn data_scanned(&self, dir: Direction) -> u32 {
        self.dir(dir).scanned
    }

    pub(crate) fn set_data_scanned(&mut self, dir: Direction, scanned: u32) {
        self.dir_mut(dir).scanned = scanned;
    }

    /// Switch app-layer inspection off for the whole flow. Irreversible.
    pub fn set_no_applayer_inspection(&mut self) {
        self.ts.detect = DetectState::Disabled;
        self.tc.detect = DetectState::Disabled;
    }

    /// Once this returns `true`, no dispatch call runs detection or parsing
    /// for the flow again.
    pub fn inspection_disabled(&self) -> bool {
        self.ts.detect == DetectState::Disabled && self.tc.detect == DetectState::Disabled
    }

    /// The one-shot detection attempt has run, hit or miss. Meaningful for
    /// datagram flows.
    pub fn detect_done(&self) -> bool {
        self.ts.detect.settled() && self.tc.detect.settled()
    }

    pub fn is_pm_done(&self, flags: StreamFlags) -> bool {
        self.dir(flags.direction()).pm_done
    }

    pub fn is_pp_done(&self, flags: StreamFlags) -> bool {
        self.dir(flags.direction()).pp_done
    }

    /// Detector-facing: the pattern matcher is out of chances for this
    /// direction.
    pub fn set_pm_done(&mut self, flags: StreamFlags) {
        self.dir_mut(flags.direction()).pm_done = true;
    }

    /// Detector-facing: the probing parser is out of chances for this
    /// direction.
    pub fn set_pp_done(&mut self, flags: StreamFlags) {
        self.dir_mut(flags.direction()).pp_done = true;
    }

    pub fn reset_pm_done(&mut self, flags: StreamFlags) {
        self.dir_mut(flags.direction()).pm_done = false;
    }

    pub fn reset_pp_done(&mut self, flags: StreamFlags) {
        self.dir_mut(flags.direction()).pp_done = false;
    }
}
