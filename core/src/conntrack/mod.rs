//! TCP session state consumed by the application-layer dispatcher.
//!
//! The reassembly engine itself lives behind [`reassembly::Reassembler`];
//! this module holds the session-resident state the dispatcher reads and
//! writes: per-stream detection bits, the first-data direction, and the
//! queues of raw reassembled messages kept for later inspection stages.

pub mod pdu;
pub mod reassembly;
pub mod smsg;

use bitmask_enum::bitmask;

use self::smsg::StreamMsgQueue;
use crate::flow::Direction;

/// Direction and framing flags attached to each reassembled chunk.
#[bitmask(u8)]
#[bitmask_config(vec_debug)]
pub enum StreamFlags {
    /// Payload flows from originator to responder.
    ToServer,
    /// Payload flows from responder to originator.
    ToClient,
    /// First payload bytes for this direction.
    Start,
    /// Unrecoverable reassembly hole.
    Gap,
}

impl StreamFlags {
    /// The single direction named by these flags.
    #[inline]
    pub fn direction(self) -> Direction {
        debug_assert!(
            self.contains(StreamFlags::ToServer) != self.contains(StreamFlags::ToClient),
            "flags must carry exactly one direction bit"
        );
        if self.contains(StreamFlags::ToServer) {
            Direction::ToServer
        } else {
            Direction::ToClient
        }
    }
}

/// Which direction produced payload first, and whether the question is
/// settled.
///
/// Monotonic: `None` to `First(..)` to `Settled`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFirstSeen {
    /// No payload observed yet.
    #[default]
    None,
    /// Payload observed in exactly one direction so far.
    First(Direction),
    /// Some payload has been handed to the parser; the question is settled.
    Settled,
}

impl DataFirstSeen {
    /// Legacy mask form. `Settled` reads as both direction bits, so any
    /// direction test against it passes.
    #[inline]
    pub fn as_flags(self) -> StreamFlags {
        match self {
            DataFirstSeen::None => StreamFlags::none(),
            DataFirstSeen::First(dir) => dir.flag(),
            DataFirstSeen::Settled => StreamFlags::ToServer | StreamFlags::ToClient,
        }
    }
}

/// Per-stream state bits.
#[bitmask(u8)]
#[bitmask_config(vec_debug)]
pub enum TcpStreamFlags {
    /// Protocol detection has run its course for this stream. Sticky,
    /// except for the detection retry path.
    DetectionCompleted,
}

/// One directional half of a TCP session.
#[derive(Debug)]
pub struct TcpStream {
    flags: TcpStreamFlags,
}

impl TcpStream {
    pub fn new() -> Self {
        TcpStream {
            flags: TcpStreamFlags::none(),
        }
    }

    pub fn detection_completed(&self) -> bool {
        self.flags.contains(TcpStreamFlags::DetectionCompleted)
    }

    pub(crate) fn set_detection_completed(&mut self) {
        self.flags |= TcpStreamFlags::DetectionCompleted;
    }

    pub(crate) fn reset_detection_completed(&mut self) {
        self.flags &= !TcpStreamFlags::DetectionCompleted;
    }
}

impl Default for TcpStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Session-wide state bits.
#[bitmask(u8)]
#[bitmask_config(vec_debug)]
pub enum TcpSessionFlags {
    NoReassemblyToServer,
    NoReassemblyToClient,
}

/// Per-flow TCP state: the two streams, the first-data record, and the
/// queued raw messages.
#[derive(Debug)]
pub struct TcpSession {
    /// Stream of bytes sent by the originator.
    pub client: TcpStream,
    /// Stream of bytes sent by the responder.
    pub server: TcpStream,
    flags: TcpSessionFlags,
    data_first_seen: DataFirstSeen,
    toserver_msgs: StreamMsgQueue,
    toclient_msgs: StreamMsgQueue,
}

impl TcpSession {
    pub fn new() -> Self {
        TcpSession {
            client: TcpStream::new(),
            server: TcpStream::new(),
            flags: TcpSessionFlags::none(),
            data_first_seen: DataFirstSeen::None,
            toserver_msgs: StreamMsgQueue::default(),
            toclient_msgs: StreamMsgQueue::default(),
        }
    }

    /// The stream carrying payload for `dir`.
    #[inline]
    pub fn stream(&self, dir: Direction) -> &TcpStream {
        match dir {
            Direction::ToServer => &self.client,
            Direction::ToClient => &self.server,
        }
    }

    #[inline]
    pub(crate) fn stream_mut(&mut self, dir: Direction) -> &mut TcpStream {
        match dir {
            Direction::ToServer => &mut self.client,
            Direction::ToClient => &mut self.server,
        }
    }

    pub fn data_first_seen(&self) -> DataFirstSeen {
        self.data_first_seen
    }

    /// Reassembler-facing: payload bytes showed up in `dir`. Only the very
    /// first sighting is recorded.
    pub fn note_data_seen(&mut self, dir: Direction) {
        if self.data_first_seen == DataFirstSeen::None {
            self.data_first_seen = DataFirstSeen::First(dir);
        }
    }

    /// Payload has reached the parser; the first-data question is closed.
    pub fn settle_first_data(&mut self) {
        self.data_first_seen = DataFirstSeen::Settled;
    }

    pub fn set_no_reassembly(&mut self, dir: Direction) {
        self.flags |= match dir {
            Direction::ToServer => TcpSessionFlags::NoReassemblyToServer,
            Direction::ToClient => TcpSessionFlags::NoReassemblyToClient,
        };
    }

    pub fn reassembly_disabled(&self, dir: Direction) -> bool {
        self.flags.contains(match dir {
            Direction::ToServer => TcpSessionFlags::NoReassemblyToServer,
            Direction::ToClient => TcpSessionFlags::NoReassemblyToClient,
        })
    }

    pub fn msgs(&self, dir: Direction) -> &StreamMsgQueue {
        match dir {
            Direction::ToServer => &self.toserver_msgs,
            Direction::ToClient => &self.toclient_msgs,
        }
    }

    pub(crate) fn msgs_mut(&mut self, dir: Direction) -> &mut StreamMsgQueue {
        match dir {
            Direction::ToServer => &mut self.toserver_msgs,
            Direction::ToClient => &mut self.toclient_msgs,
        }
    }
}

impl Default for TcpSession {
    fn default() -> Self {
        Self::new()
    }
}
