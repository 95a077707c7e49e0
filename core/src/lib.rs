//! Application-layer dispatch core for flow-based network inspection.
//!
//! Kestrel sits between a transport-layer reassembler and a set of
//! application-protocol parsers. Given reassembled byte streams (TCP) or
//! datagrams (UDP) belonging to a flow, it identifies the protocol the flow
//! carries, once per flow and as early as possible, through a pluggable
//! detector, then forwards each payload chunk to the matching parser in the
//! order the transport delivered the bytes. Along the way it tracks
//! per-flow detection state, honors parsers that insist on seeing a
//! particular direction speak first, replays data queued on the opposing
//! stream when a verdict lands, and records anomalies (protocol mismatch
//! between directions, wrong-direction first data, one-sided detection) as
//! events on the triggering packet.
//!
//! The detection algorithm, the parsers themselves, the TCP reassembly
//! engine, and the flow table are external collaborators behind traits; see
//! [`protocols::detect`], [`protocols::parser`], and
//! [`conntrack::reassembly`]. Worker threads each own one
//! [`AppLayerThreadCtx`]; flows are sharded so that all packets of a flow
//! reach the same worker.

#[macro_use]
mod timing;
pub mod applayer;
pub mod config;
pub mod conntrack;
pub mod events;
pub mod flow;
pub mod protocols;

pub use self::applayer::tcp::handle_tcp_data;
pub use self::applayer::udp::handle_udp;
pub use self::applayer::{handle_tcp_msg, AppLayer, AppLayerThreadCtx, DispatchError};
pub use self::conntrack::pdu::Packet;
pub use self::conntrack::smsg::{StreamMsg, StreamMsgPool, StreamMsgQueue};
pub use self::conntrack::{DataFirstSeen, StreamFlags, TcpSession, TcpStream};
pub use self::events::{AppLayerEvent, AppLayerEvents};
pub use self::flow::{DetectState, Direction, Flow, FlowId};
pub use self::protocols::{AppProto, ProtoTable, Transport};
