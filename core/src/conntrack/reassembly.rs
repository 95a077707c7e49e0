//! Seam to the TCP reassembly engine.

use anyhow::Result;

use crate::applayer::AppLayerThreadCtx;
use crate::conntrack::pdu::Packet;
use crate::conntrack::TcpSession;
use crate::flow::{Direction, Flow};

/// The reassembler-side contract the dispatcher drives.
///
/// `replay_*` must push any queued-but-undelivered bytes for `dir` back
/// through the application layer (re-entering the dispatcher with the
/// thread context passed here) before returning. The direction to replay is
/// an explicit argument; implementations translate it to whatever polarity
/// their mode of operation requires.
pub trait Reassembler {
    /// `true` when the engine runs as an in-path filter.
    fn inline_mode(&self) -> bool;

    /// Replay queued data for `dir` through the app layer (sniffing mode).
    fn replay_applayer(
        &mut self,
        tctx: &mut AppLayerThreadCtx,
        pkt: &mut Packet,
        flow: &mut Flow,
        ssn: &mut TcpSession,
        dir: Direction,
    ) -> Result<()>;

    /// Replay queued data for `dir` through the app layer (inline mode).
    fn replay_applayer_inline(
        &mut self,
        tctx: &mut AppLayerThreadCtx,
        pkt: &mut Packet,
        flow: &mut Flow,
        ssn: &mut TcpSession,
        dir: Direction,
    ) -> Result<()>;
}
