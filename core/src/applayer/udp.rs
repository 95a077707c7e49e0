//! UDP-side dispatch.
//!
//! Datagrams are self-contained: detection runs once on the first datagram
//! of a flow, hit or miss, and every later datagram is forwarded straight
//! to the parser once a protocol is known. There is no opposing-stream
//! replay.

use std::sync::RwLock;

use super::{AppLayerThreadCtx, DispatchError};
use crate::conntrack::pdu::Packet;
use crate::conntrack::StreamFlags;
use crate::flow::{DetectState, Direction, Flow};
use crate::protocols::Transport;

/// Handle one UDP datagram for `flow`.
///
/// Takes the flow's write lock for the whole dispatch, parser call
/// included; the guard releases on every exit path.
pub fn handle_udp(
    tctx: &mut AppLayerThreadCtx,
    pkt: &mut Packet,
    flow: &RwLock<Flow>,
) -> Result<(), DispatchError> {
    let mut flow = flow.write().expect("flow lock poisoned");

    if flow.inspection_disabled() {
        return Ok(());
    }

    let flags = match pkt.direction {
        Direction::ToServer => StreamFlags::ToServer,
        Direction::ToClient => StreamFlags::ToClient,
    };

    if flow.alproto.is_unknown() && !flow.detect_done() {
        log::debug!("detecting proto on udp message, len {}", pkt.payload.len());

        time_start!(pd_start);
        let detected = tctx
            .detect
            .detect(&mut flow, &pkt.payload, Transport::Udp, flags);
        time_record!(tctx.timers, "proto_detect", pd_start);

        flow.alproto = detected;
        // One attempt per flow, hit or miss.
        let settled = if detected.is_unknown() {
            DetectState::Exhausted
        } else {
            DetectState::Parsing
        };
        flow.set_detect_state(Direction::ToServer, settled);
        flow.set_detect_state(Direction::ToClient, settled);

        if detected.is_unknown() {
            log::debug!("no verdict for udp flow");
            return Ok(());
        }

        time_start!(ap_start);
        let r = tctx.parse.parse(&mut flow, detected, flags, &pkt.payload);
        time_record!(tctx.timers, "applayer_parse", ap_start);
        return r.map_err(DispatchError::Parser);
    }

    if !flow.alproto.is_unknown() {
        log::debug!(
            "udp data len {} alproto {:?}",
            pkt.payload.len(),
            flow.alproto
        );
        let proto = flow.alproto;
        time_start!(ap_start);
        let r = tctx.parse.parse(&mut flow, proto, flags, &pkt.payload);
        time_record!(tctx.timers, "applayer_parse", ap_start);
        r.map_err(DispatchError::Parser)
    } else {
        log::debug!("udp flow started but the protocol never resolved");
        Ok(())
    }
}
