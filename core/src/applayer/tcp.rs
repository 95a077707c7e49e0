//! TCP-side dispatch.
//!
//! For every reassembled chunk the state machine here decides whether to
//! run protocol detection, replay the opposing stream, record an anomaly
//! event, or forward the bytes to the parser. Detection runs once per
//! direction, as early as the stream start allows.

use super::{AppLayerThreadCtx, DispatchError};
use crate::conntrack::pdu::Packet;
use crate::conntrack::reassembly::Reassembler;
use crate::conntrack::{DataFirstSeen, StreamFlags, TcpSession};
use crate::events::AppLayerEvent;
use crate::flow::{DetectState, Flow};
use crate::protocols::AppProto;

/// Handle one reassembled TCP chunk for `flow`.
///
/// The caller holds exclusive access to the flow for the duration of the
/// call. `flags` carries exactly one direction bit plus the optional
/// `Start` and `Gap` markers. An `Err` tells the reassembler to stop
/// feeding this chunk; the flow continues under whatever state was left
/// behind.
pub fn handle_tcp_data(
    tctx: &mut AppLayerThreadCtx,
    ra: &mut dyn Reassembler,
    pkt: &mut Packet,
    flow: &mut Flow,
    ssn: &mut TcpSession,
    data: &[u8],
    flags: StreamFlags,
) -> Result<(), DispatchError> {
    log::debug!("data len {} flags {:?}", data.len(), flags);

    if flow.inspection_disabled() {
        log::debug!("app-layer inspection is off for this flow");
        return Ok(());
    }

    let dir = flags.direction();
    let alproto_this = flow.alproto_dir(dir);

    if alproto_this.is_unknown() && flags.contains(StreamFlags::Gap) {
        // A hole at stream start leaves nothing to detect on; this side
        // will never run L7.
        ssn.stream_mut(dir).set_detection_completed();
        flow.set_detect_state(dir, DetectState::Exhausted);
        ssn.set_no_reassembly(dir);
        log::debug!("gap at stream start, giving up on detection for {:?}", dir);
        return Ok(());
    }

    if alproto_this.is_unknown() && flags.contains(StreamFlags::Start) {
        return detect_on_stream_start(tctx, ra, pkt, flow, ssn, data, flags);
    }

    // Steady state: the protocol question is settled for the flow.
    if !flow.alproto.is_unknown() {
        log::debug!("stream data len {} alproto {:?}", data.len(), flow.alproto);
        let proto = flow.alproto;
        time_start!(start);
        let r = tctx.parse.parse(flow, proto, flags, data);
        time_record!(tctx.timers, "applayer_parse", start);
        r.map_err(DispatchError::Parser)
    } else {
        // A chunk with no preceding stream start and no protocol to parse
        // it under; nothing useful to do with it.
        log::debug!(
            "mid-stream chunk but no protocol for the flow, dropping {} bytes",
            data.len()
        );
        Ok(())
    }
}

/// Stream-start handling: run detection and act on the verdict.
fn detect_on_stream_start(
    tctx: &mut AppLayerThreadCtx,
    ra: &mut dyn Reassembler,
    pkt: &mut Packet,
    flow: &mut Flow,
    ssn: &mut TcpSession,
    data: &[u8],
    flags: StreamFlags,
) -> Result<(), DispatchError> {
    let dir = flags.direction();
    let transport = flow.transport;

    // Leading bytes already covered by an earlier detection pass but not
    // yet handed to the parser.
    let carry = if data.is_empty() {
        0
    } else {
        flow.data_scanned(dir) as usize
    };
    debug_assert!(carry <= data.len());

    log::debug!("stream initializer, len {}", data.len());

    flow.set_detect_state(dir, DetectState::InProgress);
    time_start!(pd_start);
    let detected = tctx.detect.detect(flow, data, transport, flags);
    time_record!(tctx.timers, "proto_detect", pd_start);

    let alproto_other = flow.alproto_dir(dir.flip());

    if !detected.is_unknown() {
        let mut alproto_this = detected;

        if !alproto_other.is_unknown() && alproto_other != detected {
            // The two directions disagree; settle on one canonical
            // protocol for the flow.
            pkt.events
                .set_raw(AppLayerEvent::MismatchProtocolBothDirections);
            if ssn.data_first_seen() == DataFirstSeen::Settled {
                // The other side's verdict already fed the parser; it wins.
                alproto_this = alproto_other;
            } else if flags.contains(StreamFlags::ToClient) {
                flow.set_alproto_dir(dir.flip(), detected);
            } else {
                alproto_this = alproto_other;
            }
        }

        flow.set_alproto_dir(dir, alproto_this);
        flow.alproto = alproto_this;
        flow.set_detect_state(dir, DetectState::Parsing);
        ssn.stream_mut(dir).set_detection_completed();

        // Bytes may have arrived on the opposing stream before the
        // protocol was known; they must reach the parser first. The
        // replay re-enters this dispatcher for the opposing direction.
        if let DataFirstSeen::First(first_dir) = ssn.data_first_seen() {
            if first_dir != dir {
                let opposing = dir.flip();
                let ret = if ra.inline_mode() {
                    ra.replay_applayer_inline(tctx, pkt, flow, ssn, opposing)
                } else {
                    ra.replay_applayer(tctx, pkt, flow, ssn, opposing)
                };
                if let Err(err) = ret {
                    log::debug!("replay of {:?} stream failed: {}", opposing, err);
                    flow.set_no_applayer_inspection();
                    ssn.client.set_detection_completed();
                    ssn.server.set_detection_completed();
                    return Err(DispatchError::ReplayFailed);
                }
            }
        }

        // A replayed dispatch may have rewritten either direction's slot.
        let alproto_this = flow.alproto_dir(dir);
        let alproto_other = flow.alproto_dir(dir.flip());

        if ssn.data_first_seen() != DataFirstSeen::Settled {
            let required = tctx.registry.first_data_dir(transport, alproto_this);

            if !required.is_none() && (required & ssn.data_first_seen().as_flags()).is_none() {
                // The parser needs the other side to have spoken first and
                // it did not. Known weakness: a peer can seed junk in the
                // wrong direction to land flows here.
                pkt.events.set_raw(AppLayerEvent::WrongDirectionFirstData);
                flow.set_no_applayer_inspection();
                ssn.client.set_detection_completed();
                ssn.server.set_detection_completed();
                ssn.settle_first_data();
                return Err(DispatchError::WrongDirectionFirstData);
            }

            if !required.is_none() && (required & flags).is_none() {
                // The required direction produced data first but it has not
                // reached the app layer yet. Roll the verdict back so
                // detection reruns once that data arrives.
                assert!(alproto_other.is_unknown());
                tctx.parse.flow_cleanup(flow);
                flow.alproto = AppProto::UNKNOWN;
                flow.set_alproto_dir(dir, AppProto::UNKNOWN);
                flow.set_detect_state(dir, DetectState::NeedsRetry);
                ssn.stream_mut(dir).reset_detection_completed();
                flow.reset_pp_done(flags);
                flow.reset_pm_done(flags);
                return Err(DispatchError::DetectionRetry);
            }
        }

        ssn.settle_first_data();

        time_start!(ap_start);
        let r = tctx
            .parse
            .parse(flow, alproto_this, flags, &data[carry..]);
        time_record!(tctx.timers, "applayer_parse", ap_start);
        flow.set_data_scanned(dir, 0);
        r.map_err(DispatchError::Parser)
    } else if !alproto_other.is_unknown() {
        // This side never matched, but the other side's verdict stands for
        // the whole flow; parse under it.
        let required = tctx.registry.first_data_dir(transport, alproto_other);

        if ssn.data_first_seen() != DataFirstSeen::Settled
            && !required.is_none()
            && (required & flags).is_none()
        {
            flow.set_no_applayer_inspection();
            ssn.client.set_detection_completed();
            ssn.server.set_detection_completed();
            return Err(DispatchError::WrongDirectionFirstData);
        }

        if !data.is_empty() {
            ssn.settle_first_data();
        }

        time_start!(ap_start);
        let r = tctx
            .parse
            .parse(flow, alproto_other, flags, &data[carry..]);
        time_record!(tctx.timers, "applayer_parse", ap_start);

        if flow.is_pm_done(flags) && flow.is_pp_done(flags) {
            // Every probe for this side is spent; stop rescanning it.
            pkt.events
                .set_raw(AppLayerEvent::DetectProtocolOnlyOneDirection);
            ssn.stream_mut(dir).set_detection_completed();
            flow.set_detect_state(dir, DetectState::Parsing);
            flow.set_data_scanned(dir, 0);
        } else {
            // The next stream start carries a superset of these bytes;
            // remember how much of it the parser has already consumed.
            flow.set_data_scanned(dir, data.len() as u32);
        }
        r.map_err(DispatchError::Parser)
    } else {
        // Neither direction has a verdict. Once every probe in both
        // directions is spent, stop inspecting the flow for good.
        if flow.is_pm_done(StreamFlags::ToServer)
            && flow.is_pp_done(StreamFlags::ToServer)
            && flow.is_pm_done(StreamFlags::ToClient)
            && flow.is_pp_done(StreamFlags::ToClient)
        {
            log::debug!("detection exhausted in both directions");
            flow.set_no_applayer_inspection();
            ssn.client.set_detection_completed();
            ssn.server.set_detection_completed();
            ssn.settle_first_data();
        }
        Ok(())
    }
}
