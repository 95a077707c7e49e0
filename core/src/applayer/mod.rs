//! Application-layer dispatch: protocol detection and parser hand-off.
//!
//! This module ties the external collaborators together. [`AppLayer`] owns
//! the process-wide pieces (detector, parser table, message pool);
//! [`AppLayerThreadCtx`] carries the per-worker handles into both engines.
//! The per-chunk state machines live in [`tcp`] and [`udp`]; raw
//! reassembled messages destined for later inspection stages go through
//! [`handle_tcp_msg`].

pub mod tcp;
pub mod udp;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use thiserror::Error;

use crate::config::AppLayerConfig;
use crate::conntrack::smsg::{StreamMsg, StreamMsgPool};
use crate::conntrack::TcpSession;
use crate::protocols::detect::{DetectThreadCtx, ProtoDetector};
use crate::protocols::parser::{L7Parser, ParseThreadCtx, ParserRegistry};
use crate::protocols::AppProto;
#[cfg(feature = "timing")]
use crate::timing::Timers;

/// Why a dispatch call failed. The caller stops feeding the current chunk;
/// the flow continues under whatever state the dispatcher left behind.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// First payload arrived in a direction the detected parser rejects.
    #[error("first data arrived in a direction the parser does not accept")]
    WrongDirectionFirstData,

    /// Replaying the opposing stream through the app layer failed.
    #[error("replay of the opposing stream failed")]
    ReplayFailed,

    /// The verdict was rolled back; detection reruns on a later chunk.
    #[error("detection rolled back to retry on the required direction")]
    DetectionRetry,

    /// The L7 parser reported an error, passed through unchanged.
    #[error(transparent)]
    Parser(#[from] anyhow::Error),
}

/// Process-wide application-layer state.
pub struct AppLayer {
    detector: Box<dyn ProtoDetector>,
    parser: Box<dyn L7Parser>,
    registry: Arc<ParserRegistry>,
    pool: Arc<StreamMsgPool>,
    config: AppLayerConfig,
}

impl AppLayer {
    /// One-time setup: registers the parser table and primes the detector.
    ///
    /// A second call builds a second, independent instance.
    pub fn setup(
        config: AppLayerConfig,
        mut detector: Box<dyn ProtoDetector>,
        parser: Box<dyn L7Parser>,
    ) -> Result<Self> {
        let mut registry = ParserRegistry::new();
        parser.register_parsers(&mut registry)?;
        detector.prepare()?;
        log::info!(
            "app-layer setup complete, {} protocol parsers registered",
            registry.len()
        );
        let pool = Arc::new(StreamMsgPool::new(config.msg_pool_capacity));
        Ok(AppLayer {
            detector,
            parser,
            registry: Arc::new(registry),
            pool,
            config,
        })
    }

    /// Acquires the per-worker thread context.
    ///
    /// Acquisition is all-or-nothing: if the parser handle cannot be
    /// obtained, the already-acquired detector handle is released before
    /// the error returns.
    pub fn thread_ctx(&self) -> Result<AppLayerThreadCtx> {
        let detect = self
            .detector
            .thread_ctx()
            .ok_or_else(|| anyhow!("failed to acquire detector thread context"))?;
        let parse = self
            .parser
            .thread_ctx()
            .ok_or_else(|| anyhow!("failed to acquire parser thread context"))?;
        Ok(AppLayerThreadCtx {
            detect,
            parse,
            registry: Arc::clone(&self.registry),
            #[cfg(feature = "timing")]
            timers: Timers::new(),
        })
    }

    /// Resolves a protocol by name via the detector table.
    pub fn proto_by_name(&self, name: &str) -> AppProto {
        self.detector.proto_by_name(name)
    }

    /// Registered name for `proto` via the detector table.
    pub fn proto_string(&self, proto: AppProto) -> Option<&str> {
        self.detector.proto_string(proto)
    }

    pub fn pool(&self) -> &Arc<StreamMsgPool> {
        &self.pool
    }

    pub fn config(&self) -> &AppLayerConfig {
        &self.config
    }
}

/// Per-worker handles into the detector and parser, plus shared read-only
/// state. Created once per worker thread and never shared.
pub struct AppLayerThreadCtx {
    pub(crate) detect: Box<dyn DetectThreadCtx>,
    pub(crate) parse: Box<dyn ParseThreadCtx>,
    pub(crate) registry: Arc<ParserRegistry>,
    #[cfg(feature = "timing")]
    pub(crate) timers: Timers,
}

impl AppLayerThreadCtx {
    /// Emit accumulated stage timings to the log.
    #[cfg(feature = "timing")]
    pub fn log_timing_stats(&self) {
        self.timers.log_stats();
    }
}

/// Queue a reassembled message on its session, or recycle it when the flow
/// no longer has one.
///
/// The flow handle is dropped in both arms; callers must not rely on it
/// afterwards.
pub fn handle_tcp_msg(ssn: Option<&mut TcpSession>, mut msg: StreamMsg, pool: &StreamMsgPool) {
    msg.flow.take();
    match ssn {
        Some(ssn) => {
            let dir = msg.flags.direction();
            log::debug!("storing msg in the {:?} queue", dir);
            ssn.msgs_mut(dir).enqueue(msg);
        }
        None => {
            // Nothing will inspect the message without a session.
            pool.put(msg);
        }
    }
}
