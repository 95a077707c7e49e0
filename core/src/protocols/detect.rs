//! Seam to the pluggable protocol detector.

use anyhow::Result;

use super::{AppProto, Transport};
use crate::conntrack::StreamFlags;
use crate::flow::Flow;

/// Thread-local handle into the detector. One per worker.
pub trait DetectThreadCtx {
    /// Inspect `data` and return a verdict, [`AppProto::UNKNOWN`] when no
    /// protocol matched.
    ///
    /// Implementations record probe exhaustion on the flow through
    /// [`Flow::set_pm_done`] and [`Flow::set_pp_done`] for the direction
    /// named in `dir`.
    fn detect(
        &mut self,
        flow: &mut Flow,
        data: &[u8],
        transport: Transport,
        dir: StreamFlags,
    ) -> AppProto;
}

/// Process-wide detector state and its thread-handle factory.
pub trait ProtoDetector: Send + Sync {
    /// One-time priming of internal detector state.
    fn prepare(&mut self) -> Result<()>;

    /// Acquires a thread-local handle; `None` when acquisition fails.
    fn thread_ctx(&self) -> Option<Box<dyn DetectThreadCtx>>;

    /// Resolves a protocol by registered name, `UNKNOWN` if absent.
    fn proto_by_name(&self, name: &str) -> AppProto;

    /// Registered name for `proto`, if any.
    fn proto_string(&self, proto: AppProto) -> Option<&str>;
}
