//! Seam to the pluggable L7 parsers and their registration table.

use anyhow::{bail, Result};
use hashlink::LinkedHashMap;

use super::{AppProto, Transport};
use crate::conntrack::StreamFlags;
use crate::flow::Flow;

/// Thread-local handle into the parser. One per worker.
pub trait ParseThreadCtx {
    /// Feed one ordered payload chunk to the parser under `proto`.
    fn parse(
        &mut self,
        flow: &mut Flow,
        proto: AppProto,
        dir: StreamFlags,
        data: &[u8],
    ) -> Result<()>;

    /// Drop any per-flow parser state. Invoked when a detection verdict is
    /// rolled back.
    fn flow_cleanup(&mut self, _flow: &mut Flow) {}
}

/// Process-wide parser table and thread-handle factory.
pub trait L7Parser: Send + Sync {
    /// Register every supported protocol into `registry`.
    fn register_parsers(&self, registry: &mut ParserRegistry) -> Result<()>;

    /// Acquires a thread-local handle; `None` when acquisition fails.
    fn thread_ctx(&self) -> Option<Box<dyn ParseThreadCtx>>;
}

/// Registration entry for one protocol parser.
#[derive(Debug, Clone)]
pub struct ParserSpec {
    /// Direction that must produce data first; empty mask when the parser
    /// has no such constraint.
    pub first_data_dir: StreamFlags,
}

impl ParserSpec {
    pub fn unconstrained() -> Self {
        ParserSpec {
            first_data_dir: StreamFlags::none(),
        }
    }

    pub fn first_data(dir: StreamFlags) -> Self {
        ParserSpec {
            first_data_dir: dir,
        }
    }
}

/// Registration-ordered table of protocol parsers.
#[derive(Debug, Default)]
pub struct ParserRegistry {
    table: LinkedHashMap<(Transport, AppProto), ParserSpec>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        ParserRegistry {
            table: LinkedHashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        transport: Transport,
        proto: AppProto,
        spec: ParserSpec,
    ) -> Result<()> {
        if self.table.contains_key(&(transport, proto)) {
            bail!("parser already registered for {:?}/{:?}", transport, proto);
        }
        self.table.insert((transport, proto), spec);
        Ok(())
    }

    /// First-data-direction mask for `proto` on `transport`; empty when the
    /// parser is unconstrained or unregistered.
    pub fn first_data_dir(&self, transport: Transport, proto: AppProto) -> StreamFlags {
        self.table
            .get(&(transport, proto))
            .map(|spec| spec.first_data_dir)
            .unwrap_or_else(StreamFlags::none)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
