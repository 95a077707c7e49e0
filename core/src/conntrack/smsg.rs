//! Reassembled stream messages queued for inspection stages.

use std::collections::VecDeque;

use crossbeam::queue::ArrayQueue;

use crate::conntrack::StreamFlags;
use crate::flow::FlowId;

/// A raw reassembled chunk held for later inspection.
#[derive(Debug)]
pub struct StreamMsg {
    /// Owning flow, as a handle. Dropped when the message is enqueued on a
    /// session or recycled into the pool.
    pub flow: Option<FlowId>,
    pub flags: StreamFlags,
    pub data: Vec<u8>,
}

impl StreamMsg {
    pub fn new(flow: FlowId, flags: StreamFlags, data: Vec<u8>) -> Self {
        StreamMsg {
            flow: Some(flow),
            flags,
            data,
        }
    }

    fn reset(&mut self) {
        self.flow = None;
        self.flags = StreamFlags::none();
        self.data.clear();
    }
}

/// FIFO of raw reassembled chunks for one direction of a session.
#[derive(Debug, Default)]
pub struct StreamMsgQueue {
    msgs: VecDeque<StreamMsg>,
}

impl StreamMsgQueue {
    pub(crate) fn enqueue(&mut self, msg: StreamMsg) {
        debug_assert!(msg.flow.is_none(), "flow handle must be dropped first");
        self.msgs.push_back(msg);
    }

    pub fn dequeue(&mut self) -> Option<StreamMsg> {
        self.msgs.pop_front()
    }

    pub fn len(&self) -> usize {
        self.msgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.msgs.is_empty()
    }
}

/// Shared recycling pool for stream messages.
///
/// Fixed capacity; returning a message to a full pool drops it instead.
pub struct StreamMsgPool {
    pool: ArrayQueue<StreamMsg>,
}

impl StreamMsgPool {
    pub fn new(capacity: usize) -> Self {
        StreamMsgPool {
            // ArrayQueue rejects zero capacities.
            pool: ArrayQueue::new(capacity.max(1)),
        }
    }

    /// Take a recycled message, or allocate a fresh one when the pool is
    /// empty. The caller fills in flow, flags, and payload.
    pub fn get(&self) -> StreamMsg {
        self.pool.pop().unwrap_or(StreamMsg {
            flow: None,
            flags: StreamFlags::none(),
            data: Vec::new(),
        })
    }

    /// Return a message for reuse, clearing its contents.
    pub fn put(&self, mut msg: StreamMsg) {
        msg.reset();
        let _ = self.pool.push(msg);
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
