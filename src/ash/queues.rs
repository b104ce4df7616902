use std::collections::VecDeque;

use bytes::Bytes;

use super::{
    pool::{FramePool, SlotId},
    FrameNumber,
};

/// Ownership of every buffer the engine holds: queued transmit payloads,
/// sent-but-unacknowledged copies and the single receive slot.
#[derive(Debug)]
pub struct Queues {
    pool: FramePool,
    tx_high: VecDeque<SlotId>,
    tx_normal: VecDeque<SlotId>,
    retx: VecDeque<(FrameNumber, SlotId)>,
    rx: Option<Bytes>,
}

impl Queues {
    pub fn new(tx_buffers: usize) -> Queues {
        Queues {
            pool: FramePool::with_capacity(tx_buffers),
            tx_high: VecDeque::new(),
            tx_normal: VecDeque::new(),
            retx: VecDeque::new(),
            rx: None,
        }
    }

    pub fn has_tx_space(&self) -> bool {
        self.pool.available() > 0
    }

    /// Queue a payload. Gives the payload back if the pool is full.
    pub fn enqueue(&mut self, payload: Bytes, high_priority: bool) -> Result<(), Bytes> {
        let id = self.pool.alloc(payload)?;
        if high_priority {
            self.tx_high.push_back(id);
        } else {
            self.tx_normal.push_back(id);
        }
        Ok(())
    }

    /// Move the next payload to the retransmit queue as frame `frm_num` and
    /// return it.
    pub fn start_transmit(&mut self, frm_num: FrameNumber, allow_normal: bool) -> Option<Bytes> {
        let id = match self.tx_high.pop_front() {
            Some(id) => id,
            None if allow_normal => self.tx_normal.pop_front()?,
            None => return None,
        };
        self.retx.push_back((frm_num, id));
        self.pool.get(id).cloned()
    }

    pub fn retransmit_payload(&self, frm_num: FrameNumber) -> Option<Bytes> {
        self.retx
            .iter()
            .find(|(num, _)| *num == frm_num)
            .and_then(|(_, id)| self.pool.get(*id))
            .cloned()
    }

    /// Release the oldest outstanding frame if it is `frm_num`.
    pub fn release_acked(&mut self, frm_num: FrameNumber) -> bool {
        match self.retx.front() {
            Some((num, id)) if *num == frm_num => {
                let id = *id;
                self.retx.pop_front();
                self.pool.release(id);
                true
            }
            _ => false,
        }
    }

    pub fn outstanding(&self) -> usize {
        self.retx.len()
    }

    pub fn is_rx_full(&self) -> bool {
        self.rx.is_some()
    }

    /// Place a received payload in the receive slot. Gives the payload back if
    /// the slot is occupied.
    pub fn put_received(&mut self, payload: Bytes) -> Result<(), Bytes> {
        if self.rx.is_some() {
            return Err(payload);
        }
        self.rx = Some(payload);
        Ok(())
    }

    pub fn take_received(&mut self) -> Option<Bytes> {
        self.rx.take()
    }

    /// Drop every buffer.
    pub fn clear(&mut self) {
        self.tx_high.clear();
        self.tx_normal.clear();
        self.retx.clear();
        self.rx = None;
        self.pool.clear();
    }

    pub fn buffers_in_use(&self) -> usize {
        self.pool.in_use()
    }
}
