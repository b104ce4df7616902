use bytes::Bytes;

/// Handle to an occupied slot of a [`FramePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotId(usize);

/// Fixed-capacity arena of transmit payloads. A slot stays allocated from
/// `send()` until the frame carrying it is acknowledged.
#[derive(Debug)]
pub struct FramePool {
    slots: Vec<Option<Bytes>>,
    free: Vec<SlotId>,
}

impl FramePool {
    pub fn with_capacity(capacity: usize) -> FramePool {
        FramePool {
            slots: vec![None; capacity],
            free: (0..capacity).rev().map(SlotId).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn in_use(&self) -> usize {
        self.capacity() - self.available()
    }

    /// Store `payload` in a free slot. Gives the payload back if every slot
    /// is taken.
    pub fn alloc(&mut self, payload: Bytes) -> Result<SlotId, Bytes> {
        let Some(id) = self.free.pop() else {
            return Err(payload);
        };
        self.slots[id.0] = Some(payload);
        Ok(id)
    }

    pub fn get(&self, id: SlotId) -> Option<&Bytes> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn release(&mut self, id: SlotId) -> Option<Bytes> {
        let payload = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id);
        Some(payload)
    }

    /// Release every slot.
    pub fn clear(&mut self) {
        let capacity = self.capacity();
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.free = (0..capacity).rev().map(SlotId).collect();
    }
}
