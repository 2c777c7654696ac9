//! Fixed-capacity frame FIFOs. Both drop the newest frame when full.

use heapless::{
    spsc::{Consumer, Producer, Queue},
    Deque,
};

use crate::{frame::CanFrame, QUEUE_CAPACITY};

/// Storage for the receive queue. An spsc queue with `N` slots holds `N - 1`
/// frames, hence the extra slot.
pub type ReceiveQueue = Queue<CanFrame, { QUEUE_CAPACITY + 1 }>;

/// Splits receive queue storage into the half handed to the bus receive
/// callback and the half drained by the gateway.
pub fn split_receive_queue(queue: &mut ReceiveQueue) -> (FrameSender<'_>, FrameReceiver<'_>) {
    let (producer, consumer) = queue.split();

    (FrameSender { producer }, FrameReceiver { consumer })
}

/// Producer end of the receive queue.
///
/// This is the only thing the bus receive callback (typically an interrupt
/// handler) needs; pushes are lock free with respect to the consumer.
pub struct FrameSender<'a> {
    producer: Producer<'a, CanFrame, { QUEUE_CAPACITY + 1 }>,
}

impl FrameSender<'_> {
    /// Enqueues `frame`, or drops it and returns `false` if the queue is full.
    pub fn try_push(&mut self, frame: CanFrame) -> bool {
        match self.producer.enqueue(frame) {
            Ok(()) => true,
            Err(_dropped) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Receive queue full, dropping frame {}", _dropped);

                false
            }
        }
    }

    pub fn is_full(&self) -> bool {
        !self.producer.ready()
    }
}

/// Consumer end of the receive queue, owned by the gateway.
pub struct FrameReceiver<'a> {
    consumer: Consumer<'a, CanFrame, { QUEUE_CAPACITY + 1 }>,
}

impl FrameReceiver<'_> {
    pub fn is_full(&self) -> bool {
        self.consumer.len() == QUEUE_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        !self.consumer.ready()
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn pop_front(&mut self) -> Option<CanFrame> {
        self.consumer.dequeue()
    }
}

/// FIFO used from a single context, such as the transmit queue between the
/// dispatcher and the bus.
#[derive(Debug, Clone, Default)]
pub struct FrameQueue<const N: usize> {
    frames: Deque<CanFrame, N>,
}

impl<const N: usize> FrameQueue<N> {
    pub const fn new() -> Self {
        Self {
            frames: Deque::new(),
        }
    }

    /// Enqueues `frame`, or drops it and returns `false` if the queue is full.
    pub fn try_push(&mut self, frame: CanFrame) -> bool {
        match self.frames.push_back(frame) {
            Ok(()) => true,
            Err(_dropped) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Transmit queue full, dropping frame {}", _dropped);

                false
            }
        }
    }

    pub fn is_full(&self) -> bool {
        self.frames.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn pop_front(&mut self) -> Option<CanFrame> {
        self.frames.pop_front()
    }
}
