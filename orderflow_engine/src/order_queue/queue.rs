use std::{
    any::Any,
    fmt::Debug,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use futures_util::FutureExt;
use log::*;
use tokio::{
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
};

use super::{OrderProcessor, ProcessorFault, QueueConfig, QueueError, QueueStats};
use crate::{db::traits::OrderManagement, db_types::OrderId};

#[derive(Debug)]
struct QueuedOrder {
    order_id: OrderId,
    enqueued_at: Instant,
}

type OrderReceiver = mpsc::UnboundedReceiver<QueuedOrder>;

//--------------------------------------       Buffer        ---------------------------------------------------------
/// The producer side of the queue, shared with outstanding permits.
///
/// `depth` counts the items sitting in the channel plus the slots claimed by permits that have not been sent yet.
struct Buffer {
    sender: mpsc::UnboundedSender<QueuedOrder>,
    depth: AtomicUsize,
    closed: AtomicBool,
    under_pressure: AtomicBool,
    max_depth: Option<usize>,
    high_water_mark: usize,
}

impl Buffer {
    fn claim(&self) -> Result<(), QueueError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        let previous = match self.max_depth {
            Some(capacity) => self
                .depth
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| (d < capacity).then_some(d + 1))
                .map_err(|_| QueueError::Full { capacity })?,
            None => self.depth.fetch_add(1, Ordering::SeqCst),
        };
        let depth = previous + 1;
        if depth >= self.high_water_mark && !self.under_pressure.swap(true, Ordering::SeqCst) {
            warn!(
                "📬️ {depth} orders are waiting in the queue, which is above the high-water mark of {}. The consumer is \
                 not keeping up.",
                self.high_water_mark
            );
        }
        Ok(())
    }

    fn release(&self) {
        let depth = self.depth.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        if depth <= self.high_water_mark / 2 && self.under_pressure.swap(false, Ordering::SeqCst) {
            info!("📬️ Queue depth is back down to {depth}");
        }
    }
}

//--------------------------------------     QueuePermit     ---------------------------------------------------------
/// A claimed slot in the queue.
///
/// Call [`QueuePermit::send`] to fill it. Dropping an unsent permit gives the slot back.
#[must_use = "dropping a permit releases its queue slot"]
pub struct QueuePermit {
    buffer: Option<Arc<Buffer>>,
}

impl QueuePermit {
    pub fn send(mut self, order_id: OrderId) -> Result<(), QueueError> {
        let Some(buffer) = self.buffer.take() else {
            return Err(QueueError::Closed);
        };
        if buffer.closed.load(Ordering::SeqCst) {
            buffer.release();
            return Err(QueueError::Closed);
        }
        let item = QueuedOrder { order_id, enqueued_at: Instant::now() };
        if buffer.sender.send(item).is_err() {
            buffer.release();
            return Err(QueueError::Closed);
        }
        Ok(())
    }
}

impl Drop for QueuePermit {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.release();
        }
    }
}

impl Debug for QueuePermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QueuePermit (sent: {})", self.buffer.is_none())
    }
}

//--------------------------------------     OrderQueue      ---------------------------------------------------------
struct WorkerTask {
    stop_signal: watch::Sender<bool>,
    handle: JoinHandle<OrderReceiver>,
}

/// Consumer state. The receiver lives here while the consumer is stopped, and inside the consumer task while it runs,
/// so there can never be two consumers.
struct Worker {
    receiver: Option<OrderReceiver>,
    task: Option<WorkerTask>,
}

struct QueueInner<B> {
    buffer: Arc<Buffer>,
    processor: OrderProcessor<B>,
    poll_interval: Duration,
    worker: Mutex<Worker>,
    running: AtomicBool,
    processed: AtomicU64,
    failed: AtomicU64,
}

/// A cloneable handle on the order queue. See the [module documentation](super) for an overview.
pub struct OrderQueue<B> {
    inner: Arc<QueueInner<B>>,
}

impl<B> Clone for OrderQueue<B> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<B> Debug for OrderQueue<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueue (depth: {}, running: {})", self.depth(), self.is_running())
    }
}

impl<B> OrderQueue<B> {
    /// Creates the queue. The consumer is not running until [`OrderQueue::start`] is called; orders enqueued before
    /// then are buffered.
    pub fn new(db: Arc<B>, config: QueueConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let buffer = Buffer {
            sender,
            depth: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            under_pressure: AtomicBool::new(false),
            max_depth: config.max_depth,
            high_water_mark: config.high_water_mark.max(1),
        };
        let processor = OrderProcessor::new(db).with_processing_delay(config.processing_delay);
        let inner = QueueInner {
            buffer: Arc::new(buffer),
            processor,
            poll_interval: config.poll_interval,
            worker: Mutex::new(Worker { receiver: Some(receiver), task: None }),
            running: AtomicBool::new(false),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        };
        Self { inner: Arc::new(inner) }
    }

    /// Claims a slot for an order that is about to be enqueued.
    ///
    /// In bounded mode this fails with [`QueueError::Full`] when there is no room, which lets the caller reject a
    /// request before doing any work for it. In unbounded mode it only fails once the queue has been shut down.
    pub fn reserve(&self) -> Result<QueuePermit, QueueError> {
        self.inner.buffer.claim()?;
        Ok(QueuePermit { buffer: Some(Arc::clone(&self.inner.buffer)) })
    }

    /// Appends an order to the queue. This never blocks.
    pub fn enqueue(&self, order_id: OrderId) -> Result<(), QueueError> {
        self.reserve()?.send(order_id)
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.buffer.closed.load(Ordering::SeqCst)
    }

    /// The number of orders waiting to be picked up.
    pub fn depth(&self) -> usize {
        self.inner.buffer.depth.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            running: self.is_running(),
            depth: self.depth(),
            processed: self.inner.processed.load(Ordering::SeqCst),
            failed: self.inner.failed.load(Ordering::SeqCst),
        }
    }
}

impl<B> OrderQueue<B>
where B: OrderManagement + 'static
{
    /// Starts the background consumer. Returns `false` if it was already running, or the queue has been shut down.
    pub async fn start(&self) -> bool {
        if self.is_closed() {
            warn!("📬️ The order queue has been shut down and cannot be restarted");
            return false;
        }
        let mut worker = self.inner.worker.lock().await;
        if let Some(task) = &worker.task {
            if !task.handle.is_finished() {
                debug!("📬️ The order queue consumer is already running");
                return false;
            }
        }
        // A consumer that exited without being asked to still hands its receiver back
        if let Some(task) = worker.task.take() {
            match task.handle.await {
                Ok(receiver) => worker.receiver = Some(receiver),
                Err(e) => error!("📬️ The previous order queue consumer failed: {e}"),
            }
        }
        let Some(receiver) = worker.receiver.take() else {
            error!("📬️ The order queue has lost its receiver. The consumer cannot be started.");
            return false;
        };
        let (stop_signal, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(consume(Arc::clone(&self.inner), receiver, stop_rx));
        worker.task = Some(WorkerTask { stop_signal, handle });
        self.inner.running.store(true, Ordering::SeqCst);
        true
    }

    /// Asks the consumer to stop after the order it is working on, and waits for it to exit.
    ///
    /// Orders that are still queued stay queued, and are picked up after the next [`OrderQueue::start`]. Returns
    /// `false` if the consumer was not running.
    pub async fn stop(&self) -> bool {
        let mut worker = self.inner.worker.lock().await;
        let Some(task) = worker.task.take() else {
            return false;
        };
        let _ = task.stop_signal.send(true);
        match task.handle.await {
            Ok(receiver) => worker.receiver = Some(receiver),
            Err(e) => {
                error!("📬️ The order queue consumer failed: {e}. The queue is closed.");
                self.inner.buffer.closed.store(true, Ordering::SeqCst);
            },
        }
        self.inner.running.store(false, Ordering::SeqCst);
        true
    }

    /// Stops the consumer and closes the queue to new orders. Anything still buffered is discarded; those orders stay
    /// in the store in whatever state they were last written.
    pub async fn shutdown(&self) {
        self.inner.buffer.closed.store(true, Ordering::SeqCst);
        self.stop().await;
        let mut worker = self.inner.worker.lock().await;
        if let Some(receiver) = worker.receiver.as_mut() {
            receiver.close();
            let mut abandoned = 0usize;
            while let Ok(item) = receiver.try_recv() {
                self.inner.buffer.release();
                trace!("📬️ Discarding queued order {}", item.order_id);
                abandoned += 1;
            }
            if abandoned > 0 {
                warn!("📬️ {abandoned} queued orders were not processed before shutdown. They remain in the store.");
            }
        }
        info!("📬️ Order queue shut down");
    }
}

async fn consume<B>(
    inner: Arc<QueueInner<B>>,
    mut receiver: OrderReceiver,
    mut stop: watch::Receiver<bool>,
) -> OrderReceiver
where
    B: OrderManagement + 'static,
{
    info!("📬️ Order queue consumer started");
    loop {
        let next = tokio::select! {
            biased;
            _ = stop.changed() => break,
            next = tokio::time::timeout(inner.poll_interval, receiver.recv()) => next,
        };
        match next {
            Ok(Some(item)) => inner.handle(item).await,
            Ok(None) => {
                warn!("📬️ The order queue channel has closed. The consumer is exiting.");
                break;
            },
            Err(_) => trace!("📬️ No orders arrived in the last {:?}", inner.poll_interval),
        }
    }
    info!("📬️ Order queue consumer stopped");
    receiver
}

impl<B> QueueInner<B>
where B: OrderManagement
{
    async fn handle(&self, item: QueuedOrder) {
        self.buffer.release();
        let QueuedOrder { order_id, enqueued_at } = item;
        trace!("📬️ Order {order_id} dequeued after {:?}", enqueued_at.elapsed());
        let result = AssertUnwindSafe(self.processor.process(&order_id)).catch_unwind().await.unwrap_or_else(|panic| {
            Err(ProcessorFault::Panicked { order_id: order_id.clone(), message: panic_message(panic.as_ref()) })
        });
        match result {
            Ok(outcome) => {
                self.processed.fetch_add(1, Ordering::SeqCst);
                debug!("📬️ Order {order_id} processed. It is now {}", outcome.order().status);
            },
            Err(fault) => {
                self.failed.fetch_add(1, Ordering::SeqCst);
                fault.log();
            },
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
