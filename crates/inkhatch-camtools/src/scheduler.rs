//! Chunked execution scheduler
//!
//! Runs the hatching pipeline on tokio in bounded-time batches. Each
//! request waits out a debounce delay first, so a burst of parameter edits
//! collapses into one recompute. A new request cancels the run in flight
//! for the same target, and an all-channels request cancels every run.
//! A single-channel request also takes that channel away from any older
//! all-channels run, which then publishes only the remaining channels.
//! Results are published only when a run completes uncancelled.

use crate::channels::IntensityMap;
use crate::error::{HatchError, HatchResult};
use crate::params::Parameters;
use crate::pipeline::{ChannelResult, HatchPipeline};
use inkhatch_core::{thread_safe_rw, Canvas, Channel, RasterImage, ThreadSafeRw};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};

/// Published results, replaced as a whole on every successful run.
pub type HatchSnapshot = Arc<BTreeMap<Channel, ChannelResult>>;

/// Scheduler tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Sections per batch; cancellation is checked between batches
    pub batch_size: usize,
    /// Work time after which a run yields to the runtime
    pub time_budget: Duration,
    /// Delay before a request starts, absorbing rapid edits
    pub debounce: Duration,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: crate::pipeline::BATCH_SIZE,
            time_budget: Duration::from_millis(8),
            debounce: Duration::from_millis(150),
            event_capacity: 256,
        }
    }
}

/// What a request recomputes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RunTarget {
    /// Every enabled channel
    All,
    /// A single channel; others keep their published results
    Channel(Channel),
}

/// Cooperative cancellation flag shared between a run and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

/// Why a request did no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No image has been loaded
    NoImage,
    /// No channel is enabled
    NoChannels,
    /// The requested channel is not enabled
    ChannelDisabled(Channel),
}

/// Final state of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Results for these channels were published
    Completed(Vec<Channel>),
    /// Superseded or cancelled; nothing was published
    Cancelled,
    /// Nothing to do
    Skipped(SkipReason),
}

/// Notifications about scheduler activity.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    Started {
        target: RunTarget,
        channels: Vec<Channel>,
    },
    Progress {
        channel: Channel,
        done: usize,
        total: usize,
    },
    Completed {
        target: RunTarget,
        channels: Vec<Channel>,
    },
    Cancelled {
        target: RunTarget,
    },
    Skipped {
        target: RunTarget,
        reason: SkipReason,
    },
}

/// Handle to a scheduled run.
pub struct RunTicket {
    target: RunTarget,
    token: CancellationToken,
    handle: JoinHandle<HatchResult<RunOutcome>>,
}

impl RunTicket {
    pub fn target(&self) -> RunTarget {
        self.target
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the run to finish.
    pub async fn wait(self) -> HatchResult<RunOutcome> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => Ok(RunOutcome::Cancelled),
            Err(e) => Err(HatchError::Worker(e.to_string())),
        }
    }
}

/// Intensity map for one channel, tagged with what it was built from.
struct CachedMap {
    generation: u64,
    contrast: u64,
    white_point: u64,
    map: Arc<IntensityMap>,
}

/// Sequence number of the newest request that covers each channel.
#[derive(Default)]
struct RequestLedger {
    next: u64,
    latest: HashMap<Channel, u64>,
}

struct LoadedImage {
    generation: u64,
    raster: Arc<RasterImage>,
}

struct Inner {
    canvas: Canvas,
    config: SchedulerConfig,
    image: RwLock<Option<LoadedImage>>,
    next_generation: Mutex<u64>,
    results: ThreadSafeRw<HatchSnapshot>,
    in_flight: Mutex<HashMap<RunTarget, CancellationToken>>,
    requests: Mutex<RequestLedger>,
    maps: Mutex<HashMap<Channel, CachedMap>>,
    events: broadcast::Sender<SchedulerEvent>,
}

/// Async front end to the hatching pipeline.
///
/// Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct HatchScheduler {
    inner: Arc<Inner>,
}

impl HatchScheduler {
    pub fn new(canvas: Canvas) -> HatchResult<Self> {
        Self::with_config(canvas, SchedulerConfig::default())
    }

    pub fn with_config(canvas: Canvas, config: SchedulerConfig) -> HatchResult<Self> {
        canvas.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Ok(Self {
            inner: Arc::new(Inner {
                canvas,
                config,
                image: RwLock::new(None),
                next_generation: Mutex::new(0),
                results: thread_safe_rw(Arc::new(BTreeMap::new())),
                in_flight: Mutex::new(HashMap::new()),
                requests: Mutex::new(RequestLedger::default()),
                maps: Mutex::new(HashMap::new()),
                events,
            }),
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.inner.canvas
    }

    /// Replace the source image.
    ///
    /// Cancels every run in flight and drops cached intensity maps.
    /// Published results stay until the next run replaces them.
    pub fn set_image(&self, image: Arc<RasterImage>) {
        let (width, height) = self.inner.canvas.pixel_grid();
        let raster = if image.width() == width && image.height() == height {
            image
        } else {
            Arc::new(image.resized_to(width, height))
        };

        let generation = {
            let mut next = self.inner.next_generation.lock();
            *next += 1;
            *next
        };
        self.cancel(RunTarget::All);
        self.inner.maps.lock().clear();
        *self.inner.image.write() = Some(LoadedImage { generation, raster });
        tracing::debug!("Source image replaced (generation {})", generation);
    }

    pub fn has_image(&self) -> bool {
        self.inner.image.read().is_some()
    }

    /// Schedule a recompute of `target` with `params`.
    ///
    /// The newest request covering a channel owns that channel's result:
    /// an older all-channels run still in flight will not publish over it.
    pub fn request(&self, target: RunTarget, params: Parameters) -> HatchResult<RunTicket> {
        params.validate()?;
        let token = CancellationToken::new();
        let seq = {
            let mut requests = self.inner.requests.lock();
            requests.next += 1;
            let seq = requests.next;
            match target {
                RunTarget::All => {
                    for &channel in &params.enabled_channels {
                        requests.latest.insert(channel, seq);
                    }
                }
                RunTarget::Channel(channel) => {
                    if params.enabled_channels.contains(&channel) {
                        requests.latest.insert(channel, seq);
                    }
                }
            }
            seq
        };
        {
            let mut in_flight = self.inner.in_flight.lock();
            match target {
                RunTarget::All => {
                    for (_, previous) in in_flight.drain() {
                        previous.cancel();
                    }
                }
                RunTarget::Channel(_) => {
                    if let Some(previous) = in_flight.remove(&target) {
                        previous.cancel();
                    }
                }
            }
            in_flight.insert(target, token.clone());
        }

        let inner = self.inner.clone();
        let run_token = token.clone();
        let handle = tokio::spawn(async move {
            let outcome = execute(inner.clone(), target, seq, params, run_token.clone()).await;
            inner.release(target, &run_token);
            outcome
        });
        Ok(RunTicket {
            target,
            token,
            handle,
        })
    }

    /// Cancel the run for `target`; `All` cancels every run.
    pub fn cancel(&self, target: RunTarget) {
        let mut in_flight = self.inner.in_flight.lock();
        match target {
            RunTarget::All => {
                for (_, token) in in_flight.drain() {
                    token.cancel();
                }
            }
            RunTarget::Channel(_) => {
                if let Some(token) = in_flight.remove(&target) {
                    token.cancel();
                }
            }
        }
    }

    /// Currently published results.
    pub fn snapshot(&self) -> HatchSnapshot {
        self.inner.results.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.inner.events.subscribe()
    }
}

impl Inner {
    fn emit(&self, event: SchedulerEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn release(&self, target: RunTarget, token: &CancellationToken) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(&target).is_some_and(|t| t.same_as(token)) {
            in_flight.remove(&target);
        }
    }

    fn intensity_map(
        &self,
        generation: u64,
        pipeline: &HatchPipeline,
        channel: Channel,
    ) -> Arc<IntensityMap> {
        let tone = pipeline.params().tone_for(channel);
        let contrast = tone.contrast.to_bits();
        let white_point = tone.white_point.to_bits();
        if let Some(cached) = self.maps.lock().get(&channel) {
            if cached.generation == generation
                && cached.contrast == contrast
                && cached.white_point == white_point
            {
                return cached.map.clone();
            }
        }
        let map = Arc::new(pipeline.intensity_map(channel));
        // One map per channel; a tone change replaces the previous one
        self.maps.lock().insert(
            channel,
            CachedMap {
                generation,
                contrast,
                white_point,
                map: map.clone(),
            },
        );
        map
    }

    /// Whether no request newer than `seq` has claimed `channel`.
    fn owns_channel(&self, channel: Channel, seq: u64) -> bool {
        self.requests
            .lock()
            .latest
            .get(&channel)
            .is_none_or(|&latest| latest <= seq)
    }
}

async fn execute(
    inner: Arc<Inner>,
    target: RunTarget,
    seq: u64,
    params: Parameters,
    token: CancellationToken,
) -> HatchResult<RunOutcome> {
    tokio::time::sleep(inner.config.debounce).await;
    if token.is_cancelled() {
        inner.emit(SchedulerEvent::Cancelled { target });
        return Ok(RunOutcome::Cancelled);
    }

    let loaded = inner
        .image
        .read()
        .as_ref()
        .map(|img| (img.generation, img.raster.clone()));
    let Some((generation, raster)) = loaded else {
        return Ok(skip(&inner, target, SkipReason::NoImage));
    };

    let channels = match target {
        RunTarget::All => params.enabled_channels.clone(),
        RunTarget::Channel(channel) => {
            if !params.enabled_channels.contains(&channel) {
                return Ok(skip(&inner, target, SkipReason::ChannelDisabled(channel)));
            }
            vec![channel]
        }
    };
    if channels.is_empty() {
        return Ok(skip(&inner, target, SkipReason::NoChannels));
    }

    let pipeline = Arc::new(HatchPipeline::with_raster(raster, inner.canvas, params)?);
    inner.emit(SchedulerEvent::Started {
        target,
        channels: channels.clone(),
    });
    let started = Instant::now();

    let mut tasks = JoinSet::new();
    for &channel in &channels {
        let map = inner.intensity_map(generation, &pipeline, channel);
        tasks.spawn(run_channel(
            inner.clone(),
            pipeline.clone(),
            channel,
            map,
            token.clone(),
        ));
    }

    let mut finished = Vec::with_capacity(channels.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(result)) => finished.push(result),
            Ok(None) => {}
            Err(e) => {
                token.cancel();
                return Err(HatchError::Worker(e.to_string()));
            }
        }
    }

    let published_channels = {
        let mut published = inner.results.write();
        if token.is_cancelled() || finished.len() != channels.len() {
            drop(published);
            tracing::debug!("{:?} run cancelled, discarding partial results", target);
            inner.emit(SchedulerEvent::Cancelled { target });
            return Ok(RunOutcome::Cancelled);
        }
        // Channels claimed by a newer request keep that request's result
        let (fresh, stale): (Vec<_>, Vec<_>) = finished
            .into_iter()
            .partition(|r| inner.owns_channel(r.channel, seq));
        if fresh.is_empty() {
            drop(published);
            tracing::debug!("{:?} run superseded for every channel", target);
            inner.emit(SchedulerEvent::Cancelled { target });
            return Ok(RunOutcome::Cancelled);
        }
        if !stale.is_empty() {
            tracing::debug!(
                "{:?} run superseded for {:?}",
                target,
                stale.iter().map(|r| r.channel).collect::<Vec<_>>()
            );
        }
        let names: Vec<Channel> = channels
            .iter()
            .copied()
            .filter(|&c| fresh.iter().any(|r| r.channel == c))
            .collect();
        let mut next: BTreeMap<Channel, ChannelResult> = (**published).clone();
        for result in fresh {
            next.insert(result.channel, result);
        }
        *published = Arc::new(next);
        names
    };

    tracing::info!(
        "{:?} run finished for {} channel(s) in {:?}",
        target,
        published_channels.len(),
        started.elapsed()
    );
    inner.emit(SchedulerEvent::Completed {
        target,
        channels: published_channels.clone(),
    });
    Ok(RunOutcome::Completed(published_channels))
}

fn skip(inner: &Inner, target: RunTarget, reason: SkipReason) -> RunOutcome {
    tracing::debug!("{:?} run skipped: {:?}", target, reason);
    inner.emit(SchedulerEvent::Skipped { target, reason });
    RunOutcome::Skipped(reason)
}

/// Process one channel in batches, yielding when the time budget runs out.
///
/// Returns `None` when cancelled.
async fn run_channel(
    inner: Arc<Inner>,
    pipeline: Arc<HatchPipeline>,
    channel: Channel,
    map: Arc<IntensityMap>,
    token: CancellationToken,
) -> Option<ChannelResult> {
    let config = inner.config;
    let lines = pipeline.scan_lines(channel);
    let total = lines.len();
    let mut raw = Vec::new();
    let mut done = 0usize;
    let mut slice_started = Instant::now();

    for batch in lines.chunks(config.batch_size.max(1)) {
        if token.is_cancelled() {
            return None;
        }
        for section in batch {
            raw.extend(pipeline.synthesize_batch(channel, std::slice::from_ref(section), &map));
            if slice_started.elapsed() >= config.time_budget {
                tokio::task::yield_now().await;
                slice_started = Instant::now();
            }
        }
        done += batch.len();
        inner.emit(SchedulerEvent::Progress {
            channel,
            done,
            total,
        });
    }

    if token.is_cancelled() {
        return None;
    }
    Some(pipeline.finish_channel(channel, total, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            debounce: Duration::from_millis(40),
            ..SchedulerConfig::default()
        }
    }

    fn scheduler() -> HatchScheduler {
        HatchScheduler::with_config(Canvas::new(20.0, 20.0).unwrap(), fast_config()).unwrap()
    }

    fn black_image() -> Arc<RasterImage> {
        Arc::new(RasterImage::filled(16, 16, [0, 0, 0, 255]).unwrap())
    }

    fn cmyk_params() -> Parameters {
        Parameters {
            line_angle: 0.0,
            ..Parameters::default()
        }
    }

    #[test]
    fn test_token() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
        assert!(token.same_as(&clone));
        assert!(!token.same_as(&CancellationToken::new()));
    }

    #[tokio::test]
    async fn test_skips_without_image() {
        let scheduler = scheduler();
        let ticket = scheduler.request(RunTarget::All, cmyk_params()).unwrap();
        assert_eq!(
            ticket.wait().await.unwrap(),
            RunOutcome::Skipped(SkipReason::NoImage)
        );
    }

    #[tokio::test]
    async fn test_skips_without_channels() {
        let scheduler = scheduler();
        scheduler.set_image(black_image());
        let params = Parameters {
            enabled_channels: Vec::new(),
            ..cmyk_params()
        };
        let ticket = scheduler.request(RunTarget::All, params).unwrap();
        assert_eq!(
            ticket.wait().await.unwrap(),
            RunOutcome::Skipped(SkipReason::NoChannels)
        );
        assert!(scheduler.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_parameters_rejected() {
        let scheduler = scheduler();
        let params = Parameters {
            max_lines_per_channel: 0,
            ..cmyk_params()
        };
        assert!(matches!(
            scheduler.request(RunTarget::All, params),
            Err(HatchError::Parameter(_))
        ));
    }

    #[tokio::test]
    async fn test_full_run_publishes_all_channels() {
        let scheduler = scheduler();
        scheduler.set_image(black_image());
        let mut events = scheduler.subscribe();

        let ticket = scheduler.request(RunTarget::All, cmyk_params()).unwrap();
        let outcome = ticket.wait().await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed(Channel::CMYK.to_vec()));

        let snapshot = scheduler.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert!(!snapshot[&Channel::Black].segments.is_empty());
        assert!(snapshot[&Channel::Cyan].segments.is_empty());

        let mut saw_started = false;
        let mut saw_completed = false;
        while let Ok(event) = events.try_recv() {
            match event {
                SchedulerEvent::Started { .. } => saw_started = true,
                SchedulerEvent::Completed { .. } => saw_completed = true,
                _ => {}
            }
        }
        assert!(saw_started && saw_completed);
    }

    #[tokio::test]
    async fn test_rapid_requests_coalesce() {
        let scheduler = scheduler();
        scheduler.set_image(black_image());

        let first = scheduler.request(RunTarget::All, cmyk_params()).unwrap();
        let second = scheduler
            .request(
                RunTarget::All,
                Parameters {
                    max_lines_per_channel: 3,
                    ..cmyk_params()
                },
            )
            .unwrap();

        assert_eq!(first.wait().await.unwrap(), RunOutcome::Cancelled);
        assert!(matches!(
            second.wait().await.unwrap(),
            RunOutcome::Completed(_)
        ));
        let snapshot = scheduler.snapshot();
        let max_sub_line = snapshot[&Channel::Black]
            .segments
            .iter()
            .map(|s| s.sub_line)
            .max()
            .unwrap();
        assert_eq!(max_sub_line, 2);
    }

    #[tokio::test]
    async fn test_channel_request_leaves_other_channels() {
        let scheduler = scheduler();
        scheduler.set_image(black_image());
        scheduler
            .request(RunTarget::All, cmyk_params())
            .unwrap()
            .wait()
            .await
            .unwrap();
        let before = scheduler.snapshot();

        let params = Parameters {
            max_lines_per_channel: 2,
            ..cmyk_params()
        };
        let outcome = scheduler
            .request(RunTarget::Channel(Channel::Black), params)
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::Completed(vec![Channel::Black]));

        let after = scheduler.snapshot();
        assert_eq!(after[&Channel::Cyan], before[&Channel::Cyan]);
        assert!(after[&Channel::Black].segments.len() < before[&Channel::Black].segments.len());
    }

    #[tokio::test]
    async fn test_disabled_channel_skipped() {
        let scheduler = scheduler();
        scheduler.set_image(black_image());
        let params = Parameters {
            enabled_channels: vec![Channel::Black],
            ..cmyk_params()
        };
        let outcome = scheduler
            .request(RunTarget::Channel(Channel::Cyan), params)
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Skipped(SkipReason::ChannelDisabled(Channel::Cyan))
        );
    }

    #[tokio::test]
    async fn test_channel_edit_wins_over_older_full_run() {
        let scheduler = scheduler();
        scheduler.set_image(black_image());

        let full = scheduler.request(RunTarget::All, cmyk_params()).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        let black = scheduler
            .request(
                RunTarget::Channel(Channel::Black),
                Parameters {
                    max_lines_per_channel: 2,
                    ..cmyk_params()
                },
            )
            .unwrap();

        assert_eq!(
            full.wait().await.unwrap(),
            RunOutcome::Completed(vec![Channel::Cyan, Channel::Magenta, Channel::Yellow])
        );
        assert_eq!(
            black.wait().await.unwrap(),
            RunOutcome::Completed(vec![Channel::Black])
        );

        let snapshot = scheduler.snapshot();
        assert_eq!(snapshot.len(), 4);
        let max_sub_line = snapshot[&Channel::Black]
            .segments
            .iter()
            .map(|s| s.sub_line)
            .max()
            .unwrap();
        assert_eq!(max_sub_line, 1);
    }

    #[tokio::test]
    async fn test_tone_changes_replace_cached_maps() {
        let scheduler = HatchScheduler::with_config(
            Canvas::new(20.0, 20.0).unwrap(),
            SchedulerConfig {
                debounce: Duration::ZERO,
                ..SchedulerConfig::default()
            },
        )
        .unwrap();
        scheduler.set_image(black_image());

        for step in 0..30 {
            let params = Parameters {
                enabled_channels: vec![Channel::Black],
                contrast: 0.5 + step as f64 * 0.1,
                ..cmyk_params()
            };
            let outcome = scheduler
                .request(RunTarget::All, params)
                .unwrap()
                .wait()
                .await
                .unwrap();
            assert_eq!(outcome, RunOutcome::Completed(vec![Channel::Black]));
        }
        assert_eq!(scheduler.inner.maps.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_keeps_published_results() {
        let scheduler = HatchScheduler::with_config(
            Canvas::new(100.0, 100.0).unwrap(),
            SchedulerConfig {
                batch_size: 1,
                time_budget: Duration::ZERO,
                debounce: Duration::ZERO,
                event_capacity: 1024,
            },
        )
        .unwrap();
        scheduler.set_image(black_image());
        let params = Parameters {
            enabled_channels: vec![Channel::Black],
            ..cmyk_params()
        };
        scheduler
            .request(RunTarget::All, params.clone())
            .unwrap()
            .wait()
            .await
            .unwrap();
        let before = scheduler.snapshot();

        let mut events = scheduler.subscribe();
        let ticket = scheduler
            .request(
                RunTarget::All,
                Parameters {
                    max_lines_per_channel: 2,
                    ..params
                },
            )
            .unwrap();
        // Yielding after every section lets the first progress report
        // arrive while the channel is still being processed
        loop {
            if let SchedulerEvent::Progress { done, total, .. } = events.recv().await.unwrap() {
                assert!(done < total);
                break;
            }
        }
        ticket.cancel();

        assert_eq!(ticket.wait().await.unwrap(), RunOutcome::Cancelled);
        assert!(Arc::ptr_eq(&before, &scheduler.snapshot()));
    }

    #[tokio::test]
    async fn test_explicit_cancel() {
        let scheduler = scheduler();
        scheduler.set_image(black_image());
        let ticket = scheduler.request(RunTarget::All, cmyk_params()).unwrap();
        scheduler.cancel(RunTarget::All);
        assert_eq!(ticket.wait().await.unwrap(), RunOutcome::Cancelled);
        assert!(scheduler.snapshot().is_empty());
    }
}
