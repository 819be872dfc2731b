use std::path::Path;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use common::{Bar, Result};

use crate::registry::SubscriberRegistry;
use crate::source::BarSource;

/// Lazily yields the bars of `source`, one per `interval`.
///
/// The first bar is yielded immediately; each later one after a delay of
/// `interval`. The stream ends when the source is exhausted. File reads run
/// on the blocking pool so a slow disk never stalls the runtime.
pub fn paced_bars(source: BarSource, interval: Duration) -> impl Stream<Item = Bar> + Send {
    futures_util::stream::unfold((source, false), move |(source, started)| async move {
        if started {
            tokio::time::sleep(interval).await;
        }
        let (bar, source) = read_next(source).await?;
        Some((bar?, (source, true)))
    })
}

async fn read_next(mut source: BarSource) -> Option<(Option<Bar>, BarSource)> {
    match tokio::task::spawn_blocking(move || (source.next_bar(), source)).await {
        Ok(next) => Some(next),
        Err(e) => {
            warn!(error = %e, "Bar source reader failed");
            None
        }
    }
}

/// Counters reported at the end of a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishSummary {
    /// Bars read from the source and paced out.
    pub published: u64,
    /// Messages queued across all subscribers.
    pub delivered: u64,
    /// Bars that reached no subscriber at all.
    pub skipped: u64,
}

/// Replays a bar source to whoever is subscribed at each tick.
///
/// A pacing task reads and times the bars and hands them over a channel to
/// the fan-out loop, which serializes each bar once and sends it to a
/// snapshot of the registry. Nothing is buffered for future joiners.
pub struct Publisher {
    registry: SubscriberRegistry,
    interval: Duration,
}

impl Publisher {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

    pub fn new(registry: SubscriberRegistry, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Open `path` and replay it. A missing source is reported as
    /// `SourceUnavailable` before anything is broadcast.
    pub async fn replay(&self, path: impl AsRef<Path>) -> Result<PublishSummary> {
        let source = BarSource::open(path.as_ref())?;
        info!(source = %path.as_ref().display(), interval = ?self.interval, "Replaying bar source");
        self.run(source).await
    }

    /// Replay an already opened source until it is exhausted.
    pub async fn run(&self, source: BarSource) -> Result<PublishSummary> {
        let (bar_tx, mut bar_rx) = mpsc::channel::<Bar>(1);
        let interval = self.interval;

        let pacer = tokio::spawn(async move {
            let bars = paced_bars(source, interval);
            tokio::pin!(bars);
            while let Some(bar) = bars.next().await {
                if bar_tx.send(bar).await.is_err() {
                    break;
                }
            }
        });

        let mut summary = PublishSummary::default();
        while let Some(bar) = bar_rx.recv().await {
            summary.published += 1;
            if self.registry.is_empty().await {
                summary.skipped += 1;
                continue;
            }
            let message = bar.to_message()?;
            let reached = self.registry.broadcast(&message).await;
            debug!(time = bar.time, close = bar.close, subscribers = reached, "Bar broadcast");
            if reached == 0 {
                summary.skipped += 1;
            }
            summary.delivered += reached as u64;
        }

        if let Err(e) = pacer.await {
            warn!(error = %e, "Pacing task ended abnormally");
        }
        info!(
            published = summary.published,
            delivered = summary.delivered,
            skipped = summary.skipped,
            "Bar source exhausted"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use common::Error;

    const CSV: &str = "time,open,high,low,close,volume\n\
                       1,1,1,1,10,1\n\
                       2,1,1,1,11,1\n\
                       3,1,1,1,12,1\n";

    fn source() -> BarSource {
        BarSource::from_reader("inline", CSV.as_bytes())
    }

    #[tokio::test]
    async fn paced_stream_yields_bars_in_order() {
        let closes: Vec<f64> = paced_bars(source(), Duration::from_millis(1))
            .map(|bar| bar.close)
            .collect()
            .await;
        assert_eq!(closes, vec![10.0, 11.0, 12.0]);
    }

    #[tokio::test]
    async fn paced_stream_waits_between_bars() {
        let started = Instant::now();
        let count = paced_bars(source(), Duration::from_millis(20)).count().await;
        assert_eq!(count, 3);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn runs_to_completion_without_subscribers() {
        let publisher = Publisher::new(SubscriberRegistry::new(), Duration::from_millis(1));
        let summary = publisher.run(source()).await.unwrap();
        assert_eq!(
            summary,
            PublishSummary {
                published: 3,
                delivered: 0,
                skipped: 3
            }
        );
    }

    #[tokio::test]
    async fn subscribers_receive_every_bar_in_order() {
        let registry = SubscriberRegistry::new();
        let (_, mut rx) = registry.subscribe().await;
        let publisher = Publisher::new(registry, Duration::from_millis(1));

        let summary = publisher.run(source()).await.unwrap();
        assert_eq!(summary.delivered, 3);

        let mut closes = Vec::new();
        while let Ok(message) = rx.try_recv() {
            closes.push(Bar::from_message(&message).unwrap().close);
        }
        assert_eq!(closes, vec![10.0, 11.0, 12.0]);
    }

    #[tokio::test]
    async fn bars_with_only_dead_subscribers_count_as_skipped() {
        let registry = SubscriberRegistry::new();
        let (_, rx) = registry.subscribe().await;
        drop(rx);
        let publisher = Publisher::new(registry.clone(), Duration::from_millis(1));

        let summary = publisher.run(source()).await.unwrap();
        assert_eq!(summary.published, 3);
        assert_eq!(summary.delivered, 0);
        assert_eq!(summary.skipped, 3);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn missing_source_broadcasts_nothing() {
        let registry = SubscriberRegistry::new();
        let (_, mut rx) = registry.subscribe().await;
        let publisher = Publisher::new(registry, Duration::from_millis(1));

        let err = publisher.replay("/no/such/bars.csv").await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert!(rx.try_recv().is_err());
    }
}
