//! Bearing smoothing.
//!
//! A three-sample moving average suppresses GPS bearing jitter at low speed
//! while lagging at most three fixes behind.

use super::{HeadingResponse, HeadingSample};
use crate::geo::GpsCoordinate;
use crate::location::watch_stream;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Number of samples averaged.
pub const HEADING_WINDOW: usize = 3;

/// Rolling window over raw bearings.
#[derive(Debug, Default)]
pub struct HeadingAggregator {
    /// Recent samples; an unavailable marker only ever sits at the front
    window: VecDeque<HeadingSample>,
}

impl HeadingAggregator {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(HEADING_WINDOW + 1),
        }
    }

    /// Add a sample and return the smoothed heading.
    ///
    /// An unavailable sample resets the window to just that marker and is
    /// reported as [`HeadingResponse::NoGps`]. A bearing is appended, the
    /// oldest entry dropped once the window exceeds [`HEADING_WINDOW`], and
    /// the mean of all bearings in the window returned.
    pub fn push(&mut self, sample: HeadingSample) -> HeadingResponse {
        match sample {
            HeadingSample::Unavailable => {
                self.window.clear();
                self.window.push_back(sample);
                HeadingResponse::NoGps
            }
            HeadingSample::Bearing(_) => {
                self.window.push_back(sample);
                if self.window.len() > HEADING_WINDOW {
                    self.window.pop_front();
                }
                self.average()
            }
        }
    }

    /// Current smoothed heading without adding a sample.
    pub fn average(&self) -> HeadingResponse {
        let bearings: Vec<f64> = self
            .window
            .iter()
            .filter_map(|s| match s {
                HeadingSample::Bearing(b) => Some(*b),
                HeadingSample::Unavailable => None,
            })
            .collect();

        if bearings.is_empty() {
            return HeadingResponse::NoGps;
        }

        HeadingResponse::Value(bearings.iter().sum::<f64>() / bearings.len() as f64)
    }

    /// Number of entries in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

/// Turn a stream of raw samples into a stream of smoothed headings.
///
/// Consecutive identical samples are dropped before they reach the window so
/// a stationary fix does not flush the average.
pub fn aggregate_headings<S>(samples: S) -> impl Stream<Item = HeadingResponse>
where
    S: Stream<Item = HeadingSample>,
{
    samples
        .scan(None::<HeadingSample>, |previous, sample| {
            let duplicate = *previous == Some(sample);
            *previous = Some(sample);
            futures::future::ready(Some((!duplicate).then_some(sample)))
        })
        .filter_map(futures::future::ready)
        .scan(HeadingAggregator::new(), |aggregator, sample| {
            let heading = aggregator.push(sample);
            tracing::debug!("Heading value: {:?}", heading);
            futures::future::ready(Some(heading))
        })
}

/// Publish the smoothed heading of the tracked position into `output`.
pub fn spawn_heading_tracker(
    positions: watch::Receiver<Option<GpsCoordinate>>,
    output: watch::Sender<HeadingResponse>,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let samples = watch_stream(positions).map(|fix| HeadingSample::from(fix.and_then(|f| f.bearing)));
        let headings = aggregate_headings(samples);
        futures::pin_mut!(headings);

        loop {
            tokio::select! {
                heading = headings.next() => match heading {
                    Some(heading) => {
                        output.send_replace(heading);
                    }
                    None => break,
                },
                _ = shutdown.changed() => break,
            }
        }

        tracing::debug!("Heading tracker finished");
    })
}
