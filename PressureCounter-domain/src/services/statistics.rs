use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use pressure_counter_data::{MeasurementRepository, Statistics, TimeWindow};

use crate::errors::ServiceError;

/// Statistics of the week, month and year ending at the last refresh
///
/// A period is `None` until the first refresh has completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodStatistics {
    pub week: Option<Statistics>,
    pub month: Option<Statistics>,
    pub year: Option<Statistics>,
    /// Instant the periods end at, in milliseconds
    pub computed_at: Option<i64>,
}

impl PeriodStatistics {
    pub fn for_window(&self, window: TimeWindow) -> Option<&Statistics> {
        match window {
            TimeWindow::Week => self.week.as_ref(),
            TimeWindow::Month => self.month.as_ref(),
            TimeWindow::Year => self.year.as_ref(),
        }
    }
}

struct Inner {
    repository: MeasurementRepository,
    state: watch::Sender<PeriodStatistics>,
    generation: AtomicU64,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

/// Period statistics kept up to date on request
///
/// Each refresh takes a generation number and publishes only if no newer
/// refresh started meanwhile, so a slow computation never overwrites the
/// result of a later one.
#[derive(Clone)]
pub struct StatisticsService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for StatisticsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsService")
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl StatisticsService {
    pub fn new(repository: MeasurementRepository) -> Self {
        let (state, _) = watch::channel(PeriodStatistics::default());
        Self {
            inner: Arc::new(Inner {
                repository,
                state,
                generation: AtomicU64::new(0),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Last published statistics
    pub fn current(&self) -> PeriodStatistics {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every published refresh
    pub fn subscribe(&self) -> watch::Receiver<PeriodStatistics> {
        self.inner.state.subscribe()
    }

    /// Recompute all periods ending now
    ///
    /// Returns the computed values even when a newer refresh superseded
    /// this one and they were not published.
    pub async fn refresh(&self) -> Result<PeriodStatistics, ServiceError> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let repository = &self.inner.repository;
        let now = repository.now_millis();

        let (week, month, year) = futures::try_join!(
            repository.statistics(repository.window_start(TimeWindow::Week), now),
            repository.statistics(repository.window_start(TimeWindow::Month), now),
            repository.statistics(repository.window_start(TimeWindow::Year), now),
        )?;

        let computed = PeriodStatistics {
            week: Some(week),
            month: Some(month),
            year: Some(year),
            computed_at: Some(now),
        };

        if self.inner.generation.load(Ordering::SeqCst) == generation {
            self.inner.state.send_replace(computed.clone());
            debug!("Published statistics generation {}", generation);
        } else {
            info!("Discarding superseded statistics generation {}", generation);
        }

        Ok(computed)
    }

    /// Start a refresh in the background, aborting the previous one
    pub fn spawn_refresh(&self) {
        let service = self.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = service.refresh().await {
                error!("Statistics refresh failed: {}", e);
            }
        });

        let mut in_flight = match self.inner.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = in_flight.replace(handle) {
            previous.abort();
        }
    }
}
