//! The [`Tracker`]: completion and measurement state plus where it lives.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::local::{GuestState, LocalStore};
use super::remote::RemoteStore;
use super::{SyncError, SyncEvent, SyncMachine, SyncState};
use crate::measurements::{MeasurementsByWeek, WeeklyMeasurements, validate_week_index};
use crate::plan::PlanDay;
use crate::progress::{CompletionMap, ProgressSummary, WeekAggregator};
use crate::store::User;

/// Result of a write as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Guest mode: written to the device.
    SavedLocally,
    /// Signed in: written to the server.
    Saved,
    /// Signed in: the server write failed.
    Failed,
}

impl SaveStatus {
    pub fn message(self) -> &'static str {
        match self {
            Self::SavedLocally => "Saved locally",
            Self::Saved => "Saved",
            Self::Failed => "Save failed",
        }
    }
}

/// Owns the visible completion and measurement maps and keeps them in the
/// right place: the local store for guests, the remote store once signed in.
pub struct Tracker<L> {
    local: L,
    remote: Option<Arc<dyn RemoteStore>>,
    state: SyncState,
    user: Option<User>,
    completions: CompletionMap,
    measurements: MeasurementsByWeek,
}

impl<L: LocalStore> Tracker<L> {
    /// A tracker in [`SyncState::Loading`]. Call [`Tracker::load`] next.
    pub fn new(local: L, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        Self {
            local,
            remote,
            state: SyncState::Loading,
            user: None,
            completions: CompletionMap::new(),
            measurements: MeasurementsByWeek::new(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn completions(&self) -> &CompletionMap {
        &self.completions
    }

    pub fn measurements(&self) -> &MeasurementsByWeek {
        &self.measurements
    }

    /// Resolve the session and load state from wherever it lives.
    pub async fn load(&mut self) -> Result<SyncState, SyncError> {
        if self.state != SyncState::Loading {
            return Err(SyncError::InvalidTransition {
                from: self.state,
                event: SyncEvent::NoSession,
            });
        }

        let Some(remote) = self.remote.clone() else {
            return self.enter_guest(SyncEvent::NoSession).await;
        };

        match remote.current_user().await {
            Ok(None) => self.enter_guest(SyncEvent::NoSession).await,
            Err(e) => {
                warn!(error = %e, "session check failed, continuing as guest");
                self.enter_guest(SyncEvent::SessionCheckFailed).await
            }
            Ok(Some(user)) => {
                info!(user_id = %user.id, "signed in");
                self.user = Some(user);
                let fetched =
                    tokio::try_join!(remote.fetch_completions(), remote.fetch_measurements());
                match fetched {
                    Ok((completions, measurements)) => {
                        self.completions = completions;
                        self.measurements = measurements;
                        self.apply(SyncEvent::ProfileLoaded)
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to load profile data");
                        self.completions = CompletionMap::new();
                        self.measurements = MeasurementsByWeek::new();
                        self.apply(SyncEvent::ProfileLoadFailed)
                    }
                }
            }
        }
    }

    /// Flip a day's done flag.
    ///
    /// The flip is applied immediately. A failed server write restores the
    /// previous value.
    pub async fn toggle_day(&mut self, day_id: &str) -> Result<SaveStatus, SyncError> {
        let previous = self.completions.is_done(day_id);
        let next = !previous;

        match self.state {
            SyncState::Loading => Err(SyncError::NotReady),
            SyncState::Guest => {
                self.completions.set(day_id, next);
                Ok(self.persist_local().await)
            }
            SyncState::Cloud | SyncState::CloudDegraded => {
                let remote = self.remote.clone().ok_or(SyncError::NoRemote)?;
                self.completions.set(day_id, next);
                match remote.save_completion(day_id, next).await {
                    Ok(()) => self.write_succeeded(),
                    Err(e) => {
                        warn!(day_id, error = %e, "failed to save completion");
                        self.completions.set(day_id, previous);
                        self.write_failed()
                    }
                }
            }
        }
    }

    /// Store one week's measurements. The record replaces any earlier one
    /// for that week.
    pub async fn save_measurements(
        &mut self,
        week: u32,
        record: WeeklyMeasurements,
    ) -> Result<SaveStatus, SyncError> {
        let week = validate_week_index(i64::from(week))?;
        let record = record.trimmed();

        match self.state {
            SyncState::Loading => Err(SyncError::NotReady),
            SyncState::Guest => {
                self.measurements.save(week, record);
                Ok(self.persist_local().await)
            }
            SyncState::Cloud | SyncState::CloudDegraded => {
                let remote = self.remote.clone().ok_or(SyncError::NoRemote)?;
                match remote.save_measurements(week, &record).await {
                    Ok(()) => {
                        self.measurements.save(week, record);
                        self.write_succeeded()
                    }
                    Err(e) => {
                        warn!(week, error = %e, "failed to save measurements");
                        self.write_failed()
                    }
                }
            }
        }
    }

    /// A sign-in happened elsewhere: reload from the remote.
    pub async fn sign_in(&mut self) -> Result<SyncState, SyncError> {
        self.apply(SyncEvent::SignedIn)?;
        self.load().await
    }

    /// End the session and fall back to the guest state on this device.
    ///
    /// A failed remote sign-out is logged and otherwise ignored.
    pub async fn sign_out(&mut self) -> Result<SyncState, SyncError> {
        if !self.state.is_signed_in() {
            return Err(SyncError::InvalidTransition {
                from: self.state,
                event: SyncEvent::SignedOut,
            });
        }
        if let Some(remote) = self.remote.clone() {
            if let Err(e) = remote.sign_out().await {
                warn!(error = %e, "remote sign-out failed");
            }
        }
        self.enter_guest(SyncEvent::SignedOut).await
    }

    /// Weeks and counts for `plan` against the current completions.
    pub fn summary<'a>(
        &self,
        plan: &'a [PlanDay],
        aggregator: &WeekAggregator,
    ) -> ProgressSummary<'a> {
        aggregator.summarize(plan, &self.completions)
    }

    async fn enter_guest(&mut self, event: SyncEvent) -> Result<SyncState, SyncError> {
        let to = SyncMachine::next(self.state, event)?;
        let guest = self.local.load().await.unwrap_or_else(|e| {
            warn!(error = %e, "unreadable guest state, starting empty");
            GuestState::default()
        });
        self.user = None;
        self.completions = guest.completed_days;
        self.measurements = guest.measurements_by_week;
        self.state = to;
        debug!(state = %to, "guest state loaded");
        Ok(to)
    }

    async fn persist_local(&self) -> SaveStatus {
        let state = GuestState {
            completed_days: self.completions.clone(),
            measurements_by_week: self.measurements.clone(),
        };
        match self.local.save(&state).await {
            Ok(()) => SaveStatus::SavedLocally,
            Err(e) => {
                warn!(error = %e, "failed to write guest state");
                SaveStatus::Failed
            }
        }
    }

    fn write_succeeded(&mut self) -> Result<SaveStatus, SyncError> {
        if self.state == SyncState::CloudDegraded {
            self.apply(SyncEvent::WriteSucceeded)?;
        }
        Ok(SaveStatus::Saved)
    }

    fn write_failed(&mut self) -> Result<SaveStatus, SyncError> {
        if self.state == SyncState::Cloud {
            self.apply(SyncEvent::WriteFailed)?;
        }
        Ok(SaveStatus::Failed)
    }

    fn apply(&mut self, event: SyncEvent) -> Result<SyncState, SyncError> {
        let to = SyncMachine::next(self.state, event)?;
        debug!(from = %self.state, %event, %to, "sync transition");
        self.state = to;
        Ok(to)
    }
}
