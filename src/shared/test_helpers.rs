//! In-memory fakes of the infrastructure seams, for unit tests only

use async_trait::async_trait;
use chrono::Utc;
use fake::faker::internet::en::Username;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::incidents::models::{Incident, IncidentSeverity};
use crate::features::locations::models::{GeoPoint, LocationCheckRecord, ZoneMatch};
use crate::features::locations::services::{CheckRecorder, ZoneStore};
use crate::features::notifications::clients::{DeliveryError, WebhookSender};
use crate::features::notifications::models::AlertPayload;
use crate::modules::cache::{ActiveZoneCache, CacheError, CacheResult};
use crate::modules::queue::{NotificationQueue, QueueError, QueueResult};

/// Active high-severity zone titled "Test incident"
pub fn incident_at(latitude: f64, longitude: f64, radius: f64) -> Incident {
    let now = Utc::now();
    Incident {
        id: Uuid::new_v4(),
        user_id: Username().fake(),
        latitude,
        longitude,
        title: "Test incident".to_string(),
        description: Sentence(3..8).fake(),
        severity: IncidentSeverity::High,
        radius,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Alert for one zone at the observer's own position
pub fn sample_payload(user_id: &str) -> AlertPayload {
    let zone = incident_at(10.0, 10.0, 2000.0);
    let matches = [ZoneMatch {
        zone,
        distance_meters: 0.0,
    }];

    AlertPayload::for_matches(user_id, GeoPoint::unchecked(10.0, 10.0), &matches, Utc::now())
        .expect("one match always yields a payload")
}

/// Take one unit from a countdown, returning whether one was left
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

// =============================================================================
// CACHE
// =============================================================================

pub struct InMemoryZoneCache {
    ttl: Duration,
    entry: Mutex<Option<(Vec<Incident>, Instant)>>,
    fail_gets: AtomicBool,
    fail_sets: AtomicBool,
    fail_invalidations: AtomicBool,
    invalidations: AtomicUsize,
}

impl Default for InMemoryZoneCache {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(300))
    }
}

impl InMemoryZoneCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
            fail_gets: AtomicBool::new(false),
            fail_sets: AtomicBool::new(false),
            fail_invalidations: AtomicBool::new(false),
            invalidations: AtomicUsize::new(0),
        }
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_invalidations(&self, fail: bool) {
        self.fail_invalidations.store(fail, Ordering::SeqCst);
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActiveZoneCache for InMemoryZoneCache {
    async fn get(&self) -> CacheResult<Option<Vec<Incident>>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionError("cache offline".to_string()));
        }

        let mut entry = self.entry.lock().unwrap();
        match entry.as_ref() {
            Some((_, expires_at)) if Instant::now() >= *expires_at => {
                *entry = None;
                Ok(None)
            }
            Some((zones, _)) => Ok(Some(zones.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, zones: &[Incident]) -> CacheResult<()> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(CacheError::BackendError("cache read-only".to_string()));
        }

        let active: Vec<Incident> = zones.iter().filter(|z| z.active).cloned().collect();
        *self.entry.lock().unwrap() = Some((active, Instant::now() + self.ttl));
        Ok(())
    }

    async fn invalidate(&self) -> CacheResult<()> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        if self.fail_invalidations.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionError("cache offline".to_string()));
        }

        *self.entry.lock().unwrap() = None;
        Ok(())
    }
}

// =============================================================================
// ZONE STORE / CHECK RECORDER
// =============================================================================

pub struct InMemoryZoneStore {
    zones: Mutex<Vec<Incident>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl InMemoryZoneStore {
    pub fn new(zones: Vec<Incident>) -> Self {
        Self {
            zones: Mutex::new(zones),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ZoneStore for InMemoryZoneStore {
    async fn list_active(&self) -> Result<Vec<Incident>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("zone store offline".to_string()));
        }

        Ok(self
            .zones
            .lock()
            .unwrap()
            .iter()
            .filter(|z| z.active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingCheckRecorder {
    records: Mutex<Vec<LocationCheckRecord>>,
    fail: AtomicBool,
}

impl RecordingCheckRecorder {
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<LocationCheckRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckRecorder for RecordingCheckRecorder {
    async fn record(&self, record: &LocationCheckRecord) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Internal("audit table unavailable".to_string()));
        }

        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// =============================================================================
// QUEUE
// =============================================================================

#[derive(Default)]
pub struct InMemoryNotificationQueue {
    items: Mutex<VecDeque<AlertPayload>>,
    notify: Notify,
    failing_enqueues: AtomicUsize,
    failing_dequeues: AtomicUsize,
}

impl InMemoryNotificationQueue {
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.user_id.clone())
            .collect()
    }

    pub fn fail_next_enqueues(&self, count: usize) {
        self.failing_enqueues.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_dequeues(&self, count: usize) {
        self.failing_dequeues.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationQueue for InMemoryNotificationQueue {
    async fn enqueue(&self, payload: &AlertPayload) -> QueueResult<()> {
        if take_one(&self.failing_enqueues) {
            return Err(QueueError::ConnectionError("queue offline".to_string()));
        }

        self.items.lock().unwrap().push_back(payload.clone());
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self, shutdown: &mut watch::Receiver<bool>) -> QueueResult<AlertPayload> {
        loop {
            if *shutdown.borrow() {
                return Err(QueueError::Cancelled);
            }
            if take_one(&self.failing_dequeues) {
                return Err(QueueError::ConnectionError("queue offline".to_string()));
            }

            let next = self.items.lock().unwrap().pop_front();
            if let Some(payload) = next {
                return Ok(payload);
            }

            tokio::select! {
                _ = self.notify.notified() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Err(QueueError::Cancelled);
                    }
                }
            }
        }
    }
}

// =============================================================================
// WEBHOOK
// =============================================================================

/// Sender that fails a scripted number of attempts, then succeeds
pub struct ScriptedSender {
    failures_left: AtomicU32,
    always_fail: bool,
    attempts: Mutex<Vec<Instant>>,
    delivered: Mutex<Vec<String>>,
}

impl ScriptedSender {
    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            always_fail: false,
            attempts: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing() -> Self {
        Self {
            always_fail: true,
            ..Self::failing_first(0)
        }
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn delivered_users(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookSender for ScriptedSender {
    async fn send(&self, payload: &AlertPayload) -> std::result::Result<(), DeliveryError> {
        self.attempts.lock().unwrap().push(Instant::now());

        let scripted_failure = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if self.always_fail || scripted_failure {
            return Err(DeliveryError::UnexpectedStatus(503));
        }

        self.delivered.lock().unwrap().push(payload.user_id.clone());
        Ok(())
    }
}
