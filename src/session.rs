use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::{Catalog, Page, Selection};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown session '{0}'")]
    Unknown(String),
}

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// One visitor on one page: the configurator state and the submit flag.
#[derive(Debug)]
pub struct PageSession {
    id: String,
    page: Page,
    selection: Mutex<Selection>,
    submitting: AtomicBool,
    last_seen: Mutex<Instant>,
}

/// Held while a submission is in flight. Dropping it re-enables submit,
/// whether the submission finished or failed.
#[derive(Debug)]
pub struct SubmitGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl PageSession {
    pub fn new(id: impl Into<String>, page: Page, catalog: &Catalog) -> Self {
        Self {
            id: id.into(),
            page,
            selection: Mutex::new(Selection::new(catalog, page.default_line())),
            submitting: AtomicBool::new(false),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Locks the selection. A panic elsewhere cannot leave it half-written,
    /// so a poisoned lock is still usable.
    pub fn selection(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Selection {
        self.selection().clone()
    }

    /// `None` while another submission holds the flag.
    pub fn begin_submit(&self) -> Option<SubmitGuard<'_>> {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitGuard { flag: &self.submitting })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    fn touch(&self, now: Instant) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    fn last_seen(&self) -> Instant {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idle for longer than `ttl` and not in the middle of a submission.
    fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        !self.is_submitting() && now.saturating_duration_since(self.last_seen()) > ttl
    }
}

/// Open page sessions by id. Pages that never unmount are dropped once idle
/// for `ttl`, and the oldest go first when `max_sessions` is reached.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Arc<PageSession>>>,
    counter: AtomicU64,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<PageSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self, page: Page) -> String {
        let serial = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(page.slug().as_bytes());
        hasher.update(&serial.to_le_bytes());
        hasher.update(&std::process::id().to_le_bytes());
        hasher.finalize().to_hex().as_str()[..16].to_string()
    }

    pub fn open(&self, page: Page, catalog: &Catalog) -> Arc<PageSession> {
        self.sweep(Instant::now());

        let id = self.next_id(page);
        let session = Arc::new(PageSession::new(id.clone(), page, catalog));
        let mut sessions = self.sessions();
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.last_seen())
                .map(|s| s.id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            debug!(session = %oldest, "Session limit reached, dropped oldest");
        }
        sessions.insert(id, Arc::clone(&session));
        debug!(session = %session.id, page = page.slug(), "Session opened");
        session
    }

    /// Looks a session up and marks it as seen. Expired sessions are removed
    /// and reported as unknown.
    pub fn get(&self, id: &str) -> Result<Arc<PageSession>, SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions();
        let session = sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::Unknown(id.to_string()))?;

        if session.is_idle(now, self.ttl) {
            sessions.remove(id);
            debug!(session = id, "Session expired");
            return Err(SessionError::Unknown(id.to_string()));
        }
        session.touch(now);
        Ok(session)
    }

    /// Drops every session idle at `now`. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(now, self.ttl));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Idle sessions evicted");
        }
        evicted
    }

    pub fn close(&self, id: &str) -> Result<(), SessionError> {
        self.sessions()
            .remove(id)
            .map(|_| debug!(session = id, "Session closed"))
            .ok_or_else(|| SessionError::Unknown(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_start_on_the_page_line() {
        let catalog = Catalog::builtin().unwrap();
        let registry = SessionRegistry::new();

        let acm = registry.open(Page::LandingAcm, &catalog);
        let quote = registry.open(Page::Quote, &catalog);
        assert_ne!(acm.id(), quote.id());
        assert_eq!(acm.snapshot().line().as_str(), "acm");
        assert_eq!(quote.snapshot().line().as_str(), "perfetta");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn closed_sessions_are_gone() {
        let catalog = Catalog::builtin().unwrap();
        let registry = SessionRegistry::new();
        let session = registry.open(Page::Budget, &catalog);
        let id = session.id().to_string();

        assert!(registry.get(&id).is_ok());
        registry.close(&id).unwrap();
        assert_eq!(registry.get(&id).unwrap_err(), SessionError::Unknown(id.clone()));
        assert!(registry.close(&id).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn submit_flag_is_exclusive_and_released_on_drop() {
        let catalog = Catalog::builtin().unwrap();
        let session = PageSession::new("s", Page::Quote, &catalog);

        let guard = session.begin_submit().unwrap();
        assert!(session.is_submitting());
        assert!(session.begin_submit().is_none());

        drop(guard);
        assert!(!session.is_submitting());
        assert!(session.begin_submit().is_some());
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let catalog = Catalog::builtin().unwrap();
        let registry = SessionRegistry::with_limits(Duration::from_secs(60), 100);
        let idle = registry.open(Page::Quote, &catalog);
        let id = idle.id().to_string();

        assert_eq!(registry.sweep(Instant::now()), 0);
        assert_eq!(registry.sweep(Instant::now() + Duration::from_secs(120)), 1);
        assert!(registry.is_empty());
        assert_eq!(registry.get(&id).unwrap_err(), SessionError::Unknown(id));
    }

    #[test]
    fn expired_session_is_unknown_on_lookup() {
        let catalog = Catalog::builtin().unwrap();
        let registry = SessionRegistry::with_limits(Duration::ZERO, 100);
        let session = registry.open(Page::Budget, &catalog);
        std::thread::sleep(Duration::from_millis(5));

        assert!(registry.get(session.id()).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn submitting_sessions_survive_a_sweep() {
        let catalog = Catalog::builtin().unwrap();
        let registry = SessionRegistry::with_limits(Duration::from_secs(60), 100);
        let session = registry.open(Page::Quote, &catalog);

        let _guard = session.begin_submit().unwrap();
        assert_eq!(registry.sweep(Instant::now() + Duration::from_secs(120)), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn session_count_is_capped() {
        let catalog = Catalog::builtin().unwrap();
        let registry = SessionRegistry::with_limits(Duration::from_secs(60), 2);
        let first = registry.open(Page::Quote, &catalog);
        std::thread::sleep(Duration::from_millis(2));
        let second = registry.open(Page::Quote, &catalog);
        std::thread::sleep(Duration::from_millis(2));
        let third = registry.open(Page::Quote, &catalog);

        assert_eq!(registry.len(), 2);
        assert!(registry.get(first.id()).is_err());
        assert!(registry.get(second.id()).is_ok());
        assert!(registry.get(third.id()).is_ok());
    }

    #[test]
    fn selection_changes_are_shared() {
        let catalog = Catalog::builtin().unwrap();
        let registry = SessionRegistry::new();
        let session = registry.open(Page::Quote, &catalog);

        session.selection().choose_color(&catalog, "cherry").unwrap();
        let again = registry.get(session.id()).unwrap();
        assert_eq!(again.snapshot().color().map(|c| c.name.as_str()), Some("Cereja"));
    }
}
