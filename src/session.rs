//! Session registry for the grade book.
//!
//! Each session holds its own student list behind its own lock. A handler
//! loads the session at the start of a request and keeps it locked until the
//! returned [`Session`] is dropped, so concurrent requests for the same
//! session run one after another and never lose each other's changes.
//! Sessions idle for longer than the TTL are evicted by a background task.

use crate::models::Student;
use crate::models::gradebook::seed_students;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

/// Default idle lifetime of a session in seconds.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "probe_session";

/// Cleanup interval for expired sessions.
const CLEANUP_INTERVAL_SECS: u64 = 60;

#[derive(Debug)]
struct SessionEntry {
    students: Vec<Student>,
    last_seen: Instant,
}

impl SessionEntry {
    fn seeded() -> Self {
        Self {
            students: seed_students(),
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() > ttl
    }
}

/// A locked session, exclusive to one request until dropped.
#[derive(Debug)]
pub struct Session {
    id: String,
    /// True when the client has to be told the id
    is_new: bool,
    entry: OwnedMutexGuard<SessionEntry>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn students(&self) -> &[Student] {
        &self.entry.students
    }

    pub fn add_student(&mut self, student: Student) {
        self.entry.students.push(student);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.entry.last_seen = Instant::now();
    }
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<SessionEntry>>>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Lock the session for `id`, or start a seeded one if it is unknown or expired.
    pub async fn load(&self, id: Option<&str>) -> Session {
        if let Some(id) = id {
            let entry = self.sessions.read().await.get(id).cloned();
            if let Some(entry) = entry {
                let entry = entry.lock_owned().await;
                if !entry.is_expired(self.ttl) {
                    return Session {
                        id: id.to_string(),
                        is_new: false,
                        entry,
                    };
                }
            }
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        let entry = Arc::new(Mutex::new(SessionEntry::seeded()));
        let guard = entry.clone().lock_owned().await;
        self.sessions.write().await.insert(id.clone(), entry);
        debug!(session_id = %id, "Starting new session");
        Session {
            id,
            is_new: true,
            entry: guard,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove sessions idle for longer than the TTL. Sessions locked by a
    /// request are in use and kept. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(entry) => !entry.is_expired(self.ttl),
            Err(_) => true,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Expired sessions removed");
        }
        removed
    }

    /// Start a background task to clean up expired sessions.
    ///
    /// This should be called once when the server starts.
    pub fn start_cleanup_task(self) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
            loop {
                interval.tick().await;
                self.cleanup_expired().await;
            }
        });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_session_is_seeded() {
        let store = SessionStore::default();
        let session = store.load(Some("nope")).await;
        assert!(session.is_new());
        assert_eq!(session.students().len(), 3);
        assert_ne!(session.id(), "nope");
    }

    #[tokio::test]
    async fn test_changes_persist_across_loads() {
        let store = SessionStore::default();
        let mut session = store.load(None).await;
        session.add_student(Student::new("Dana", [5.0, 5.0, 5.0]));
        let id = session.id().to_string();
        drop(session);

        let loaded = store.load(Some(&id)).await;
        assert!(!loaded.is_new());
        assert_eq!(loaded.students().len(), 4);
        assert_eq!(loaded.students()[3].name, "Dana");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::default();
        let mut first = store.load(None).await;
        first.add_student(Student::new("Dana", [1.0, 1.0, 1.0]));
        let first_id = first.id().to_string();
        drop(first);

        let second = store.load(None).await;
        let second_id = second.id().to_string();
        drop(second);

        assert_ne!(first_id, second_id);
        assert_eq!(store.load(Some(&second_id)).await.students().len(), 3);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_additions_are_not_lost() {
        let store = SessionStore::default();
        let id = store.load(None).await.id().to_string();

        let mut handles = Vec::new();
        for i in 0..200 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let mut session = store.load(Some(&id)).await;
                tokio::task::yield_now().await;
                session.add_student(Student::new(format!("S{i}"), [1.0, 2.0, 3.0]));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.load(Some(&id)).await.students().len(), 203);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_locked_session_survives_cleanup() {
        let store = SessionStore::new(Duration::from_millis(10));
        let session = store.load(None).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.cleanup_expired().await, 0);
        drop(session);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_removed() {
        let store = SessionStore::new(Duration::from_millis(10));
        let id = store.load(None).await.id().to_string();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(store.load(Some(&id)).await.is_new());
        // The expired entry and the replacement created by the load above
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.cleanup_expired().await, 2);
        assert!(store.is_empty().await);
    }
}
