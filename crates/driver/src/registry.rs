//! Session Registry - process-wide session table
//!
//! Maps stream ids (primary) and owner ids (secondary) to live sessions.
//! All index mutations serialize under one lock guarding both maps and the
//! pending-creation set together; the lock is held only for map operations,
//! never across I/O. There is no process-wide singleton: the registry is an
//! explicit handle passed to every entry point.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::SessionInfo;
use observability::record_session_started;
use tracing::{info, instrument};

use crate::error::DriverError;
use crate::factory;
use crate::pump;
use crate::session::Session;
use crate::stream::{self, ByteStream, InputStream};

struct RegistryState {
    by_stream: HashMap<String, Arc<Session>>,
    by_owner: HashMap<String, Arc<Session>>,
    /// Stream ids reserved by in-flight creations, so concurrent duplicate
    /// creates lose before any sink is built
    pending: HashSet<String>,
}

/// Process-wide table of live sessions
#[derive(Clone)]
pub struct SessionRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                by_stream: HashMap::new(),
                by_owner: HashMap::new(),
                pending: HashSet::new(),
            })),
        }
    }

    // A poisoned lock only means a panic while touching the maps; the maps
    // themselves stay usable.
    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a session reading from the FIFO or file at `stream_path`.
    ///
    /// Builds the durable sink first, then telemetry sinks in configuration
    /// order, then opens the input stream; any failure rolls everything back
    /// and leaves no state behind. Returns once the session is registered,
    /// not once the pump has processed anything.
    #[instrument(name = "registry_create", skip(self, info), fields(container = %info.container_id))]
    pub async fn create(
        &self,
        stream_path: &Path,
        info: SessionInfo,
    ) -> Result<Arc<Session>, DriverError> {
        let stream_id = stream_path.to_string_lossy().into_owned();
        self.reserve(&stream_id)?;

        let (durable, telemetry) = match factory::build_sinks(&info).await {
            Ok(built) => built,
            Err(err) => {
                self.release(&stream_id);
                return Err(err);
            }
        };

        let reader = match stream::open_input(stream_path).await {
            Ok(reader) => reader,
            Err(err) => {
                factory::release_sinks(&durable, &telemetry).await;
                self.release(&stream_id);
                return Err(DriverError::stream_open(stream_id, err));
            }
        };

        Ok(self.commit(stream_id, info, durable, telemetry, reader))
    }

    /// Create a session over an already open byte stream.
    ///
    /// Used by embedded hosts and tests that hold the stream themselves;
    /// semantics are identical to [`SessionRegistry::create`].
    pub async fn create_from_stream(
        &self,
        stream_id: &str,
        info: SessionInfo,
        reader: ByteStream,
    ) -> Result<Arc<Session>, DriverError> {
        self.reserve(stream_id)?;

        let (durable, telemetry) = match factory::build_sinks(&info).await {
            Ok(built) => built,
            Err(err) => {
                self.release(stream_id);
                return Err(err);
            }
        };

        Ok(self.commit(stream_id.to_string(), info, durable, telemetry, reader))
    }

    /// Create a session over an already open byte stream with caller-supplied
    /// sink adapters.
    ///
    /// For embedded hosts (and tests) that build their own sinks instead of
    /// going through the option map.
    pub fn create_with_adapters(
        &self,
        stream_id: &str,
        info: SessionInfo,
        reader: ByteStream,
        durable: contracts::SinkAdapter,
        telemetry: Vec<contracts::SinkAdapter>,
    ) -> Result<Arc<Session>, DriverError> {
        self.reserve(stream_id)?;
        Ok(self.commit(stream_id.to_string(), info, durable, telemetry, reader))
    }

    /// Destroy the session for `stream_id`.
    ///
    /// Removes it from both indices, then runs teardown synchronously: when
    /// this returns, every sink handle has been released.
    #[instrument(name = "registry_destroy", skip(self))]
    pub async fn destroy(&self, stream_id: &str) -> Result<(), DriverError> {
        let session = {
            let mut state = self.lock_state();
            let Some(session) = state.by_stream.remove(stream_id) else {
                return Err(DriverError::not_found(stream_id));
            };
            Self::remove_owner_entry(&mut state, &session);
            session
        };
        session.close().await;
        Ok(())
    }

    /// Look up the session owned by `owner_id`.
    ///
    /// A lookup racing a destroy may legitimately fail.
    pub fn lookup(&self, owner_id: &str) -> Result<Arc<Session>, DriverError> {
        self.lock_state()
            .by_owner
            .get(owner_id)
            .cloned()
            .ok_or_else(|| DriverError::not_found(owner_id))
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.lock_state().by_stream.len()
    }

    /// Whether no session is live
    pub fn is_empty(&self) -> bool {
        self.lock_state().by_stream.is_empty()
    }

    /// Best-effort drain of every live session, for process exit
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<Session>> = {
            let mut state = self.lock_state();
            state.pending.clear();
            state.by_owner.clear();
            state.by_stream.drain().map(|(_, session)| session).collect()
        };
        for session in sessions {
            session.close().await;
        }
    }

    /// Drop a session from both indices when its pump exits on its own
    pub(crate) fn detach(&self, stream_id: &str) {
        let mut state = self.lock_state();
        if let Some(session) = state.by_stream.remove(stream_id) {
            Self::remove_owner_entry(&mut state, &session);
        }
    }

    fn reserve(&self, stream_id: &str) -> Result<(), DriverError> {
        let mut state = self.lock_state();
        if state.pending.contains(stream_id) || state.by_stream.contains_key(stream_id) {
            return Err(DriverError::session_exists(stream_id));
        }
        state.pending.insert(stream_id.to_string());
        Ok(())
    }

    fn release(&self, stream_id: &str) {
        self.lock_state().pending.remove(stream_id);
    }

    fn commit(
        &self,
        stream_id: String,
        info: SessionInfo,
        durable: contracts::SinkAdapter,
        telemetry: Vec<contracts::SinkAdapter>,
        reader: ByteStream,
    ) -> Arc<Session> {
        let (input, handle) = InputStream::new(reader);
        let session = Arc::new(Session::new(
            stream_id.clone(),
            info,
            durable,
            telemetry,
            handle,
        ));

        {
            let mut state = self.lock_state();
            state.pending.remove(&stream_id);
            state.by_stream.insert(stream_id.clone(), session.clone());
            state
                .by_owner
                .insert(session.owner_id().to_string(), session.clone());
        }

        record_session_started();
        info!(
            stream = %stream_id,
            container = %session.owner_id(),
            telemetry = session.telemetry().len(),
            "session started"
        );
        tokio::spawn(pump::run(session.clone(), self.clone(), input));
        session
    }

    fn remove_owner_entry(state: &mut RegistryState, session: &Arc<Session>) {
        // Clear the secondary index only while it still points at this
        // session; a newer session may have reused the owner id.
        let points_here = state
            .by_owner
            .get(session.owner_id())
            .is_some_and(|current| Arc::ptr_eq(current, session));
        if points_here {
            state.by_owner.remove(session.owner_id());
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
