//! Session lifecycle for a sensor connection
//!
//! A session tracks where a connection stands:
//! - Unverified: transport open, password not yet accepted
//! - Verified: password accepted, operations allowed
//! - Busy: a multi-frame transfer is in progress
//! - Closed: terminal after a protocol or transport failure
//!
//! Closed is terminal. A desynchronized byte stream cannot be resumed
//! mid-protocol, so the session must be rebuilt from scratch.

use std::sync::Arc;

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport open, password not verified yet
    Unverified,

    /// Password accepted, ready for operations
    Verified,

    /// A multi-frame transfer is running, no second command may start
    Busy,

    /// Terminal: the session must be rebuilt, never resumed
    Closed,
}

/// Session handle
///
/// Thread-safe and cheap to clone (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<parking_lot::RwLock<SessionState>>,
}

impl Session {
    /// Create a new unverified session
    pub fn new() -> Self {
        Self {
            state: Arc::new(parking_lot::RwLock::new(SessionState::Unverified)),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Check if operations are allowed
    pub fn is_verified(&self) -> bool {
        matches!(self.state(), SessionState::Verified)
    }

    /// Check if the session reached its terminal state
    pub fn is_closed(&self) -> bool {
        matches!(self.state(), SessionState::Closed)
    }

    /// Mark the password as accepted
    pub fn verify(&self) -> Result<()> {
        let mut state = self.state.write();

        match *state {
            SessionState::Unverified | SessionState::Verified => {
                *state = SessionState::Verified;
                Ok(())
            }
            SessionState::Busy => Err(Error::InvalidSessionState(
                "cannot verify while a transfer is in progress".into(),
            )),
            SessionState::Closed => Err(Error::SessionClosed),
        }
    }

    /// Enter the busy state for a multi-frame transfer
    pub fn begin_transfer(&self) -> Result<()> {
        let mut state = self.state.write();

        match *state {
            SessionState::Verified => {
                *state = SessionState::Busy;
                Ok(())
            }
            SessionState::Closed => Err(Error::SessionClosed),
            other => Err(Error::InvalidSessionState(format!(
                "cannot start a transfer from state: {:?}",
                other
            ))),
        }
    }

    /// Leave the busy state after a completed transfer
    pub fn end_transfer(&self) {
        let mut state = self.state.write();

        if *state == SessionState::Busy {
            *state = SessionState::Verified;
        }
    }

    /// Close the session permanently
    pub fn close(&self) {
        *self.state.write() = SessionState::Closed;
    }

    /// Require the verified state
    pub fn ensure_verified(&self) -> Result<()> {
        match self.state() {
            SessionState::Verified => Ok(()),
            SessionState::Closed => Err(Error::SessionClosed),
            SessionState::Unverified => Err(Error::InvalidSessionState(
                "password not verified".into(),
            )),
            SessionState::Busy => Err(Error::InvalidSessionState(
                "a transfer is in progress".into(),
            )),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_new() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Unverified);
        assert!(!session.is_verified());
        assert!(!session.is_closed());
    }

    #[test]
    fn test_session_verify() {
        let session = Session::new();
        session.verify().unwrap();

        assert_eq!(session.state(), SessionState::Verified);
        assert!(session.is_verified());
        assert!(session.ensure_verified().is_ok());
    }

    #[test]
    fn test_session_transfer_cycle() {
        let session = Session::new();
        session.verify().unwrap();

        session.begin_transfer().unwrap();
        assert_eq!(session.state(), SessionState::Busy);

        // No second command while busy
        assert!(session.ensure_verified().is_err());
        assert!(session.begin_transfer().is_err());

        session.end_transfer();
        assert_eq!(session.state(), SessionState::Verified);
    }

    #[test]
    fn test_session_transfer_requires_verification() {
        let session = Session::new();
        assert!(session.begin_transfer().is_err());
    }

    #[test]
    fn test_session_close_is_terminal() {
        let session = Session::new();
        session.verify().unwrap();
        session.close();

        assert!(session.is_closed());
        assert!(matches!(session.verify(), Err(Error::SessionClosed)));
        assert!(matches!(
            session.begin_transfer(),
            Err(Error::SessionClosed)
        ));
        assert!(matches!(
            session.ensure_verified(),
            Err(Error::SessionClosed)
        ));

        // end_transfer must not resurrect a closed session
        session.end_transfer();
        assert!(session.is_closed());
    }

    #[test]
    fn test_session_clone_shares_state() {
        let session1 = Session::new();
        let session2 = session1.clone();

        session1.verify().unwrap();
        assert!(session2.is_verified());

        session2.close();
        assert!(session1.is_closed());
    }
}
