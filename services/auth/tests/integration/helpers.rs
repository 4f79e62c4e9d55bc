use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use uuid::Uuid;

use keystep_auth::domain::repository::{
    DeliveryChannel, OtpRepository, SessionRepository, UserRepository,
};
use keystep_auth::domain::types::{Identity, OtpCode, OtpPurpose, Session};
use keystep_auth::error::AuthServiceError;

pub fn test_user() -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: "user@example.com".to_owned(),
        phone: Some("15550100".to_owned()),
        password: "hunter2".to_owned(),
        role: "USER".to_owned(),
        is_active: true,
    }
}

/// A LOGIN-purpose code record expiring `ttl` from now.
pub fn test_code(user_id: Uuid, target: &str, code: &str, ttl: Duration) -> OtpCode {
    let now = Utc::now();
    OtpCode {
        id: Uuid::new_v4(),
        user_id,
        target: target.to_owned(),
        purpose: OtpPurpose::Login,
        code: code.to_owned(),
        attempts: 0,
        origin_ip: None,
        expires_at: now + ttl,
        used_at: None,
        created_at: now,
    }
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockUserRepo {
    pub users: Arc<Vec<Identity>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<Identity>) -> Self {
        Self {
            users: Arc::new(users),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_email(
        &self,
        email: &str,
        role: &str,
    ) -> Result<Option<Identity>, AuthServiceError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email && u.role == role)
            .cloned())
    }

    async fn find_by_phone(
        &self,
        phone: &str,
        role: &str,
    ) -> Result<Option<Identity>, AuthServiceError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.phone.as_deref() == Some(phone) && u.role == role)
            .cloned())
    }
}

// ── MockOtpRepo ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockOtpRepo {
    pub codes: Arc<Mutex<Vec<OtpCode>>>,
}

impl MockOtpRepo {
    pub fn new(codes: Vec<OtpCode>) -> Self {
        Self {
            codes: Arc::new(Mutex::new(codes)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Shared handle to the stored records for post-execution inspection.
    pub fn codes_handle(&self) -> Arc<Mutex<Vec<OtpCode>>> {
        Arc::clone(&self.codes)
    }
}

impl OtpRepository for MockOtpRepo {
    async fn create(&self, code: &OtpCode) -> Result<(), AuthServiceError> {
        self.codes.lock().unwrap().push(code.clone());
        Ok(())
    }

    async fn find_latest(
        &self,
        user_id: Uuid,
        target: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpCode>, AuthServiceError> {
        // Insertion order breaks created_at ties, mirroring the store's
        // newest-record-wins read.
        let codes = self.codes.lock().unwrap();
        Ok(codes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.user_id == user_id && c.target == target && c.purpose == purpose)
            .max_by_key(|(i, c)| (c.created_at, *i))
            .map(|(_, c)| c.clone()))
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let mut codes = self.codes.lock().unwrap();
        match codes.iter_mut().find(|c| c.id == id) {
            Some(c) if c.used_at.is_none() => {
                c.used_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ── MockSessionRepo ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockSessionRepo {
    pub sessions: Arc<Mutex<Vec<Session>>>,
}

impl MockSessionRepo {
    pub fn empty() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn sessions_handle(&self) -> Arc<Mutex<Vec<Session>>> {
        Arc::clone(&self.sessions)
    }
}

impl SessionRepository for MockSessionRepo {
    async fn create(&self, session: &Session) -> Result<(), AuthServiceError> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, AuthServiceError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn revoke(&self, id: Uuid) -> Result<(), AuthServiceError> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(s) = sessions.iter_mut().find(|s| s.id == id) {
            s.is_active = false;
            s.last_activity_at = Utc::now();
        }
        Ok(())
    }

    async fn revoke_all(&self, user_id: Uuid) -> Result<(), AuthServiceError> {
        let mut sessions = self.sessions.lock().unwrap();
        for s in sessions.iter_mut().filter(|s| s.user_id == user_id) {
            s.is_active = false;
            s.last_activity_at = Utc::now();
        }
        Ok(())
    }
}

// ── MockDelivery ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockDelivery {
    pub fail: bool,
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockDelivery {
    pub fn ok() -> Self {
        Self {
            fail: false,
            sent: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Arc::new(Mutex::new(vec![])),
        }
    }

    /// `(target, code)` pairs this channel delivered.
    pub fn sent_handle(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.sent)
    }
}

impl DeliveryChannel for MockDelivery {
    async fn send_code(
        &self,
        target: &str,
        code: &str,
        _purpose: OtpPurpose,
    ) -> Result<(), anyhow::Error> {
        if self.fail {
            return Err(anyhow::anyhow!("provider unavailable"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((target.to_owned(), code.to_owned()));
        Ok(())
    }
}
