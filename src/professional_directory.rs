use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::backend::{ApiError, AppointmentSource};
use crate::schedule::{Professional, ProfessionalId};

pub const PROFESSIONALS_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Default)]
struct Directory {
    professionals: Vec<Professional>,
    fetched_at: Option<Instant>,
    error: Option<String>,
}

pub struct ProfessionalDirectory {
    source: Arc<dyn AppointmentSource>,
    ttl: Duration,
    directory: Mutex<Directory>,
    // Held for the duration of a remote load.
    loading: Mutex<()>,
}

impl ProfessionalDirectory {
    pub fn new(source: Arc<dyn AppointmentSource>) -> Self {
        Self {
            source,
            ttl: PROFESSIONALS_TTL,
            directory: Mutex::new(Directory::default()),
            loading: Mutex::new(()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the cached list while it is non-empty and younger than the
    /// TTL. A caller arriving while another load is in flight waits for it
    /// and gets its result instead of starting a second request.
    pub async fn professionals(&self, force_refresh: bool) -> Result<Vec<Professional>, ApiError> {
        if !force_refresh {
            let directory = self.directory.lock().await;
            let fresh = directory.fetched_at.is_some_and(|at| at.elapsed() < self.ttl);
            if fresh && !directory.professionals.is_empty() {
                tracing::debug!("Serving {} cached professionals", directory.professionals.len());
                return Ok(directory.professionals.clone());
            }
        }

        let _load = match self.loading.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!("Waiting for professionals load in flight");
                drop(self.loading.lock().await);
                return Ok(self.directory.lock().await.professionals.clone());
            }
        };

        match self.source.fetch_professionals().await {
            Ok(professionals) => {
                let mut directory = self.directory.lock().await;
                directory.professionals = professionals.clone();
                directory.fetched_at = Some(Instant::now());
                directory.error = None;
                Ok(professionals)
            }
            Err(e) => {
                tracing::error!("Failed to load professionals: {}", e);
                self.directory.lock().await.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn reload(&self) -> Result<Vec<Professional>, ApiError> {
        self.professionals(true).await
    }

    pub async fn clear(&self) {
        *self.directory.lock().await = Directory::default();
    }

    pub async fn find_by_id(&self, id: ProfessionalId) -> Option<Professional> {
        self.directory
            .lock()
            .await
            .professionals
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn lookup(&self, id: ProfessionalId) -> Result<Option<Professional>, ApiError> {
        Ok(self.professionals(false).await?.into_iter().find(|p| p.id == id))
    }

    pub fn is_loading(&self) -> bool {
        self.loading.try_lock().is_err()
    }

    pub async fn error(&self) -> Option<String> {
        self.directory.lock().await.error.clone()
    }
}
