// ============================================================================
// Structure : Notification
// ============================================================================
// Message éphémère ("toast") affiché dans le footer après une action
// ============================================================================

use chrono::{DateTime, Duration, Utc};

/// Durée d'affichage d'une notification (2 secondes)
pub const NOTIFICATION_TTL_MS: i64 = 2000;

/// Niveau d'une notification (détermine la couleur)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// Toast affiché à l'utilisateur
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub level: NotificationLevel,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl Notification {
    pub fn new(title: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            title: title.into(),
            level,
            created_at: Utc::now(),
            ttl: Duration::milliseconds(NOTIFICATION_TTL_MS),
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(title, NotificationLevel::Success)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(title, NotificationLevel::Info)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(title, NotificationLevel::Error)
    }

    /// Vérifie si la notification doit disparaître à l'instant `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let toast = Notification::success("Added to favorites");
        assert!(!toast.is_expired(toast.created_at));
        assert!(!toast.is_expired(toast.created_at + Duration::milliseconds(1999)));
        assert!(toast.is_expired(toast.created_at + Duration::milliseconds(2000)));
    }
}
