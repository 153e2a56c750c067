//! Reminder notifications
//!
//! The engine only ever cancels reminders; scheduling belongs to the
//! screens that create tasks. [`LocalNotifier`] is an owned, in-process
//! scheduler: create it, share it, and dispose of it when the session ends.

use crate::error::NotifyError;
use async_trait::async_trait;
use garden_assistant_shared::Task;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Reminder scheduler
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Schedule a reminder for a task, returning its id
    async fn schedule_for_task(&self, task: &Task) -> Option<String>;

    async fn cancel(&self, notification_id: &str) -> Result<(), NotifyError>;

    async fn cancel_all(&self) -> Result<(), NotifyError>;
}

/// In-memory reminder scheduler
#[derive(Debug)]
pub struct LocalNotifier {
    /// `None` once disposed
    scheduled: Mutex<Option<HashMap<String, Task>>>,
}

impl Default for LocalNotifier {
    fn default() -> Self {
        Self {
            scheduled: Mutex::new(Some(HashMap::new())),
        }
    }
}

impl LocalNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of reminders still pending
    pub async fn pending(&self) -> Vec<String> {
        let scheduled = self.scheduled.lock().await;
        let mut ids: Vec<String> = scheduled
            .as_ref()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub async fn is_scheduled(&self, notification_id: &str) -> bool {
        self.scheduled
            .lock()
            .await
            .as_ref()
            .map(|map| map.contains_key(notification_id))
            .unwrap_or(false)
    }

    /// Register a reminder under a known id
    ///
    /// Used when the server created the reminder and returned its id.
    pub async fn track(&self, notification_id: impl Into<String>, task: Task) -> Result<(), NotifyError> {
        let mut scheduled = self.scheduled.lock().await;
        let map = scheduled.as_mut().ok_or(NotifyError::Disposed)?;
        map.insert(notification_id.into(), task);
        Ok(())
    }

    /// Drop all reminders and refuse further use
    pub async fn dispose(&self) {
        let mut scheduled = self.scheduled.lock().await;
        if let Some(map) = scheduled.take() {
            debug!(count = map.len(), "Disposed notifier");
        }
    }
}

#[async_trait]
impl Notifier for LocalNotifier {
    async fn schedule_for_task(&self, task: &Task) -> Option<String> {
        if task.completed {
            return None;
        }
        let mut scheduled = self.scheduled.lock().await;
        let map = scheduled.as_mut()?;
        let id = Uuid::new_v4().to_string();
        map.insert(id.clone(), task.clone());
        debug!(task_id = %task.id, notification_id = %id, due = %task.due_date, "Scheduled reminder");
        Some(id)
    }

    async fn cancel(&self, notification_id: &str) -> Result<(), NotifyError> {
        let mut scheduled = self.scheduled.lock().await;
        let map = scheduled.as_mut().ok_or(NotifyError::Disposed)?;
        map.remove(notification_id)
            .map(|_| debug!(notification_id, "Cancelled reminder"))
            .ok_or_else(|| NotifyError::NotFound(notification_id.to_string()))
    }

    async fn cancel_all(&self) -> Result<(), NotifyError> {
        let mut scheduled = self.scheduled.lock().await;
        let map = scheduled.as_mut().ok_or(NotifyError::Disposed)?;
        map.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use garden_assistant_shared::ActionType;

    fn task(completed: bool) -> Task {
        Task {
            id: "t1".to_string(),
            user_plant_id: "p1".to_string(),
            task_type: ActionType::Water,
            due_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            completed,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_schedule_and_cancel() {
        let notifier = LocalNotifier::new();
        let id = notifier.schedule_for_task(&task(false)).await.unwrap();
        assert!(notifier.is_scheduled(&id).await);

        notifier.cancel(&id).await.unwrap();
        assert!(!notifier.is_scheduled(&id).await);
        assert_eq!(
            notifier.cancel(&id).await,
            Err(NotifyError::NotFound(id.clone()))
        );
    }

    #[tokio::test]
    async fn test_completed_task_is_not_scheduled() {
        let notifier = LocalNotifier::new();
        assert!(notifier.schedule_for_task(&task(true)).await.is_none());
        assert!(notifier.pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let notifier = LocalNotifier::new();
        notifier.schedule_for_task(&task(false)).await;
        notifier.track("n-server", task(false)).await.unwrap();
        assert_eq!(notifier.pending().await.len(), 2);
        notifier.cancel_all().await.unwrap();
        assert!(notifier.pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_disposed_notifier_refuses_use() {
        let notifier = LocalNotifier::new();
        notifier.track("n1", task(false)).await.unwrap();
        notifier.dispose().await;

        assert_eq!(notifier.cancel("n1").await, Err(NotifyError::Disposed));
        assert!(notifier.schedule_for_task(&task(false)).await.is_none());
        assert!(notifier.pending().await.is_empty());
    }
}
