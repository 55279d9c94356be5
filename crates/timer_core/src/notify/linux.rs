use crate::error::AppError;
use crate::notify::{NOTIFICATION_TITLE, Notifier, notification_body};
use crate::timer::ToggleEvent;
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, task_name: &str, event: &ToggleEvent) -> Result<(), AppError> {
        Notification::new()
            .summary(&format!("{NOTIFICATION_TITLE}: {task_name}"))
            .body(&notification_body(event))
            .show()
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        Ok(())
    }
}
