use crate::error::AppError;
use crate::notify::{NOTIFICATION_TITLE, Notifier, notification_body};
use crate::timer::ToggleEvent;
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, task_name: &str, event: &ToggleEvent) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(NOTIFICATION_TITLE)
            .text1(task_name)
            .text2(&notification_body(event))
            .show()
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        Ok(())
    }
}
