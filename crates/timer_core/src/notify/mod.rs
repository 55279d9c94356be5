use crate::error::AppError;
use crate::timer::{ToggleEvent, ToggleKind};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "TASKTIMER_DISABLE_NOTIFICATIONS";
pub const NOTIFICATION_TITLE: &str = "tasktimer";

/// Shows a transient message after a task is started or stopped.
pub trait Notifier {
    fn notify(&self, task_name: &str, event: &ToggleEvent) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _task_name: &str, _event: &ToggleEvent) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn notification_body(event: &ToggleEvent) -> String {
    match event.kind {
        ToggleKind::Start => format!(
            "Started task that took {} minutes",
            event.total_minutes()
        ),
        ToggleKind::Stop => format!("This task took {} minutes", event.total_minutes()),
    }
}

pub fn notifier_from_env() -> Box<dyn Notifier> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Box::new(NoopNotifier);
    }

    match platform_notifier() {
        Ok(notifier) => notifier,
        Err(err) => {
            tracing::debug!(error = %err, "desktop notifications unavailable");
            Box::new(NoopNotifier)
        }
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
