//! User-visible notifications raised by the response interceptor.

/// Sink for error notifications.
///
/// The transport calls this itself, so every call site gets the same error
/// visibility without repeating it.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Default notifier: reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        tracing::error!(target: "sync_viewer::notify", "{}", message);
    }
}
