pub mod form_feedback;
pub mod system_notifier;
pub mod toast_service;

pub use form_feedback::FormFeedback;
pub use system_notifier::{NotifyOutcome, SystemNotifier};
pub use toast_service::ToastService;
