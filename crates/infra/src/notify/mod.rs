//! Low-stock notification path: the dispatcher boundary and the notifier
//! that decides when to use it.

pub mod dispatcher;
pub mod low_stock;

pub use dispatcher::{
    HttpNotificationDispatcher, LoggingDispatcher, NotificationDispatcher, NotifyError,
    RecordingDispatcher, TemplateFields,
};
pub use low_stock::LowStockNotifier;
