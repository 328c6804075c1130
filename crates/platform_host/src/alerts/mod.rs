//! User-visible alert contracts and adapters.

use std::{cell::RefCell, rc::Rc};

/// Host service for blocking user-facing alerts raised at the presentation boundary.
pub trait AlertService {
    /// Displays `message` to the user.
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
/// Alert service that drops every message.
pub struct NoopAlertService;

impl AlertService for NoopAlertService {
    fn alert(&self, _message: &str) {}
}

#[derive(Debug, Clone, Default)]
/// Alert service that records messages for inspection.
pub struct MemoryAlertService {
    messages: Rc<RefCell<Vec<String>>>,
}

impl MemoryAlertService {
    /// Returns every recorded message in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl AlertService for MemoryAlertService {
    fn alert(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_alerts_record_in_order() {
        let alerts = MemoryAlertService::default();
        let alerts_obj: &dyn AlertService = &alerts;
        alerts_obj.alert("first");
        alerts_obj.alert("second");
        assert_eq!(alerts.messages(), vec!["first", "second"]);
    }
}
