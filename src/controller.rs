//! Per-channel memory controller: accept/reject decisions with no timing
//! model, just enough open-row state to give writes somewhere to land.

use std::collections::HashMap;

use crate::error::FailReason;
use crate::request::MemoryRequest;

/// Accept/reject gate for one channel's memory requests.
pub trait MemoryController {
    fn is_issuable(&self, request: &MemoryRequest) -> (bool, Option<FailReason>);
    fn issue_command(&mut self, request: &MemoryRequest) -> bool;
    fn issue_atomic(&mut self, request: &MemoryRequest) -> bool;
}

/// Tracks one open row per bank. A request to the already-open row, or a
/// request opening a different row (no queue depth limit, since no
/// cycle-accurate timing is modeled here), is always issuable.
#[derive(Debug, Clone, Default)]
pub struct OpenRowController {
    open_row: HashMap<u64, u64>,
}

impl OpenRowController {
    pub fn new() -> Self {
        OpenRowController::default()
    }

    fn bank_key(request: &MemoryRequest) -> Option<u64> {
        request.translated.map(|c| c.bank)
    }
}

impl MemoryController for OpenRowController {
    fn is_issuable(&self, request: &MemoryRequest) -> (bool, Option<FailReason>) {
        if request.translated.is_none() {
            return (false, Some(FailReason::Unconfigured));
        }
        (true, None)
    }

    fn issue_command(&mut self, request: &MemoryRequest) -> bool {
        let (ok, _) = self.is_issuable(request);
        if !ok {
            return false;
        }
        if let (Some(bank), Some(coord)) = (Self::bank_key(request), request.translated) {
            self.open_row.insert(bank, coord.row);
        }
        true
    }

    fn issue_atomic(&mut self, request: &MemoryRequest) -> bool {
        self.issue_command(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Coordinate;

    fn translated(bank: u64, row: u64) -> MemoryRequest {
        let mut req = MemoryRequest::read(0, 0);
        req.translated = Some(Coordinate { bank, row, ..Default::default() });
        req
    }

    #[test]
    fn untranslated_request_is_not_issuable() {
        let controller = OpenRowController::new();
        let req = MemoryRequest::read(0, 0);
        let (ok, reason) = controller.is_issuable(&req);
        assert!(!ok);
        assert_eq!(reason, Some(FailReason::Unconfigured));
    }

    #[test]
    fn same_bank_reopen_and_new_row_are_both_issuable() {
        let mut controller = OpenRowController::new();
        assert!(controller.issue_command(&translated(0, 5)));
        assert!(controller.issue_command(&translated(0, 5)));
        assert!(controller.issue_command(&translated(0, 9)));
        assert_eq!(controller.open_row.get(&0), Some(&9));
    }
}
