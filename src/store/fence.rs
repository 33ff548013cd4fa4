use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

/// Logical operations whose responses replace shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKey {
    FetchJobs,
    FetchApplications,
    GetJob(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    key: RequestKey,
    seq: u64,
}

#[derive(Debug, Default)]
struct Issued {
    next: u64,
    latest: HashMap<RequestKey, u64>,
}

/// Hands out increasing sequence numbers so late responses can be recognised.
///
/// Numbers come from one counter shared by every key, so a retired key never
/// reissues a number an older ticket still holds.
#[derive(Debug, Default)]
pub struct RequestFence {
    issued: Mutex<Issued>,
}

impl RequestFence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, key: RequestKey) -> Ticket {
        let mut issued = self.issued.lock().expect("request fence mutex poisoned");
        issued.next += 1;
        let seq = issued.next;
        issued.latest.insert(key, seq);
        Ticket { key, seq }
    }

    /// True while no newer ticket has been issued for the same key.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let issued = self.issued.lock().expect("request fence mutex poisoned");
        issued.latest.get(&ticket.key) == Some(&ticket.seq)
    }

    /// Forgets the key once its newest request has resolved.
    pub fn retire(&self, ticket: &Ticket) {
        let mut issued = self.issued.lock().expect("request fence mutex poisoned");
        if issued.latest.get(&ticket.key) == Some(&ticket.seq) {
            issued.latest.remove(&ticket.key);
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.issued
            .lock()
            .expect("request fence mutex poisoned")
            .latest
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let fence = RequestFence::new();
        let first = fence.issue(RequestKey::FetchJobs);
        assert!(fence.is_current(&first));
        let second = fence.issue(RequestKey::FetchJobs);
        assert!(!fence.is_current(&first));
        assert!(fence.is_current(&second));
    }

    #[test]
    fn keys_are_independent() {
        let fence = RequestFence::new();
        let jobs = fence.issue(RequestKey::FetchJobs);
        let _apps = fence.issue(RequestKey::FetchApplications);
        let _one = fence.issue(RequestKey::GetJob(Uuid::nil()));
        assert!(fence.is_current(&jobs));
    }

    #[test]
    fn retired_keys_are_forgotten_without_reviving_old_tickets() {
        let fence = RequestFence::new();
        let key = RequestKey::GetJob(Uuid::new_v4());
        let older = fence.issue(key);
        let newer = fence.issue(key);

        fence.retire(&older);
        assert_eq!(fence.tracked(), 1);
        fence.retire(&newer);
        assert_eq!(fence.tracked(), 0);

        let again = fence.issue(key);
        assert!(!fence.is_current(&older));
        assert!(!fence.is_current(&newer));
        assert!(fence.is_current(&again));
    }
}
