//! Transient user-visible notifications in a bounded queue.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const TOAST_TTL: Duration = Duration::from_secs(5);
const CAPACITY: usize = 8;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if dq.len() == cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: Level,
    pub created: Instant,
}

#[derive(Debug, Default)]
pub struct Toasts {
    queue: VecDeque<Toast>,
}

impl Toasts {
    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        let t = Toast {
            message: message.into(),
            level,
            created: Instant::now(),
        };
        push_capped(&mut self.queue, t, CAPACITY);
    }

    pub fn expire(&mut self, now: Instant) {
        self.queue
            .retain(|t| now.saturating_duration_since(t.created) < TOAST_TTL);
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.queue.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn count(&self, level: Level) -> usize {
        self.queue.iter().filter(|t| t.level == level).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_bounded() {
        let mut t = Toasts::default();
        for i in 0..20 {
            t.push(Level::Info, format!("n{i}"));
        }
        assert_eq!(t.len(), CAPACITY);
        assert_eq!(t.latest().unwrap().message, "n19");
    }

    #[test]
    fn toasts_expire() {
        let mut t = Toasts::default();
        t.push(Level::Error, "boom");
        t.expire(Instant::now());
        assert_eq!(t.count(Level::Error), 1);
        t.expire(Instant::now() + TOAST_TTL + Duration::from_millis(1));
        assert!(t.is_empty());
    }
}
