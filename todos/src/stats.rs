//! Dashboard statistics over the current list.
//!
//! A pure projection, recomputed on demand and never stored. "Today" is the
//! calendar day in a configurable timezone.

use crate::types::{Priority, TodoItem};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Open todos per priority
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    /// Open high-priority todos
    pub high: usize,
    /// Open medium-priority todos
    pub medium: usize,
    /// Open low-priority todos
    pub low: usize,
}

impl PriorityCounts {
    /// Count for one priority
    #[must_use]
    pub const fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    const fn increment(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }
}

/// Summary of a todo list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoStats {
    /// All todos
    pub total: usize,
    /// Completed todos
    pub completed: usize,
    /// Open todos
    pub active: usize,
    /// Completed share of all todos, 0..=100, rounded; 0 for an empty list
    pub completion_rate: u8,
    /// Open todos per priority
    pub open_by_priority: PriorityCounts,
    /// Todos completed on the current day in the configured timezone
    pub completed_today: usize,
}

impl TodoStats {
    /// Computes statistics for `todos` as of `now`
    #[must_use]
    pub fn compute(todos: &[TodoItem], now: DateTime<Utc>, timezone: Tz) -> Self {
        let today = now.with_timezone(&timezone).date_naive();
        let mut stats = Self {
            total: todos.len(),
            ..Self::default()
        };

        for todo in todos {
            if todo.completed {
                stats.completed += 1;
                let done_today = todo
                    .completed_at
                    .is_some_and(|at| at.with_timezone(&timezone).date_naive() == today);
                if done_today {
                    stats.completed_today += 1;
                }
            } else {
                stats.active += 1;
                stats.open_by_priority.increment(todo.priority);
            }
        }

        stats.completion_rate = completion_rate(stats.completed, stats.total);
        stats
    }
}

/// `completed / total` as a rounded percentage
fn completion_rate(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    // round(100c / t) == floor((200c + t) / 2t), half rounds up
    let rate = (completed * 200 + total) / (total * 2);
    u8::try_from(rate.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use crate::types::{OwnerId, TodoId, TodoPatch};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn todo(priority: Priority, completed_at: Option<DateTime<Utc>>) -> TodoItem {
        let mut item = TodoItem::new(
            TodoId::new(),
            OwnerId::new(),
            "Todo".to_string(),
            priority,
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        );
        if let Some(at) = completed_at {
            item.apply(&TodoPatch::complete(at));
        }
        item
    }

    #[test]
    fn empty_list_has_zero_rate() {
        let stats = TodoStats::compute(&[], Utc::now(), chrono_tz::Europe::London);
        assert_eq!(stats, TodoStats::default());
    }

    #[test]
    fn counts_and_rate() {
        let done = Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        let todos = vec![
            todo(Priority::High, None),
            todo(Priority::High, done),
            todo(Priority::Low, None),
        ];

        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let stats = TodoStats::compute(&todos, now, chrono_tz::Europe::London);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.completion_rate, 33);
        assert_eq!(stats.open_by_priority.get(Priority::High), 1);
        assert_eq!(stats.open_by_priority.get(Priority::Medium), 0);
        assert_eq!(stats.open_by_priority.get(Priority::Low), 1);
        assert_eq!(stats.completed_today, 1);
    }

    #[test]
    fn rate_rounds_half_up() {
        assert_eq!(completion_rate(1, 8), 13); // 12.5
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(5, 5), 100);
    }

    #[test]
    fn today_follows_the_timezone() {
        // 23:30 UTC on 30 June is already 1 July in London (BST)
        let done = Some(Utc.with_ymd_and_hms(2025, 6, 30, 23, 30, 0).unwrap());
        let todos = vec![todo(Priority::Medium, done)];
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap();

        let london = TodoStats::compute(&todos, now, chrono_tz::Europe::London);
        assert_eq!(london.completed_today, 1);

        let utc = TodoStats::compute(&todos, now, chrono_tz::UTC);
        assert_eq!(utc.completed_today, 0);
    }

    proptest! {
        #[test]
        fn totals_are_consistent(flags in proptest::collection::vec(any::<(bool, u8)>(), 0..50)) {
            let done = Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
            let todos: Vec<TodoItem> = flags
                .iter()
                .map(|(completed, p)| {
                    let priority = Priority::ALL[usize::from(*p) % 3];
                    todo(priority, completed.then_some(done).flatten())
                })
                .collect();

            let stats = TodoStats::compute(&todos, Utc::now(), chrono_tz::Europe::London);

            prop_assert_eq!(stats.total, todos.len());
            prop_assert_eq!(stats.completed + stats.active, stats.total);
            prop_assert!(stats.completion_rate <= 100);
            let open = stats.open_by_priority;
            prop_assert_eq!(open.high + open.medium + open.low, stats.active);
            if stats.completed == stats.total && stats.total > 0 {
                prop_assert_eq!(stats.completion_rate, 100);
            }
        }
    }
}
