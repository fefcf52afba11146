//! Warriors and their process queues.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A competing program: an id and a FIFO queue of program counters.
///
/// Each entry of the queue is one live process. A warrior whose queue is
/// empty has been eliminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warrior {
    id: usize,
    queue: VecDeque<usize>,
}

impl Warrior {
    /// A warrior with a single process at `start`.
    pub fn new(id: usize, start: usize) -> Self {
        Self {
            id,
            queue: VecDeque::from([start]),
        }
    }

    /// The warrior's id (its index in the program list).
    pub fn id(&self) -> usize {
        self.id
    }

    /// Does the warrior still own any process?
    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of live processes.
    pub fn process_count(&self) -> usize {
        self.queue.len()
    }

    /// The program counter that will execute next, if any.
    pub fn next_pc(&self) -> Option<usize> {
        self.queue.front().copied()
    }

    /// Remove the front process.
    pub fn pop(&mut self) -> Option<usize> {
        self.queue.pop_front()
    }

    /// Queue a process behind all existing ones.
    pub fn push(&mut self, pc: usize) {
        self.queue.push_back(pc);
    }

    /// Program counters in execution order.
    pub fn queue(&self) -> impl Iterator<Item = usize> + '_ {
        self.queue.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut w = Warrior::new(3, 10);
        assert_eq!(w.id(), 3);
        w.push(20);
        w.push(30);
        assert_eq!(w.process_count(), 3);
        assert_eq!(w.pop(), Some(10));
        assert_eq!(w.next_pc(), Some(20));
        assert_eq!(w.queue().collect::<Vec<_>>(), vec![20, 30]);
    }

    #[test]
    fn test_empty_queue_is_dead() {
        let mut w = Warrior::new(0, 5);
        assert!(w.is_alive());
        assert_eq!(w.pop(), Some(5));
        assert!(!w.is_alive());
        assert_eq!(w.pop(), None);
    }
}
