//! The match scheduler.
//!
//! One tick executes exactly one process: the front process of the warrior
//! under the rotation cursor. The cursor then moves to the next warrior that
//! still has a process, so warriors alternate regardless of how many
//! processes each owns.

use crate::asm::{load, LoadError, Program};
use crate::config::MatchConfig;
use crate::vm::execute::{self, InvalidOperand};
use crate::vm::{Core, Instruction, Warrior};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// How a match ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every other warrior was eliminated.
    Winner { warrior: usize },
    /// The cycle limit ran out with these warriors still alive.
    Draw { survivors: Vec<usize> },
    /// No warrior is left. Only reachable in a solo match.
    Extinct,
}

/// Something that happened during a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// The warrior lost its last process on this cycle.
    Eliminated { warrior: usize, cycle: u64 },
}

/// An invalid operand met during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub cycle: u64,
    pub warrior: usize,
    pub pc: usize,
    pub error: InvalidOperand,
}

/// Read-only copy of the simulation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub memory: Vec<Instruction>,
    pub warriors: Vec<WarriorState>,
}

/// One warrior inside a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarriorState {
    pub id: usize,
    pub alive: bool,
    pub queue: Vec<usize>,
}

/// A running match.
#[derive(Debug, Clone)]
pub struct Mars {
    core: Core,
    warriors: Vec<Warrior>,
    cursor: usize,
    cycles: u64,
    cycle_limit: Option<u64>,
    /// Warriors at the start; a lone warrior cannot "win".
    contenders: usize,
    outcome: Option<Outcome>,
    events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
}

impl Mars {
    /// Load `programs` and prepare a match.
    pub fn new(programs: &[Program], config: &MatchConfig) -> Result<Self, LoadError> {
        let loaded = load(programs, config)?;
        Ok(Self::from_parts(loaded.core, loaded.warriors, config.cycle_limit))
    }

    /// A match over an already populated core.
    pub fn from_parts(core: Core, warriors: Vec<Warrior>, cycle_limit: Option<u64>) -> Self {
        let cursor = warriors.iter().position(Warrior::is_alive).unwrap_or(0);
        let contenders = warriors.iter().filter(|w| w.is_alive()).count();
        let outcome = (contenders == 0).then_some(Outcome::Extinct);
        Self {
            core,
            warriors,
            cursor,
            cycles: 0,
            cycle_limit,
            contenders,
            outcome,
            events: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Execute one process. Returns whether the match continues.
    pub fn tick(&mut self) -> bool {
        if self.outcome.is_some() {
            return false;
        }

        let cycle = self.cycles + 1;
        let warrior = &mut self.warriors[self.cursor];
        let id = warrior.id();
        let step = execute::execute(&mut self.core, warrior);
        let alive = warrior.is_alive();
        self.cycles = cycle;

        if let Some(step) = step {
            debug!(cycle, warrior = id, pc = step.pc, instruction = %step.instruction, "executed");
            if let Some(error) = step.fault {
                warn!(cycle, warrior = id, pc = step.pc, %error, "invalid operand");
                self.diagnostics.push(Diagnostic { cycle, warrior: id, pc: step.pc, error });
            }
        }

        if !alive {
            info!(cycle, warrior = id, "warrior eliminated");
            self.events.push(Event::Eliminated { warrior: id, cycle });
        }

        if let Some(outcome) = self.check_outcome() {
            info!(cycle, ?outcome, "match over");
            self.outcome = Some(outcome);
            return false;
        }

        self.advance();
        true
    }

    /// Tick until the match ends.
    pub fn run(&mut self) -> Outcome {
        loop {
            if let Some(outcome) = &self.outcome {
                return outcome.clone();
            }
            self.tick();
        }
    }

    fn check_outcome(&self) -> Option<Outcome> {
        let survivors: Vec<usize> = self.alive_ids().collect();
        match survivors.as_slice() {
            [] => return Some(Outcome::Extinct),
            [warrior] if self.contenders > 1 => return Some(Outcome::Winner { warrior: *warrior }),
            _ => {}
        }
        match self.cycle_limit {
            Some(limit) if self.cycles >= limit => Some(Outcome::Draw { survivors }),
            _ => None,
        }
    }

    /// Move the cursor to the next warrior with a process, wrapping.
    fn advance(&mut self) {
        let count = self.warriors.len();
        for offset in 1..=count {
            let candidate = (self.cursor + offset) % count;
            if self.warriors[candidate].is_alive() {
                self.cursor = candidate;
                return;
            }
        }
    }

    fn alive_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.warriors.iter().filter(|w| w.is_alive()).map(Warrior::id)
    }

    /// Ticks executed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// The configured cycle limit.
    pub fn cycle_limit(&self) -> Option<u64> {
        self.cycle_limit
    }

    /// How the match ended, once it has.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Eliminations so far, in order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Invalid operands met so far, in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The shared core.
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// All warriors, eliminated ones included.
    pub fn warriors(&self) -> &[Warrior] {
        &self.warriors
    }

    /// The warrior that will execute on the next tick.
    pub fn current(&self) -> Option<&Warrior> {
        match self.outcome {
            Some(_) => None,
            None => self.warriors.get(self.cursor),
        }
    }

    /// Copy out the current memory and process queues.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cycle: self.cycles,
            memory: self.core.cells().to_vec(),
            warriors: self
                .warriors
                .iter()
                .map(|w| WarriorState {
                    id: w.id(),
                    alive: w.is_alive(),
                    queue: w.queue().collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::Statement;
    use crate::vm::execute::Slot;
    use crate::vm::AddrMode::{Direct, Immediate, Indirect};
    use crate::vm::Opcode;

    fn config(size: usize, limit: u64) -> MatchConfig {
        MatchConfig::default().with_core_size(size).with_cycle_limit(Some(limit))
    }

    fn imp() -> Program {
        vec![Statement::new(Opcode::Mov, Direct, 0, Direct, 1)]
    }

    fn dat() -> Program {
        vec![Statement::new(Opcode::Dat, Immediate, 0, Immediate, 0)]
    }

    #[test]
    fn test_lone_dat_dies_on_first_cycle() {
        let mut mars = Mars::new(&[dat()], &config(100, 1000)).unwrap();
        assert!(!mars.tick());
        assert_eq!(mars.cycles(), 1);
        assert_eq!(mars.outcome(), Some(&Outcome::Extinct));
        assert_eq!(mars.events(), &[Event::Eliminated { warrior: 0, cycle: 1 }]);
        assert!(!mars.tick());
        assert_eq!(mars.cycles(), 1);
    }

    #[test]
    fn test_lone_imp_runs_until_limit() {
        let mut mars = Mars::new(&[imp()], &config(100, 250)).unwrap();
        let mut expected_pc = 0;
        while mars.current().is_some() {
            assert_eq!(mars.warriors()[0].next_pc(), Some(expected_pc));
            mars.tick();
            expected_pc = (expected_pc + 1) % 100;
        }
        assert_eq!(mars.cycles(), 250);
        assert_eq!(mars.outcome(), Some(&Outcome::Draw { survivors: vec![0] }));
        assert!(mars.events().is_empty());
    }

    #[test]
    fn test_warriors_alternate() {
        let mut mars = Mars::new(&[imp(), imp()], &config(100, 10)).unwrap();
        let order: Vec<usize> = (0..4)
            .map(|_| {
                let id = mars.current().map(Warrior::id).unwrap();
                mars.tick();
                id
            })
            .collect();
        assert_eq!(order, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_two_imps_draw_at_limit() {
        let mut mars = Mars::new(&[imp(), imp()], &config(100, 10)).unwrap();
        assert_eq!(mars.run(), Outcome::Draw { survivors: vec![0, 1] });
        assert_eq!(mars.cycles(), 10);
        assert!(mars.events().is_empty());
    }

    #[test]
    fn test_elimination_on_last_cycle_is_a_win() {
        let mut mars = Mars::new(&[imp(), dat()], &config(100, 2)).unwrap();
        assert_eq!(mars.run(), Outcome::Winner { warrior: 0 });
        assert_eq!(mars.cycles(), 2);
        assert_eq!(mars.events(), &[Event::Eliminated { warrior: 1, cycle: 2 }]);
    }

    #[test]
    fn test_process_count_does_not_buy_extra_turns() {
        // Warrior 0 splits every cycle; warrior 1 is a plain imp.
        let splitter = vec![
            Statement::new(Opcode::Spl, Direct, 0, Direct, 0),
            Statement::new(Opcode::Jmp, Direct, -1, Direct, 0),
        ];
        let mut mars = Mars::new(&[splitter, imp()], &config(100, 10)).unwrap();
        for _ in 0..3 {
            assert_eq!(mars.current().map(Warrior::id), Some(0));
            mars.tick();
            assert_eq!(mars.current().map(Warrior::id), Some(1));
            mars.tick();
        }
        assert_eq!(mars.warriors()[0].queue().collect::<Vec<_>>(), vec![0, 1, 0]);
    }

    #[test]
    fn test_spl_queues_next_and_target() {
        let program = vec![
            Statement::new(Opcode::Spl, Direct, 2, Direct, 0),
            Statement::new(Opcode::Jmp, Direct, 0, Direct, 0),
            Statement::new(Opcode::Jmp, Direct, 0, Direct, 0),
        ];
        let mut mars = Mars::new(&[program], &config(100, 10)).unwrap();
        mars.tick();
        assert_eq!(mars.warriors()[0].queue().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_dwarf_kills_dat_victim() {
        // Classic dwarf: bomb every fourth cell through an indirect pointer.
        let dwarf = vec![
            Statement::new(Opcode::Add, Immediate, "step", Direct, "bomb").labeled("top"),
            Statement::new(Opcode::Mov, Direct, "bomb", Indirect, "bomb"),
            Statement::new(Opcode::Jmp, Direct, "top", Direct, 0),
            Statement::new(Opcode::Dat, Immediate, 0, Immediate, 0).labeled("bomb"),
            Statement::equ("step", 4),
        ];
        // Victim loops in place at a cell the dwarf is guaranteed to hit.
        let victim = vec![Statement::new(Opcode::Jmp, Direct, 0, Direct, 0)];
        let cfg = config(80, 1000).with_start_positions(vec![0, 15]);

        let mut mars = Mars::new(&[dwarf, victim], &cfg).unwrap();
        let outcome = mars.run();

        assert_eq!(outcome, Outcome::Winner { warrior: 0 });
        assert!(mars.cycles() < 1000);
        assert!(matches!(mars.events(), [Event::Eliminated { warrior: 1, .. }]));
        assert_eq!(mars.core().read(15).opcode, Opcode::Dat);
    }

    #[test]
    fn test_invalid_operand_is_reported_not_fatal() {
        let program = vec![
            Statement::new(Opcode::Add, Immediate, 1, Immediate, 1),
            Statement::new(Opcode::Jmp, Direct, -1, Direct, 0),
        ];
        let mut mars = Mars::new(&[program], &config(100, 3)).unwrap();
        assert!(mars.tick());
        assert_eq!(
            mars.diagnostics(),
            &[Diagnostic {
                cycle: 1,
                warrior: 0,
                pc: 0,
                error: InvalidOperand { opcode: Opcode::Add, slot: Slot::B },
            }]
        );
        assert_eq!(mars.warriors()[0].next_pc(), Some(1));
        assert_eq!(mars.run(), Outcome::Draw { survivors: vec![0] });
        assert_eq!(mars.diagnostics().len(), 2);
    }

    #[test]
    fn test_eliminated_warrior_is_skipped() {
        let mut mars = Mars::new(&[imp(), dat(), imp()], &config(90, 20)).unwrap();
        mars.tick();
        assert!(mars.tick());
        assert_eq!(mars.events(), &[Event::Eliminated { warrior: 1, cycle: 2 }]);

        let order: Vec<usize> = (0..4)
            .map(|_| {
                let id = mars.current().map(Warrior::id).unwrap();
                mars.tick();
                id
            })
            .collect();
        assert_eq!(order, vec![2, 0, 2, 0]);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let cfg = config(500, 300).with_seed(99);
        let programs = [imp(), imp(), dat()];
        let mut first = Mars::new(&programs, &cfg).unwrap();
        let mut second = Mars::new(&programs, &cfg).unwrap();
        let a = first.run();
        let b = second.run();
        assert_eq!(a, b);
        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn test_snapshot() {
        let mut mars = Mars::new(&[imp(), dat()], &config(10, 100)).unwrap();
        let snap = mars.snapshot();
        assert_eq!(snap.cycle, 0);
        assert_eq!(snap.memory.len(), 10);
        assert_eq!(snap.warriors[1].queue, vec![5]);

        mars.run();
        let snap = mars.snapshot();
        assert_eq!(snap.cycle, 2);
        assert!(snap.warriors[0].alive);
        assert!(!snap.warriors[1].alive);
        assert!(snap.warriors[1].queue.is_empty());

        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_placement_error_is_fatal() {
        let big: Program = (0..60).map(|_| imp()[0].clone()).collect();
        let err = Mars::new(&[big.clone(), big], &config(100, 10)).unwrap_err();
        assert!(matches!(err, LoadError::Placement(_)));
    }
}
