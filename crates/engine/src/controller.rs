//! Timed driver around the pure engine.
//!
//! A front-end calls `roll` and `select_piece` on user input and `tick` from
//! its frame or timer loop. The controller owns the `GameState` and at most
//! one deferred transition: the die settling after its animation, or the turn
//! passing after a short pause. Time comes from an injected [`Clock`] and dice
//! from an injected [`Die`], so the whole flow runs deterministically in tests.

use std::cell::Cell;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::{
    advance_turn, begin_roll, legal_moves, reset, settle_roll, try_apply_move, GameState, MoveOutcome,
    NextStep, Phase, PieceId, Rules, DIE_FACES,
};

/// Monotonic time source
pub trait Clock {
    /// Time elapsed since some fixed origin
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction
#[derive(Clone, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Source of die faces
pub trait Die {
    /// A face in 1..=6
    fn roll(&mut self) -> u8;
}

/// Fair six-sided die
#[derive(Clone, Debug)]
pub struct RandomDie {
    rng: StdRng,
}

impl RandomDie {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Die for RandomDie {
    fn roll(&mut self) -> u8 {
        self.rng.random_range(1..=DIE_FACES)
    }
}

/// Animation and pause lengths
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    /// How long the die tumbles before it settles
    pub roll_animation: Duration,
    /// How often the tumbling face changes
    pub dice_flicker: Duration,
    /// Pause before skipping a turn with no legal move
    pub skip_delay: Duration,
    /// Pause after a move before the next color's turn
    pub move_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            roll_animation: Duration::from_millis(800),
            dice_flicker: Duration::from_millis(100),
            skip_delay: Duration::from_millis(1000),
            move_delay: Duration::from_millis(500),
        }
    }
}

impl ControllerConfig {
    /// No animation or pauses; every deferred step fires on the next tick
    pub fn instant() -> Self {
        Self {
            roll_animation: Duration::ZERO,
            dice_flicker: Duration::ZERO,
            skip_delay: Duration::ZERO,
            move_delay: Duration::ZERO,
        }
    }
}

/// A transition waiting on the clock
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Deferred {
    SettleRoll,
    AdvanceTurn,
}

#[derive(Copy, Clone, Debug)]
struct Pending {
    due: Duration,
    action: Deferred,
}

pub struct GameController<C: Clock, D: Die = RandomDie> {
    state: GameState,
    config: ControllerConfig,
    clock: C,
    die: D,
    pending: Option<Pending>,
    flicker: Option<u8>,
    last_flicker: Duration,
}

impl<C: Clock, D: Die> GameController<C, D> {
    pub fn new(rules: Rules, config: ControllerConfig, clock: C, die: D) -> Self {
        Self::from_state(crate::new_game(rules), config, clock, die)
    }

    /// Resume from an existing state. Any roll in progress is settled on the next tick.
    pub fn from_state(state: GameState, config: ControllerConfig, clock: C, die: D) -> Self {
        let mut controller = Self {
            state,
            config,
            clock,
            die,
            pending: None,
            flicker: None,
            last_flicker: Duration::ZERO,
        };
        let now = controller.clock.now();
        match controller.state.phase() {
            Phase::Rolling => controller.schedule(now, Deferred::SettleRoll),
            Phase::TurnEnding(_) => controller.schedule(now, Deferred::AdvanceTurn),
            _ => {}
        }
        controller
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn pending(&self) -> Option<Deferred> {
        self.pending.map(|p| p.action)
    }

    /// When the pending transition fires
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.map(|p| p.due)
    }

    /// Time left before the pending transition fires; zero once it is due
    pub fn time_until_deadline(&self) -> Option<Duration> {
        let due = self.next_deadline()?;
        Some(due.saturating_sub(self.clock.now()))
    }

    /// Face shown while the die tumbles
    pub fn flicker_value(&self) -> Option<u8> {
        self.flicker
    }

    /// Pieces the current color may select right now
    pub fn legal_moves(&self) -> Vec<PieceId> {
        legal_moves(&self.state)
    }

    fn schedule(&mut self, due: Duration, action: Deferred) {
        self.pending = Some(Pending { due, action });
    }

    /// Start the roll animation. Returns false if rolling is not allowed now.
    pub fn roll(&mut self) -> bool {
        match begin_roll(&self.state) {
            Ok(next) => {
                self.state = next;
                let now = self.clock.now();
                self.schedule(now + self.config.roll_animation, Deferred::SettleRoll);
                self.flicker = Some(1);
                self.last_flicker = now;
                true
            }
            Err(error) => {
                debug!(%error, color = %self.state.current_turn, "roll ignored");
                false
            }
        }
    }

    /// Move a piece with the settled roll. Invalid selections are ignored.
    pub fn select_piece(&mut self, id: PieceId) -> Option<MoveOutcome> {
        match try_apply_move(&self.state, id) {
            Ok(outcome) => {
                self.state = outcome.state.clone();
                if outcome.next == NextStep::AdvanceTurn {
                    let now = self.clock.now();
                    self.schedule(now + self.config.move_delay, Deferred::AdvanceTurn);
                }
                Some(outcome)
            }
            Err(error) => {
                debug!(%error, piece = id, "piece selection ignored");
                None
            }
        }
    }

    /// Fire every deferred transition that is due. Returns true if the game
    /// state changed.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        let mut changed = false;

        while let Some(pending) = self.pending.filter(|p| p.due <= now) {
            self.pending = None;
            self.fire(pending);
            changed = true;
        }

        if self.state.rolling && now >= self.last_flicker + self.config.dice_flicker {
            self.flicker = Some(self.flicker.map_or(1, |face| face % DIE_FACES + 1));
            self.last_flicker = now;
        }

        changed
    }

    fn fire(&mut self, pending: Pending) {
        match pending.action {
            Deferred::SettleRoll => {
                let value = self.die.roll();
                match settle_roll(&self.state, value) {
                    Ok(next) => {
                        self.state = next;
                        self.flicker = None;
                        debug!(color = %self.state.current_turn, value, can_move = self.state.can_move, "die settled");
                        if let Phase::TurnEnding(_) = self.state.phase() {
                            // chained off the settle time so a late tick catches up
                            self.schedule(pending.due + self.config.skip_delay, Deferred::AdvanceTurn);
                        }
                    }
                    Err(error) => debug!(%error, value, "settle ignored"),
                }
            }
            Deferred::AdvanceTurn => {
                self.state = advance_turn(std::mem::take(&mut self.state));
            }
        }
    }

    /// Start over. Any pending transition is dropped.
    pub fn reset(&mut self) {
        self.state = reset(std::mem::take(&mut self.state));
        self.pending = None;
        self.flicker = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_piece_invariants, Color, PieceState};
    use std::collections::VecDeque;

    /// Die that rolls a fixed script
    struct Loaded(VecDeque<u8>);

    impl Loaded {
        fn new(faces: &[u8]) -> Self {
            Self(faces.iter().copied().collect())
        }
    }

    impl Die for Loaded {
        fn roll(&mut self) -> u8 {
            self.0.pop_front().expect("loaded die ran out of faces")
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn controller(faces: &[u8]) -> GameController<ManualClock, Loaded> {
        GameController::new(
            Rules::default(),
            ControllerConfig::default(),
            ManualClock::new(),
            Loaded::new(faces),
        )
    }

    #[test]
    fn test_roll_settles_after_animation() {
        let mut c = controller(&[6]);
        assert!(c.roll());
        assert_eq!(c.state().phase(), Phase::Rolling);
        assert_eq!(c.pending(), Some(Deferred::SettleRoll));
        assert_eq!(c.next_deadline(), Some(ms(800)));
        assert_eq!(c.time_until_deadline(), Some(ms(800)));

        c.clock().advance(ms(300));
        assert_eq!(c.time_until_deadline(), Some(ms(500)));
        c.clock().advance(ms(499));
        assert!(!c.tick());
        assert_eq!(c.state().phase(), Phase::Rolling);

        c.clock().advance(ms(1));
        assert!(c.tick());
        assert_eq!(c.state().phase(), Phase::AwaitingMove(6));
        assert_eq!(c.pending(), None);
        assert_eq!(c.time_until_deadline(), None);
        assert_eq!(c.flicker_value(), None);
    }

    #[test]
    fn test_flicker_cycles_while_rolling() {
        let mut c = controller(&[2]);
        c.roll();
        assert_eq!(c.flicker_value(), Some(1));

        c.clock().advance(ms(100));
        c.tick();
        assert_eq!(c.flicker_value(), Some(2));

        c.clock().advance(ms(50));
        c.tick();
        assert_eq!(c.flicker_value(), Some(2));

        c.clock().advance(ms(50));
        c.tick();
        assert_eq!(c.flicker_value(), Some(3));
    }

    #[test]
    fn test_second_roll_ignored_while_rolling() {
        let mut c = controller(&[4]);
        assert!(c.roll());
        assert!(!c.roll());
        assert_eq!(c.next_deadline(), Some(ms(800)));
    }

    #[test]
    fn test_release_with_six_keeps_turn() {
        let mut c = controller(&[6]);
        c.roll();
        c.clock().advance(ms(800));
        c.tick();

        let outcome = c.select_piece(0).unwrap();
        assert_eq!(outcome.next, NextStep::RollAgain);
        assert_eq!(c.state().pieces[0].state, PieceState::OnTrack(0));
        assert_eq!(c.state().current_turn, Color::Red);
        assert_eq!(c.state().phase(), Phase::AwaitingRoll);
        assert_eq!(c.pending(), None);
    }

    #[test]
    fn test_no_legal_move_auto_skips() {
        let mut c = controller(&[3]);
        c.roll();
        c.clock().advance(ms(800));
        c.tick();

        assert_eq!(c.state().phase(), Phase::TurnEnding(3));
        assert_eq!(c.pending(), Some(Deferred::AdvanceTurn));
        assert!(!c.roll());

        c.clock().advance(ms(999));
        c.tick();
        assert_eq!(c.state().current_turn, Color::Red);

        c.clock().advance(ms(1));
        assert!(c.tick());
        assert_eq!(c.state().current_turn, Color::Green);
        assert_eq!(c.state().phase(), Phase::AwaitingRoll);
        assert_eq!(c.state().dice_value, None);
    }

    #[test]
    fn test_late_tick_catches_up() {
        let mut c = controller(&[2]);
        c.roll();
        c.clock().advance(ms(5000));
        assert!(c.tick());
        assert_eq!(c.state().current_turn, Color::Green);
        assert_eq!(c.pending(), None);
    }

    #[test]
    fn test_move_hands_over_after_delay() {
        let state = crate::new_game(Rules::default());
        let mut state = state;
        state.pieces[0].state = PieceState::OnTrack(10);
        let mut c = GameController::from_state(
            state,
            ControllerConfig::default(),
            ManualClock::new(),
            Loaded::new(&[4]),
        );

        c.roll();
        c.clock().advance(ms(800));
        c.tick();
        assert_eq!(c.legal_moves(), vec![0]);

        assert!(c.select_piece(1).is_none());
        let outcome = c.select_piece(0).unwrap();
        assert_eq!(outcome.next, NextStep::AdvanceTurn);
        assert_eq!(c.state().pieces[0].state, PieceState::OnTrack(14));
        assert_eq!(c.next_deadline(), Some(ms(1300)));

        assert!(!c.roll());
        assert!(c.select_piece(0).is_none());

        c.clock().advance(ms(500));
        c.tick();
        assert_eq!(c.state().current_turn, Color::Green);
        assert_piece_invariants(c.state());
    }

    #[test]
    fn test_selection_ignored_while_rolling() {
        let mut c = controller(&[6]);
        c.roll();
        assert!(c.select_piece(0).is_none());
        assert_eq!(c.state().pieces[0].state, PieceState::Base);
    }

    #[test]
    fn test_reset_cancels_pending() {
        let mut c = controller(&[3]);
        c.roll();
        c.clock().advance(ms(800));
        c.tick();
        assert_eq!(c.pending(), Some(Deferred::AdvanceTurn));

        c.reset();
        assert_eq!(c.pending(), None);
        assert_eq!(c.state(), &crate::new_game(Rules::default()));

        c.clock().advance(ms(2000));
        assert!(!c.tick());
        assert_eq!(c.state().current_turn, Color::Red);
    }

    #[test]
    fn test_won_game_refuses_roll() {
        let mut state = crate::new_game(Rules::default());
        for id in 12..15 {
            state.pieces[id].state = PieceState::Finished;
        }
        state.pieces[15].state = PieceState::OnTrack(52);
        state.current_turn = Color::Blue;

        let mut c = GameController::from_state(
            state,
            ControllerConfig::default(),
            ManualClock::new(),
            Loaded::new(&[4]),
        );
        c.roll();
        c.clock().advance(ms(800));
        c.tick();
        let outcome = c.select_piece(15).unwrap();
        assert_eq!(outcome.next, NextStep::Won(Color::Blue));
        assert_eq!(c.pending(), None);

        let before = c.state().clone();
        assert!(!c.roll());
        assert!(c.select_piece(12).is_none());
        c.clock().advance(ms(5000));
        assert!(!c.tick());
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_resume_mid_roll() {
        let state = begin_roll(&crate::new_game(Rules::default())).unwrap();
        let mut c = GameController::from_state(
            state,
            ControllerConfig::default(),
            ManualClock::new(),
            Loaded::new(&[6]),
        );
        assert_eq!(c.pending(), Some(Deferred::SettleRoll));
        c.tick();
        assert_eq!(c.state().phase(), Phase::AwaitingMove(6));
    }

    #[test]
    fn test_instant_config_with_random_die() {
        let mut c = GameController::new(
            Rules::default(),
            ControllerConfig::instant(),
            ManualClock::new(),
            RandomDie::seeded(11),
        );

        for _ in 0..100_000 {
            if c.state().is_over() {
                break;
            }
            match c.state().phase() {
                Phase::AwaitingRoll => assert!(c.roll()),
                Phase::AwaitingMove(_) => {
                    let id = c.legal_moves()[0];
                    assert!(c.select_piece(id).is_some());
                }
                _ => {}
            }
            c.tick();
            assert_piece_invariants(c.state());
        }
        assert!(c.state().is_over(), "game did not finish");
    }
}
