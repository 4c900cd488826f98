//! Decision façade. Every question the game asks a search bot goes through
//! [`SearchBot`], which refreshes memory, builds a root state and runs one
//! full search per call.

mod context;

pub use context::{ActionContext, DecisionContext, DrawnCard, KnownCard, SeatInfo};

use crate::memory::CardMemoryStore;
use crate::search::{EvaluatorWeights, SearchConfig, SearchEngine, SearchReport, StateEvaluator};
use crate::tier::{SearchOverrides, SkillTier, TierProfile};
use cabo_core::game::moves::{Move, MoveTag};
use cabo_core::game::rules::{MoveGenerator, StandardRules, StateTransition};
use cabo_core::game::state::{Seat, SearchState, SlotCard, TurnPhase};
use cabo_core::model::action::ActionKind;
use cabo_core::model::player::{PlayerId, Target};
use cabo_core::model::rank::Rank;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::time::Duration;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("player {player} is not seated at this table")]
    UnknownPlayer { player: PlayerId },
    #[error("invalid decision context: {reason}")]
    InvalidContext { reason: String },
    #[error("no legal way to resolve {kind}")]
    NoLegalTargets { kind: ActionKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    Draw,
    TakeDiscard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionChoice {
    pub targets: Vec<Target>,
    pub declared: Option<Rank>,
    pub swap: Option<bool>,
}

pub struct SearchBot<G = StandardRules, T = StandardRules> {
    id: PlayerId,
    tier: SkillTier,
    profile: TierProfile,
    memory: CardMemoryStore,
    engine: SearchEngine<G, T>,
    rng: SmallRng,
}

impl SearchBot {
    pub fn new(id: PlayerId, tier: SkillTier) -> Self {
        Self::with_rules(id, tier, StandardRules::new(), StandardRules::new())
    }
}

impl<G, T> SearchBot<G, T>
where
    G: MoveGenerator,
    T: StateTransition,
{
    /// Builds a bot whose search runs on caller-supplied rules. Search
    /// budgets honour `CABO_SEARCH_*` overrides from the environment.
    pub fn with_rules(id: PlayerId, tier: SkillTier, generator: G, transition: T) -> Self {
        let mut profile = tier.profile();
        profile.search = profile.search.with_overrides(SearchOverrides::from_env());
        Self {
            id,
            tier,
            profile,
            memory: CardMemoryStore::new(profile.memory),
            engine: SearchEngine::new(
                generator,
                transition,
                StateEvaluator::default(),
                SearchConfig::from(profile.search),
            ),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Makes memory and search reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.memory = CardMemoryStore::seeded(self.profile.memory, seed);
        self.rng = SmallRng::seed_from_u64(seed.wrapping_add(1));
        self
    }

    pub fn with_search_config(mut self, config: SearchConfig) -> Self {
        self.engine.set_config(config);
        self
    }

    pub fn with_weights(mut self, weights: EvaluatorWeights) -> Self {
        self.engine.set_evaluator(StateEvaluator::new(weights));
        self
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn tier(&self) -> SkillTier {
        self.tier
    }

    pub fn memory(&self) -> &CardMemoryStore {
        &self.memory
    }

    /// Pause the orchestrator may insert before acting, so the bot reads
    /// as deliberating. The bot itself never sleeps.
    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.profile.thinking_delay_ms)
    }

    pub fn choose_turn_action(&mut self, ctx: &DecisionContext) -> Result<TurnAction, DecisionError> {
        let root = self.prepare(ctx, &[], TurnPhase::Start)?;
        let report = self.run(&root);
        let choice = most_visited(&report, |mv| {
            matches!(mv, Move::Draw { .. } | Move::TakeDiscard { .. })
        });
        let action = match choice {
            Some(Move::TakeDiscard { .. }) => TurnAction::TakeDiscard,
            _ => TurnAction::Draw,
        };
        self.log_decision("turn_action", &report, &format!("{action:?}"));
        Ok(action)
    }

    pub fn should_use_action(&mut self, ctx: &DecisionContext) -> Result<bool, DecisionError> {
        let drawn = require_drawn(ctx)?;
        if drawn.from_discard || drawn.rank.action().is_none() {
            return Ok(false);
        }
        let root = self.prepare(ctx, &[], drawn_phase(drawn))?;
        let report = self.run(&root);
        let use_it = report.best_move.tag() == MoveTag::UseAction;
        self.log_decision("use_action", &report, &use_it.to_string());
        Ok(use_it)
    }

    pub fn choose_action_targets(
        &mut self,
        ctx: &DecisionContext,
        action: &ActionContext,
    ) -> Result<ActionChoice, DecisionError> {
        for card in &action.peeked {
            ctx.check_target(card)?;
        }
        let phase = TurnPhase::Action {
            player: self.id,
            kind: action.kind,
        };
        let root = self.prepare(ctx, &action.peeked, phase)?;
        let report = self.run(&root);

        let chosen = match &report.best_move {
            Move::UseAction { .. } => Some(report.best_move.clone()),
            _ => self
                .engine
                .generator()
                .generate(&root)
                .into_iter()
                .find(|mv| mv.tag() == MoveTag::UseAction),
        };
        let Some(Move::UseAction {
            targets,
            declared,
            swap,
            ..
        }) = chosen
        else {
            return Err(DecisionError::NoLegalTargets { kind: action.kind });
        };
        let choice = ActionChoice {
            targets,
            declared,
            swap,
        };
        self.log_decision("action_targets", &report, &format!("{choice:?}"));
        Ok(choice)
    }

    pub fn should_toss_in(&mut self, ctx: &DecisionContext) -> Result<bool, DecisionError> {
        Ok(self.choose_toss_in(ctx)?.is_some())
    }

    /// Own position to toss onto the discard pile, if tossing is worth it.
    pub fn choose_toss_in(&mut self, ctx: &DecisionContext) -> Result<Option<usize>, DecisionError> {
        let Some(rank) = ctx.discard_top else {
            return Err(DecisionError::InvalidContext {
                reason: "toss-in window without a discard".to_string(),
            });
        };
        let root = self.prepare(ctx, &[], TurnPhase::TossIn { rank })?;
        let report = self.run(&root);
        let position = match report.best_move {
            Move::TossIn {
                player, position, ..
            } if player == self.id => Some(position),
            _ => None,
        };
        self.log_decision("toss_in", &report, &format!("{position:?}"));
        Ok(position)
    }

    /// Own position to swap the drawn card into; `None` means discard it.
    pub fn choose_swap_position(
        &mut self,
        ctx: &DecisionContext,
    ) -> Result<Option<usize>, DecisionError> {
        let drawn = require_drawn(ctx)?;
        let root = self.prepare(ctx, &[], drawn_phase(drawn))?;
        let report = self.run(&root);
        let position = match report.best_move {
            Move::Swap { position, .. } => Some(position),
            _ => None,
        };
        self.log_decision("swap_position", &report, &format!("{position:?}"));
        Ok(position)
    }

    pub fn should_call_end(&mut self, ctx: &DecisionContext) -> Result<bool, DecisionError> {
        let root = self.prepare(ctx, &[], TurnPhase::Start)?;
        let report = self.run(&root);
        let call = report.best_move.tag() == MoveTag::CallEnd;
        self.log_decision("call_end", &report, &call.to_string());
        Ok(call)
    }

    pub fn on_turn_boundary(&mut self) {
        self.memory.process_turn_boundary();
    }

    /// A card left `player`'s `position` unseen; whatever was known is stale.
    pub fn on_card_moved(&mut self, player: PlayerId, position: usize) {
        self.memory.forget(player, position);
    }

    /// The bot watched two cards trade places.
    pub fn on_public_swap(&mut self, a: Target, b: Target) {
        self.memory
            .swap_slots((a.player, a.position), (b.player, b.position));
    }

    pub fn reset_round(&mut self) {
        self.memory.reset();
    }

    fn prepare(
        &mut self,
        ctx: &DecisionContext,
        peeked: &[KnownCard],
        phase: TurnPhase,
    ) -> Result<SearchState, DecisionError> {
        ctx.validate(self.id)?;
        let own_turn = matches!(phase, TurnPhase::Start | TurnPhase::Drawn { .. });
        if own_turn && ctx.current != self.id {
            return Err(DecisionError::InvalidContext {
                reason: format!("{} asked to act on {}'s turn", self.id, ctx.current),
            });
        }

        let seen: Vec<KnownCard> = ctx
            .known_own_cards()
            .chain(ctx.opponent_knowledge.iter().copied())
            .chain(peeked.iter().copied())
            .collect();
        for card in seen {
            self.memory.observe(card.rank, card.player, card.position);
        }
        self.memory.decay();

        let seats = ctx
            .seats
            .iter()
            .map(|info| {
                let slots = (0..info.card_count)
                    .map(|position| {
                        self.memory.query(info.player, position).map(|record| {
                            SlotCard::remembered(record.rank, record.confidence as f32)
                        })
                    })
                    .collect();
                Seat::new(info.player, slots)
            })
            .collect();
        let current = ctx.seat_index(ctx.current).unwrap_or(0);

        Ok(SearchState::new(self.id, seats, current)
            .with_discard_top(ctx.discard_top)
            .with_deck_size(ctx.deck_size)
            .with_turn_count(ctx.turn_count)
            .with_end_caller(ctx.end_caller)
            .with_phase(phase))
    }

    fn run(&mut self, root: &SearchState) -> SearchReport {
        self.engine.search(root, self.memory.rank_pool(), &mut self.rng)
    }

    fn log_decision(&self, decision: &'static str, report: &SearchReport, answer: &str) {
        if !tracing::enabled!(target: "cabo_bot::decision", Level::INFO) {
            return;
        }
        event!(
            target: "cabo_bot::decision",
            Level::INFO,
            bot = %self.id,
            tier = self.tier.label(),
            decision,
            answer,
            best = %report.best_move,
            fallback = report.is_fallback(),
            iterations = report.iterations,
            elapsed_ms = report.elapsed.as_millis() as u64,
            remembered = self.memory.len(),
        );
    }
}

fn require_drawn(ctx: &DecisionContext) -> Result<DrawnCard, DecisionError> {
    ctx.drawn.ok_or_else(|| DecisionError::InvalidContext {
        reason: "no drawn card pending".to_string(),
    })
}

fn drawn_phase(drawn: DrawnCard) -> TurnPhase {
    TurnPhase::Drawn {
        card: Some(drawn.rank),
        from_discard: drawn.from_discard,
    }
}

fn most_visited<F>(report: &SearchReport, accept: F) -> Option<&Move>
where
    F: Fn(&Move) -> bool,
{
    let mut best: Option<(&Move, u32)> = None;
    for child in &report.root_children {
        if !accept(&child.mv) {
            continue;
        }
        match best {
            Some((_, visits)) if child.visits <= visits => {}
            _ => best = Some((&child.mv, child.visits)),
        }
    }
    best.map(|(mv, _)| mv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(children: &[(Move, u32)]) -> SearchReport {
        SearchReport {
            best_move: Move::Pass { player: PlayerId(0) },
            iterations: 0,
            elapsed: Duration::ZERO,
            nodes: 1,
            root_children: children
                .iter()
                .map(|(mv, visits)| crate::search::ChildSummary {
                    mv: mv.clone(),
                    visits: *visits,
                    mean_reward: 0.5,
                })
                .collect(),
        }
    }

    fn toss_window(current: PlayerId) -> DecisionContext {
        let seat = |id: u8| SeatInfo {
            player: PlayerId(id),
            card_count: 4,
        };
        DecisionContext {
            bot: PlayerId(0),
            own_hand: vec![Rank::Two, Rank::Nine, Rank::Four, Rank::Jack],
            known_positions: vec![1],
            seats: vec![seat(0), seat(1), seat(2)],
            current,
            discard_top: Some(Rank::Nine),
            end_caller: None,
            turn_count: 5,
            deck_size: 30,
            drawn: None,
            opponent_knowledge: Vec::new(),
        }
    }

    #[test]
    fn root_starts_from_the_seat_whose_turn_it_is() {
        let mut bot = SearchBot::new(PlayerId(0), SkillTier::Expert).with_seed(1);
        let ctx = toss_window(PlayerId(2));
        let root = bot
            .prepare(&ctx, &[], TurnPhase::TossIn { rank: Rank::Nine })
            .unwrap();
        assert_eq!(root.current_player(), PlayerId(2));
        assert_eq!(root.perspective(), PlayerId(0));
        assert_eq!(root.turn_count(), 5);
    }

    #[test]
    fn own_turn_questions_need_the_bot_to_be_current() {
        let mut bot = SearchBot::new(PlayerId(0), SkillTier::Casual).with_seed(1);
        let ctx = toss_window(PlayerId(1));
        assert!(matches!(
            bot.prepare(&ctx, &[], TurnPhase::Start),
            Err(DecisionError::InvalidContext { .. })
        ));
        let root = bot.prepare(&toss_window(PlayerId(0)), &[], TurnPhase::Start).unwrap();
        assert_eq!(root.current_player(), PlayerId(0));
    }

    #[test]
    fn most_visited_respects_filter_and_ties() {
        let p = PlayerId(0);
        let report = report_with(&[
            (Move::CallEnd { player: p }, 9),
            (Move::Draw { player: p }, 4),
            (Move::TakeDiscard { player: p }, 4),
        ]);
        let pick = most_visited(&report, |mv| mv.tag() != MoveTag::CallEnd);
        assert_eq!(pick, Some(&Move::Draw { player: p }));
        assert_eq!(most_visited(&report_with(&[]), |_| true), None);
    }
}
