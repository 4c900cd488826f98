//! Move generation and state transition contracts, plus the reference rules.
//!
//! Search code only talks to the two traits; [`StandardRules`] is the
//! implementation used by the bots and harnesses in this workspace. All
//! knowledge bookkeeping is from the perspective of `SearchState::perspective`.

use crate::game::moves::Move;
use crate::game::state::{SearchState, SlotCard, TurnPhase};
use crate::model::action::ActionKind;
use crate::model::player::{PlayerId, Target};
use crate::model::rank::Rank;

/// Lists the legal moves in a state. Must be a pure function of the state.
pub trait MoveGenerator {
    fn generate(&self, state: &SearchState) -> Vec<Move>;
}

/// Produces the successor of a state. Must not mutate its input.
pub trait StateTransition {
    fn apply(&self, state: &SearchState, mv: &Move) -> SearchState;
}

impl<T: MoveGenerator + ?Sized> MoveGenerator for &T {
    fn generate(&self, state: &SearchState) -> Vec<Move> {
        (**self).generate(state)
    }
}

impl<T: StateTransition + ?Sized> StateTransition for &T {
    fn apply(&self, state: &SearchState, mv: &Move) -> SearchState {
        (**self).apply(state, mv)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    pub fn new() -> Self {
        Self
    }

    /// Every concrete way `actor` can resolve an action of `kind`.
    pub fn action_moves(&self, state: &SearchState, actor: PlayerId, kind: ActionKind) -> Vec<Move> {
        let Some(actor_index) = state.seat_index(actor) else {
            return Vec::new();
        };
        let own_count = state.seats[actor_index].card_count();
        let opponent_slots: Vec<Target> = state
            .seats
            .iter()
            .filter(|seat| seat.id != actor)
            .flat_map(|seat| (0..seat.card_count()).map(move |pos| Target::new(seat.id, pos)))
            .collect();

        let use_action = |targets: Vec<Target>, declared: Option<Rank>, swap: Option<bool>| {
            Move::UseAction {
                player: actor,
                kind,
                targets,
                declared,
                swap,
            }
        };

        let mut moves = Vec::new();
        match kind {
            ActionKind::PeekOwn => {
                for pos in 0..own_count {
                    moves.push(use_action(vec![Target::new(actor, pos)], None, None));
                }
            }
            ActionKind::PeekOpponent => {
                for &target in &opponent_slots {
                    moves.push(use_action(vec![target], None, None));
                }
            }
            ActionKind::BlindSwap => {
                for pos in 0..own_count {
                    for &target in &opponent_slots {
                        moves.push(use_action(vec![Target::new(actor, pos), target], None, None));
                    }
                }
            }
            ActionKind::PeekAndSwap => {
                for pos in 0..own_count {
                    for &target in &opponent_slots {
                        for swap in [true, false] {
                            moves.push(use_action(
                                vec![Target::new(actor, pos), target],
                                None,
                                Some(swap),
                            ));
                        }
                    }
                }
            }
            ActionKind::DeclareOwn => {
                for (pos, slot) in state.seats[actor_index].slots.iter().enumerate() {
                    let Some(card) = slot else {
                        continue;
                    };
                    if actor == state.perspective && !card.is_remembered() {
                        continue;
                    }
                    moves.push(use_action(
                        vec![Target::new(actor, pos)],
                        Some(card.rank),
                        None,
                    ));
                }
            }
            ActionKind::ForceDraw => {
                if state.deck_size > 0 {
                    for seat in state.seats.iter().filter(|seat| seat.id != actor) {
                        moves.push(use_action(
                            vec![Target::new(seat.id, seat.card_count())],
                            None,
                            None,
                        ));
                    }
                }
            }
        }
        moves
    }
}

impl MoveGenerator for StandardRules {
    fn generate(&self, state: &SearchState) -> Vec<Move> {
        if state.terminal || state.seats.is_empty() {
            return Vec::new();
        }

        let actor = state.current_player();
        let mut moves = Vec::new();
        match state.phase {
            TurnPhase::Start => {
                if state.deck_size > 0 {
                    moves.push(Move::Draw { player: actor });
                }
                if state.discard_top.is_some() {
                    moves.push(Move::TakeDiscard { player: actor });
                }
                // Everyone gets at least one turn before the round can be called.
                if state.end_caller.is_none() && state.turn_count as usize >= state.seats.len() {
                    moves.push(Move::CallEnd { player: actor });
                }
            }
            TurnPhase::Drawn { card, from_discard } => {
                let own_count = state.seats[state.current].card_count();
                for position in 0..own_count {
                    moves.push(Move::Swap {
                        player: actor,
                        position,
                    });
                }
                if !from_discard || own_count == 0 {
                    moves.push(Move::Discard { player: actor });
                }
                if !from_discard {
                    if let Some(kind) = card.and_then(Rank::action) {
                        moves.extend(self.action_moves(state, actor, kind));
                    }
                }
            }
            TurnPhase::Action { player, kind } => {
                moves.extend(self.action_moves(state, player, kind));
                moves.push(Move::Pass { player });
            }
            TurnPhase::TossIn { rank } => {
                let count = state.seats.len();
                for offset in 0..count {
                    let seat = &state.seats[(state.current + offset) % count];
                    for (position, slot) in seat.slots.iter().enumerate() {
                        let Some(card) = slot else {
                            continue;
                        };
                        if card.rank != rank {
                            continue;
                        }
                        if seat.id == state.perspective && !card.is_remembered() {
                            continue;
                        }
                        moves.push(Move::TossIn {
                            player: seat.id,
                            position,
                            rank,
                        });
                    }
                }
                // Letting the window close is the perspective's call, whoever's turn it is.
                moves.push(Move::Pass {
                    player: state.perspective,
                });
            }
        }
        moves
    }
}

impl StateTransition for StandardRules {
    fn apply(&self, state: &SearchState, mv: &Move) -> SearchState {
        let mut next = state.clone();
        if next.terminal {
            return next;
        }

        match mv {
            Move::Draw { .. } => {
                let card = next.draw_card();
                next.phase = TurnPhase::Drawn {
                    card,
                    from_discard: false,
                };
            }
            Move::TakeDiscard { .. } => {
                let card = next.discard_top.take();
                next.phase = TurnPhase::Drawn {
                    card,
                    from_discard: true,
                };
            }
            Move::CallEnd { player } => {
                next.end_caller = Some(*player);
                next.finish_turn();
            }
            Move::Swap { player, position } => {
                let Some((card, from_discard)) = next.pending_drawn() else {
                    next.finish_turn();
                    return next;
                };
                let known_to_bot = *player == next.perspective || from_discard;
                let incoming = card.map(|rank| {
                    if known_to_bot {
                        SlotCard::revealed(rank)
                    } else {
                        SlotCard::sampled(rank)
                    }
                });
                let outgoing = next.seat_index(*player).and_then(|seat_index| {
                    let slots = &mut next.seats[seat_index].slots;
                    match slots.get_mut(*position) {
                        Some(slot) => std::mem::replace(slot, incoming),
                        None => {
                            slots.push(incoming);
                            None
                        }
                    }
                });
                next.discard(outgoing.map(|card| card.rank));
            }
            Move::Discard { .. } => {
                let card = next.pending_drawn().and_then(|(card, _)| card);
                next.discard(card);
            }
            Move::UseAction {
                player,
                kind,
                targets,
                declared,
                swap,
            } => match state.phase {
                TurnPhase::Drawn {
                    card,
                    from_discard: false,
                } => {
                    next.discard_top = card;
                    next.resolve_action(*player, *kind, targets, *declared, *swap);
                    match card {
                        Some(rank) => next.phase = TurnPhase::TossIn { rank },
                        None => next.finish_turn(),
                    }
                }
                _ => {
                    next.resolve_action(*player, *kind, targets, *declared, *swap);
                    next.finish_turn();
                }
            },
            Move::TossIn {
                player,
                position,
                rank,
            } => {
                let Some(seat_index) = next.seat_index(*player) else {
                    next.finish_turn();
                    return next;
                };
                let actual = next.seats[seat_index].slot(*position).map(|card| card.rank);
                if actual == Some(*rank) {
                    next.seats[seat_index].slots.remove(*position);
                    next.discard_top = Some(*rank);
                    match rank.action() {
                        Some(kind) => {
                            next.phase = TurnPhase::Action {
                                player: *player,
                                kind,
                            }
                        }
                        None => next.finish_turn(),
                    }
                } else {
                    next.penalty(seat_index);
                    next.finish_turn();
                }
            }
            Move::Pass { .. } => next.finish_turn(),
        }
        next
    }
}

impl SearchState {
    fn draw_card(&mut self) -> Option<Rank> {
        if self.deck_size == 0 {
            return None;
        }
        self.deck_size -= 1;
        self.draw_pile.pop()
    }

    /// Adds a face-down card nobody has seen to `seat_index`.
    fn penalty(&mut self, seat_index: usize) {
        if self.deck_size == 0 {
            return;
        }
        let card = self.draw_card().map(SlotCard::sampled);
        if let Some(seat) = self.seats.get_mut(seat_index) {
            seat.slots.push(card);
        }
    }

    fn discard(&mut self, card: Option<Rank>) {
        self.discard_top = card;
        match card {
            Some(rank) => self.phase = TurnPhase::TossIn { rank },
            None => self.finish_turn(),
        }
    }

    fn slot_mut(&mut self, target: Target) -> Option<&mut Option<SlotCard>> {
        let seat_index = self.seat_index(target.player)?;
        self.seats[seat_index].slots.get_mut(target.position)
    }

    fn reveal(&mut self, target: Target) {
        if let Some(Some(card)) = self.slot_mut(target) {
            *card = SlotCard::revealed(card.rank);
        }
    }

    fn swap_targets(&mut self, a: Target, b: Target) {
        let (Some(first), Some(second)) = (
            self.slot_mut(a).map(|slot| *slot),
            self.slot_mut(b).map(|slot| *slot),
        ) else {
            return;
        };
        if let Some(slot) = self.slot_mut(a) {
            *slot = second;
        }
        if let Some(slot) = self.slot_mut(b) {
            *slot = first;
        }
    }

    fn resolve_action(
        &mut self,
        actor: PlayerId,
        kind: ActionKind,
        targets: &[Target],
        declared: Option<Rank>,
        swap: Option<bool>,
    ) {
        let sees = actor == self.perspective;
        match (kind, targets) {
            (ActionKind::PeekOwn | ActionKind::PeekOpponent, [target, ..]) => {
                if sees {
                    self.reveal(*target);
                }
            }
            (ActionKind::BlindSwap, [own, other, ..]) => self.swap_targets(*own, *other),
            (ActionKind::PeekAndSwap, [own, other, ..]) => {
                if sees {
                    self.reveal(*other);
                }
                if swap == Some(true) {
                    self.swap_targets(*own, *other);
                }
            }
            (ActionKind::DeclareOwn, [target, ..]) => {
                let Some(seat_index) = self.seat_index(target.player) else {
                    return;
                };
                let actual = self.seats[seat_index].slot(target.position).map(|c| c.rank);
                if actual.is_some() && actual == declared {
                    self.seats[seat_index].slots.remove(target.position);
                    self.discard_top = actual;
                } else {
                    self.penalty(seat_index);
                }
            }
            (ActionKind::ForceDraw, [target, ..]) => {
                if let Some(seat_index) = self.seat_index(target.player) {
                    self.penalty(seat_index);
                }
            }
            _ => {}
        }
    }

    fn finish_turn(&mut self) {
        self.phase = TurnPhase::Start;
        if self.seats.is_empty() {
            self.terminal = true;
            return;
        }
        self.current = (self.current + 1) % self.seats.len();
        self.turn_count += 1;
        let back_to_caller = self.end_caller == Some(self.seats[self.current].id);
        if back_to_caller || self.deck_size == 0 {
            self.terminal = true;
            self.winner = self.leader();
        }
    }

    /// Seat with the lowest estimated hand total; ties go to the earlier seat.
    fn leader(&self) -> Option<PlayerId> {
        let mut best: Option<(PlayerId, f32)> = None;
        for seat in &self.seats {
            let score = seat.estimated_score();
            match best {
                Some((_, best_score)) if score >= best_score => {}
                _ => best = Some((seat.id, score)),
            }
        }
        best.map(|(id, _)| id)
    }
}
