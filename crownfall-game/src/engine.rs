//! Action enumeration, ranking and execution.
//!
//! [`legal_actions`] only produces actions whose preconditions hold on the
//! current board, so [`execute`] treats any refusal as a bug and surfaces it.
use rand::Rng;
use rand::seq::SliceRandom;

use crate::actions::{Action, Command, OfficeActionId, TurnAction};
use crate::board::{Board, BoardError, Ctx, player_mut};
use crate::buildings::{Building, BuildingKind, EffectContext};
use crate::coffer::Resources;
use crate::constants::{
    AUDIT_MAX_GOLD, AUDIT_MIN_GOLD, BLACKMAIL_PRESTIGE, COURT_ENTRY_PRESTIGE,
    FAILED_ARREST_PRESTIGE, RETAINER_HIRE_GOLD, TAX_GOLD, TAX_PRESTIGE_PENALTY, TITHE_GOLD,
};
use crate::effects::{Effects, Priorities};
use crate::events::GameEvent;
use crate::numbers::{i64_to_f64, usize_to_f64};
use crate::pieces::{Character, CharacterId, Location, Office, PlayerId, Sentencing, WorkerId};
use crate::player::Player;
use crate::retainers::{Perk, RetainerKind};
use crate::rng::{ChallengeOracle, RngBundle};

/// Standing gained by holding a court seat, excluding the entry fee.
const COURT_PRESENCE: Effects = Effects {
    power: 1.0,
    reputation: 2.0,
    ..Effects::ZERO
};

/// Expected campaign returns per round: the d6 table averaged.
const CAMPAIGN_EFFECTS: Effects = Effects {
    gold: 4.667,
    food: -1.0,
    prestige: 0.333,
    risk: 2.0,
    ..Effects::ZERO
};

/// Onboarding bonus for taking up an office. Recalling inverts it.
#[must_use]
pub const fn office_effects(office: Office) -> Effects {
    match office {
        Office::Crown => Effects {
            power: 5.0,
            prestige: 2.0,
            ..Effects::ZERO
        },
        Office::Priest => Effects {
            power: 2.0,
            karma: 1.0,
            ..Effects::ZERO
        },
        Office::Commander => Effects {
            power: 3.0,
            risk: -1.0,
            ..Effects::ZERO
        },
        Office::Spymaster => Effects {
            power: 2.0,
            risk: -0.5,
            ..Effects::ZERO
        },
        Office::Treasurer => Effects {
            power: 2.0,
            gold: 1.0,
            ..Effects::ZERO
        },
        Office::Heir => Effects {
            power: 1.0,
            prestige: 1.0,
            ..Effects::ZERO
        },
    }
}

fn resource_effects(amount: Resources) -> Effects {
    Effects {
        gold: i64_to_f64(amount.gold),
        food: i64_to_f64(amount.food),
        prestige: i64_to_f64(amount.prestige),
        ..Effects::ZERO
    }
}

fn perk_effects(kind: RetainerKind, neighbours: usize) -> Effects {
    match kind.perk() {
        Some(Perk::Gift(amount)) => resource_effects(amount),
        Some(Perk::PerNeighbour(gold)) => Effects::gold(i64_to_f64(gold) * usize_to_f64(neighbours)),
        None => Effects::ZERO,
    }
}

fn effect_context(board: &Board, building: &Building, player: PlayerId) -> EffectContext {
    EffectContext {
        workers_here: board.workers_in(building, player),
        manages_here: building
            .manager()
            .and_then(|m| board.character(m).ok())
            .is_some_and(|m| m.owner == player),
        is_commander: board.has_office(player, Office::Commander),
        works_a_church: board.works_in(player, BuildingKind::Church),
    }
}

fn own_characters<'b>(board: &'b Board, player: &'b Player) -> impl Iterator<Item = &'b Character> {
    player
        .characters()
        .iter()
        .filter_map(|id| board.character(*id).ok())
}

fn free_character<'b>(board: &'b Board, player: &'b Player) -> Option<&'b Character> {
    own_characters(board, player).find(|c| c.is_free())
}

fn free_worker(board: &Board, player: &Player) -> Option<WorkerId> {
    player
        .workers()
        .iter()
        .copied()
        .find(|w| board.worker(*w).is_ok_and(|w| w.building().is_none()))
}

/// Every action `player` may take right now.
#[must_use]
pub fn legal_actions(
    board: &Board,
    players: &[Player],
    player: PlayerId,
    rng: &RngBundle,
) -> Vec<Action> {
    let Some(me) = players.get(player.index()) else {
        return Vec::new();
    };
    let mut actions = Vec::new();
    build_actions(board, me, &mut actions);
    worker_actions(board, me, &mut actions);
    manager_actions(board, me, &mut actions);
    takeover_actions(board, me, &mut actions);
    court_and_campaign_actions(board, me, &mut actions);
    recall_actions(board, me, &mut actions);
    move_to_office_actions(board, me, &mut actions);
    retainer_actions(board, me, &mut actions);

    for office in Office::ALL {
        if board.has_office(player, office) {
            actions.extend(office_actions(board, players, player, office, false, rng));
        }
    }
    if board.has_office(player, Office::Crown) {
        // The crown may also issue every occupied subordinate office's orders,
        // even one it holds itself.
        for office in Office::SUBORDINATE {
            if board.office_holder(office).is_some() {
                actions.extend(
                    office_actions(board, players, player, office, true, rng)
                        .into_iter()
                        .map(Action::from_crown),
                );
            }
        }
    }
    actions
}

fn build_actions(board: &Board, me: &Player, out: &mut Vec<Action>) {
    let Some(pos) = board.plots().first_free_slot() else {
        return;
    };
    let crowned = board.has_office(me.id, Office::Crown);
    for (id, cost) in board.build_queue() {
        let Ok(building) = board.building(id) else {
            continue;
        };
        let paid = if crowned { cost / 2 } else { cost };
        if !me.coffer().can_afford(Resources::gold(paid)) {
            continue;
        }
        out.push(
            TurnAction::new(
                me.id,
                format!("built a {}", building.kind),
                Command::Build {
                    building: id,
                    pos,
                    cost: paid,
                },
                building.kind.build_effects() + Effects::gold(-i64_to_f64(paid)),
            )
            .into(),
        );
    }
}

fn worker_actions(board: &Board, me: &Player, out: &mut Vec<Action>) {
    let open: Vec<&Building> = board.constructed().filter(|b| b.has_worker_room()).collect();
    if let Some(worker) = free_worker(board, me) {
        for building in &open {
            let ctx = effect_context(board, building, me.id);
            out.push(
                TurnAction::new(
                    me.id,
                    format!("moved a worker to the {}", building.kind),
                    Command::PlaceWorker {
                        worker,
                        building: building.id,
                    },
                    building.kind.place_worker_effects(&ctx),
                )
                .into(),
            );
        }
    }
    for from in board.constructed() {
        let Some(worker) = from
            .workers()
            .iter()
            .copied()
            .find(|w| board.owner_of_worker(*w) == Some(me.id))
        else {
            continue;
        };
        let leaving = from.kind.remove_worker_effects(&effect_context(board, from, me.id));
        for to in open.iter().filter(|b| b.id != from.id) {
            let arriving = to.kind.place_worker_effects(&effect_context(board, to, me.id));
            out.push(
                TurnAction::new(
                    me.id,
                    format!("moved a worker from the {} to the {}", from.kind, to.kind),
                    Command::ReallocateWorker { worker, to: to.id },
                    leaving + arriving,
                )
                .into(),
            );
        }
    }
}

fn manager_actions(board: &Board, me: &Player, out: &mut Vec<Action>) {
    let vacant: Vec<&Building> = board
        .constructed()
        .filter(|b| b.manager().is_none())
        .collect();
    if let Some(character) = free_character(board, me) {
        for building in &vacant {
            let ctx = effect_context(board, building, me.id);
            out.push(
                TurnAction::new(
                    me.id,
                    format!("made {} manager of the {}", character.name, building.kind),
                    Command::PlaceManager {
                        character: character.id,
                        building: building.id,
                    },
                    building.kind.place_manager_effects(&ctx),
                )
                .into(),
            );
        }
    }
    for character in own_characters(board, me).filter(|c| !c.is_locked()) {
        let Location::Building(from) = character.location() else {
            continue;
        };
        let Ok(from) = board.building(from) else {
            continue;
        };
        let leaving = from.kind.remove_manager_effects(&effect_context(board, from, me.id));
        for to in &vacant {
            let arriving = to.kind.place_manager_effects(&effect_context(board, to, me.id));
            out.push(
                TurnAction::new(
                    me.id,
                    format!(
                        "moved {} from the {} to the {}",
                        character.name, from.kind, to.kind
                    ),
                    Command::ReallocateManager {
                        character: character.id,
                        to: to.id,
                    },
                    leaving + arriving,
                )
                .into(),
            );
        }
    }
}

fn takeover_actions(board: &Board, me: &Player, out: &mut Vec<Action>) {
    let Some(character) = free_character(board, me) else {
        return;
    };
    for building in board.constructed().filter(|b| !b.is_locked()) {
        let Some(manager) = building.manager().and_then(|m| board.character(m).ok()) else {
            continue;
        };
        if manager.owner == me.id {
            continue;
        }
        let ctx = EffectContext {
            manages_here: false,
            ..effect_context(board, building, me.id)
        };
        let success = TurnAction::new(
            me.id,
            format!(
                "{} took over the {} and expelled all workers",
                character.name, building.kind
            ),
            Command::Takeover {
                character: character.id,
                building: building.id,
            },
            building.kind.place_manager_effects(&ctx) + Effects::power(1.0),
        );
        let failure = TurnAction::new(
            me.id,
            format!(
                "{} died trying to take over the {}",
                character.name, building.kind
            ),
            Command::FailedTakeover {
                character: character.id,
                building: building.id,
            },
            Effects::ZERO,
        );
        out.push(Action::challenge(success, failure));
    }
}

fn court_and_campaign_actions(board: &Board, me: &Player, out: &mut Vec<Action>) {
    let Some(character) = free_character(board, me) else {
        return;
    };
    if me
        .coffer()
        .can_afford(Resources::prestige(COURT_ENTRY_PRESTIGE))
    {
        if let Some(seat) = board.court().first_free_slot() {
            out.push(
                TurnAction::new(
                    me.id,
                    format!("moved {} into court", character.name),
                    Command::EnterCourt {
                        character: character.id,
                        seat,
                    },
                    COURT_PRESENCE + Effects::prestige(-i64_to_f64(COURT_ENTRY_PRESTIGE)),
                )
                .into(),
            );
        }
    }
    if !board.campaign().is_full() {
        out.push(
            TurnAction::new(
                me.id,
                format!("sent {} on campaign", character.name),
                Command::Campaign {
                    character: character.id,
                },
                CAMPAIGN_EFFECTS,
            )
            .into(),
        );
    }
}

/// Predicted effect of pulling a character back to hand: the inverse of
/// whatever its current role brought in.
fn recall_effects(board: &Board, character: &Character) -> Effects {
    match character.location() {
        Location::Court(_) => COURT_PRESENCE.inverse(),
        Location::Campaign => CAMPAIGN_EFFECTS.inverse(),
        Location::Office(office) => office_effects(office).inverse(),
        Location::Building(id) => board.building(id).map_or(Effects::ZERO, |b| {
            b.kind
                .remove_manager_effects(&effect_context(board, b, character.owner))
        }),
        Location::Hand | Location::Dungeon | Location::Crypt => Effects::ZERO,
    }
}

fn recall_actions(board: &Board, me: &Player, out: &mut Vec<Action>) {
    for character in own_characters(board, me) {
        if character.is_locked()
            || matches!(
                character.location(),
                Location::Hand | Location::Dungeon | Location::Crypt
            )
        {
            continue;
        }
        let from = match character.location() {
            Location::Building(id) => board
                .building(id)
                .map_or_else(|_| "building".to_string(), |b| b.kind.to_string()),
            other => other.label().to_string(),
        };
        out.push(
            TurnAction::new(
                me.id,
                format!("recalled {} from the {from}", character.name),
                Command::Recall {
                    character: character.id,
                },
                recall_effects(board, character),
            )
            .into(),
        );
    }
}

fn move_to_office_actions(board: &Board, me: &Player, out: &mut Vec<Action>) {
    let Some(courtier) = own_characters(board, me)
        .find(|c| matches!(c.location(), Location::Court(_)) && !c.is_locked())
    else {
        return;
    };
    let candidates = std::iter::once(Office::Crown).chain(Office::SUBORDINATE);
    for office in candidates {
        if !board.office_available(office) || board.office_holder(office).is_some() {
            continue;
        }
        out.push(
            TurnAction::new(
                me.id,
                format!("moved {} into office: {office}", courtier.name),
                Command::MoveToOffice {
                    character: courtier.id,
                    office,
                },
                office_effects(office) + COURT_PRESENCE.inverse(),
            )
            .into(),
        );
    }
}

fn retainer_actions(board: &Board, me: &Player, out: &mut Vec<Action>) {
    let seated = |c: &&Character| {
        c.is_usable() && !matches!(c.location(), Location::Hand) && !c.is_locked()
    };
    if board.has_presence(me.id, BuildingKind::Tavern)
        && me.coffer().can_afford(Resources::gold(RETAINER_HIRE_GOLD))
        && !board.retainer_deck().is_empty()
    {
        let cost = Effects::gold(-i64_to_f64(RETAINER_HIRE_GOLD));
        let mut eligible = own_characters(board, me)
            .filter(seated)
            .filter(|c| c.retainer().is_none())
            .peekable();
        if let Some(first) = eligible.peek() {
            let neighbours = board.court_neighbours(first.id).len();
            for claimed in RetainerKind::WITH_PERKS {
                out.push(
                    TurnAction::new(
                        me.id,
                        format!(
                            "hired a retainer for {}, claiming a {claimed}",
                            first.name
                        ),
                        Command::HireRetainer {
                            character: first.id,
                            bluff: Some(claimed),
                        },
                        cost + perk_effects(claimed, neighbours) + Effects::risk(1.0),
                    )
                    .into(),
                );
            }
        }
        for character in eligible {
            out.push(
                TurnAction::new(
                    me.id,
                    format!("hired a retainer for {}", character.name),
                    Command::HireRetainer {
                        character: character.id,
                        bluff: None,
                    },
                    cost + Effects::prestige(1.0),
                )
                .into(),
            );
        }
    }

    for character in own_characters(board, me).filter(seated) {
        let Some(card) = character
            .retainer()
            .and_then(|r| board.retainer(r).ok())
        else {
            continue;
        };
        let kind = card.appears_as();
        if kind.perk().is_none() {
            continue;
        }
        let neighbours = board.court_neighbours(character.id).len();
        out.push(
            TurnAction::new(
                me.id,
                format!("called on {}'s {kind}", character.name),
                Command::CallRetainer {
                    character: character.id,
                },
                perk_effects(kind, neighbours),
            )
            .into(),
        );
    }
}

/// The action set attached to `office`, issued by `actor`.
///
/// Delegated orders from the crown are never challenged.
fn office_actions(
    board: &Board,
    players: &[Player],
    actor: PlayerId,
    office: Office,
    delegated: bool,
    rng: &RngBundle,
) -> Vec<Action> {
    let mut out = Vec::new();
    let open = |id: OfficeActionId| board.office_action_available(id);
    let others = move || players.iter().filter(move |p| p.id != actor);
    match office {
        Office::Priest => {
            if open(OfficeActionId::Sentencing) {
                for sentencing in Sentencing::ALL {
                    if sentencing == board.sentencing() {
                        continue;
                    }
                    let effects = match sentencing {
                        Sentencing::Fine => Effects {
                            karma: 1.0,
                            ..Effects::ZERO
                        },
                        Sentencing::Prison => Effects::power(1.0),
                        Sentencing::Death => Effects {
                            power: 2.0,
                            karma: -2.0,
                            ..Effects::ZERO
                        },
                    };
                    out.push(
                        TurnAction::new(
                            actor,
                            format!("changed the sentencing to {sentencing}"),
                            Command::SetSentencing { sentencing },
                            effects,
                        )
                        .locking(OfficeActionId::Sentencing)
                        .into(),
                    );
                }
            }
            if open(OfficeActionId::Tithe) {
                let payers = others()
                    .filter(|p| !board.works_in(p.id, BuildingKind::Church))
                    .count();
                let n = usize_to_f64(payers);
                out.push(
                    TurnAction::new(
                        actor,
                        "collected a tithe",
                        Command::Tithe,
                        Effects {
                            gold: i64_to_f64(TITHE_GOLD) * n,
                            reputation: -0.5 * n,
                            ..Effects::ZERO
                        },
                    )
                    .locking(OfficeActionId::Tithe)
                    .into(),
                );
            }
        }
        Office::Treasurer => {
            if open(OfficeActionId::Audit) {
                for target in others() {
                    let amount = rng.dice().gen_range(AUDIT_MIN_GOLD..=AUDIT_MAX_GOLD);
                    out.push(
                        TurnAction::new(
                            actor,
                            format!("audited {} and took {amount} gold", target.id),
                            Command::Audit {
                                target: target.id,
                                amount,
                            },
                            Effects {
                                power: 1.0,
                                reputation: -1.0,
                                ..Effects::ZERO
                            },
                        )
                        .locking(OfficeActionId::Audit)
                        .into(),
                    );
                }
            }
            if open(OfficeActionId::Tax) {
                out.push(
                    TurnAction::new(
                        actor,
                        "collected taxes from all players",
                        Command::Tax,
                        Effects {
                            power: 1.0,
                            reputation: -1.0,
                            ..Effects::ZERO
                        },
                    )
                    .locking(OfficeActionId::Tax)
                    .into(),
                );
            }
        }
        Office::Commander => {
            if open(OfficeActionId::Punish) {
                let my_prestige = players
                    .get(actor.index())
                    .map_or(0, |p| p.coffer().prestige());
                for target in board.characters() {
                    let Some(owner) = players.get(target.owner.index()) else {
                        continue;
                    };
                    if target.owner == actor
                        || owner.coffer().prestige() > my_prestige
                        || matches!(
                            target.location(),
                            Location::Hand
                                | Location::Office(Office::Crown)
                                | Location::Dungeon
                                | Location::Crypt
                        )
                    {
                        continue;
                    }
                    let success = TurnAction::new(
                        actor,
                        format!("had {} arrested", target.name),
                        Command::Arrest { target: target.id },
                        Effects {
                            power: 2.0,
                            karma: -1.0,
                            ..Effects::ZERO
                        },
                    )
                    .locking(OfficeActionId::Punish);
                    if delegated {
                        out.push(success.into());
                    } else {
                        let failure = TurnAction::new(
                            actor,
                            format!("failed to arrest {}", target.name),
                            Command::FailedArrest,
                            Effects::prestige(-i64_to_f64(FAILED_ARREST_PRESTIGE)),
                        )
                        .locking(OfficeActionId::Punish);
                        out.push(Action::challenge(success, failure));
                    }
                }
            }
        }
        Office::Spymaster => {
            let marks = others()
                .filter(|p| board.has_presence(p.id, BuildingKind::Tavern))
                .count();
            if open(OfficeActionId::Blackmail) && marks > 0 {
                out.push(
                    TurnAction::new(
                        actor,
                        "blackmailed the tavern's patrons",
                        Command::Blackmail,
                        Effects {
                            prestige: i64_to_f64(BLACKMAIL_PRESTIGE) * usize_to_f64(marks),
                            karma: -1.0,
                            ..Effects::ZERO
                        },
                    )
                    .locking(OfficeActionId::Blackmail)
                    .into(),
                );
            }
        }
        Office::Crown => {
            if open(OfficeActionId::Pardon) {
                for prisoner in board.dungeon().as_slice() {
                    let Ok(prisoner) = board.character(*prisoner) else {
                        continue;
                    };
                    let effects = if prisoner.owner == actor {
                        Effects {
                            power: 1.0,
                            karma: 1.0,
                            ..Effects::ZERO
                        }
                    } else {
                        Effects {
                            reputation: 1.0,
                            karma: 1.0,
                            ..Effects::ZERO
                        }
                    };
                    out.push(
                        TurnAction::new(
                            actor,
                            format!("pardoned {}", prisoner.name),
                            Command::Pardon {
                                prisoner: prisoner.id,
                            },
                            effects,
                        )
                        .locking(OfficeActionId::Pardon)
                        .into(),
                    );
                }
            }
            if open(OfficeActionId::NameHeir) {
                for (_, courtier) in board.court().occupied() {
                    let Ok(courtier) = board.character(courtier) else {
                        continue;
                    };
                    let effects = if courtier.owner == actor {
                        office_effects(Office::Heir) + Effects::power(1.0)
                    } else {
                        Effects {
                            reputation: 1.0,
                            ..Effects::ZERO
                        }
                    };
                    out.push(
                        TurnAction::new(
                            actor,
                            format!("named {} heir", courtier.name),
                            Command::NameHeir {
                                character: courtier.id,
                            },
                            effects,
                        )
                        .locking(OfficeActionId::NameHeir)
                        .into(),
                    );
                }
            }
        }
        Office::Heir => {}
    }
    out
}

/// Order candidates best first. Candidates are shuffled before a stable
/// sort so equal scores are broken at random.
pub fn rank_actions<R: Rng + ?Sized>(
    mut actions: Vec<Action>,
    priorities: &Priorities,
    rng: &mut R,
) -> Vec<Action> {
    actions.shuffle(rng);
    let mut scored: Vec<(f64, Action)> = actions
        .into_iter()
        .map(|a| (priorities.score(&a.effects()), a))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, a)| a).collect()
}

/// Everything an executing action may touch.
pub struct Table<'a> {
    pub board: &'a mut Board,
    pub players: &'a mut [Player],
    pub oracle: &'a mut dyn ChallengeOracle,
    pub ctx: Ctx<'a>,
}

/// Run an action. Returns `false` when a challenge resolved to its failure
/// branch.
///
/// # Errors
///
/// Returns `BoardError` if the action's preconditions no longer hold.
pub fn execute(action: &Action, table: &mut Table<'_>) -> Result<bool, BoardError> {
    match action {
        Action::Turn(turn) => {
            run(turn, table)?;
            Ok(true)
        }
        Action::Challenge(challenge) => {
            if table.oracle.challenge() {
                run(&challenge.success, table)?;
                Ok(true)
            } else {
                run(&challenge.failure, table)?;
                Ok(false)
            }
        }
    }
}

fn ensure_free(board: &Board, id: CharacterId) -> Result<(), BoardError> {
    let character = board.character(id)?;
    if !character.is_usable() {
        return Err(BoardError::NotUsable(id));
    }
    if character.is_locked() {
        return Err(BoardError::Locked(id));
    }
    Ok(())
}

fn run(action: &TurnAction, table: &mut Table<'_>) -> Result<(), BoardError> {
    let actor = action.player;
    let Table {
        board,
        players,
        ctx,
        ..
    } = table;
    match &action.command {
        Command::Build {
            building,
            pos,
            cost,
        } => {
            board.construct(*building, *pos)?;
            player_mut(players, actor)?.take(Resources::gold(*cost));
        }
        Command::PlaceWorker { worker, building } => {
            if board.worker(*worker)?.building().is_some() {
                return Err(BoardError::NoFreeWorker { player: actor });
            }
            board.place_worker(*worker, *building)?;
        }
        Command::ReallocateWorker { worker, to } => board.place_worker(*worker, *to)?,
        Command::PlaceManager {
            character,
            building,
        } => {
            ensure_free(board, *character)?;
            board.move_character(*character, Location::Building(*building), ctx.sink)?;
        }
        Command::ReallocateManager { character, to } => {
            ensure_free(board, *character)?;
            board.move_character(*character, Location::Building(*to), ctx.sink)?;
        }
        Command::Takeover {
            character,
            building,
        } => {
            ensure_free(board, *character)?;
            board.take_over(*building, *character, ctx.sink)?;
        }
        Command::FailedTakeover {
            character,
            building,
        } => {
            board.kill(*character, ctx.sink)?;
            board.lock_building(*building)?;
        }
        Command::EnterCourt { character, seat } => {
            ensure_free(board, *character)?;
            board.move_character(*character, Location::Court(*seat), ctx.sink)?;
            player_mut(players, actor)?.take(Resources::prestige(COURT_ENTRY_PRESTIGE));
        }
        Command::Campaign { character } => {
            ensure_free(board, *character)?;
            board.move_character(*character, Location::Campaign, ctx.sink)?;
        }
        Command::Recall { character } => {
            ensure_free(board, *character)?;
            board.move_character(*character, Location::Hand, ctx.sink)?;
        }
        Command::MoveToOffice { character, office } => {
            ensure_free(board, *character)?;
            board.move_character(*character, Location::Office(*office), ctx.sink)?;
        }
        Command::SetSentencing { sentencing } => board.set_sentencing(*sentencing),
        Command::Tithe => {
            let mut collected = Resources::default();
            for player in players.iter_mut().filter(|p| p.id != actor) {
                if !board.works_in(player.id, BuildingKind::Church) {
                    let taken = player.take(Resources::gold(TITHE_GOLD));
                    collected = Resources::gold(collected.gold + taken.gold);
                }
            }
            player_mut(players, actor)?.give(collected);
        }
        Command::Audit { target, amount } => {
            let taken = player_mut(players, *target)?.take(Resources::gold(*amount));
            board.treasury_mut().give(taken);
        }
        Command::Tax => {
            for player in players.iter_mut().filter(|p| p.id != actor) {
                if player.coffer().can_afford(Resources::gold(TAX_GOLD)) {
                    let taken = player.take(Resources::gold(TAX_GOLD));
                    board.treasury_mut().give(taken);
                } else {
                    player.take(Resources::prestige(TAX_PRESTIGE_PENALTY));
                }
            }
        }
        Command::Arrest { target } => board.punish(*target, players, ctx.sink)?,
        Command::FailedArrest => {
            player_mut(players, actor)?.take(Resources::prestige(FAILED_ARREST_PRESTIGE));
        }
        Command::Blackmail => {
            let mut collected = Resources::default();
            for player in players.iter_mut().filter(|p| p.id != actor) {
                if board.has_presence(player.id, BuildingKind::Tavern) {
                    let taken = player.take(Resources::prestige(BLACKMAIL_PRESTIGE));
                    collected = Resources::prestige(collected.prestige + taken.prestige);
                }
            }
            player_mut(players, actor)?.give(collected);
        }
        Command::Pardon { prisoner } => board.pardon(*prisoner, ctx.sink)?,
        Command::NameHeir { character } => {
            if let Some(previous) = board.office_holder(Office::Heir) {
                if previous != *character {
                    board.move_character(previous, Location::Hand, ctx.sink)?;
                }
            }
            board.move_character(*character, Location::Office(Office::Heir), ctx.sink)?;
        }
        Command::HireRetainer { character, bluff } => {
            board.hire_retainer(*character, *bluff)?;
            player_mut(players, actor)?.take(Resources::gold(RETAINER_HIRE_GOLD));
        }
        Command::CallRetainer { character } => {
            ensure_free(board, *character)?;
            board.call_retainer(*character, players)?;
        }
    }

    if let Some(lock) = action.lock {
        board.lock_office_action(lock);
    }
    if let Some(character) = action.command.actor() {
        if board.character(character)?.is_usable() {
            board.lock_character(character)?;
        }
    }
    log::debug!("{actor} {}", action.description);
    ctx.sink
        .record(GameEvent::player(actor, action.description.clone()));
    Ok(())
}
