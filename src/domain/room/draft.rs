//! Draft engine: team assignment, captain picks, side selection and game end.
//!
//! Stateless; every operation validates fully before touching the room so a
//! failed call leaves it unchanged.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::foundation::{Timestamp, UserId};

use super::{MemberStatus, PickMode, Room, RoomError, RoomStatus, Side, TeamId};

/// Result of a captain pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOutcome {
    pub assigned: UserId,
    pub team_id: TeamId,
    pub next_team: Option<TeamId>,
    pub remaining_unassigned: usize,
    /// The lone remaining player was auto-assigned and picking is over.
    pub terminal: bool,
}

/// Result of a side selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideOutcome {
    pub team_id: TeamId,
    pub side: Side,
    pub other_side: Side,
    pub status: RoomStatus,
}

/// Target roster size per team for a room of `total` players.
pub fn team_targets(total: usize) -> [usize; 2] {
    let first = total / 2;
    [first, total - first]
}

/// Expand a mode's cadence into the team of every non-captain pick.
///
/// Blocks alternate teams starting with team 1 and cycle for rooms larger
/// than the pattern. A pick that would overfill its team goes to the other
/// team. The last entry is the terminal, auto-assigned pick.
pub fn build_pick_order(mode: PickMode, total: usize) -> Vec<TeamId> {
    let cadence = mode.cadence();
    if cadence.is_empty() || total <= 2 {
        return Vec::new();
    }

    let targets = team_targets(total);
    let mut counts = [1usize, 1usize];
    let picks = total - 2;
    let mut order = Vec::with_capacity(picks);

    let mut block = 0;
    let mut team = TeamId::ONE;
    let mut left_in_block = cadence[0];
    while order.len() + 1 < picks {
        if left_in_block == 0 {
            block = (block + 1) % cadence.len();
            team = team.other();
            left_in_block = cadence[block];
        }
        let pick = if counts[team.index()] < targets[team.index()] {
            team
        } else {
            team.other()
        };
        counts[pick.index()] += 1;
        order.push(pick);
        left_in_block -= 1;
    }

    let preferred = mode.terminal_team();
    let terminal = if counts[preferred.index()] < targets[preferred.index()] {
        preferred
    } else {
        preferred.other()
    };
    order.push(terminal);
    order
}

/// Stateless draft operations over a [`Room`].
pub struct DraftEngine;

impl DraftEngine {
    /// Split the full roster into teams.
    ///
    /// Random mode shuffles, assigns captains at random and goes straight to
    /// `gaming`. Sequential modes seat the two earliest joiners as captains
    /// and open `picking`, or `side_picking` when nobody is left to pick.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not the creator
    /// - `Phase` outside `waiting`
    /// - `Validation` if the roster is not full
    pub fn start<R: Rng + ?Sized>(
        room: &mut Room,
        actor: &UserId,
        rng: &mut R,
    ) -> Result<(), RoomError> {
        if !room.is_creator(actor) {
            return Err(RoomError::forbidden("Only the room creator can start the draft"));
        }
        room.ensure_status(RoomStatus::Waiting, "start the draft")?;
        let total = room.player_count as usize;
        if room.players.len() != total {
            return Err(RoomError::validation(
                "players",
                format!(
                    "Room needs {} players to start, has {}",
                    total,
                    room.players.len()
                ),
            ));
        }

        for player in &mut room.players {
            player.team_id = None;
            player.is_captain = false;
        }
        for team in &mut room.teams {
            team.captain_id = None;
            team.side = None;
        }

        match room.pick_mode {
            PickMode::Random => Self::assign_random(room, rng)?,
            PickMode::SeqA | PickMode::SeqB => Self::assign_captains(room)?,
        }
        room.started_at = Some(Timestamp::now());
        Ok(())
    }

    /// A captain drafts an unassigned player.
    ///
    /// When exactly one player is unassigned the call is the terminal pick:
    /// any captain may make it, the supplied team and target are ignored, and
    /// the lone player joins the team with a free slot.
    ///
    /// # Errors
    ///
    /// - `Phase` unless `picking`
    /// - `NotFound` if the target is not a player
    /// - `Conflict` if the target already has a team
    /// - `Forbidden` if the actor is not the captain of `team_id`
    /// - `TurnOrder` if it is not `team_id`'s turn
    pub fn captain_select_player(
        room: &mut Room,
        actor: &UserId,
        team_id: TeamId,
        target: &UserId,
    ) -> Result<PickOutcome, RoomError> {
        room.ensure_status(RoomStatus::Picking, "pick players")?;

        let unassigned: Vec<UserId> = room.unassigned_players().map(|p| p.user_id.clone()).collect();
        if unassigned.len() == 1 {
            if room.captained_team(actor).is_none() {
                return Err(RoomError::forbidden("Only a captain can make the final pick"));
            }
            let destination = Self::terminal_destination(room);
            let lone = unassigned[0].clone();
            Self::assign(room, &lone, destination);
            room.transition(RoomStatus::SidePicking)?;
            room.next_team_pick = None;
            return Ok(PickOutcome {
                assigned: lone,
                team_id: destination,
                next_team: None,
                remaining_unassigned: 0,
                terminal: true,
            });
        }

        let player = room
            .player(target)
            .ok_or_else(|| RoomError::not_found("Player"))?;
        if player.team_id.is_some() {
            return Err(RoomError::conflict("Player already has a team"));
        }
        if !room.is_captain_of(actor, team_id) {
            return Err(RoomError::forbidden(format!(
                "Only team {}'s captain can pick for it",
                team_id
            )));
        }
        match room.next_team_pick {
            Some(expected) if expected == team_id => {}
            Some(expected) => {
                return Err(RoomError::TurnOrder {
                    expected,
                    attempted: team_id,
                })
            }
            None => return Err(RoomError::phase(room.status, "pick players")),
        }

        Self::assign(room, target, team_id);
        let picks_made = room.players.len() - 2 - (unassigned.len() - 1);
        room.next_team_pick = room.pick_order.get(picks_made).copied();

        Ok(PickOutcome {
            assigned: target.clone(),
            team_id,
            next_team: room.next_team_pick,
            remaining_unassigned: unassigned.len() - 1,
            terminal: false,
        })
    }

    /// A captain chooses a side for their team; the other team gets the
    /// opposite side. Leaving `side_picking` starts the game.
    ///
    /// # Errors
    ///
    /// - `Phase` unless `side_picking` or `gaming`
    /// - `Forbidden` if the actor is not the captain of `team_id`
    pub fn select_side(
        room: &mut Room,
        actor: &UserId,
        team_id: TeamId,
        side: Side,
    ) -> Result<SideOutcome, RoomError> {
        if !matches!(room.status, RoomStatus::SidePicking | RoomStatus::Gaming) {
            return Err(RoomError::phase(room.status, "select a side"));
        }
        if !room.is_captain_of(actor, team_id) {
            return Err(RoomError::forbidden(format!(
                "Only team {}'s captain can choose its side",
                team_id
            )));
        }

        room.teams[team_id.index()].side = Some(side);
        room.teams[team_id.other().index()].side = Some(side.opposite());
        if room.status == RoomStatus::SidePicking {
            room.transition(RoomStatus::Gaming)?;
            room.set_all_player_status(MemberStatus::Gaming);
        }

        Ok(SideOutcome {
            team_id,
            side,
            other_side: side.opposite(),
            status: room.status,
        })
    }

    /// Close the room's match.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not the creator
    /// - `Phase` unless `picking`, `side_picking` or `gaming`
    pub fn end_game(room: &mut Room, actor: &UserId) -> Result<(), RoomError> {
        if !room.is_creator(actor) {
            return Err(RoomError::forbidden("Only the room creator can end the game"));
        }
        if !room.status.is_in_progress() {
            return Err(RoomError::phase(room.status, "end the game"));
        }
        room.transition(RoomStatus::Ended)?;
        room.next_team_pick = None;
        room.set_all_player_status(MemberStatus::Online);
        room.ended_at = Some(Timestamp::now());
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn assign_random<R: Rng + ?Sized>(room: &mut Room, rng: &mut R) -> Result<(), RoomError> {
        let mut order: Vec<usize> = (0..room.players.len()).collect();
        order.shuffle(rng);
        let first = team_targets(order.len())[0];

        let (team_one, team_two) = order.split_at(first);
        for &idx in team_one {
            room.players[idx].team_id = Some(TeamId::ONE);
        }
        for &idx in team_two {
            room.players[idx].team_id = Some(TeamId::TWO);
        }
        for (team, members) in [(TeamId::ONE, team_one), (TeamId::TWO, team_two)] {
            if let Some(&idx) = members.choose(rng) {
                room.players[idx].is_captain = true;
                room.teams[team.index()].captain_id = Some(room.players[idx].user_id.clone());
            }
        }

        room.pick_order.clear();
        room.next_team_pick = None;
        room.transition(RoomStatus::Gaming)?;
        room.set_all_player_status(MemberStatus::Gaming);
        Ok(())
    }

    fn assign_captains(room: &mut Room) -> Result<(), RoomError> {
        let mut by_join: Vec<usize> = (0..room.players.len()).collect();
        by_join.sort_by_key(|&idx| room.players[idx].join_time);

        for (team, &idx) in [TeamId::ONE, TeamId::TWO].into_iter().zip(by_join.iter()) {
            let player = &mut room.players[idx];
            player.team_id = Some(team);
            player.is_captain = true;
            room.teams[team.index()].captain_id = Some(player.user_id.clone());
        }

        room.pick_order = build_pick_order(room.pick_mode, room.players.len());
        room.next_team_pick = room.pick_order.first().copied();
        if room.pick_order.is_empty() {
            room.transition(RoomStatus::SidePicking)?;
        } else {
            room.transition(RoomStatus::Picking)?;
        }
        Ok(())
    }

    /// Team that receives the terminal pick: the mode's preferred team
    /// unless it is already full.
    fn terminal_destination(room: &Room) -> TeamId {
        let targets = team_targets(room.player_count as usize);
        let preferred = room
            .pick_order
            .last()
            .copied()
            .unwrap_or_else(|| room.pick_mode.terminal_team());
        if room.team_size(preferred) < targets[preferred.index()] {
            preferred
        } else {
            preferred.other()
        }
    }

    fn assign(room: &mut Room, user_id: &UserId, team: TeamId) {
        if let Some(player) = room.players.iter_mut().find(|p| &p.user_id == user_id) {
            player.team_id = Some(team);
        }
    }
}
