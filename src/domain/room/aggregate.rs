//! Room aggregate entity.
//!
//! The room is the single source of truth for membership, teams and phase.
//! Live connections are tracked elsewhere and reconciled against it.
//!
//! # Ownership
//!
//! Exactly one member carries the creator flag while the room is non-empty.
//! When the creator leaves, ownership passes to the earliest-joined player,
//! or the earliest-joined spectator if no players remain.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RoomId, Timestamp, UserId};

use super::{
    MemberRole, MemberStatus, PasswordHash, PickMode, Player, RoomError, RoomStatus, Spectator,
    Team, TeamId,
};

/// Minimum room capacity.
pub const MIN_PLAYER_COUNT: u8 = 2;

/// Maximum room capacity.
pub const MAX_PLAYER_COUNT: u8 = 10;

/// Room names are 3-30 characters after trimming.
pub const MIN_NAME_LENGTH: usize = 3;
pub const MAX_NAME_LENGTH: usize = 30;

/// Maximum length for the room description.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

/// Only supported game.
pub const GAME_TYPE: &str = "LOL";

/// Parameters supplied when creating a room.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomParams {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub player_count: u8,
    #[serde(default)]
    pub pick_mode: PickMode,
    #[serde(default)]
    pub password: Option<String>,
}

/// Result of an add operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The user already held the requested role.
    Unchanged,
    /// The user was not a member before.
    Added,
    /// The user held the other role and was moved.
    Moved,
}

/// Result of removing a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub user_id: UserId,
    pub role: MemberRole,
    pub team_id: Option<TeamId>,
    pub was_creator: bool,
    pub new_creator: Option<UserId>,
    /// Nothing left; the caller deletes the room.
    pub is_empty: bool,
}

/// Room aggregate.
///
/// # Invariants
///
/// - `players.len() <= player_count`
/// - at most one captain per team, mirrored in `teams[i].captain_id`
/// - a user appears in at most one of `players` and `spectators`
/// - both team sides, once set, are opposite
/// - exactly one creator while non-empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub(super) id: RoomId,
    pub(super) name: String,
    pub(super) description: Option<String>,
    pub(super) game_type: String,
    pub(super) creator_id: Option<UserId>,
    pub(super) player_count: u8,
    pub(super) pick_mode: PickMode,
    pub(super) password: Option<PasswordHash>,
    pub(super) status: RoomStatus,
    pub(super) players: Vec<Player>,
    pub(super) spectators: Vec<Spectator>,
    pub(super) teams: [Team; 2],
    pub(super) next_team_pick: Option<TeamId>,
    /// Team for each non-captain pick, fixed when the draft starts.
    pub(super) pick_order: Vec<TeamId>,
    pub(super) created_at: Timestamp,
    pub(super) started_at: Option<Timestamp>,
    pub(super) ended_at: Option<Timestamp>,
}

impl Room {
    /// Create a new room in `waiting` with the creator seated as a player.
    ///
    /// # Errors
    ///
    /// - `Validation` if capacity, name or description are out of range
    pub fn create(creator: UserId, params: RoomParams) -> Result<Self, RoomError> {
        Self::validate_player_count(params.player_count)?;
        let name = Self::validate_name(&params.name)?;
        let description = Self::validate_description(params.description)?;

        let now = Timestamp::now();
        let mut room = Self {
            id: RoomId::new(),
            name,
            description,
            game_type: GAME_TYPE.to_string(),
            creator_id: Some(creator.clone()),
            player_count: params.player_count,
            pick_mode: params.pick_mode,
            password: None,
            status: RoomStatus::Waiting,
            players: vec![Player::new(creator, true, now)],
            spectators: Vec::new(),
            teams: Team::default_pair(),
            next_team_pick: None,
            pick_order: Vec::new(),
            created_at: now,
            started_at: None,
            ended_at: None,
        };
        room.set_password(params.password.as_deref());
        Ok(room)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn game_type(&self) -> &str {
        &self.game_type
    }

    pub fn creator_id(&self) -> Option<&UserId> {
        self.creator_id.as_ref()
    }

    pub fn player_count(&self) -> u8 {
        self.player_count
    }

    pub fn pick_mode(&self) -> PickMode {
        self.pick_mode
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn spectators(&self) -> &[Spectator] {
        &self.spectators
    }

    pub fn teams(&self) -> &[Team; 2] {
        &self.teams
    }

    pub fn team(&self, id: TeamId) -> &Team {
        &self.teams[id.index()]
    }

    /// Team whose captain picks next. Only meaningful while `picking`.
    pub fn next_team_pick(&self) -> Option<TeamId> {
        self.next_team_pick
    }

    pub fn pick_order(&self) -> &[TeamId] {
        &self.pick_order
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn started_at(&self) -> Option<&Timestamp> {
        self.started_at.as_ref()
    }

    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.spectators.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.player_count as usize
    }

    pub fn player(&self, user_id: &UserId) -> Option<&Player> {
        self.players.iter().find(|p| &p.user_id == user_id)
    }

    pub fn spectator(&self, user_id: &UserId) -> Option<&Spectator> {
        self.spectators.iter().find(|s| &s.user_id == user_id)
    }

    /// Durable role of a user, if they are a member.
    pub fn role_of(&self, user_id: &UserId) -> Option<MemberRole> {
        if self.player(user_id).is_some() {
            Some(MemberRole::Player)
        } else if self.spectator(user_id).is_some() {
            Some(MemberRole::Spectator)
        } else {
            None
        }
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.role_of(user_id).is_some()
    }

    /// Team of a player, `None` for spectators and undrafted players.
    pub fn team_of(&self, user_id: &UserId) -> Option<TeamId> {
        self.player(user_id).and_then(|p| p.team_id)
    }

    pub fn is_creator(&self, user_id: &UserId) -> bool {
        self.creator_id.as_ref() == Some(user_id)
    }

    pub fn is_captain_of(&self, user_id: &UserId, team: TeamId) -> bool {
        self.team(team).captain_id.as_ref() == Some(user_id)
    }

    /// Team captained by this user, if any.
    pub fn captained_team(&self, user_id: &UserId) -> Option<TeamId> {
        self.teams
            .iter()
            .find(|t| t.captain_id.as_ref() == Some(user_id))
            .map(|t| t.id)
    }

    /// Players not yet assigned to a team.
    pub fn unassigned_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.team_id.is_none())
    }

    /// Number of players currently on a team.
    pub fn team_size(&self, team: TeamId) -> usize {
        self.players
            .iter()
            .filter(|p| p.team_id == Some(team))
            .count()
    }

    /// Every member's user id, players first.
    pub fn member_ids(&self) -> Vec<UserId> {
        self.players
            .iter()
            .map(|p| p.user_id.clone())
            .chain(self.spectators.iter().map(|s| s.user_id.clone()))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Password gate
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace or clear the room password.
    pub fn set_password(&mut self, password: Option<&str>) {
        self.password = match password.map(str::trim) {
            Some(pw) if !pw.is_empty() => Some(PasswordHash::create(pw)),
            _ => None,
        };
    }

    /// Check a candidate password. Unprotected rooms accept anything.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the room is protected and the password is missing or wrong
    pub fn verify_password(&self, candidate: Option<&str>) -> Result<(), RoomError> {
        match (&self.password, candidate) {
            (None, _) => Ok(()),
            (Some(hash), Some(pw)) if hash.verify(pw) => Ok(()),
            (Some(_), _) => Err(RoomError::forbidden("Incorrect room password")),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Membership
    // ─────────────────────────────────────────────────────────────────────────

    /// Seat a user as a player.
    ///
    /// Idempotent for existing players; spectators are moved.
    ///
    /// # Errors
    ///
    /// - `Phase` if a new player joins outside `waiting`
    /// - `Capacity` if the roster is full
    pub fn add_player(&mut self, user_id: UserId) -> Result<JoinOutcome, RoomError> {
        if self.player(&user_id).is_some() {
            return Ok(JoinOutcome::Unchanged);
        }
        if self.spectator(&user_id).is_some() {
            self.move_spectator_to_player(&user_id)?;
            return Ok(JoinOutcome::Moved);
        }

        self.ensure_status(RoomStatus::Waiting, "join as player")?;
        self.ensure_capacity()?;

        let is_creator = self.is_empty();
        if is_creator {
            self.creator_id = Some(user_id.clone());
        }
        self.players
            .push(Player::new(user_id, is_creator, Timestamp::now()));
        Ok(JoinOutcome::Added)
    }

    /// Add a user as a spectator.
    ///
    /// Idempotent for existing spectators; players are moved. The first
    /// member of an empty room becomes its creator.
    ///
    /// # Errors
    ///
    /// - `Phase` if an existing player is moved outside `waiting`
    pub fn add_spectator(&mut self, user_id: UserId) -> Result<JoinOutcome, RoomError> {
        if self.spectator(&user_id).is_some() {
            return Ok(JoinOutcome::Unchanged);
        }
        if self.player(&user_id).is_some() {
            self.move_player_to_spectator(&user_id)?;
            return Ok(JoinOutcome::Moved);
        }

        let is_creator = self.is_empty();
        if is_creator {
            self.creator_id = Some(user_id.clone());
        }
        self.spectators
            .push(Spectator::new(user_id, is_creator, Timestamp::now()));
        Ok(JoinOutcome::Added)
    }

    /// Promote a spectator onto the roster.
    ///
    /// # Errors
    ///
    /// - `Phase` outside `waiting`
    /// - `Conflict` if the user is already a player
    /// - `NotFound` if the user is not a spectator
    /// - `Capacity` if the roster is full
    pub fn move_spectator_to_player(&mut self, user_id: &UserId) -> Result<(), RoomError> {
        self.ensure_status(RoomStatus::Waiting, "switch to player")?;
        if self.player(user_id).is_some() {
            return Err(RoomError::conflict("User is already a player"));
        }
        let idx = self
            .spectators
            .iter()
            .position(|s| &s.user_id == user_id)
            .ok_or_else(|| RoomError::not_found("Spectator"))?;
        self.ensure_capacity()?;

        let spectator = self.spectators.remove(idx);
        self.players.push(Player {
            user_id: spectator.user_id,
            team_id: None,
            is_captain: false,
            is_creator: spectator.is_creator,
            status: spectator.status,
            join_time: spectator.join_time,
        });
        Ok(())
    }

    /// Move a player off the roster into the spectators.
    ///
    /// # Errors
    ///
    /// - `Phase` outside `waiting`
    /// - `Conflict` if the user is already a spectator
    /// - `NotFound` if the user is not a player
    pub fn move_player_to_spectator(&mut self, user_id: &UserId) -> Result<(), RoomError> {
        self.ensure_status(RoomStatus::Waiting, "switch to spectator")?;
        if self.spectator(user_id).is_some() {
            return Err(RoomError::conflict("User is already a spectator"));
        }
        let idx = self
            .players
            .iter()
            .position(|p| &p.user_id == user_id)
            .ok_or_else(|| RoomError::not_found("Player"))?;

        let player = self.players.remove(idx);
        if player.is_captain {
            self.clear_captain(&player.user_id);
        }
        self.spectators.push(Spectator {
            user_id: player.user_id,
            is_creator: player.is_creator,
            status: player.status,
            join_time: player.join_time,
        });
        Ok(())
    }

    /// Remove a user from whichever list holds them and transfer ownership
    /// if needed. No phase checks; see [`Room::leave`] and [`Room::kick`].
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user is not a member
    pub fn remove_user(&mut self, user_id: &UserId) -> Result<Removal, RoomError> {
        let (role, team_id, was_creator) =
            if let Some(idx) = self.players.iter().position(|p| &p.user_id == user_id) {
                let player = self.players.remove(idx);
                if player.is_captain {
                    self.clear_captain(&player.user_id);
                }
                (MemberRole::Player, player.team_id, player.is_creator)
            } else if let Some(idx) = self.spectators.iter().position(|s| &s.user_id == user_id) {
                let spectator = self.spectators.remove(idx);
                (MemberRole::Spectator, None, spectator.is_creator)
            } else {
                return Err(RoomError::not_found("Member"));
            };

        let new_creator = if was_creator || self.is_creator(user_id) {
            self.transfer_ownership()
        } else {
            None
        };

        Ok(Removal {
            user_id: user_id.clone(),
            role,
            team_id,
            was_creator,
            new_creator,
            is_empty: self.is_empty(),
        })
    }

    /// Voluntary departure.
    ///
    /// # Errors
    ///
    /// - `Phase` if a player leaves while the draft or match is underway
    /// - `NotFound` if the user is not a member
    pub fn leave(&mut self, user_id: &UserId) -> Result<Removal, RoomError> {
        if self.player(user_id).is_some() && self.status.is_in_progress() {
            return Err(RoomError::phase(self.status, "leave as a player"));
        }
        self.remove_user(user_id)
    }

    /// Creator removes another member.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not the creator
    /// - `Validation` if the actor targets themselves
    /// - `NotFound` if the target is not a member
    /// - `Phase` if the target is a player and the room is not `waiting`
    pub fn kick(&mut self, actor: &UserId, target: &UserId) -> Result<Removal, RoomError> {
        if !self.is_creator(actor) {
            return Err(RoomError::forbidden("Only the room creator can kick members"));
        }
        if actor == target {
            return Err(RoomError::validation(
                "target_user_id",
                "Cannot kick yourself",
            ));
        }
        match self.role_of(target) {
            None => Err(RoomError::not_found("Member")),
            Some(MemberRole::Player) if self.status != RoomStatus::Waiting => {
                Err(RoomError::phase(self.status, "kick a player"))
            }
            Some(_) => self.remove_user(target),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers shared with the draft engine
    // ─────────────────────────────────────────────────────────────────────────

    pub(super) fn ensure_status(
        &self,
        expected: RoomStatus,
        operation: &str,
    ) -> Result<(), RoomError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(RoomError::phase(self.status, operation))
        }
    }

    pub(super) fn transition(&mut self, target: RoomStatus) -> Result<(), RoomError> {
        if !self.status.can_transition_to(&target) {
            return Err(RoomError::phase(
                self.status,
                format!("move to {}", target),
            ));
        }
        self.status = target;
        Ok(())
    }

    pub(super) fn set_all_player_status(&mut self, status: MemberStatus) {
        for player in &mut self.players {
            player.status = status;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_capacity(&self) -> Result<(), RoomError> {
        if self.is_full() {
            Err(RoomError::Capacity {
                capacity: self.player_count,
            })
        } else {
            Ok(())
        }
    }

    fn clear_captain(&mut self, user_id: &UserId) {
        for team in &mut self.teams {
            if team.captain_id.as_ref() == Some(user_id) {
                team.captain_id = None;
            }
        }
    }

    /// Hand the creator flag to the earliest-joined player, else spectator.
    fn transfer_ownership(&mut self) -> Option<UserId> {
        self.creator_id = None;
        for player in &mut self.players {
            player.is_creator = false;
        }
        for spectator in &mut self.spectators {
            spectator.is_creator = false;
        }

        let heir = if let Some(p) = self.players.iter_mut().min_by_key(|p| p.join_time) {
            p.is_creator = true;
            p.user_id.clone()
        } else if let Some(s) = self.spectators.iter_mut().min_by_key(|s| s.join_time) {
            s.is_creator = true;
            s.user_id.clone()
        } else {
            return None;
        };
        self.creator_id = Some(heir.clone());
        Some(heir)
    }

    fn validate_player_count(count: u8) -> Result<(), RoomError> {
        if (MIN_PLAYER_COUNT..=MAX_PLAYER_COUNT).contains(&count) {
            Ok(())
        } else {
            Err(RoomError::validation(
                "player_count",
                format!(
                    "Player count must be between {} and {}",
                    MIN_PLAYER_COUNT, MAX_PLAYER_COUNT
                ),
            ))
        }
    }

    fn validate_name(name: &str) -> Result<String, RoomError> {
        let trimmed = name.trim();
        let len = trimmed.chars().count();
        if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len) {
            return Err(RoomError::validation(
                "name",
                format!(
                    "Room name must be {}-{} characters",
                    MIN_NAME_LENGTH, MAX_NAME_LENGTH
                ),
            ));
        }
        Ok(trimmed.to_string())
    }

    fn validate_description(description: Option<String>) -> Result<Option<String>, RoomError> {
        match description {
            Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(RoomError::validation(
                "description",
                format!(
                    "Description must be {} characters or less",
                    MAX_DESCRIPTION_LENGTH
                ),
            )),
            Some(d) if d.trim().is_empty() => Ok(None),
            other => Ok(other),
        }
    }
}
