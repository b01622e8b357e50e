//! Per-combatant action economy.
//!
//! Primary action, secondary action and movement are turn-scoped and are
//! refilled when the owner's turn begins. The reaction is round-scoped and is
//! refilled only at a round boundary, so a reaction spent on an enemy's turn
//! stays spent through the owner's own next turn in the same round.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    PrimaryAction,
    SecondaryAction,
    Movement,
    Reaction,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::PrimaryAction => "primary action",
            ResourceKind::SecondaryAction => "secondary action",
            ResourceKind::Movement => "movement",
            ResourceKind::Reaction => "reaction",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{0} already spent")]
    Spent(ResourceKind),
    #[error("{remaining} ft of movement left, {requested} ft requested")]
    InsufficientMovement { remaining: u32, requested: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    primary_action: bool,
    secondary_action: bool,
    movement: u32,
    reaction: bool,
    speed: u32,
}

impl ResourceLedger {
    /// A ledger outside its owner's turn: only the reaction is available.
    pub fn new(speed: u32) -> Self {
        Self {
            primary_action: false,
            secondary_action: false,
            movement: 0,
            reaction: true,
            speed,
        }
    }

    pub fn can_afford(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::PrimaryAction => self.primary_action,
            ResourceKind::SecondaryAction => self.secondary_action,
            ResourceKind::Movement => self.movement > 0,
            ResourceKind::Reaction => self.reaction,
        }
    }

    /// Spend a resource. `amount` is feet for movement and ignored otherwise.
    /// A failed spend leaves the ledger untouched.
    pub fn spend(&mut self, kind: ResourceKind, amount: u32) -> Result<(), LedgerError> {
        let slot = match kind {
            ResourceKind::PrimaryAction => &mut self.primary_action,
            ResourceKind::SecondaryAction => &mut self.secondary_action,
            ResourceKind::Reaction => &mut self.reaction,
            ResourceKind::Movement => {
                if self.movement < amount {
                    return Err(LedgerError::InsufficientMovement {
                        remaining: self.movement,
                        requested: amount,
                    });
                }
                self.movement -= amount;
                return Ok(());
            }
        };
        if !*slot {
            return Err(LedgerError::Spent(kind));
        }
        *slot = false;
        Ok(())
    }

    pub fn refill(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::PrimaryAction => self.primary_action = true,
            ResourceKind::SecondaryAction => self.secondary_action = true,
            ResourceKind::Movement => self.movement = self.speed,
            ResourceKind::Reaction => self.reaction = true,
        }
    }

    /// Turn-start refill: everything except the reaction.
    pub(crate) fn refill_turn(&mut self) {
        self.refill(ResourceKind::PrimaryAction);
        self.refill(ResourceKind::SecondaryAction);
        self.refill(ResourceKind::Movement);
    }

    pub fn primary_action(&self) -> bool {
        self.primary_action
    }

    pub fn secondary_action(&self) -> bool {
        self.secondary_action
    }

    pub fn movement(&self) -> u32 {
        self.movement
    }

    pub fn reaction(&self) -> bool {
        self.reaction
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }
}
