//! Collision Routing
//!
//! Classifies raw engine contacts into game outcomes. Classification is a pure
//! lookup: the same contact always maps to the same outcome, so repeated
//! reports of a persisting contact are harmless here. Idempotence of the
//! *effects* is the state machine's job.

use serde::{Serialize, Deserialize};

use crate::game::entity::{BodyTag, EntityId};
use crate::physics::{BodyHandle, ContactEvent};

/// What a contact means to the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Player landed on a surface
    Grounded,
    /// Player touched the goal platform
    GoalReached,
    /// Player touched a hazard or an enemy
    HazardHit,
    /// Player landed on a platform with a linked enemy
    EnemyActivated(EntityId),
    /// Nothing the game cares about
    None,
}

impl Outcome {
    /// Whether the player can stand on whatever produced this outcome.
    #[inline]
    pub fn grounds_player(self) -> bool {
        matches!(self, Outcome::Grounded | Outcome::GoalReached | Outcome::EnemyActivated(_))
    }

    /// Outcome for touching a body with `tag`.
    #[inline]
    pub fn for_tag(tag: BodyTag) -> Self {
        match tag {
            BodyTag::Ground => Outcome::Grounded,
            BodyTag::Goal => Outcome::GoalReached,
            BodyTag::Hazard => Outcome::HazardHit,
            BodyTag::EnemyTrigger(trigger) => Outcome::EnemyActivated(trigger),
            BodyTag::None => Outcome::None,
        }
    }
}

/// Routes contacts involving the player body.
#[derive(Clone, Copy, Debug)]
pub struct CollisionRouter {
    player: BodyHandle,
}

impl CollisionRouter {
    /// Router for a player body.
    pub fn new(player: BodyHandle) -> Self {
        Self { player }
    }

    /// The player body.
    pub fn player(&self) -> BodyHandle {
        self.player
    }

    /// Classify a contact between `a` and `b`.
    ///
    /// `lookup` resolves a body to its tag. Contacts without the player, and
    /// contacts against untracked bodies, are [`Outcome::None`].
    pub fn classify<F>(&self, a: BodyHandle, b: BodyHandle, lookup: F) -> Outcome
    where
        F: Fn(BodyHandle) -> Option<BodyTag>,
    {
        let other = if a == self.player {
            b
        } else if b == self.player {
            a
        } else {
            return Outcome::None;
        };
        if other == self.player {
            return Outcome::None;
        }
        lookup(other).map_or(Outcome::None, Outcome::for_tag)
    }

    /// Classify an engine contact.
    #[inline]
    pub fn classify_contact<F>(&self, contact: &ContactEvent, lookup: F) -> Outcome
    where
        F: Fn(BodyHandle) -> Option<BodyTag>,
    {
        self.classify(contact.a, contact.b, lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const PLAYER: BodyHandle = BodyHandle(0);

    fn tags() -> BTreeMap<BodyHandle, BodyTag> {
        let mut tags = BTreeMap::new();
        tags.insert(BodyHandle(1), BodyTag::Ground);
        tags.insert(BodyHandle(2), BodyTag::Goal);
        tags.insert(BodyHandle(3), BodyTag::Hazard);
        tags.insert(BodyHandle(4), BodyTag::EnemyTrigger(EntityId(7)));
        tags.insert(BodyHandle(5), BodyTag::None);
        tags
    }

    #[test]
    fn test_classify_each_tag() {
        let tags = tags();
        let router = CollisionRouter::new(PLAYER);
        let lookup = |b: BodyHandle| tags.get(&b).copied();

        assert_eq!(router.classify(PLAYER, BodyHandle(1), lookup), Outcome::Grounded);
        assert_eq!(router.classify(BodyHandle(2), PLAYER, lookup), Outcome::GoalReached);
        assert_eq!(router.classify(PLAYER, BodyHandle(3), lookup), Outcome::HazardHit);
        assert_eq!(
            router.classify(PLAYER, BodyHandle(4), lookup),
            Outcome::EnemyActivated(EntityId(7))
        );
    }

    #[test]
    fn test_untracked_and_foreign_contacts_are_none() {
        let tags = tags();
        let router = CollisionRouter::new(PLAYER);
        let lookup = |b: BodyHandle| tags.get(&b).copied();

        assert_eq!(router.classify(PLAYER, BodyHandle(99), lookup), Outcome::None);
        assert_eq!(router.classify(PLAYER, BodyHandle(5), lookup), Outcome::None);
        assert_eq!(router.classify(BodyHandle(1), BodyHandle(3), lookup), Outcome::None);
        assert_eq!(router.classify(PLAYER, PLAYER, lookup), Outcome::None);
    }

    #[test]
    fn test_repeated_contact_classifies_identically() {
        let tags = tags();
        let router = CollisionRouter::new(PLAYER);
        let contact = ContactEvent::new(PLAYER, BodyHandle(2));
        let first = router.classify_contact(&contact, |b| tags.get(&b).copied());
        for _ in 0..5 {
            assert_eq!(router.classify_contact(&contact, |b| tags.get(&b).copied()), first);
        }
    }

    #[test]
    fn test_grounding_outcomes() {
        assert!(Outcome::Grounded.grounds_player());
        assert!(Outcome::GoalReached.grounds_player());
        assert!(Outcome::EnemyActivated(EntityId(0)).grounds_player());
        assert!(!Outcome::HazardHit.grounds_player());
        assert!(!Outcome::None.grounds_player());
    }
}
