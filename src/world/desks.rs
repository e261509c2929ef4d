//! Desk claim table
//!
//! The only shared mutable resource agents contend for. All mutation goes
//! through [`DeskTable`], which keeps each desk to one claimant and each
//! agent to one desk.

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::core::types::{AgentId, DeskId, Rect, Vec2};

#[derive(Debug, Clone, Serialize)]
pub struct Desk {
    pub id: DeskId,
    pub rect: Rect,
    pub claimed_by: Option<AgentId>,
    /// Terminal; broken desks are never repaired
    pub broken: bool,
}

impl Desk {
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Where a seated occupant is drawn, just below the desk centre
    pub fn seat_position(&self) -> Vec2 {
        self.center() + Vec2::new(0.0, self.rect.h * 0.4)
    }

    /// Claimable by `agent` (unbroken and unclaimed or already theirs)
    pub fn available_to(&self, agent: Option<AgentId>) -> bool {
        !self.broken && (self.claimed_by.is_none() || self.claimed_by == agent)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeskTable {
    desks: Vec<Desk>,
}

impl DeskTable {
    pub fn new(rects: &[Rect]) -> Self {
        Self {
            desks: rects
                .iter()
                .enumerate()
                .map(|(i, rect)| Desk {
                    id: DeskId(i as u32),
                    rect: *rect,
                    claimed_by: None,
                    broken: false,
                })
                .collect(),
        }
    }

    pub fn get(&self, id: DeskId) -> Option<&Desk> {
        self.desks.get(id.0 as usize).filter(|d| d.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Desk> {
        self.desks.iter()
    }

    pub fn len(&self) -> usize {
        self.desks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.desks.is_empty()
    }

    /// Check-then-set claim. Any other desk `agent` holds is released first.
    pub fn claim(&mut self, agent: AgentId, desk: DeskId) -> bool {
        let claimable = self.get(desk).map(|d| d.available_to(Some(agent))).unwrap_or(false);
        if !claimable {
            return false;
        }
        for d in self.desks.iter_mut() {
            if d.claimed_by == Some(agent) && d.id != desk {
                d.claimed_by = None;
            }
        }
        if let Some(d) = self.desks.get_mut(desk.0 as usize) {
            d.claimed_by = Some(agent);
        }
        true
    }

    /// Release whatever `agent` holds, returning the desk it held
    pub fn release(&mut self, agent: AgentId) -> Option<DeskId> {
        let mut released = None;
        for d in self.desks.iter_mut().filter(|d| d.claimed_by == Some(agent)) {
            d.claimed_by = None;
            released = Some(d.id);
        }
        released
    }

    pub fn claimed_by(&self, agent: AgentId) -> Option<DeskId> {
        self.desks.iter().find(|d| d.claimed_by == Some(agent)).map(|d| d.id)
    }

    /// Nearest desk available to `agent`; `None` means only unclaimed desks qualify
    pub fn nearest_free(&self, pos: Vec2, agent: Option<AgentId>) -> Option<&Desk> {
        self.desks
            .iter()
            .filter(|d| d.available_to(agent))
            .min_by_key(|d| OrderedFloat(d.center().distance_squared(&pos)))
    }

    /// First unbroken desk whose centre lies strictly within `radius` of `pos`
    pub fn breakable_near(&self, pos: Vec2, radius: f32) -> Option<DeskId> {
        self.desks
            .iter()
            .find(|d| !d.broken && d.center().distance(&pos) < radius)
            .map(|d| d.id)
    }

    /// Mark a desk broken and evict its claimant, returned to the caller
    pub fn break_desk(&mut self, id: DeskId) -> Option<AgentId> {
        let desk = self.desks.get_mut(id.0 as usize)?;
        desk.broken = true;
        desk.claimed_by.take()
    }

    /// Unbroken desks overlapping a circle
    pub fn colliding(&self, pos: Vec2, radius: f32) -> impl Iterator<Item = &Desk> {
        self.desks.iter().filter(move |d| {
            !d.broken && d.rect.closest_point(pos).distance_squared(&pos) < radius * radius
        })
    }

    pub fn claimed_count(&self) -> usize {
        self.desks.iter().filter(|d| d.claimed_by.is_some()).count()
    }

    pub fn broken_count(&self) -> usize {
        self.desks.iter().filter(|d| d.broken).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DeskTable {
        DeskTable::new(&[
            Rect::new(0.0, 0.0, 50.0, 36.0),
            Rect::new(100.0, 0.0, 50.0, 36.0),
            Rect::new(200.0, 0.0, 50.0, 36.0),
        ])
    }

    #[test]
    fn test_claim_is_exclusive() {
        let mut t = table();
        assert!(t.claim(AgentId(1), DeskId(0)));
        assert!(!t.claim(AgentId(2), DeskId(0)));
        assert!(t.claim(AgentId(1), DeskId(0)));
    }

    #[test]
    fn test_claim_moves_existing_claim() {
        let mut t = table();
        t.claim(AgentId(1), DeskId(0));
        t.claim(AgentId(1), DeskId(2));
        assert_eq!(t.get(DeskId(0)).and_then(|d| d.claimed_by), None);
        assert_eq!(t.claimed_by(AgentId(1)), Some(DeskId(2)));
        assert_eq!(t.claimed_count(), 1);
    }

    #[test]
    fn test_broken_desk_unclaimable_and_evicts() {
        let mut t = table();
        t.claim(AgentId(4), DeskId(1));
        assert_eq!(t.break_desk(DeskId(1)), Some(AgentId(4)));
        assert!(!t.claim(AgentId(5), DeskId(1)));
        assert_eq!(t.claimed_by(AgentId(4)), None);
        assert_eq!(t.broken_count(), 1);
    }

    #[test]
    fn test_nearest_free_skips_taken() {
        let mut t = table();
        t.claim(AgentId(1), DeskId(0));
        let near = t.nearest_free(Vec2::new(0.0, 0.0), Some(AgentId(2))).map(|d| d.id);
        assert_eq!(near, Some(DeskId(1)));
        let own = t.nearest_free(Vec2::new(0.0, 0.0), Some(AgentId(1))).map(|d| d.id);
        assert_eq!(own, Some(DeskId(0)));
    }

    #[test]
    fn test_release_returns_desk() {
        let mut t = table();
        t.claim(AgentId(3), DeskId(2));
        assert_eq!(t.release(AgentId(3)), Some(DeskId(2)));
        assert_eq!(t.release(AgentId(3)), None);
    }

    #[test]
    fn test_colliding_ignores_broken() {
        let mut t = table();
        assert_eq!(t.colliding(Vec2::new(25.0, 40.0), 16.0).count(), 1);
        t.break_desk(DeskId(0));
        assert_eq!(t.colliding(Vec2::new(25.0, 40.0), 16.0).count(), 0);
    }
}
