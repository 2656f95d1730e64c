//! Constrained proportional allocation of an aggregate count
//!
//! Splits one aggregate target (e.g. the student total of a regency for one
//! level and ownership) across the members of a group so that every member
//! lands inside its own `[min, max]` bounds and the shares sum to the
//! target whenever the bounds allow it.
//!
//! # Procedure
//!
//! 1. Random weighted split (weights uniform in `[0.7, 1.3]`), last member
//!    absorbs the rounding remainder
//! 2. Clamp every share into its bounds
//! 3. Over target: cut proportionally to headroom above the minimum, then
//!    lower the largest minimums down to the level floor, then truncate
//! 4. Under target: fill proportionally to headroom below the maximum
//! 5. Exact-total correction at one member strictly inside its bounds
//! 6. Smoothing so shares do not sit on the round base maximum and a group
//!    never comes out perfectly uniform
//!
//! Infeasible inputs never fail; they are reported through [`Outcome`].
//! The random source is injected, so a seeded RNG makes runs reproducible.
//!
//! # Example
//!
//! ```
//! use edumon::allocation::{Allocator, Outcome};
//! use edumon::models::Level;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let allocation = Allocator::for_level(Level::Sd)
//!     .allocate(1000, 3, &mut rng)
//!     .unwrap();
//!
//! assert_eq!(allocation.shares.len(), 3);
//! assert_eq!(allocation.total(), 1000);
//! assert_eq!(allocation.outcome, Outcome::Exact);
//! ```

pub mod limits;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use limits::{Bounds, LevelLimits};

use crate::models::Level;

/// Weight range of the initial random split
const WEIGHT_LOW: f64 = 0.7;
const WEIGHT_HIGH: f64 = 1.3;

/// Allocation precondition violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("cannot allocate {target} across an empty group")]
    EmptyGroup { target: u64 },
}

/// How closely an allocation honours its target and bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Shares sum to the target and every share is within its bounds
    Exact,

    /// Shares sum to the target, but some minimums were lowered (never
    /// below the level floor) by `relaxed_by` units in total
    MinimumsRelaxed { relaxed_by: u64 },

    /// Even the floored minimums exceeded the target by `excess`; shares
    /// were truncated toward zero to hit the target and some sit below
    /// their minimum
    FloorExceedsTarget { excess: u64 },

    /// Every share is at its maximum and the sum is still `shortfall`
    /// below the target
    TargetExceedsCeiling { shortfall: u64 },
}

impl Outcome {
    /// Whether the shares sum exactly to the target
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact | Self::MinimumsRelaxed { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::MinimumsRelaxed { .. } => "minimums_relaxed",
            Self::FloorExceedsTarget { .. } => "floor_exceeds_target",
            Self::TargetExceedsCeiling { .. } => "target_exceeds_ceiling",
        }
    }
}

/// Result of one allocation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// One share per group member, in input order
    pub shares: Vec<u64>,
    pub outcome: Outcome,
}

impl Allocation {
    pub fn total(&self) -> u64 {
        self.shares.iter().sum()
    }

    pub fn is_exact(&self) -> bool {
        self.outcome.is_exact()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

/// Allocation engine for one level
///
/// Stateless between calls; the same allocator can serve every group of
/// its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocator {
    limits: LevelLimits,
}

impl Allocator {
    pub fn new(limits: LevelLimits) -> Self {
        Self { limits }
    }

    /// Allocator with the built-in limits of a level
    pub fn for_level(level: Level) -> Self {
        Self::new(LevelLimits::for_level(level))
    }

    pub fn limits(&self) -> &LevelLimits {
        &self.limits
    }

    /// Allocate `target` across `count` members, sampling each member's
    /// bounds from the level limits
    pub fn allocate<R: Rng + ?Sized>(
        &self,
        target: u64,
        count: usize,
        rng: &mut R,
    ) -> Result<Allocation, AllocationError> {
        if count == 0 {
            return empty_group(target);
        }

        let weights = draw_weights(count, rng);
        let bounds: Vec<Bounds> = (0..count).map(|_| self.limits.sample(rng)).collect();
        Ok(self.distribute(target, &weights, bounds))
    }

    /// Allocate `target` across members with caller-supplied bounds
    pub fn allocate_within<R: Rng + ?Sized>(
        &self,
        target: u64,
        bounds: &[Bounds],
        rng: &mut R,
    ) -> Result<Allocation, AllocationError> {
        if bounds.is_empty() {
            return empty_group(target);
        }

        let weights = draw_weights(bounds.len(), rng);
        Ok(self.distribute(target, &weights, bounds.to_vec()))
    }

    fn distribute(&self, target: u64, weights: &[f64], mut bounds: Vec<Bounds>) -> Allocation {
        let mut shares = weighted_split(target, weights);
        for (share, b) in shares.iter_mut().zip(&bounds) {
            *share = b.clamp(*share);
        }

        let mut relaxed_by = 0;
        let total: u64 = shares.iter().sum();

        if total > target {
            let over = shrink_toward_minimum(&mut shares, &bounds, total - target);
            if over > 0 {
                let (excess, relaxed) = self.relax_minimums(&mut shares, &mut bounds, over);
                relaxed_by = relaxed;
                if excess > 0 {
                    truncate_from_end(&mut shares, excess);
                    return Allocation {
                        shares,
                        outcome: Outcome::FloorExceedsTarget { excess },
                    };
                }
            }
        } else if total < target {
            let shortfall = raise_toward_maximum(&mut shares, &bounds, target - total);
            if shortfall > 0 {
                return Allocation {
                    shares,
                    outcome: Outcome::TargetExceedsCeiling { shortfall },
                };
            }
        }

        correct_total(&mut shares, &bounds, target);
        self.smooth(&mut shares, &bounds);

        let outcome = if relaxed_by > 0 {
            Outcome::MinimumsRelaxed { relaxed_by }
        } else {
            Outcome::Exact
        };
        Allocation { shares, outcome }
    }

    /// Lower minimums, largest first, down to the level floor.
    ///
    /// Called only once every share already sits on its minimum. Returns
    /// the overshoot left after relaxing and the total amount relaxed.
    fn relax_minimums(&self, shares: &mut [u64], bounds: &mut [Bounds], over: u64) -> (u64, u64) {
        let floor = self.limits.min_low;
        let mut order: Vec<usize> = (0..shares.len()).collect();
        order.sort_by(|&a, &b| bounds[b].min.cmp(&bounds[a].min));

        let mut remaining = over;
        let mut relaxed = 0;
        for i in order {
            if remaining == 0 {
                break;
            }
            let cut = bounds[i].min.saturating_sub(floor).min(remaining);
            bounds[i].min -= cut;
            shares[i] -= cut;
            remaining -= cut;
            relaxed += cut;
        }
        (remaining, relaxed)
    }

    /// Nudge shares off the round base maximum and break up uniform groups.
    /// Never changes the total or leaves a share outside its bounds.
    fn smooth(&self, shares: &mut [u64], bounds: &[Bounds]) {
        let n = shares.len();
        if n < 2 {
            return;
        }

        let base_max = self.limits.base_max;
        for i in 0..n {
            if shares[i] != base_max {
                continue;
            }
            let give_to = by_distance(i, n).find(|&j| shares[j] < bounds[j].max && shares[j] + 1 != base_max);
            if let (true, Some(j)) = (shares[i] > bounds[i].min, give_to) {
                shares[i] -= 1;
                shares[j] += 1;
                continue;
            }

            // jittered overflow paid for by the nearest member above its minimum
            let take_from = by_distance(i, n).find(|&j| shares[j] > bounds[j].min && shares[j] - 1 != base_max);
            if let (true, Some(j)) = (shares[i] < bounds[i].max, take_from) {
                shares[i] += 1;
                shares[j] -= 1;
            }
        }

        if shares.iter().all(|&s| s == shares[0]) {
            for a in (0..n - 1).step_by(2) {
                let b = a + 1;
                if shares[a] > bounds[a].min && shares[b] < bounds[b].max {
                    shares[a] -= 1;
                    shares[b] += 1;
                } else if shares[b] > bounds[b].min && shares[a] < bounds[a].max {
                    shares[b] -= 1;
                    shares[a] += 1;
                }
            }
        }
    }
}

/// A zero target over no members is trivially exact; anything else has
/// nowhere to go.
///
/// A zero target over a non-empty group is not special-cased: the regular
/// path truncates every share to zero and reports the floored minimums as
/// `FloorExceedsTarget`.
fn empty_group(target: u64) -> Result<Allocation, AllocationError> {
    if target > 0 {
        return Err(AllocationError::EmptyGroup { target });
    }
    Ok(Allocation {
        shares: Vec::new(),
        outcome: Outcome::Exact,
    })
}

/// Every other member index, nearest to `i` first, right before left
fn by_distance(i: usize, n: usize) -> impl Iterator<Item = usize> {
    (1..n)
        .flat_map(move |d| [i.checked_add(d), i.checked_sub(d)])
        .flatten()
        .filter(move |&j| j < n)
}

fn draw_weights<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<f64> {
    (0..count)
        .map(|_| rng.gen_range(WEIGHT_LOW..=WEIGHT_HIGH))
        .collect()
}

/// Round each weighted share but the last; the last absorbs the remainder.
fn weighted_split(target: u64, weights: &[f64]) -> Vec<u64> {
    let total_weight: f64 = weights.iter().sum();
    let Some((_, head)) = weights.split_last() else {
        return Vec::new();
    };

    let mut shares: Vec<u64> = head
        .iter()
        .map(|w| (target as f64 * w / total_weight).round() as u64)
        .collect();
    let assigned: u64 = shares.iter().sum();

    if assigned <= target {
        shares.push(target - assigned);
    } else {
        // rounding overshot on tiny targets; hand the excess back from the end
        shares.push(0);
        truncate_from_end(&mut shares, assigned - target);
    }
    shares
}

/// Cut `over` units proportionally to each share's headroom above its
/// minimum, sweeping rounding leftovers front to back. Returns what could
/// not be cut.
fn shrink_toward_minimum(shares: &mut [u64], bounds: &[Bounds], over: u64) -> u64 {
    let mut headroom: Vec<u64> = shares
        .iter()
        .zip(bounds)
        .map(|(s, b)| s - b.min)
        .collect();
    let total_headroom: u64 = headroom.iter().sum();
    let mut remaining = over;

    if total_headroom > over {
        for (i, room) in headroom.iter_mut().enumerate() {
            let cut = proportional(over, *room, total_headroom).min(*room);
            shares[i] -= cut;
            *room -= cut;
            remaining -= cut;
        }
    }

    for (i, room) in headroom.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        let cut = (*room).min(remaining);
        shares[i] -= cut;
        remaining -= cut;
    }
    remaining
}

/// Add `under` units proportionally to each share's room below its
/// maximum, sweeping rounding leftovers front to back. Returns what could
/// not be placed.
fn raise_toward_maximum(shares: &mut [u64], bounds: &[Bounds], under: u64) -> u64 {
    let mut room: Vec<u64> = shares
        .iter()
        .zip(bounds)
        .map(|(s, b)| b.max - s)
        .collect();
    let total_room: u64 = room.iter().sum();
    let mut remaining = under;

    if total_room > under {
        for (i, r) in room.iter_mut().enumerate() {
            let add = proportional(under, *r, total_room).min(*r);
            shares[i] += add;
            *r -= add;
            remaining -= add;
        }
    }

    for (i, r) in room.iter().enumerate() {
        if remaining == 0 {
            break;
        }
        let add = (*r).min(remaining);
        shares[i] += add;
        remaining -= add;
    }
    remaining
}

/// floor(amount * part / whole) without overflow
fn proportional(amount: u64, part: u64, whole: u64) -> u64 {
    (u128::from(amount) * u128::from(part) / u128::from(whole)) as u64
}

fn truncate_from_end(shares: &mut [u64], mut excess: u64) {
    for share in shares.iter_mut().rev() {
        if excess == 0 {
            break;
        }
        let cut = (*share).min(excess);
        *share -= cut;
        excess -= cut;
    }
}

/// Apply any residual delta at the first share strictly inside its bounds
/// (else the last share), then re-clamp.
fn correct_total(shares: &mut [u64], bounds: &[Bounds], target: u64) {
    let total: u64 = shares.iter().sum();
    if total == target || shares.is_empty() {
        return;
    }

    let idx = shares
        .iter()
        .zip(bounds)
        .position(|(s, b)| b.min < *s && *s < b.max)
        .unwrap_or(shares.len() - 1);

    let adjusted = if target > total {
        shares[idx] + (target - total)
    } else {
        shares[idx].saturating_sub(total - target)
    };
    shares[idx] = bounds[idx].clamp(adjusted);
}
