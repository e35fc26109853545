//! Payload mutation: random byte edits and targeted structural corruption.
//!
//! Both modes start from a baseline corpus of [`TestCase`]s (normally the static
//! catalog) and return new `TestCase`s with synthesized ids: `MUT.R.<n>` for
//! random mutations and `MUT.T.<n>` for targeted ones. Random mode is driven by
//! a [`StdRng`] seeded by the caller, so a run can be replayed exactly.

use crate::catalog::TestCase;
use crate::codec::{definite_length, DeclaredLength};
use crate::malform::{LengthFault, TagFault};
use crate::walk::{self, ElementSpan};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

/// Upper bound on byte offsets changed by one random mutation.
pub const MAX_RANDOM_EDITS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Random,
    Targeted,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Random => "random",
            MutationKind::Targeted => "targeted",
        }
    }
}

impl FromStr for MutationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(MutationKind::Random),
            "targeted" => Ok(MutationKind::Targeted),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural corruption applied to one recognized element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetedOp {
    InvalidateTag,
    FlipConstructed,
    Length(LengthFault),
}

impl TargetedOp {
    /// Every operation, in the order targeted mode applies them.
    pub fn all() -> Vec<TargetedOp> {
        let mut ops = vec![TargetedOp::InvalidateTag, TargetedOp::FlipConstructed];
        ops.extend(LengthFault::ALL.into_iter().map(TargetedOp::Length));
        ops
    }
}

impl fmt::Display for TargetedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetedOp::InvalidateTag => f.write_str("invalid tag"),
            TargetedOp::FlipConstructed => f.write_str("constructed flip"),
            TargetedOp::Length(fault) => write!(f, "length {}", fault.name()),
        }
    }
}

pub struct MutationEngine {
    rng: StdRng,
    seed: u64,
}

impl MutationEngine {
    pub fn new(seed: u64) -> Self {
        MutationEngine { rng: StdRng::seed_from_u64(seed), seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn generate(&mut self, kind: MutationKind, corpus: &[TestCase], count: usize) -> Vec<TestCase> {
        match kind {
            MutationKind::Random => self.random(corpus, count),
            MutationKind::Targeted => targeted(corpus, count),
        }
    }

    /// `count` mutations, each changing 1..=[`MAX_RANDOM_EDITS`] distinct offsets of a
    /// randomly chosen baseline payload to different byte values.
    pub fn random(&mut self, corpus: &[TestCase], count: usize) -> Vec<TestCase> {
        let baselines: Vec<(&TestCase, &[u8])> = corpus
            .iter()
            .flat_map(|case| case.payloads.iter().filter(|p| !p.is_empty()).map(move |p| (case, p.as_slice())))
            .collect();
        if baselines.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(count);
        for n in 1..=count {
            let (base, payload) = baselines[self.rng.gen_range(0..baselines.len())];
            let edits = self.rng.gen_range(1..=MAX_RANDOM_EDITS.min(payload.len()));
            let mut offsets = rand::seq::index::sample(&mut self.rng, payload.len(), edits).into_vec();
            offsets.sort_unstable();

            let mut mutated = payload.to_vec();
            for &offset in &offsets {
                // 1..=255 added mod 256 never yields the original byte
                let delta: u8 = self.rng.gen_range(1..=255);
                mutated[offset] = mutated[offset].wrapping_add(delta);
            }
            out.push(TestCase::new(
                format!("MUT.R.{}", n),
                format!("Random mutation of {}", base.id),
                format!("{} byte(s) changed at offsets {:?} of {}: {}", edits, offsets, base.id, base.name),
                mutated,
                base.expected.clone(),
            ));
        }
        out
    }
}

/// One case per (baseline payload × [`TargetedOp`]), in corpus order, capped at `count`.
/// Payloads with no readable structure are skipped.
pub fn targeted(corpus: &[TestCase], count: usize) -> Vec<TestCase> {
    let ops = TargetedOp::all();
    let mut out = Vec::new();
    for case in corpus {
        for payload in &case.payloads {
            let spans = walk::scan(payload);
            let Some(target) = pick_target(&spans) else {
                continue;
            };
            for &op in &ops {
                if out.len() >= count {
                    return out;
                }
                let mutated = apply_targeted(payload, &spans, &target, op);
                let n = out.len() + 1;
                out.push(TestCase::new(
                    format!("MUT.T.{}", n),
                    format!("{} on {}", op, case.id),
                    format!("{} applied to element at offset {} of {}: {}", op, target.offset, case.id, case.name),
                    mutated,
                    case.expected.clone(),
                ));
            }
        }
    }
    out
}

/// The protocolOp (second child of the envelope), else the first child, else the envelope.
fn pick_target(spans: &[ElementSpan]) -> Option<ElementSpan> {
    let mut children = spans.iter().filter(|s| s.depth == 1);
    let first = children.next().copied();
    let second = children.next().copied();
    second.or(first).or_else(|| spans.first().copied())
}

/// Corrupt `target` inside `payload`. When the target is a child of a definite-length
/// envelope whose content is all present, the envelope length is recomputed so the
/// corruption stays confined to the target.
pub fn apply_targeted(payload: &[u8], spans: &[ElementSpan], target: &ElementSpan, op: TargetedOp) -> Vec<u8> {
    let mutated = match op {
        TargetedOp::InvalidateTag => walk::splice(payload, target.tag_range(), &TagFault::InvalidNumber.apply(0)),
        TargetedOp::FlipConstructed => {
            let lead = payload[target.offset];
            walk::splice(payload, target.offset..target.offset + 1, &TagFault::FlipConstructed.apply(lead))
        }
        TargetedOp::Length(fault) => walk::splice(payload, target.length_range(), &fault.encode(target.content_len)),
    };

    let parent = spans.iter().filter(|s| s.depth == 0 && s.offset < target.offset).last();
    let parent = match parent {
        Some(parent) if target.depth == 1 && !parent.is_truncated() => parent,
        _ => return mutated,
    };
    if let DeclaredLength::Definite(declared) = parent.declared {
        let delta = mutated.len() as i64 - payload.len() as i64;
        let new_len = declared as i64 + delta;
        if new_len >= 0 {
            // parent header precedes the target, so its range is unchanged in `mutated`
            return walk::splice(&mutated, parent.length_range(), &definite_length(new_len as usize));
        }
    }
    mutated
}
