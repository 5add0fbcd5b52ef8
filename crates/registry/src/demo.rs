//! Demo marketplace content, built by driving the public operations so every
//! seeded job is reachable through normal transitions.

use microjob_core::enums::VoteDecision;
use microjob_core::ids::{Identity, JobId};

use crate::{JobRegistry, RegistryError};

const DAY_SECS: u64 = 24 * 60 * 60;

pub const ALICE: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNY750GGH2AF55P5G8";
pub const BOB: &str = "ST20ATRN26N9P05V2F4202APF30HJXW005A8K2G4Y";
pub const CAROL: &str = "ST3J2Z4G9P05V2F4202APF30HJXW005A8K2J6F7H3";

fn reviewer(n: usize) -> Identity {
    Identity::new(format!("ST4DEMOREVIEWER{n:026}"))
}

/// Seeds four jobs: one Open, one Claimed, one InReview with a single
/// approval, one Completed. Returns their ids in that order.
pub fn seed(registry: &JobRegistry, now: u64) -> Result<Vec<JobId>, RegistryError> {
    let alice = Identity::from(ALICE);
    let bob = Identity::from(BOB);
    let carol = Identity::from(CAROL);

    let open = registry.create_job(
        &alice,
        "Design a new logo for a coffee shop brand. The design should be modern, \
         minimalist, and use earthy tones. Deliverables: SVG and PNG files.",
        150,
        now + 7 * DAY_SECS,
    )?;

    let claimed = registry.create_job(
        &bob,
        "Develop a responsive landing page using React and Tailwind CSS. The page \
         needs a hero section, feature list, and a contact form. No backend required.",
        500,
        now + 10 * DAY_SECS,
    )?;
    registry.apply_to_job(claimed.id, &carol)?;

    let in_review = registry.create_job(
        &bob,
        "Write a 1000-word blog post about the benefits of decentralized finance \
         (DeFi). The tone should be informative and accessible to beginners.",
        80,
        now.saturating_sub(DAY_SECS),
    )?;
    registry.apply_to_job(in_review.id, &alice)?;
    registry.submit_result(
        in_review.id,
        &alice,
        "QmXoypizjW3WknFiJnKLwHCnL72vedxjQkDDP1mXWo6uco",
    )?;
    if registry.config().vote_threshold > 1 {
        registry.cast_vote(in_review.id, &carol, VoteDecision::Approve)?;
    }

    let completed = registry.create_job(
        &alice,
        "Translate a 2-page document from English to Spanish. The document is \
         technical and relates to blockchain technology.",
        120,
        now + 4 * DAY_SECS,
    )?;
    registry.apply_to_job(completed.id, &carol)?;
    registry.submit_result(
        completed.id,
        &carol,
        "QmZtmD2qt6f7G4eYJMWDCDr4gV213zV1rADr5e5i2GrwVz",
    )?;
    for n in 0..registry.config().vote_threshold {
        registry.cast_vote(completed.id, &reviewer(n), VoteDecision::Approve)?;
    }
    registry.claim_reward(completed.id, &carol)?;

    tracing::info!(count = 4, "seeded demo jobs");
    Ok(vec![open.id, claimed.id, in_review.id, completed.id])
}
