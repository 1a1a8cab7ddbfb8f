//! Share link length advice.
//!
//! Long links get mangled by chat apps and mail clients. The advisor runs the
//! encode chain on a message, measures the result and says whether it is
//! within the budget. It never blocks encoding and never shrinks anything by
//! itself; it only tells the producer which photo costs the most.

use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::{compress, pack, state, CompressionError};
use crate::message::Message;

/// Default budget for a share link, in characters.
pub const DEFAULT_BUDGET_CHARS: usize = crate::LINK_BUDGET_CHARS;

/// Outcome of a budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetVerdict {
    /// The link fits in the budget (inclusive).
    WithinBudget,
    /// The link is longer than the budget.
    OverBudget,
}

/// Non-fatal notice that a share link is longer than recommended.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Share link is {link_chars} characters, over the {budget_chars}-character budget; consider removing a photo")]
pub struct OverBudgetWarning {
    pub link_chars: usize,
    pub budget_chars: usize,
}

/// Measured size of a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetReport {
    /// Length of the full link, in characters.
    pub link_chars: usize,
    /// Length of the compressed payload, in characters.
    pub payload_chars: usize,
    /// The budget the link was measured against.
    pub budget_chars: usize,
    pub verdict: BudgetVerdict,
    /// Characters each photo adds to the link, in photo order.
    /// Only filled in by [`advise`].
    pub photo_costs: Vec<usize>,
}

impl BudgetReport {
    /// Measures an already-built link.
    pub fn measure(link: &str, payload: &str, budget_chars: usize) -> Self {
        let link_chars = link.chars().count();
        Self {
            link_chars,
            payload_chars: payload.chars().count(),
            budget_chars,
            verdict: classify(link_chars, budget_chars),
            photo_costs: Vec::new(),
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.verdict == BudgetVerdict::OverBudget
    }

    /// Characters over the budget (0 when within).
    pub fn overflow(&self) -> usize {
        self.link_chars.saturating_sub(self.budget_chars)
    }

    /// The warning to show the producer, if any.
    pub fn warning(&self) -> Option<OverBudgetWarning> {
        self.is_over_budget().then(|| OverBudgetWarning {
            link_chars: self.link_chars,
            budget_chars: self.budget_chars,
        })
    }

    /// Index of the photo that adds the most characters.
    pub fn costliest_photo(&self) -> Option<usize> {
        self.photo_costs
            .iter()
            .enumerate()
            .max_by_key(|(idx, cost)| (**cost, std::cmp::Reverse(*idx)))
            .map(|(idx, _)| idx)
    }
}

/// Classifies a link length against a budget.
pub fn classify(link_chars: usize, budget_chars: usize) -> BudgetVerdict {
    if link_chars <= budget_chars {
        BudgetVerdict::WithinBudget
    } else {
        BudgetVerdict::OverBudget
    }
}

/// Builds the link for `message` and returns it with its payload.
fn build_link(message: &Message, base_url: &str) -> Result<(String, String), CompressionError> {
    let payload = compress(&state::to_json(message))?;
    let link = pack(base_url, &payload);
    Ok((link, payload))
}

/// Measures the share link `message` would produce, without side effects.
///
/// Also reports how many characters each photo contributes, so the caller
/// can suggest which one to drop.
pub fn advise(
    message: &Message,
    base_url: &str,
    budget_chars: usize,
) -> Result<BudgetReport, CompressionError> {
    let (link, payload) = build_link(message, base_url)?;
    let mut report = BudgetReport::measure(&link, &payload, budget_chars);

    for index in 0..message.photos().len() {
        let mut without = message.clone();
        without.remove_photo(index);
        let (shorter, _) = build_link(&without, base_url)?;
        report
            .photo_costs
            .push(report.link_chars.saturating_sub(shorter.chars().count()));
    }

    debug!(
        link_chars = report.link_chars,
        payload_chars = report.payload_chars,
        budget_chars,
        "budget measured"
    );
    if let Some(warning) = report.warning() {
        warn!("{}", warning);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Theme;
    use crate::photo::ImageToken;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const BASE: &str = "https://wish.example/";

    fn mia() -> Message {
        Message::new("Mia", Theme::Dreamy, "Happy 5th birthday, Mia! Lots of love.").with_age(5)
    }

    /// Incompressible bytes of a given length.
    fn noisy_token(len: usize, seed: u64) -> ImageToken {
        let mut bytes = vec![0u8; len];
        StdRng::seed_from_u64(seed).fill(bytes.as_mut_slice());
        ImageToken::from_jpeg_bytes(&bytes)
    }

    #[test]
    fn test_classify_boundary() {
        assert_eq!(classify(2000, 2000), BudgetVerdict::WithinBudget);
        assert_eq!(classify(2001, 2000), BudgetVerdict::OverBudget);
        assert_eq!(classify(0, 2000), BudgetVerdict::WithinBudget);
    }

    #[test]
    fn test_small_message_within_budget() {
        let report = advise(&mia(), BASE, DEFAULT_BUDGET_CHARS).unwrap();
        assert_eq!(report.verdict, BudgetVerdict::WithinBudget);
        assert!(report.warning().is_none());
        assert_eq!(report.overflow(), 0);
        assert!(report.photo_costs.is_empty());
        assert_eq!(report.link_chars, BASE.len() + 3 + report.payload_chars);
    }

    #[test]
    fn test_photo_pushes_over_budget() {
        let mut message = mia();
        message.add_photo(noisy_token(3000, 1)).unwrap();

        let report = advise(&message, BASE, DEFAULT_BUDGET_CHARS).unwrap();
        assert!(report.is_over_budget());
        let warning = report.warning().unwrap();
        assert_eq!(warning.link_chars, report.link_chars);
        assert!(warning.to_string().contains("2000"));
    }

    #[test]
    fn test_costliest_photo() {
        let mut message = mia();
        message.add_photo(noisy_token(100, 1)).unwrap();
        message.add_photo(noisy_token(900, 2)).unwrap();
        message.add_photo(noisy_token(300, 3)).unwrap();

        let report = advise(&message, BASE, DEFAULT_BUDGET_CHARS).unwrap();
        assert_eq!(report.photo_costs.len(), 3);
        assert_eq!(report.costliest_photo(), Some(1));
        assert!(report.photo_costs[1] > report.photo_costs[0]);
    }

    #[test]
    fn test_advise_does_not_modify_message() {
        let mut message = mia();
        message.add_photo(noisy_token(50, 9)).unwrap();
        let before = message.clone();
        advise(&message, BASE, 10).unwrap();
        assert_eq!(message, before);
    }
}
