//! Reputation Ledger
//!
//! This data structure keeps track of the reputation `score` associated with
//! every identity `N`, along with a history of adjustments and any stakes
//! currently locked against future actions. It is deliberately generic over
//! the identity type `N` and the action-id type `A` (both `Clone + Eq + Hash
//! + Ord`) so it carries no dependency on the concrete identifier types used
//! by the rest of the workspace.
use std::collections::BTreeMap;
use std::hash::Hash;

use rumorcast_config::Config;

use crate::error::ReputationError;

/// The kind of action a stake (or a reward/slash) is associated with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Casting a vote on a rumor.
    Vote,
    /// Posting a new rumor.
    Post,
    /// Filing a dispute.
    Dispute,
}

impl Action {
    fn min_stake(self, cfg: &Config) -> u64 {
        match self {
            Action::Vote => cfg.min_stake_vote,
            Action::Post => cfg.min_stake_post,
            Action::Dispute => cfg.min_stake_dispute,
        }
    }

    /// Fraction of current score that may be staked on a single action of
    /// this kind (4.G: vote 0.25, post/dispute 0.50).
    fn cap_fraction(self) -> f64 {
        match self {
            Action::Vote => 0.25,
            Action::Post | Action::Dispute => 0.50,
        }
    }
}

/// A stake locked against a pending action, keyed by action id in
/// [`ReputationLedger`].
#[derive(Clone, Debug, PartialEq)]
pub struct LockedStake {
    /// The amount locked.
    pub amount: u64,
    /// The action the stake was locked for.
    pub action: Action,
}

/// The kind of a [`HistoryEntry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HistoryKind {
    /// Account registration.
    Register,
    /// A stake was locked.
    StakeLock,
    /// A previously locked stake was released without a score change.
    StakeRelease,
    /// A positive BTS/RBTS score rewarded the account.
    Reward,
    /// A negative BTS/RBTS score slashed the account.
    Slash,
    /// A cluster-wide slash applied identically to every member.
    GroupSlash,
    /// A periodic multiplicative decay.
    Decay,
    /// A periodic additive recovery toward the initial trust score.
    Recovery,
}

/// One entry in an account's reputation history.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry<A> {
    /// What kind of adjustment this was.
    pub kind: HistoryKind,
    /// The score delta actually applied, after clamping into
    /// `[min_score, max_score]`.
    pub delta: f64,
    /// The action id this entry refers to, if any (e.g. the rumor a reward
    /// was paid out for).
    pub reference: Option<A>,
}

#[derive(Clone, Debug)]
struct Account<A> {
    score: f64,
    history: Vec<HistoryEntry<A>>,
    locked: BTreeMap<A, LockedStake>,
}

/// Result of [`ReputationLedger::apply_scores`]: the reward or slash actually
/// applied to every voter present in the score result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppliedScores<N: Ord> {
    /// `nullifier -> reward amount` for voters with a positive score.
    pub rewards: BTreeMap<N, f64>,
    /// `nullifier -> slash amount` for voters with a negative score.
    pub slashes: BTreeMap<N, f64>,
}

/// Reputation ledger (§4.G).
///
/// Initial score on [`register`](Self::register) is `config.initial_trust_score`;
/// every score is clamped into `[config.min_score, config.max_score]` (I4) and
/// `sum(lockedStakes.amount) <= score` is enforced at lock time (I5).
#[derive(Clone, Debug)]
pub struct ReputationLedger<N, A>
where
    N: Clone + Eq + Hash + Ord,
    A: Clone + Eq + Hash + Ord,
{
    config: Config,
    accounts: BTreeMap<N, Account<A>>,
}

impl<N, A> ReputationLedger<N, A>
where
    N: Clone + Eq + Hash + Ord,
    A: Clone + Eq + Hash + Ord,
{
    /// Build a new, empty ledger with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            accounts: BTreeMap::new(),
        }
    }

    /// Register a new account. Idempotent: registering twice is a no-op.
    pub fn register(&mut self, n: N) {
        if self.accounts.contains_key(&n) {
            return;
        }
        self.accounts.insert(
            n,
            Account {
                score: self.config.initial_trust_score,
                history: vec![HistoryEntry {
                    kind: HistoryKind::Register,
                    delta: self.config.initial_trust_score,
                    reference: None,
                }],
                locked: BTreeMap::new(),
            },
        );
    }

    /// Current score for an account, or `None` if unregistered.
    pub fn score(&self, n: &N) -> Option<f64> {
        self.accounts.get(n).map(|a| a.score)
    }

    /// Read-only access to an account's history.
    pub fn history(&self, n: &N) -> &[HistoryEntry<A>] {
        self.accounts
            .get(n)
            .map(|a| a.history.as_slice())
            .unwrap_or(&[])
    }

    fn locked_total(account: &Account<A>) -> u64 {
        account.locked.values().map(|l| l.amount).sum()
    }

    /// Whether `n` may lock `amount` for `action` right now.
    pub fn can_stake(&self, n: &N, amount: u64, action: Action) -> bool {
        let Some(account) = self.accounts.get(n) else {
            return false;
        };
        if amount < action.min_stake(&self.config) {
            return false;
        }
        if (amount as f64) > action.cap_fraction() * account.score {
            return false;
        }
        let locked = Self::locked_total(account);
        account.score - (locked as f64) >= amount as f64
    }

    /// Lock `amount` against `action_id`, failing with
    /// [`ReputationError::StakeNotPermitted`] if [`can_stake`](Self::can_stake)
    /// would return `false`.
    pub fn lock_stake(
        &mut self,
        n: &N,
        amount: u64,
        action_id: A,
        action: Action,
    ) -> Result<(), ReputationError> {
        if !self.can_stake(n, amount, action) {
            return Err(ReputationError::StakeNotPermitted);
        }
        let account = self.accounts.get_mut(n).expect("can_stake checked existence");
        account.locked.insert(
            action_id.clone(),
            LockedStake { amount, action },
        );
        account.history.push(HistoryEntry {
            kind: HistoryKind::StakeLock,
            delta: 0.0,
            reference: Some(action_id),
        });
        Ok(())
    }

    /// Release a previously locked stake without changing the score.
    pub fn release_lock(&mut self, n: &N, action_id: &A) -> Result<(), ReputationError> {
        let account = self.accounts.get_mut(n).ok_or(ReputationError::UnknownAccount)?;
        if account.locked.remove(action_id).is_none() {
            return Err(ReputationError::UnknownLock);
        }
        account.history.push(HistoryEntry {
            kind: HistoryKind::StakeRelease,
            delta: 0.0,
            reference: Some(action_id.clone()),
        });
        Ok(())
    }

    /// Apply a clamped score delta to `n`, auto-registering if absent, and
    /// record the clamped amount in history. Returns the delta actually
    /// applied.
    fn adjust(&mut self, n: &N, kind: HistoryKind, delta: f64, reference: Option<A>) -> f64 {
        self.register(n.clone());
        let account = self.accounts.get_mut(n).expect("just registered");
        let before = account.score;
        let after = (before + delta).clamp(self.config.min_score, self.config.max_score);
        account.score = after;
        let applied = after - before;
        account.history.push(HistoryEntry {
            kind,
            delta: applied,
            reference,
        });
        applied
    }

    /// Apply a `BTS`/`RBTS` score result to every voter it covers (4.F -> 4.G).
    ///
    /// For each voter: `score_i > 0` rewards `score_i * stake_i * reward_mult`;
    /// `score_i < 0` slashes `|score_i| * stake_i * slash_mult`; `score_i == 0`
    /// is a no-op. The lock previously held for `action_id` is released
    /// (if present) regardless of the sign of the score.
    pub fn apply_scores(
        &mut self,
        voter_scores: &BTreeMap<N, f64>,
        stakes: &BTreeMap<N, u64>,
        action_id: A,
    ) -> AppliedScores<N> {
        let mut result = AppliedScores::default();
        // Deterministic: BTreeMap iterates in key order already (P5 / "Float
        // Determinism" design note — never rely on hash-map iteration order).
        for (n, score) in voter_scores {
            let stake = stakes.get(n).copied().unwrap_or(1) as f64;
            if *score > 0.0 {
                let reward = score * stake * self.config.reward_mult;
                let applied = self.adjust(n, HistoryKind::Reward, reward, Some(action_id.clone()));
                result.rewards.insert(n.clone(), applied);
            } else if *score < 0.0 {
                let slash = score.abs() * stake * self.config.slash_mult;
                let applied = self.adjust(n, HistoryKind::Slash, -slash, Some(action_id.clone()));
                result.slashes.insert(n.clone(), applied.abs());
            }
            let _ = self.release_lock(n, &action_id);
        }
        result
    }

    /// Apply an identical penalty to every member of a coordinated cluster
    /// (4.E/4.G): `penalty = base_penalty * (1 + log2(max(|nullifiers|, 1)))`.
    pub fn apply_group_slash(
        &mut self,
        nullifiers: &[N],
        base_penalty: f64,
        reference: A,
    ) -> BTreeMap<N, f64> {
        let size = nullifiers.len().max(1) as f64;
        let penalty = base_penalty * (1.0 + size.log2());
        let mut sorted: Vec<&N> = nullifiers.iter().collect();
        sorted.sort();
        let mut out = BTreeMap::new();
        for n in sorted {
            let applied = self.adjust(n, HistoryKind::GroupSlash, -penalty, Some(reference.clone()));
            out.insert(n.clone(), applied.abs());
        }
        out
    }

    /// Multiply every account's score by `rate` (default
    /// `config.decay_rate`).
    pub fn apply_decay(&mut self, rate: Option<f64>) {
        let rate = rate.unwrap_or(self.config.decay_rate);
        let nullifiers: Vec<N> = self.accounts.keys().cloned().collect();
        for n in nullifiers {
            let before = self.accounts[&n].score;
            let delta = before * rate - before;
            self.adjust(&n, HistoryKind::Decay, delta, None);
        }
    }

    /// Add `rate` (default `config.recovery_rate`) to every account below
    /// `config.initial_trust_score`, capped at that value.
    pub fn apply_recovery(&mut self, rate: Option<f64>) {
        let rate = rate.unwrap_or(self.config.recovery_rate);
        let initial = self.config.initial_trust_score;
        let nullifiers: Vec<N> = self
            .accounts
            .iter()
            .filter(|(_, a)| a.score < initial)
            .map(|(n, _)| n.clone())
            .collect();
        for n in nullifiers {
            let before = self.accounts[&n].score;
            let delta = (before + rate).min(initial) - before;
            self.adjust(&n, HistoryKind::Recovery, delta, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ledger() -> ReputationLedger<String, String> {
        ReputationLedger::new(Config::default())
    }

    #[test]
    fn register_is_idempotent() {
        let mut l = ledger();
        l.register("u1".to_string());
        l.register("u1".to_string());
        assert_eq!(l.score(&"u1".to_string()), Some(10.0));
    }

    #[test]
    fn scenario_s4_asymmetric_reputation() {
        // S4: +1.0 then -1.0 on equal stake nets negative.
        let mut l = ledger();
        l.register("u1".to_string());

        let mut scores = BTreeMap::new();
        scores.insert("u1".to_string(), 1.0);
        let mut stakes = BTreeMap::new();
        stakes.insert("u1".to_string(), 1u64);
        l.apply_scores(&scores, &stakes, "r1".to_string());
        assert_relative_eq!(l.score(&"u1".to_string()).unwrap(), 11.0);

        let mut scores2 = BTreeMap::new();
        scores2.insert("u1".to_string(), -1.0);
        l.apply_scores(&scores2, &stakes, "r2".to_string());
        assert_relative_eq!(l.score(&"u1".to_string()).unwrap(), 9.5);
    }

    #[test]
    fn reward_and_slash_asymmetry_is_structural() {
        // A generic equal-magnitude +/- pair always nets negative because
        // slash_mult > reward_mult.
        let mut l = ledger();
        l.register("u1".to_string());
        let mut stakes = BTreeMap::new();
        stakes.insert("u1".to_string(), 2u64);

        let mut up = BTreeMap::new();
        up.insert("u1".to_string(), 0.5);
        let before = l.score(&"u1".to_string()).unwrap();
        l.apply_scores(&up, &stakes, "a".to_string());
        let after_reward = l.score(&"u1".to_string()).unwrap();

        let mut down = BTreeMap::new();
        down.insert("u1".to_string(), -0.5);
        l.apply_scores(&down, &stakes, "b".to_string());
        let after_slash = l.score(&"u1".to_string()).unwrap();

        assert!(after_reward > before);
        assert!(after_slash < after_reward);
        assert!(after_slash < before, "equal +/- must net negative");
    }

    #[test]
    fn can_stake_respects_minimum_and_cap_and_headroom() {
        let mut l = ledger();
        l.register("u1".to_string());
        // score = 10, vote cap fraction 0.25 -> max stake 2 (floor)
        assert!(!l.can_stake(&"u1".to_string(), 0, Action::Vote)); // below min 1
        assert!(l.can_stake(&"u1".to_string(), 1, Action::Vote));
        assert!(!l.can_stake(&"u1".to_string(), 3, Action::Vote)); // > 0.25*10=2.5
        assert!(!l.can_stake(&"u1".to_string(), 100, Action::Post)); // > 0.5*10=5
    }

    #[test]
    fn lock_then_release_frees_headroom() {
        let mut l = ledger();
        l.register("u1".to_string());
        // score = 10; post cap 5, dispute cap 5. Lock both fully to exhaust headroom.
        l.lock_stake(&"u1".to_string(), 5, "post-r1".to_string(), Action::Post)
            .unwrap();
        l.lock_stake(&"u1".to_string(), 5, "dispute-r1".to_string(), Action::Dispute)
            .unwrap();
        // headroom is now 0: a 1-unit vote (well within its own cap) is refused.
        assert!(!l.can_stake(&"u1".to_string(), 1, Action::Vote));
        l.release_lock(&"u1".to_string(), &"dispute-r1".to_string())
            .unwrap();
        assert!(l.can_stake(&"u1".to_string(), 1, Action::Vote));
    }

    #[test]
    fn lock_stake_fails_over_cap() {
        let mut l = ledger();
        l.register("u1".to_string());
        let err = l
            .lock_stake(&"u1".to_string(), 100, "r1".to_string(), Action::Vote)
            .unwrap_err();
        assert_eq!(err, ReputationError::StakeNotPermitted);
    }

    #[test]
    fn score_clamped_into_bounds() {
        let mut l = ledger();
        l.register("u1".to_string());
        let mut scores = BTreeMap::new();
        scores.insert("u1".to_string(), 10_000.0);
        let mut stakes = BTreeMap::new();
        stakes.insert("u1".to_string(), 1000u64);
        l.apply_scores(&scores, &stakes, "r1".to_string());
        assert_eq!(l.score(&"u1".to_string()), Some(1000.0));
    }

    #[test]
    fn group_slash_scales_with_log2_of_cluster_size() {
        let mut l = ledger();
        for i in 0..4 {
            l.register(format!("u{i}"));
        }
        let members: Vec<String> = (0..4).map(|i| format!("u{i}")).collect();
        let out = l.apply_group_slash(&members, 1.0, "r1".to_string());
        // penalty = 1.0 * (1 + log2(4)) = 3.0, identical for all members
        for n in &members {
            assert_relative_eq!(out[n], 3.0);
            assert_relative_eq!(l.score(n).unwrap(), 7.0);
        }
    }

    #[test]
    fn decay_then_recovery_moves_toward_initial() {
        let mut l = ledger();
        l.register("u1".to_string());
        let mut scores = BTreeMap::new();
        scores.insert("u1".to_string(), 5.0);
        let mut stakes = BTreeMap::new();
        stakes.insert("u1".to_string(), 1u64);
        l.apply_scores(&scores, &stakes, "r1".to_string());
        let high = l.score(&"u1".to_string()).unwrap();
        assert!(high > 10.0);

        l.apply_decay(None);
        let decayed = l.score(&"u1".to_string()).unwrap();
        assert_relative_eq!(decayed, high * 0.99);

        // force below initial, then recover
        let mut down = BTreeMap::new();
        down.insert("u1".to_string(), -100.0);
        l.apply_scores(&down, &stakes, "r2".to_string());
        assert_eq!(l.score(&"u1".to_string()), Some(0.0));

        l.apply_recovery(None);
        assert_relative_eq!(l.score(&"u1".to_string()).unwrap(), 0.1);
    }
}
