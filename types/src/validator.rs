use std::fmt::{self, Display, Formatter};

use datasize::DataSize;
use serde::{Deserialize, Serialize};

use crate::PublicKey;

/// A consensus participant and its voting power.
#[derive(Clone, Copy, DataSize, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Validator {
    public_key: PublicKey,
    voting_power: u64,
}

impl Validator {
    /// Creates a new validator.
    pub fn new(public_key: PublicKey, voting_power: u64) -> Self {
        Validator {
            public_key,
            voting_power,
        }
    }

    /// Returns the validator's public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns the validator's voting power.
    pub fn voting_power(&self) -> u64 {
        self.voting_power
    }
}

/// The validators entitled to vote at a given height.
///
/// Validators are kept sorted by public key, so lookups are binary searches.
#[derive(Clone, DataSize, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
}

impl ValidatorSet {
    /// Creates a validator set.
    ///
    /// If a public key appears more than once, the last entry wins.
    pub fn new<I: IntoIterator<Item = Validator>>(validators: I) -> Self {
        let mut validators: Vec<Validator> = validators.into_iter().collect();
        validators.reverse();
        validators.sort_by(|lhs, rhs| lhs.public_key.cmp(&rhs.public_key));
        validators.dedup_by(|later, earlier| later.public_key == earlier.public_key);
        ValidatorSet { validators }
    }

    /// Returns the validator with the given key, if it is a member.
    pub fn get(&self, public_key: &PublicKey) -> Option<&Validator> {
        self.validators
            .binary_search_by(|validator| validator.public_key.cmp(public_key))
            .ok()
            .map(|index| &self.validators[index])
    }

    /// Returns the summed voting power of all validators.
    pub fn total_voting_power(&self) -> u64 {
        self.validators
            .iter()
            .fold(0u64, |total, validator| {
                total.saturating_add(validator.voting_power)
            })
    }

    /// Returns the number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns `true` if there are no validators.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Returns an iterator over the validators, ordered by public key.
    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.iter()
    }
}

impl Display for ValidatorSet {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "{} validators with total power {}",
            self.len(),
            self.total_voting_power()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestRng;

    #[test]
    fn lookup_and_total_power() {
        let mut rng = TestRng::new();
        let alice = PublicKey::random(&mut rng);
        let bob = PublicKey::random(&mut rng);
        let carol = PublicKey::random(&mut rng);
        let set = ValidatorSet::new(vec![
            Validator::new(alice, 10),
            Validator::new(bob, 20),
            Validator::new(alice, 5),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(&alice).map(Validator::voting_power), Some(5));
        assert_eq!(set.get(&bob).map(Validator::voting_power), Some(20));
        assert!(set.get(&carol).is_none());
        assert_eq!(set.total_voting_power(), 25);
    }
}
