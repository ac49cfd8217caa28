//! Negative-sampling pools and the assembly of training and evaluation
//! instances for implicit-feedback models.
//!
//! Negatives are drawn uniformly from each user's unobserved interactions.
//! The pools are built over the full dataset before splitting, so that a
//! sampled negative is never a positive of either split.
use std::collections::HashSet;

use rand::seq::sample_slice;
use rand::Rng;

use data::Interactions;
use {ItemId, UserId};

/// Sampling error types.
#[derive(Debug, Fail)]
pub enum SamplingError {
    /// A user has interacted with too many items to draw the requested
    /// number of distinct negatives.
    #[fail(
        display = "User {} has {} candidate negatives, {} requested.",
        user_id,
        available,
        requested
    )]
    PoolExhausted {
        /// The user whose pool ran out.
        user_id: UserId,
        /// Size of the user's negative pool.
        available: usize,
        /// Number of negatives requested.
        requested: usize,
    },
}

/// Per-user pools of unobserved items to sample negatives from.
pub struct NegativeSampler {
    num_items: usize,
    seen: Vec<HashSet<ItemId>>,
}

impl NegativeSampler {
    /// Build the sampler from a set of interactions.
    pub fn new(interactions: &Interactions) -> Self {
        let mut seen = vec![HashSet::new(); interactions.num_users()];

        for interaction in interactions.data() {
            seen[interaction.user_id()].insert(interaction.item_id());
        }

        NegativeSampler {
            num_items: interactions.num_items(),
            seen,
        }
    }

    /// Whether `user_id` has interacted with `item_id`.
    pub fn is_seen(&self, user_id: UserId, item_id: ItemId) -> bool {
        self.seen[user_id].contains(&item_id)
    }

    /// All items `user_id` has never interacted with.
    pub fn negative_pool(&self, user_id: UserId) -> Vec<ItemId> {
        (0..self.num_items)
            .filter(|item_id| !self.seen[user_id].contains(item_id))
            .collect()
    }

    /// Number of users covered by the sampler.
    pub fn num_users(&self) -> usize {
        self.seen.len()
    }

    /// Number of items in the index space.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    fn sample_negatives<R: Rng>(
        &self,
        user_id: UserId,
        pool: &[ItemId],
        amount: usize,
        rng: &mut R,
    ) -> Result<Vec<ItemId>, SamplingError> {
        if pool.len() < amount {
            return Err(SamplingError::PoolExhausted {
                user_id,
                available: pool.len(),
                requested: amount,
            });
        }

        Ok(sample_slice(rng, pool, amount))
    }
}

/// Labelled `(user, item)` training instances in struct-of-arrays form:
/// every positive followed by its sampled negatives.
#[derive(Debug)]
pub struct TrainingInstances {
    num_users: usize,
    num_items: usize,
    user_ids: Vec<UserId>,
    item_ids: Vec<ItemId>,
    labels: Vec<f32>,
}

impl TrainingInstances {
    /// Number of instances.
    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    /// Whether there are no instances.
    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    /// The user ids of the instances.
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    /// The item ids of the instances.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    /// The labels of the instances: the interaction weight for positives,
    /// 0.0 for sampled negatives.
    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    /// Shuffle the instances in place, keeping the parallel arrays in sync.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        rng.shuffle(&mut indices);

        self.user_ids = indices.iter().map(|&idx| self.user_ids[idx]).collect();
        self.item_ids = indices.iter().map(|&idx| self.item_ids[idx]).collect();
        self.labels = indices.iter().map(|&idx| self.labels[idx]).collect();
    }

    /// Iterate over minibatches of `minibatch_size` instances. The final
    /// partial minibatch is dropped.
    pub fn iter_minibatch(&self, minibatch_size: usize) -> TrainingMinibatchIterator {
        TrainingMinibatchIterator {
            instances: &self,
            idx: 0,
            stop_idx: self.len(),
            minibatch_size,
        }
    }

    /// Number of users in the index space.
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Number of items in the index space.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The `(num_users, num_items)` index space.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_users, self.num_items)
    }
}

/// A contiguous block of training instances.
#[derive(Debug)]
pub struct TrainingMinibatch<'a> {
    /// The user ids of the minibatch.
    pub user_ids: &'a [UserId],
    /// The item ids of the minibatch.
    pub item_ids: &'a [ItemId],
    /// The labels of the minibatch.
    pub labels: &'a [f32],
}

impl<'a> TrainingMinibatch<'a> {
    /// Number of instances in the minibatch.
    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    /// Whether the minibatch is empty.
    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }
}

/// Iterator over minibatches of training instances.
#[derive(Clone, Debug)]
pub struct TrainingMinibatchIterator<'a> {
    instances: &'a TrainingInstances,
    idx: usize,
    stop_idx: usize,
    minibatch_size: usize,
}

impl<'a> Iterator for TrainingMinibatchIterator<'a> {
    type Item = TrainingMinibatch<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        let value = if self.idx + self.minibatch_size > self.stop_idx {
            None
        } else {
            let start = self.idx;
            let stop = self.idx + self.minibatch_size;

            Some(TrainingMinibatch {
                user_ids: &self.instances.user_ids[start..stop],
                item_ids: &self.instances.item_ids[start..stop],
                labels: &self.instances.labels[start..stop],
            })
        };

        self.idx += self.minibatch_size;

        value
    }
}

/// Assemble training instances: every positive in `train` is followed by
/// `num_negatives` distinct sampled negatives labelled 0.0.
pub fn training_instances<R: Rng>(
    train: &Interactions,
    sampler: &NegativeSampler,
    num_negatives: usize,
    rng: &mut R,
) -> Result<TrainingInstances, SamplingError> {
    let capacity = train.len() * (1 + num_negatives);

    let mut user_ids = Vec::with_capacity(capacity);
    let mut item_ids = Vec::with_capacity(capacity);
    let mut labels = Vec::with_capacity(capacity);

    let mut pools: Vec<Option<Vec<ItemId>>> = vec![None; train.num_users()];

    for interaction in train.data() {
        let user_id = interaction.user_id();

        user_ids.push(user_id);
        item_ids.push(interaction.item_id());
        labels.push(interaction.weight());

        let negatives = {
            let pool = pools[user_id].get_or_insert_with(|| sampler.negative_pool(user_id));
            sampler.sample_negatives(user_id, pool, num_negatives, rng)?
        };

        for negative in negatives {
            user_ids.push(user_id);
            item_ids.push(negative);
            labels.push(0.0);
        }
    }

    let (num_users, num_items) = train.shape();

    Ok(TrainingInstances {
        num_users,
        num_items,
        user_ids,
        item_ids,
        labels,
    })
}

/// A test positive together with its sampled candidate negatives.
#[derive(Clone, Debug)]
pub struct EvaluationInstance {
    /// The evaluated user.
    pub user_id: UserId,
    /// The held-out positive item.
    pub positive: ItemId,
    /// Sampled items the user has never interacted with.
    pub negatives: Vec<ItemId>,
}

/// Assemble evaluation instances: for every positive in `test`, sample
/// `num_candidates` distinct negatives from the user's pool.
///
/// Test positives whose user pool holds fewer than `num_candidates`
/// items are skipped.
pub fn evaluation_instances<R: Rng>(
    test: &Interactions,
    sampler: &NegativeSampler,
    num_candidates: usize,
    rng: &mut R,
) -> Result<Vec<EvaluationInstance>, SamplingError> {
    let mut instances = Vec::with_capacity(test.len());
    let mut pools: Vec<Option<Vec<ItemId>>> = vec![None; test.num_users()];

    for interaction in test.data() {
        let user_id = interaction.user_id();

        let negatives = {
            let pool = pools[user_id].get_or_insert_with(|| sampler.negative_pool(user_id));

            if pool.len() < num_candidates {
                continue;
            }

            sampler.sample_negatives(user_id, pool, num_candidates, rng)?
        };

        instances.push(EvaluationInstance {
            user_id,
            positive: interaction.item_id(),
            negatives,
        });
    }

    Ok(instances)
}
