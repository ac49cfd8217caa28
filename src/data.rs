//! Interaction data structures, dense re-indexing, and train/test splits.
use std::cmp::Ordering;
use std::collections::HashMap;

use ndarray::Array2;
use rand::Rng;

use super::{ItemId, Timestamp, UserId};

/// A single rating row: a user interacting with an item at a point in time.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Interaction {
    user_id: UserId,
    item_id: ItemId,
    weight: f32,
    timestamp: Timestamp,
}

impl Interaction {
    /// Build a new interaction.
    pub fn new(user_id: UserId, item_id: ItemId, weight: f32, timestamp: Timestamp) -> Self {
        Interaction {
            user_id,
            item_id,
            weight,
            timestamp,
        }
    }

    /// The id of the interacting user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
    /// The id of the item interacted with.
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }
    /// The interaction weight: the raw rating, or 1.0 after binarization.
    pub fn weight(&self) -> f32 {
        self.weight
    }
    /// The interaction timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Maps raw file identifiers to dense contiguous indices
/// in first-appearance order.
#[derive(Clone, Debug, Default)]
pub struct IdIndex {
    indices: HashMap<u32, usize>,
    ids: Vec<u32>,
}

impl IdIndex {
    /// Build an empty index.
    pub fn new() -> Self {
        IdIndex {
            indices: HashMap::new(),
            ids: Vec::new(),
        }
    }

    /// Return the dense index for `raw_id`, assigning the next free
    /// index if the id has not been seen before.
    pub fn get_or_assign(&mut self, raw_id: u32) -> usize {
        let next_id = self.ids.len();
        let ids = &mut self.ids;

        *self.indices.entry(raw_id).or_insert_with(|| {
            ids.push(raw_id);
            next_id
        })
    }

    /// Return the dense index for `raw_id`, if assigned.
    pub fn get(&self, raw_id: u32) -> Option<usize> {
        self.indices.get(&raw_id).cloned()
    }

    /// Return the raw id for `dense_id`, if assigned.
    pub fn raw(&self, dense_id: usize) -> Option<u32> {
        self.ids.get(dense_id).cloned()
    }

    /// Number of distinct ids seen so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Randomly split interactions into training and test sets.
pub fn train_test_split<R: Rng>(
    interactions: &mut Interactions,
    rng: &mut R,
    test_fraction: f32,
) -> (Interactions, Interactions) {
    interactions.shuffle(rng);

    let (test, train) = interactions.split_at((test_fraction * interactions.len() as f32) as usize);

    (train, test)
}

/// Split interactions by holding out, for every user, the interaction
/// with the latest timestamp (first occurrence on ties) as the test set.
///
/// Users with a single interaction are kept wholly in the training set.
pub fn leave_one_out_split(interactions: &Interactions) -> (Interactions, Interactions) {
    let mut latest: Vec<Option<(usize, Timestamp)>> = vec![None; interactions.num_users()];
    let mut num_interactions = vec![0; interactions.num_users()];

    for (idx, interaction) in interactions.data().iter().enumerate() {
        let user_id = interaction.user_id();

        num_interactions[user_id] += 1;

        let is_later = match latest[user_id] {
            None => true,
            Some((_, timestamp)) => interaction.timestamp() > timestamp,
        };

        if is_later {
            latest[user_id] = Some((idx, interaction.timestamp()));
        }
    }

    let mut held_out = vec![false; interactions.len()];

    for (user_id, slot) in latest.iter().enumerate() {
        if let Some((idx, _)) = *slot {
            if num_interactions[user_id] > 1 {
                held_out[idx] = true;
            }
        }
    }

    let (num_users, num_items) = interactions.shape();

    let mut train = Vec::with_capacity(interactions.len());
    let mut test = Vec::new();

    for (idx, interaction) in interactions.data().iter().enumerate() {
        if held_out[idx] {
            test.push(interaction.clone());
        } else {
            train.push(interaction.clone());
        }
    }

    (
        Interactions {
            num_users,
            num_items,
            interactions: train,
        },
        Interactions {
            num_users,
            num_items,
            interactions: test,
        },
    )
}

/// A collection of interactions together with its user/item index space.
#[derive(Debug)]
pub struct Interactions {
    num_users: usize,
    num_items: usize,
    interactions: Vec<Interaction>,
}

impl Interactions {
    /// The underlying interaction rows.
    pub fn data(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Number of interactions.
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Whether there are no interactions.
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Convert to implicit feedback: positive weights become 1.0.
    pub fn binarize(&mut self) {
        for interaction in &mut self.interactions {
            if interaction.weight > 0.0 {
                interaction.weight = 1.0;
            }
        }
    }

    /// Shuffle the interactions in place.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        rng.shuffle(&mut self.interactions);
    }

    /// Split into two collections at `idx`, preserving the index space.
    pub fn split_at(&self, idx: usize) -> (Self, Self) {
        let head = Interactions {
            num_users: self.num_users,
            num_items: self.num_items,
            interactions: self.interactions[..idx].to_owned(),
        };
        let tail = Interactions {
            num_users: self.num_users,
            num_items: self.num_items,
            interactions: self.interactions[idx..].to_owned(),
        };

        (head, tail)
    }

    /// Convert to a per-user compressed representation.
    pub fn to_compressed(&self) -> CompressedInteractions {
        CompressedInteractions::from(self)
    }

    /// Convert to a dense `num_users` by `num_items` rating matrix.
    pub fn to_dense(&self) -> Array2<f32> {
        let mut matrix = Array2::zeros((self.num_users, self.num_items));

        for interaction in &self.interactions {
            matrix[[interaction.user_id(), interaction.item_id()]] = interaction.weight();
        }

        matrix
    }

    /// Number of distinct users in the index space.
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Number of distinct items in the index space.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The `(num_users, num_items)` index space.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_users, self.num_items)
    }
}

impl From<Vec<Interaction>> for Interactions {
    fn from(data: Vec<Interaction>) -> Interactions {
        let num_users = data.iter().map(|x| x.user_id()).max().map_or(0, |x| x + 1);
        let num_items = data.iter().map(|x| x.item_id()).max().map_or(0, |x| x + 1);

        Interactions {
            num_users,
            num_items,
            interactions: data,
        }
    }
}

fn cmp_timestamp(x: &Interaction, y: &Interaction) -> Ordering {
    let uid_comparison = x.user_id().cmp(&y.user_id());

    if uid_comparison == Ordering::Equal {
        x.timestamp().cmp(&y.timestamp())
    } else {
        uid_comparison
    }
}

/// A compressed-sparse-row view of a set of interactions: for every user,
/// a contiguous timestamp-sorted slice of item ids, weights, and timestamps.
pub struct CompressedInteractions {
    num_users: usize,
    num_items: usize,
    user_pointers: Vec<usize>,
    item_ids: Vec<ItemId>,
    weights: Vec<f32>,
    timestamps: Vec<Timestamp>,
}

impl<'a> From<&'a Interactions> for CompressedInteractions {
    fn from(interactions: &Interactions) -> CompressedInteractions {
        let mut data = interactions.data().to_owned();

        data.sort_by(cmp_timestamp);

        let mut user_pointers = vec![0; interactions.num_users + 1];
        let mut item_ids = Vec::with_capacity(data.len());
        let mut weights = Vec::with_capacity(data.len());
        let mut timestamps = Vec::with_capacity(data.len());

        for datum in &data {
            item_ids.push(datum.item_id());
            weights.push(datum.weight());
            timestamps.push(datum.timestamp());

            user_pointers[datum.user_id() + 1] += 1;
        }

        for idx in 1..user_pointers.len() {
            user_pointers[idx] += user_pointers[idx - 1];
        }

        CompressedInteractions {
            num_users: interactions.num_users,
            num_items: interactions.num_items,
            user_pointers,
            item_ids,
            weights,
            timestamps,
        }
    }
}

impl CompressedInteractions {
    /// Iterate over all users in the index space.
    pub fn iter_users(&self) -> CompressedInteractionsUserIterator {
        CompressedInteractionsUserIterator {
            interactions: &self,
            idx: 0,
        }
    }

    /// Return the interactions of a single user.
    pub fn get_user(&self, user_id: UserId) -> Option<CompressedInteractionsUser> {
        if user_id >= self.num_users {
            return None;
        }

        let start = self.user_pointers[user_id];
        let stop = self.user_pointers[user_id + 1];

        Some(CompressedInteractionsUser {
            user_id,
            item_ids: &self.item_ids[start..stop],
            weights: &self.weights[start..stop],
            timestamps: &self.timestamps[start..stop],
        })
    }

    /// Number of distinct users in the index space.
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Number of distinct items in the index space.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The `(num_users, num_items)` index space.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_users, self.num_items)
    }
}

/// Iterator over the users of a `CompressedInteractions`.
pub struct CompressedInteractionsUserIterator<'a> {
    interactions: &'a CompressedInteractions,
    idx: usize,
}

/// A single user's interactions, sorted by timestamp.
#[derive(Debug)]
pub struct CompressedInteractionsUser<'a> {
    /// The user's id.
    pub user_id: UserId,
    /// The ids of the items the user interacted with.
    pub item_ids: &'a [ItemId],
    /// The weights of the user's interactions.
    pub weights: &'a [f32],
    /// The timestamps of the user's interactions.
    pub timestamps: &'a [Timestamp],
}

impl<'a> Iterator for CompressedInteractionsUserIterator<'a> {
    type Item = CompressedInteractionsUser<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        let value = if self.idx >= self.interactions.num_users {
            None
        } else {
            let start = self.interactions.user_pointers[self.idx];
            let stop = self.interactions.user_pointers[self.idx + 1];

            Some(CompressedInteractionsUser {
                user_id: self.idx,
                item_ids: &self.interactions.item_ids[start..stop],
                weights: &self.interactions.weights[start..stop],
                timestamps: &self.interactions.timestamps[start..stop],
            })
        };

        self.idx += 1;

        value
    }
}
