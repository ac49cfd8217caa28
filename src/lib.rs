#![deny(missing_docs)]
//! # recprep
//!
//! `recprep` prepares implicit-feedback ratings data for recommender
//! experiments and scores the resulting models under a sampled-candidates
//! ranking protocol.
//!
//! The crate reads flat delimited ratings files, remaps raw identifiers to
//! dense contiguous indices, builds train/test splits (random holdout or
//! leave-one-out by timestamp), constructs negative-sampling pools for
//! implicit-feedback training, and computes hit ratio, NDCG, and MRR for any
//! model implementing [`RankingModel`].
//!
//! ## Example
//!
//! ```rust
//! # extern crate recprep;
//! # extern crate rand;
//! use rand::{SeedableRng, XorShiftRng};
//! use recprep::data::{self, Interaction, Interactions};
//! use recprep::sampling;
//!
//! let mut interactions = Interactions::from(vec![
//!     Interaction::new(0, 0, 5.0, 0),
//!     Interaction::new(0, 1, 3.0, 1),
//!     Interaction::new(1, 1, 4.0, 0),
//!     Interaction::new(1, 2, 1.0, 1),
//!     Interaction::new(2, 2, 2.0, 0),
//!     Interaction::new(2, 0, 5.0, 1),
//! ]);
//! interactions.binarize();
//!
//! let mut rng = XorShiftRng::from_seed([42; 16]);
//!
//! // Pools are built over the full dataset, before splitting.
//! let sampler = sampling::NegativeSampler::new(&interactions);
//!
//! let (train, test) = data::leave_one_out_split(&interactions);
//! assert_eq!(train.len() + test.len(), interactions.len());
//!
//! let instances = sampling::training_instances(&train, &sampler, 1, &mut rng).unwrap();
//! let evaluation = sampling::evaluation_instances(&test, &sampler, 1, &mut rng).unwrap();
//!
//! println!(
//!     "{} training instances, {} evaluation users",
//!     instances.len(),
//!     evaluation.len()
//! );
//! ```
#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate itertools;

extern crate csv;
#[macro_use]
extern crate failure;
extern crate ndarray;
extern crate rand;
extern crate rayon;
extern crate serde;

#[cfg(feature = "download")]
extern crate reqwest;

pub mod data;
pub mod datasets;
pub mod evaluation;
pub mod features;
pub mod sampling;
pub mod trust;

/// Alias for user indices.
pub type UserId = usize;
/// Alias for item indices.
pub type ItemId = usize;
/// Alias for feature indices.
pub type FeatureId = usize;
/// Alias for timestamps.
pub type Timestamp = usize;

/// Prediction error types.
#[derive(Debug, Fail)]
pub enum PredictionError {
    /// Failed prediction due to numerical issues.
    #[fail(display = "Invalid prediction value: non-finite or not a number.")]
    InvalidPredictionValue,
    /// The model returned the wrong number of scores for its candidates.
    #[fail(display = "Prediction length does not match the number of candidates.")]
    MismatchedLength,
}

/// Trait describing models that can score candidate items for a user.
///
/// This is the boundary between data preparation and the downstream models:
/// the evaluation module will rank anything that implements it.
pub trait RankingModel {
    /// Score `item_ids` for `user_id`. Higher scores mean the user is more
    /// likely to interact with the item.
    fn predict(&self, user_id: UserId, item_ids: &[ItemId]) -> Result<Vec<f32>, PredictionError>;
}
