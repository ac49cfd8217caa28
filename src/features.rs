//! Design matrices and categorical feature spaces for factorization-machine
//! and wide-and-deep experiments.
use std::collections::HashMap;

use ndarray::{Array1, Array2};

use data::{IdIndex, Interactions};
use datasets::{MovieMetadata, UserMetadata};
use FeatureId;

/// Build the factorization-machine design matrix: for every interaction,
/// the concatenation of a user one-hot block, an item one-hot block, and
/// the user's row-normalized binarized rating history. Returns the matrix
/// together with the rating targets.
pub fn design_matrix(interactions: &Interactions) -> (Array2<f32>, Array1<f32>) {
    let (num_users, num_items) = interactions.shape();
    let num_rows = interactions.len();

    let mut rated = interactions.to_dense();
    rated.mapv_inplace(|x| if x > 0.0 { 1.0 } else { 0.0 });

    for mut row in rated.genrows_mut() {
        let total: f32 = row.iter().sum();

        if total > 0.0 {
            row /= total;
        }
    }

    let mut matrix = Array2::zeros((num_rows, num_users + 2 * num_items));
    let mut targets = Array1::zeros(num_rows);

    for (row_idx, interaction) in interactions.data().iter().enumerate() {
        let user_id = interaction.user_id();

        matrix[[row_idx, user_id]] = 1.0;
        matrix[[row_idx, num_users + interaction.item_id()]] = 1.0;

        for (offset, &value) in rated.row(user_id).iter().enumerate() {
            matrix[[row_idx, num_users + num_items + offset]] = value;
        }

        targets[row_idx] = interaction.weight();
    }

    (matrix, targets)
}

/// Maps categorical tokens to dense contiguous indices in
/// first-appearance order.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    indices: HashMap<String, FeatureId>,
    tokens: Vec<String>,
}

impl Vocabulary {
    /// Build an empty vocabulary.
    pub fn new() -> Self {
        Vocabulary {
            indices: HashMap::new(),
            tokens: Vec::new(),
        }
    }

    /// Return the index for `token`, assigning the next free index if the
    /// token has not been seen before.
    pub fn get_or_assign(&mut self, token: &str) -> FeatureId {
        if let Some(&idx) = self.indices.get(token) {
            return idx;
        }

        let idx = self.tokens.len();
        self.indices.insert(token.to_owned(), idx);
        self.tokens.push(token.to_owned());

        idx
    }

    /// Return the index for `token`, if assigned.
    pub fn get(&self, token: &str) -> Option<FeatureId> {
        self.indices.get(token).cloned()
    }

    /// Return the token at `idx`, if assigned.
    pub fn token(&self, idx: FeatureId) -> Option<&str> {
        self.tokens.get(idx).map(|x| x.as_str())
    }

    /// Number of distinct tokens seen so far.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// The wide-and-deep feature layout: one feature id per field for every
/// interaction, in a single contiguous feature-id space.
#[derive(Debug)]
pub struct CategoricalFeatures {
    /// Total size of the feature-id space.
    pub num_features: usize,
    /// Number of fields per interaction.
    pub num_fields: usize,
    /// Row-major feature ids, `num_fields` per interaction.
    pub feature_ids: Vec<FeatureId>,
    /// Rating targets, one per interaction.
    pub targets: Vec<f32>,
}

impl CategoricalFeatures {
    /// Number of interactions with features.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// The feature ids of the `idx`-th interaction.
    pub fn row(&self, idx: usize) -> &[FeatureId] {
        &self.feature_ids[idx * self.num_fields..(idx + 1) * self.num_fields]
    }
}

const NUM_FIELDS: usize = 7;

/// Join interactions with movie and user metadata into categorical
/// features over the fields user, item, genre, year, gender, age, and
/// occupation. Interactions whose raw ids have no metadata row are
/// skipped.
pub fn categorical_features(
    interactions: &Interactions,
    user_index: &IdIndex,
    item_index: &IdIndex,
    movies: &[MovieMetadata],
    users: &[UserMetadata],
) -> CategoricalFeatures {
    let movie_metadata: HashMap<u32, &MovieMetadata> =
        movies.iter().map(|x| (x.movie_id, x)).collect();
    let user_metadata: HashMap<u32, &UserMetadata> =
        users.iter().map(|x| (x.user_id, x)).collect();

    let (num_users, num_items) = interactions.shape();

    let mut genre_vocab = Vocabulary::new();
    let mut year_vocab = Vocabulary::new();
    let mut gender_vocab = Vocabulary::new();
    let mut age_vocab = Vocabulary::new();
    let mut occupation_vocab = Vocabulary::new();

    let mut user_fields = Vec::new();
    let mut item_fields = Vec::new();
    let mut genre_fields = Vec::new();
    let mut year_fields = Vec::new();
    let mut gender_fields = Vec::new();
    let mut age_fields = Vec::new();
    let mut occupation_fields = Vec::new();

    let mut targets = Vec::new();

    for interaction in interactions.data() {
        let raw_user = user_index.raw(interaction.user_id());
        let raw_item = item_index.raw(interaction.item_id());

        let (movie, user) = match (
            raw_item.and_then(|x| movie_metadata.get(&x)),
            raw_user.and_then(|x| user_metadata.get(&x)),
        ) {
            (Some(movie), Some(user)) => (movie, user),
            _ => continue,
        };

        let year_token = movie
            .year
            .map(|x| x.to_string())
            .unwrap_or_else(|| "unknown".to_owned());

        user_fields.push(interaction.user_id());
        item_fields.push(interaction.item_id());
        genre_fields.push(genre_vocab.get_or_assign(&movie.genre));
        year_fields.push(year_vocab.get_or_assign(&year_token));
        gender_fields.push(gender_vocab.get_or_assign(&user.gender));
        age_fields.push(age_vocab.get_or_assign(&user.age.to_string()));
        occupation_fields.push(occupation_vocab.get_or_assign(&user.occupation.to_string()));

        targets.push(interaction.weight());
    }

    let field_sizes = [
        num_users,
        num_items,
        genre_vocab.len(),
        year_vocab.len(),
        gender_vocab.len(),
        age_vocab.len(),
        occupation_vocab.len(),
    ];

    let mut offsets = [0; NUM_FIELDS];
    for idx in 1..NUM_FIELDS {
        offsets[idx] = offsets[idx - 1] + field_sizes[idx - 1];
    }

    let num_features: usize = field_sizes.iter().sum();

    let mut feature_ids = Vec::with_capacity(targets.len() * NUM_FIELDS);

    for (&user, &item, &genre, &year, &gender, &age, &occupation) in izip!(
        &user_fields,
        &item_fields,
        &genre_fields,
        &year_fields,
        &gender_fields,
        &age_fields,
        &occupation_fields
    ) {
        feature_ids.push(offsets[0] + user);
        feature_ids.push(offsets[1] + item);
        feature_ids.push(offsets[2] + genre);
        feature_ids.push(offsets[3] + year);
        feature_ids.push(offsets[4] + gender);
        feature_ids.push(offsets[5] + age);
        feature_ids.push(offsets[6] + occupation);
    }

    CategoricalFeatures {
        num_features,
        num_fields: NUM_FIELDS,
        feature_ids,
        targets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data::Interaction;

    fn toy_interactions() -> Interactions {
        Interactions::from(vec![
            Interaction::new(0, 0, 5.0, 0),
            Interaction::new(0, 1, 3.0, 1),
            Interaction::new(1, 1, 4.0, 2),
        ])
    }

    #[test]
    fn design_matrix_has_one_hot_and_history_blocks() {
        let interactions = toy_interactions();
        let (matrix, targets) = design_matrix(&interactions);

        // Two users, two items: user block, item block, history block.
        assert_eq!(matrix.shape(), &[3, 6]);
        assert_eq!(targets.len(), 3);

        // First row: user 0, item 0.
        assert_eq!(matrix[[0, 0]], 1.0);
        assert_eq!(matrix[[0, 1]], 0.0);
        assert_eq!(matrix[[0, 2]], 1.0);
        assert_eq!(matrix[[0, 3]], 0.0);

        // User 0 rated both items; the history block is row-normalized.
        assert_eq!(matrix[[0, 4]], 0.5);
        assert_eq!(matrix[[0, 5]], 0.5);

        // User 1 rated item 1 only.
        assert_eq!(matrix[[2, 4]], 0.0);
        assert_eq!(matrix[[2, 5]], 1.0);

        assert_eq!(targets[1], 3.0);
    }

    #[test]
    fn vocabulary_assigns_in_first_appearance_order() {
        let mut vocab = Vocabulary::new();

        assert_eq!(vocab.get_or_assign("Animation"), 0);
        assert_eq!(vocab.get_or_assign("Drama"), 1);
        assert_eq!(vocab.get_or_assign("Animation"), 0);

        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.get("Drama"), Some(1));
        assert_eq!(vocab.get("Comedy"), None);
        assert_eq!(vocab.token(0), Some("Animation"));
    }

    #[test]
    fn categorical_features_join_metadata_by_raw_id() {
        let interactions = toy_interactions();

        let mut user_index = IdIndex::new();
        user_index.get_or_assign(10);
        user_index.get_or_assign(20);

        let mut item_index = IdIndex::new();
        item_index.get_or_assign(100);
        item_index.get_or_assign(200);

        let movies = vec![
            MovieMetadata {
                movie_id: 100,
                genre: "Animation".to_owned(),
                year: Some(1995),
            },
            MovieMetadata {
                movie_id: 200,
                genre: "Drama".to_owned(),
                year: Some(1999),
            },
        ];
        let users = vec![
            UserMetadata {
                user_id: 10,
                gender: "F".to_owned(),
                age: 1,
                occupation: 10,
            },
            UserMetadata {
                user_id: 20,
                gender: "M".to_owned(),
                age: 56,
                occupation: 16,
            },
        ];

        let features =
            categorical_features(&interactions, &user_index, &item_index, &movies, &users);

        assert_eq!(features.len(), 3);
        assert_eq!(features.num_fields, 7);

        // users (2) + items (2) + genres (2) + years (2) + genders (2)
        // + ages (2) + occupations (2)
        assert_eq!(features.num_features, 14);

        // First interaction: user 0, item 0, first genre/year/gender/age/
        // occupation tokens.
        assert_eq!(features.row(0), &[0, 2, 4, 6, 8, 10, 12]);
        // Third interaction: user 1 brings new user-side tokens.
        assert_eq!(features.row(2), &[1, 3, 5, 7, 9, 11, 13]);

        assert_eq!(features.targets, vec![5.0, 3.0, 4.0]);
    }

    #[test]
    fn interactions_without_metadata_are_skipped() {
        let interactions = toy_interactions();

        let mut user_index = IdIndex::new();
        user_index.get_or_assign(10);
        user_index.get_or_assign(20);

        let mut item_index = IdIndex::new();
        item_index.get_or_assign(100);
        item_index.get_or_assign(200);

        let movies = vec![MovieMetadata {
            movie_id: 100,
            genre: "Animation".to_owned(),
            year: Some(1995),
        }];
        let users = vec![UserMetadata {
            user_id: 10,
            gender: "F".to_owned(),
            age: 1,
            occupation: 10,
        }];

        let features =
            categorical_features(&interactions, &user_index, &item_index, &movies, &users);

        // Only the (user 10, movie 100) interaction has full metadata.
        assert_eq!(features.len(), 1);
        assert_eq!(features.targets, vec![5.0]);
    }
}
