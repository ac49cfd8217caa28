//! Social-trust statements and their alignment with a ratings index space.
use ndarray::Array2;

use data::IdIndex;

/// A directed trust statement between two users, with raw ids as they
/// appear in the trust file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrustStatement {
    /// Raw id of the trusting user.
    pub source: u32,
    /// Raw id of the trusted user.
    pub target: u32,
    /// Trust weight.
    pub weight: f32,
}

impl TrustStatement {
    /// Build a new trust statement.
    pub fn new(source: u32, target: u32, weight: f32) -> Self {
        TrustStatement {
            source,
            target,
            weight,
        }
    }
}

/// Build the dense user-by-user trust matrix aligned with the ratings
/// user index.
///
/// Statements mentioning users absent from the ratings are dropped, so
/// the matrix rows line up with the rating matrix rows.
pub fn trust_matrix(statements: &[TrustStatement], user_index: &IdIndex) -> Array2<f32> {
    let num_users = user_index.len();
    let mut matrix = Array2::zeros((num_users, num_users));

    for statement in statements {
        if let (Some(source), Some(target)) = (
            user_index.get(statement.source),
            user_index.get(statement.target),
        ) {
            matrix[[source, target]] = statement.weight;
        }
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_matrix_is_aligned_with_the_user_index() {
        let mut user_index = IdIndex::new();
        user_index.get_or_assign(1000);
        user_index.get_or_assign(7);
        user_index.get_or_assign(23);

        let statements = vec![
            TrustStatement::new(7, 1000, 1.0),
            TrustStatement::new(23, 7, 0.5),
            // Not a rating user; dropped.
            TrustStatement::new(7, 99999, 1.0),
        ];

        let matrix = trust_matrix(&statements, &user_index);

        assert_eq!(matrix.shape(), &[3, 3]);
        assert_eq!(matrix[[1, 0]], 1.0);
        assert_eq!(matrix[[2, 1]], 0.5);
        assert_eq!(matrix.iter().filter(|&&x| x != 0.0).count(), 2);
    }
}
