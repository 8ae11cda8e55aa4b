//! User-based collaborative filtering over the interaction matrix.

use crate::InteractionMatrix;
use crate::scoreboard::{ScoreBoard, descending};
use crate::similarity::cosine_sparse;

/// Providers favoured by the users most similar to `user_id`.
///
/// Neighbours are the `neighbours` other users with the highest cosine
/// similarity to `user_id`, ties kept in ascending user id order. Every
/// provider a neighbour engaged with accrues `score × similarity`; the
/// result holds at most `k` provider ids, strongest first with ties in
/// first-seen order. An unknown user yields an empty list.
#[expect(
    clippy::float_arithmetic,
    reason = "neighbour scores are weighted by similarity"
)]
pub(crate) fn collaborate(
    matrix: &InteractionMatrix,
    user_id: u64,
    k: usize,
    neighbours: usize,
) -> Vec<u64> {
    let Some(target) = matrix.row(user_id) else {
        return Vec::new();
    };
    let mut similar_users: Vec<(u64, f64)> = matrix
        .users()
        .filter(|(other, _)| *other != user_id)
        .map(|(other, row)| (other, cosine_sparse(target, row)))
        .collect();
    similar_users.sort_by(|left, right| descending(left.1, right.1));
    similar_users.truncate(neighbours);

    let mut board = ScoreBoard::new();
    for (neighbour, similarity) in similar_users {
        let Some(row) = matrix.row(neighbour) else {
            continue;
        };
        for (&provider, &score) in row {
            if score > 0.0 {
                board.add(provider, score * similarity);
            }
        }
    }
    board
        .ranked()
        .into_iter()
        .take(k)
        .map(|(provider, _)| provider)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InteractionWeights;
    use localpro_core::{Interaction, InteractionKind};
    use rstest::{fixture, rstest};

    fn hire(user: u64, provider: u64) -> Interaction {
        Interaction::new(user, provider, InteractionKind::Hire, 0)
    }

    fn view(user: u64, provider: u64) -> Interaction {
        Interaction::new(user, provider, InteractionKind::View, 0)
    }

    #[fixture]
    fn matrix() -> InteractionMatrix {
        let interactions = [
            hire(1, 10),
            view(1, 20),
            hire(2, 10),
            view(2, 20),
            hire(2, 30),
            view(3, 10),
            hire(3, 40),
            hire(4, 50),
        ];
        InteractionMatrix::build(&interactions, &InteractionWeights::default())
    }

    #[rstest]
    fn unknown_user_is_cold_start(matrix: InteractionMatrix) {
        assert!(collaborate(&matrix, 99, 10, 5).is_empty());
    }

    #[rstest]
    fn ranks_providers_from_similar_users(matrix: InteractionMatrix) {
        let ranked = collaborate(&matrix, 1, 10, 5);
        assert_eq!(ranked.first(), Some(&10));
        let position = |id: u64| ranked.iter().position(|&p| p == id);
        assert!(position(30) < position(40), "user 2 is closer than user 3");
        assert!(
            ranked.contains(&50),
            "zero-similarity neighbours still contribute their providers"
        );
    }

    #[rstest]
    fn honours_neighbour_and_length_limits(matrix: InteractionMatrix) {
        let ranked = collaborate(&matrix, 1, 10, 1);
        assert_eq!(ranked, vec![10, 30, 20]);
        assert_eq!(collaborate(&matrix, 1, 2, 1), vec![10, 30]);
    }
}
