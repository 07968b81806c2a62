// Error taxonomy for the standings pipeline and the bracket engine.

use thiserror::Error;

use crate::model::TeamId;

#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Not every regular-season game has a final result or a pick, so the
    /// postseason cannot be seeded yet.
    #[error("regular season incomplete: {resolved} of {total} games resolved")]
    IncompleteSeason { resolved: usize, total: usize },

    /// At least one matchup or series in the round has no picked winner.
    #[error("round {round} incomplete: {unpicked} of {total} slots have no pick")]
    RoundIncomplete {
        round: u32,
        unpicked: usize,
        total: usize,
    },

    /// The picked team does not play in the game or bracket slot.
    #[error("invalid pick: team {team_id} is not a participant in {context}")]
    InvalidPick { team_id: TeamId, context: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("cannot generate from round {round}: {reason}")]
    InvalidRound { round: u32, reason: String },

    /// Standings cannot supply the seeds or winners a round needs.
    #[error("bracket cannot be built: {0}")]
    BracketShape(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ScenarioError {
    pub(crate) fn invalid_pick(team_id: TeamId, context: impl Into<String>) -> Self {
        ScenarioError::InvalidPick {
            team_id,
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_counts() {
        let err = ScenarioError::IncompleteSeason {
            resolved: 270,
            total: 272,
        };
        assert_eq!(
            err.to_string(),
            "regular season incomplete: 270 of 272 games resolved"
        );

        let err = ScenarioError::RoundIncomplete {
            round: 2,
            unpicked: 1,
            total: 4,
        };
        assert!(err.to_string().contains("round 2"));
    }

    #[test]
    fn storage_errors_pass_through_unchanged() {
        let err: ScenarioError = anyhow::anyhow!("disk I/O error").into();
        assert_eq!(err.to_string(), "disk I/O error");
    }
}
