//! Ranking board
//!
//! In-memory leaderboard keyed by nickname. A nickname belongs to whoever first
//! registered it with a password; later submissions must present the same
//! password. Passwords are kept as salted Argon2id PHC strings. Each nickname
//! keeps its best score and the board lists the top 10.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of entries listed
pub const MAX_RANKING_ENTRIES: usize = 10;

/// Longest accepted nickname, in characters
pub const MAX_NICKNAME_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankingError {
    #[error("nickname '{0}' is already taken")]
    DuplicateNickname(String),

    #[error("wrong password for '{0}'")]
    WrongPassword(String),

    #[error("invalid submission: {0}")]
    Invalid(&'static str),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Score submitted at game over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingSubmission {
    pub session_id: String,
    pub nickname: String,
    pub password: String,
    pub score: u64,
}

/// A single leaderboard entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntry {
    pub nickname: String,
    /// Best score for this nickname
    pub score: u64,
    /// Session that registered the nickname
    pub owner_session: String,
    /// Argon2id PHC string
    #[serde(skip)]
    password_hash: String,
}

/// Result of an accepted submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    /// True if the submission raised the nickname's best score
    pub improved: bool,
    /// 1-based rank of the nickname after the update, if listed
    pub rank: Option<usize>,
}

/// Ranking board, sorted descending by score
#[derive(Debug, Clone, Default)]
pub struct RankingBoard {
    entries: Vec<RankingEntry>,
    params: Params,
}

impl RankingBoard {
    /// Board with the default Argon2id cost (19 MiB, 2 passes)
    pub fn new() -> Self {
        Self::default()
    }

    /// Board with a custom Argon2id cost
    pub fn with_params(params: Params) -> Self {
        Self {
            entries: Vec::new(),
            params,
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn hash_password(&self, password: &str) -> Result<String, RankingError> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| RankingError::Hash(e.to_string()))?;
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| RankingError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, phc: &str) -> Result<bool, RankingError> {
        let parsed = PasswordHash::new(phc).map_err(|e| RankingError::Hash(e.to_string()))?;
        Ok(self
            .argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn validate(submission: &RankingSubmission) -> Result<(), RankingError> {
        let nickname = submission.nickname.trim();
        if nickname.is_empty() {
            return Err(RankingError::Invalid("empty nickname"));
        }
        if nickname.chars().count() > MAX_NICKNAME_LEN {
            return Err(RankingError::Invalid("nickname too long"));
        }
        if submission.password.is_empty() {
            return Err(RankingError::Invalid("empty password"));
        }
        if submission.session_id.is_empty() {
            return Err(RankingError::Invalid("missing session id"));
        }
        Ok(())
    }

    /// Submit a final score
    pub fn submit(&mut self, submission: &RankingSubmission) -> Result<Accepted, RankingError> {
        Self::validate(submission)?;
        let nickname = submission.nickname.trim();

        let improved = match self.entries.iter().position(|e| e.nickname == nickname) {
            Some(index) => {
                let entry = &self.entries[index];
                if !self.verify_password(&submission.password, &entry.password_hash)? {
                    return Err(if entry.owner_session == submission.session_id {
                        RankingError::WrongPassword(nickname.to_string())
                    } else {
                        RankingError::DuplicateNickname(nickname.to_string())
                    });
                }
                let entry = &mut self.entries[index];
                let improved = submission.score > entry.score;
                entry.score = entry.score.max(submission.score);
                improved
            }
            None => {
                let password_hash = self.hash_password(&submission.password)?;
                self.entries.push(RankingEntry {
                    nickname: nickname.to_string(),
                    score: submission.score,
                    owner_session: submission.session_id.clone(),
                    password_hash,
                });
                true
            }
        };

        // Stable sort keeps earlier holders of a tied score ahead
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        let rank = self
            .entries
            .iter()
            .position(|e| e.nickname == nickname)
            .map(|i| i + 1)
            .filter(|&r| r <= MAX_RANKING_ENTRIES);

        log::info!(
            "Ranking: {} scored {} (rank {:?})",
            nickname,
            submission.score,
            rank
        );
        Ok(Accepted { improved, rank })
    }

    /// Top entries, best first
    pub fn top(&self) -> &[RankingEntry] {
        &self.entries[..self.entries.len().min(MAX_RANKING_ENTRIES)]
    }

    /// Rank a new nickname with `score` would take (1-indexed, None if it
    /// would not be listed)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let rank = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len())
            + 1;
        (rank <= MAX_RANKING_ENTRIES).then_some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn best_score(&self, nickname: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.nickname == nickname.trim())
            .map(|e| e.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> RankingBoard {
        RankingBoard::with_params(Params::new(Params::MIN_M_COST, 1, 1, None).unwrap())
    }

    fn sub(session: &str, nick: &str, pw: &str, score: u64) -> RankingSubmission {
        RankingSubmission {
            session_id: session.to_string(),
            nickname: nick.to_string(),
            password: pw.to_string(),
            score,
        }
    }

    #[test]
    fn test_first_submission_registers_nickname() {
        let mut board = board();
        let accepted = board.submit(&sub("s1", "ace", "pw", 700)).unwrap();
        assert_eq!(accepted, Accepted { improved: true, rank: Some(1) });
        assert_eq!(board.top_score(), Some(700));
    }

    #[test]
    fn test_best_score_is_kept() {
        let mut board = board();
        board.submit(&sub("s1", "ace", "pw", 700)).unwrap();
        let accepted = board.submit(&sub("s1", "ace", "pw", 300)).unwrap();
        assert!(!accepted.improved);
        assert_eq!(board.best_score("ace"), Some(700));
        board.submit(&sub("s2", "ace", "pw", 900)).unwrap();
        assert_eq!(board.best_score("ace"), Some(900));
    }

    #[test]
    fn test_conflicts() {
        let mut board = board();
        board.submit(&sub("s1", "ace", "pw", 700)).unwrap();
        assert_eq!(
            board.submit(&sub("s1", "ace", "nope", 800)),
            Err(RankingError::WrongPassword("ace".into()))
        );
        assert_eq!(
            board.submit(&sub("s2", "ace", "nope", 800)),
            Err(RankingError::DuplicateNickname("ace".into()))
        );
        assert_eq!(board.best_score("ace"), Some(700));
    }

    #[test]
    fn test_invalid_submissions() {
        let mut board = board();
        assert!(matches!(
            board.submit(&sub("s1", "  ", "pw", 1)),
            Err(RankingError::Invalid(_))
        ));
        assert!(matches!(
            board.submit(&sub("s1", "a_really_long_nickname", "pw", 1)),
            Err(RankingError::Invalid(_))
        ));
        assert!(matches!(
            board.submit(&sub("s1", "ace", "", 1)),
            Err(RankingError::Invalid(_))
        ));
        assert!(board.is_empty());
    }

    #[test]
    fn test_top_ten_descending() {
        let mut board = board();
        for i in 0..12u64 {
            board
                .submit(&sub("s", &format!("p{i}"), "pw", i * 100))
                .unwrap();
        }
        let top = board.top();
        assert_eq!(top.len(), MAX_RANKING_ENTRIES);
        assert_eq!(top[0].score, 1100);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(board.potential_rank(150), None);
        assert_eq!(board.potential_rank(1050), Some(2));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let mut board = board();
        board.submit(&sub("s1", "ace", "secret", 100)).unwrap();
        let json = serde_json::to_string(&board.top()[0]).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("secret"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_passwords_stored_as_salted_argon2id() {
        let mut board = board();
        board.submit(&sub("s1", "ace", "same", 100)).unwrap();
        board.submit(&sub("s2", "bee", "same", 200)).unwrap();
        let hashes: Vec<&str> = board.top().iter().map(|e| e.password_hash.as_str()).collect();
        assert!(hashes.iter().all(|h| h.starts_with("$argon2id$")));
        assert!(hashes.iter().all(|h| !h.contains("same")));
        // Per-entry salt: same password, different hashes
        assert_ne!(hashes[0], hashes[1]);
        assert!(board.submit(&sub("s1", "ace", "same", 300)).unwrap().improved);
    }
}
