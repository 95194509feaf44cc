//! Ownership checks consulted before loading or saving a board.

use std::collections::HashSet;

/// Decides whether the current user may read or write a board.
pub trait AccessPolicy: Send + Sync {
    fn can_load(&self, board: &str) -> bool;
    fn can_save(&self, board: &str) -> bool;
}

/// Every board is readable and writable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn can_load(&self, _board: &str) -> bool {
        true
    }

    fn can_save(&self, _board: &str) -> bool {
        true
    }
}

/// Only the listed boards are accessible.
#[derive(Debug, Clone, Default)]
pub struct OwnedBoards {
    owned: HashSet<String>,
}

impl OwnedBoards {
    pub fn new<I, S>(boards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owned: boards.into_iter().map(Into::into).collect(),
        }
    }

    pub fn grant(&mut self, board: impl Into<String>) {
        self.owned.insert(board.into());
    }
}

impl AccessPolicy for OwnedBoards {
    fn can_load(&self, board: &str) -> bool {
        self.owned.contains(board)
    }

    fn can_save(&self, board: &str) -> bool {
        self.owned.contains(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_boards() {
        let mut policy = OwnedBoards::new(["mine"]);
        assert!(policy.can_load("mine"));
        assert!(!policy.can_save("yours"));
        policy.grant("yours");
        assert!(policy.can_save("yours"));
        assert!(AllowAll.can_load("anything"));
    }
}
