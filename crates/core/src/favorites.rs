//! User-flagged favorite coins

use serde::{Deserialize, Serialize};

/// Insertion-ordered set of favorite coin ids.
///
/// Persisted independently of fetched market data, so favorites survive
/// refreshes and coins that drop out of the current page. The persisted
/// form is a plain JSON array of ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet {
    ids: Vec<String>,
}

impl FavoriteSet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|f| f == id)
    }

    /// Flip membership for a coin id. Returns true if the coin is a
    /// favorite after the toggle.
    pub fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|f| f == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_membership() {
        let mut favorites = FavoriteSet::default();
        assert!(favorites.toggle("bitcoin"));
        assert!(favorites.contains("bitcoin"));
        assert!(!favorites.toggle("bitcoin"));
        assert!(!favorites.contains("bitcoin"));
        assert!(favorites.is_empty());
    }

    #[test]
    fn persisted_form_round_trips() {
        let mut favorites = FavoriteSet::default();
        favorites.toggle("bitcoin");
        favorites.toggle("solana");

        let json = serde_json::to_string(&favorites).unwrap();
        assert_eq!(json, r#"["bitcoin","solana"]"#);

        let reloaded: FavoriteSet = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, favorites);
    }
}
