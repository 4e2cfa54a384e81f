//! On-disk client state
//!
//! Two independent JSON records under the data directory: the favorite
//! set and the portfolio. Read once at startup, written after every
//! mutation. A corrupt or absent file loads as the empty default; it is
//! never a fatal error.

use coindeck_core::{FavoriteSet, Portfolio, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const FAVORITES_FILE: &str = "favorites.json";
const PORTFOLIO_FILE: &str = "portfolio.json";

/// Load/save endpoint for persisted client state.
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn load_favorites(&self) -> FavoriteSet {
        self.load_or_default(FAVORITES_FILE)
    }

    pub fn save_favorites(&self, favorites: &FavoriteSet) -> Result<()> {
        self.save_json(FAVORITES_FILE, favorites)
    }

    pub fn load_portfolio(&self) -> Portfolio {
        self.load_or_default(PORTFOLIO_FILE)
    }

    pub fn save_portfolio(&self, portfolio: &Portfolio) -> Result<()> {
        self.save_json(PORTFOLIO_FILE, portfolio)
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(value) => {
                    debug!("Loaded {}", path.display());
                    value
                }
                Err(e) => {
                    warn!("Corrupt state file {}, starting empty: {}", path.display(), e);
                    T::default()
                }
            },
            Err(_) => T::default(),
        }
    }

    /// Write via a temp file and rename so a crash mid-write cannot
    /// leave a truncated record behind.
    fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.tmp"));
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}
