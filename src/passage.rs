use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;
use std::error::Error;

static TEXT_DIR: Dir = include_dir!("src/texts");

/// Difficulty tier a session is configured with. `Custom` means the caller
/// supplies the text; every tier maps to one of the embedded pools.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Custom,
}

impl Difficulty {
    /// Lenient parse for config files and persisted keys. Unrecognized keys
    /// fall back to Medium rather than failing.
    pub fn from_key(key: &str) -> Self {
        match key.to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            "custom" => Difficulty::Custom,
            _ => Difficulty::Medium,
        }
    }

    fn pool_file(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy.json",
            Difficulty::Medium => "medium.json",
            Difficulty::Hard => "hard.json",
            // Custom without a supplied text borrows the medium pool
            Difficulty::Custom => "medium.json",
        }
    }
}

#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
pub struct PassagePool {
    pub name: String,
    pub texts: Vec<String>,
}

impl PassagePool {
    pub fn load(difficulty: Difficulty) -> Self {
        read_pool_from_file(difficulty.pool_file()).unwrap()
    }
}

fn read_pool_from_file(file_name: &str) -> Result<PassagePool, Box<dyn Error>> {
    let file = TEXT_DIR.get_file(file_name).expect("Passage file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    let pool = from_str(file_as_str).expect("Unable to deserialize passage json");

    Ok(pool)
}

/// Pick the text for a session. A non-blank custom text wins when the
/// difficulty is `Custom`; everything else draws uniformly from the pool for
/// the difficulty. The RNG is injected so callers can select
/// deterministically.
pub fn select_text<R: Rng>(
    difficulty: Difficulty,
    custom_text: Option<&str>,
    rng: &mut R,
) -> String {
    if difficulty == Difficulty::Custom {
        if let Some(text) = custom_text {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    let pool = PassagePool::load(difficulty);
    pool.texts.choose(rng).cloned().unwrap_or_default()
}
