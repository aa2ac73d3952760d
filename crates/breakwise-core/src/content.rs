//! Break content.
//!
//! The engine asks a [`ContentProvider`] for an exercise every time a reminder
//! fires. Providers never fail: any problem with the source degrades to
//! [`Exercise::fallback`].

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    #[default]
    Text,
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: ExerciseKind,
    #[serde(alias = "duration", default = "default_duration")]
    pub duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

fn default_duration() -> u32 {
    30
}

impl Exercise {
    /// Generic content used whenever the library cannot be read.
    pub fn fallback() -> Self {
        Self {
            title: "Take a Break".into(),
            description: "Stretch your legs and relax your eyes.".into(),
            kind: ExerciseKind::Text,
            duration_seconds: default_duration(),
            media_url: None,
        }
    }
}

pub trait ContentProvider: Send {
    fn next_exercise(&mut self) -> Exercise;
}

enum Source {
    File(PathBuf),
    Inline(Vec<Exercise>),
}

/// Random pick from a JSON array of exercises.
///
/// A file-backed library is re-read on every pick so edits take effect
/// without a restart.
pub struct ExerciseLibrary {
    source: Source,
    rng: StdRng,
}

impl ExerciseLibrary {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_exercises(exercises: Vec<Exercise>) -> Self {
        Self {
            source: Source::Inline(exercises),
            rng: StdRng::from_entropy(),
        }
    }

    /// Library with no source; always yields the fallback.
    pub fn empty() -> Self {
        Self::from_exercises(Vec::new())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    fn read(&self) -> Result<Vec<Exercise>, String> {
        match &self.source {
            Source::Inline(list) => Ok(list.clone()),
            Source::File(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| format!("{}: {e}", path.display()))?;
                serde_json::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))
            }
        }
    }
}

impl ContentProvider for ExerciseLibrary {
    fn next_exercise(&mut self) -> Exercise {
        match self.read() {
            Ok(list) => list
                .choose(&mut self.rng)
                .cloned()
                .unwrap_or_else(Exercise::fallback),
            Err(e) => {
                tracing::warn!("Failed to read exercises, using fallback: {e}");
                Exercise::fallback()
            }
        }
    }
}

pub const MOTIVATIONAL_TIPS: &[&str] = &[
    "Water break reminder: Stay hydrated!",
    "Blink to relax your eyes.",
    "Keep your back straight and avoid slouching.",
    "Take a deep breath and relax your shoulders.",
    "Look away from the screen at something 20 feet away.",
    "Stretch your neck gently from side to side.",
    "Stand up and do a quick stretch.",
];

/// Random health tip.
pub fn random_tip<R: rand::Rng + ?Sized>(rng: &mut R) -> &'static str {
    MOTIVATIONAL_TIPS
        .choose(rng)
        .copied()
        .unwrap_or(MOTIVATIONAL_TIPS[0])
}
