//! Script scene planning.
//!
//! Splits a narration script into ordered visual scenes and assigns each a
//! screen duration based on narration pace.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of scenes kept from a script.
pub const MAX_SCENES: usize = 20;

/// Fragments at or below this many characters are dropped.
const MIN_SCENE_CHARS: usize = 20;

/// Scenes longer than this are truncated with an ellipsis.
const MAX_SCENE_CHARS: usize = 200;

/// Narration reading pace used to estimate scene durations.
const WORDS_PER_MINUTE: f64 = 150.0;

/// Minimum screen time for a scene in seconds.
const MIN_SCENE_SECS: f64 = 3.0;

// Break points applied in order: blank lines, sentence boundaries followed
// by a transition word, Scene/Chapter/Part markers, and a new actor taking
// a movement action.
static SCENE_BREAKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\n\n+",
        r"\.\s*(?i:Meanwhile|Later|Then|Next|After|Suddenly|However)",
        r"\.\s*(?i:Scene|Chapter|Part)",
        r"\.\s*[A-Za-z][A-Za-z]+\s*(?i:walked|went|moved|arrived|entered)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid scene break regex"))
    .collect()
});

/// Split a narration script into ordered scene prompts.
///
/// Fragments of [`MIN_SCENE_CHARS`] characters or fewer are dropped, longer
/// fragments are truncated at [`MAX_SCENE_CHARS`] characters with an
/// ellipsis, and the result is capped at [`MAX_SCENES`] scenes.
pub fn split_script(script: &str) -> Vec<String> {
    let mut fragments: Vec<String> = vec![script.to_string()];

    for re in SCENE_BREAKS.iter() {
        fragments = fragments
            .iter()
            .flat_map(|fragment| re.split(fragment))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    fragments
        .into_iter()
        .filter(|s| s.chars().count() > MIN_SCENE_CHARS)
        .map(|s| clip_chars(&s, MAX_SCENE_CHARS))
        .take(MAX_SCENES)
        .collect()
}

/// Estimate screen time in seconds for each scene.
///
/// Durations assume a reading pace of [`WORDS_PER_MINUTE`] with a floor of
/// [`MIN_SCENE_SECS`] per scene. When the narration audio length is known,
/// all durations are scaled so their sum matches it.
pub fn scene_durations(scenes: &[String], total_audio_secs: Option<f64>) -> Vec<f64> {
    let mut durations: Vec<f64> = scenes
        .iter()
        .map(|scene| {
            let words = scene.split_whitespace().count() as f64;
            (words / WORDS_PER_MINUTE * 60.0).max(MIN_SCENE_SECS)
        })
        .collect();

    if let Some(total) = total_audio_secs {
        let base: f64 = durations.iter().sum();
        if base > 0.0 && total > 0.0 {
            let scale = total / base;
            for duration in &mut durations {
                *duration *= scale;
            }
        }
    }

    durations
}

/// Truncate at a character boundary, appending an ellipsis when cut.
fn clip_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}
