use serde::{Deserialize, Serialize};

use super::resolver::normalize;

/// One selectable character: how to recognise it, how it sounds, how it talks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub id: String,
    pub display_name: String,
    /// Surface forms matched by containment against normalized user text.
    #[serde(default)]
    pub aliases: Vec<String>,
    pub voice_id: String,
    #[serde(default = "default_stability")]
    pub stability: f64,
    #[serde(default = "default_similarity")]
    pub similarity: f64,
    /// System context handed to the dialogue API.
    #[serde(default)]
    pub prompt: String,
    /// Overrides `[dialogue] bot` for this persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<String>,
}

fn default_stability() -> f64 {
    0.5
}

fn default_similarity() -> f64 {
    0.75
}

/// Immutable lookup table of personas with pre-normalized aliases.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    profiles: Vec<PersonaProfile>,
    aliases: Vec<Vec<String>>,
}

impl PersonaCatalog {
    pub fn new(profiles: Vec<PersonaProfile>) -> Self {
        let aliases = profiles
            .iter()
            .map(|profile| {
                let mut forms: Vec<String> = profile
                    .aliases
                    .iter()
                    .map(|alias| normalize(alias))
                    .filter(|alias| !alias.is_empty())
                    .collect();
                forms.sort();
                forms.dedup();
                forms
            })
            .collect();
        Self { profiles, aliases }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_profiles())
    }

    pub fn get(&self, id: &str) -> Option<&PersonaProfile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|profile| profile.id.as_str())
    }

    /// `(persona id, normalized aliases)` pairs in catalog order.
    pub(crate) fn alias_table(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.profiles
            .iter()
            .zip(&self.aliases)
            .map(|(profile, aliases)| (profile.id.as_str(), aliases.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn profile(
    id: &str,
    display_name: &str,
    aliases: &[&str],
    voice_id: &str,
    (stability, similarity): (f64, f64),
    prompt: &str,
) -> PersonaProfile {
    PersonaProfile {
        id: id.to_string(),
        display_name: display_name.to_string(),
        aliases: aliases.iter().map(ToString::to_string).collect(),
        voice_id: voice_id.to_string(),
        stability,
        similarity,
        prompt: prompt.to_string(),
        bot: None,
    }
}

pub fn builtin_profiles() -> Vec<PersonaProfile> {
    vec![
        profile(
            "tutor",
            "Tutor",
            &["tutor", "teacher"],
            "21m00Tcm4TlvDq8ikWAM",
            (0.5, 0.75),
            "You are a patient, encouraging tutor. Keep answers short, check understanding \
             with a follow-up question, and correct mistakes gently.",
        ),
        profile(
            "sophia",
            "Sophia",
            &["sophia", "sofia"],
            "EXAVITQu4vr4xnSDxMaL",
            (0.45, 0.8),
            "You are Sophia, a warm and curious conversation partner. Speak casually, \
             ask about the other person's day, and keep replies to a few sentences.",
        ),
        profile(
            "marco",
            "Marco",
            &["marco", "marco polo"],
            "TxGEqnHWrfWFTfGW9XjX",
            (0.55, 0.7),
            "You are Marco, a well-travelled storyteller. Answer with vivid short \
             anecdotes from your journeys and invite questions about places.",
        ),
        profile(
            "leonardo",
            "Leonardo",
            &["leonardo", "da vinci", "davinci"],
            "VR6AewLTigWG4xSOukaG",
            (0.6, 0.7),
            "You are Leonardo, an inventor and painter. Explain ideas through sketches \
             described in words and connect art with engineering.",
        ),
    ]
}
