//! Personas the user can talk to

pub mod prompts;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prebuilt speech synthesis voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerVoice {
    Puck,
    Charon,
    Kore,
    Fenrir,
    Zephyr,
}

impl SpeakerVoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerVoice::Puck => "Puck",
            SpeakerVoice::Charon => "Charon",
            SpeakerVoice::Kore => "Kore",
            SpeakerVoice::Fenrir => "Fenrir",
            SpeakerVoice::Zephyr => "Zephyr",
        }
    }
}

impl fmt::Display for SpeakerVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub title: String,
    pub era: String,
    pub description: String,
    pub system_instruction: String,
    pub voice: SpeakerVoice,
}

impl Persona {
    /// Opening line the persona speaks when a conversation starts
    pub fn greeting(&self) -> String {
        format!(
            "Hello. I see you've summoned me to 2024. I am {}. What shall we discuss?",
            self.name
        )
    }
}

pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "Critique the visual hierarchy of this layout.",
    "Does this composition have good rhythm?",
    "Is the visual weight balanced?",
    "How can I improve the repetition here?",
];

fn persona(
    id: &str,
    name: &str,
    title: &str,
    era: &str,
    description: &str,
    system_instruction: &str,
    voice: SpeakerVoice,
) -> Persona {
    Persona {
        id: id.to_string(),
        name: name.to_string(),
        title: title.to_string(),
        era: era.to_string(),
        description: description.to_string(),
        system_instruction: system_instruction.to_string(),
        voice,
    }
}

/// The built-in roster, in display order
pub fn builtin_personas() -> Vec<Persona> {
    vec![
        persona(
            "warhol",
            "Andy Warhol",
            "Pop Art Icon",
            "1960s New York",
            "Explores the relationship between artistic expression, celebrity culture, and advertising.",
            prompts::WARHOL,
            SpeakerVoice::Puck,
        ),
        persona(
            "zaha",
            "Dame Zaha Hadid",
            "Queen of the Curve",
            "Contemporary Modern",
            "Deconstructivist architect known for radical deconstructivism and fluid, curved forms.",
            prompts::HADID,
            SpeakerVoice::Kore,
        ),
        persona(
            "da_vinci",
            "Leonardo da Vinci",
            "The Polymath",
            "High Renaissance",
            "The archetype of the Renaissance Man: painter, engineer, scientist, theorist.",
            prompts::DA_VINCI,
            SpeakerVoice::Fenrir,
        ),
        persona(
            "rand",
            "Paul Rand",
            "Modernist Master",
            "Mid-Century New York",
            "Graphic designer best known for his corporate logo designs.",
            prompts::RAND,
            SpeakerVoice::Charon,
        ),
        persona(
            "soprano",
            "Tony Soprano",
            "Waste Management Consultant",
            "Turn of the Millennium Jersey",
            "A pragmatic \"business consultant\" who values loyalty, structural integrity, and clear chain of command.",
            prompts::SOPRANO,
            SpeakerVoice::Fenrir,
        ),
    ]
}

/// Look up a persona by id
pub fn find<'a>(personas: &'a [Persona], id: &str) -> Option<&'a Persona> {
    personas.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roster() {
        let roster = builtin_personas();
        let ids: Vec<_> = roster.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["warhol", "zaha", "da_vinci", "rand", "soprano"]);
        assert!(roster.iter().all(|p| !p.system_instruction.is_empty()));
    }

    #[test]
    fn test_find_and_voice() {
        let roster = builtin_personas();
        assert_eq!(find(&roster, "zaha").unwrap().voice, SpeakerVoice::Kore);
        assert_eq!(find(&roster, "rand").unwrap().voice.as_str(), "Charon");
        assert!(find(&roster, "picasso").is_none());
    }

    #[test]
    fn test_greeting() {
        let roster = builtin_personas();
        let warhol = find(&roster, "warhol").unwrap();
        assert_eq!(
            warhol.greeting(),
            "Hello. I see you've summoned me to 2024. I am Andy Warhol. What shall we discuss?"
        );
    }

    #[test]
    fn test_persona_from_toml() {
        let text = r#"
            id = "rams"
            name = "Dieter Rams"
            title = "Less But Better"
            era = "Post-war Germany"
            description = "Industrial designer."
            system_instruction = "You are Dieter Rams."
            voice = "Zephyr"
        "#;
        let persona: Persona = toml::from_str(text).unwrap();
        assert_eq!(persona.voice, SpeakerVoice::Zephyr);
    }
}
