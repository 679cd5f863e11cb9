//! The pedagogical document produced by the text provider.
//!
//! Providers drift in how they name things, so the model accepts a couple of
//! alternate keys for the same concept and drops optional sections that arrive
//! malformed instead of rejecting the whole lesson. Only the pattern template
//! and its examples list are required.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, DeserializeOwned, MapAccess, Visitor},
    ser::SerializeMap,
};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Lesson content is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Lesson content must be a JSON object")]
    NotAnObject,

    #[error("Lesson content is missing its pattern template")]
    MissingTemplate,

    #[error("Lesson content is missing its examples list")]
    MissingExamples,
}

const TEMPLATE_KEYS: [&str; 2] = ["pattern_template", "pattern"];
const OBJECTIVES_KEYS: [&str; 2] = ["learning_objectives", "objectives"];
const SENTENCE_KEYS: [&str; 3] = ["sentence", "text", "example"];
const BREAKDOWN_KEYS: [&str; 2] = ["breakdown", "components"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonContent {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub topic: Option<String>,

    /// The sentence frame being taught, e.g. "I would like to ___ because ___."
    #[serde(alias = "pattern")]
    pub pattern_template: String,

    #[serde(deserialize_with = "examples_list")]
    pub examples: Vec<Example>,

    #[serde(
        default,
        alias = "objectives",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "lenient_list"
    )]
    pub learning_objectives: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub grammar_focus: Option<String>,

    #[serde(default, skip_serializing_if = "Breakdown::is_empty", deserialize_with = "lenient")]
    pub pattern_breakdown: Breakdown,

    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient_list")]
    pub vocabulary: Vec<VocabularyItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient_list")]
    pub common_mistakes: Vec<CommonMistake>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient_list")]
    pub practice_activities: Vec<PracticeActivity>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "lenient_list")]
    pub illustrations: Vec<Illustration>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub teacher_notes: Option<String>,
}

/// One example of the sentence frame in use. Providers send either a bare sentence
/// or an object that also explains each slot of the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Example {
    Text(String),
    Structured(StructuredExample),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredExample {
    #[serde(alias = "text", alias = "example")]
    pub sentence: String,

    #[serde(
        default,
        alias = "components",
        skip_serializing_if = "Breakdown::is_empty",
        deserialize_with = "lenient"
    )]
    pub breakdown: Breakdown,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub note: Option<String>,
}

/// Ordered `part -> explanation` pairs. Order follows the provider's output so the
/// parts read left to right like the sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakdown(Vec<(String, String)>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    #[serde(alias = "term")]
    pub word: String,
    #[serde(alias = "meaning")]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonMistake {
    #[serde(alias = "mistake")]
    pub incorrect: String,
    #[serde(alias = "correction")]
    pub correct: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeActivity {
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default, alias = "description", deserialize_with = "lenient")]
    pub instructions: String,
    #[serde(
        default,
        alias = "questions",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "lenient_list"
    )]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Illustration {
    #[serde(alias = "image_prompt")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub caption: Option<String>,
    /// Data URL filled in by the server once the image provider returns something.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub image: Option<String>,
}

impl LessonContent {
    /// Builds a lesson from an arbitrary provider document.
    pub fn from_value(mut value: Value) -> Result<Self, ContentError> {
        let object = value.as_object_mut().ok_or(ContentError::NotAnObject)?;

        let has_template = fold_aliases(object, &TEMPLATE_KEYS, |value| {
            value.as_str().is_some_and(|template| !template.trim().is_empty())
        });
        if !has_template {
            return Err(ContentError::MissingTemplate);
        }
        let Some(Value::Array(examples)) = object.get_mut("examples") else {
            return Err(ContentError::MissingExamples);
        };
        for example in examples.iter_mut().filter_map(Value::as_object_mut) {
            fold_aliases(example, &SENTENCE_KEYS, Value::is_string);
            fold_aliases(example, &BREAKDOWN_KEYS, Value::is_object);
        }
        fold_aliases(object, &OBJECTIVES_KEYS, Value::is_array);

        Ok(serde_json::from_value(value)?)
    }

    /// Parses the string form kept in the `lessons.content` column.
    pub fn from_storage(raw: &str) -> Result<Self, ContentError> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.illustrations.iter().map(|i| i.prompt.clone()).collect()
    }

    /// Attaches images positionally: `images[i]` belongs to `illustrations[i]`.
    /// `None` leaves the illustration without a picture.
    pub fn attach_images<I>(&mut self, images: I)
    where
        I: IntoIterator<Item = Option<String>>,
    {
        for (illustration, image) in self.illustrations.iter_mut().zip(images) {
            if image.is_some() {
                illustration.image = image;
            }
        }
    }
}

impl Example {
    pub fn sentence(&self) -> &str {
        match self {
            Example::Text(sentence) => sentence,
            Example::Structured(example) => &example.sentence,
        }
    }

    /// Slot explanations; empty for plain-string examples.
    pub fn breakdown(&self) -> &[(String, String)] {
        match self {
            Example::Text(_) => &[],
            Example::Structured(example) => example.breakdown.parts(),
        }
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            Example::Text(_) => None,
            Example::Structured(example) => example.note.as_deref(),
        }
    }
}

impl Breakdown {
    pub fn parts(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, String)>> for Breakdown {
    fn from(parts: Vec<(String, String)>) -> Self {
        Breakdown(parts)
    }
}

impl Serialize for Breakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (part, explanation) in &self.0 {
            map.serialize_entry(part, explanation)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Breakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BreakdownVisitor;

        impl<'de> Visitor<'de> for BreakdownVisitor {
            type Value = Breakdown;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of sentence parts to explanations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Breakdown, A::Error> {
                let mut parts = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((part, explanation)) = map.next_entry::<String, Value>()? {
                    let explanation = match explanation {
                        Value::String(text) => text,
                        Value::Null => continue,
                        other => other.to_string(),
                    };
                    parts.push((part, explanation));
                }
                Ok(Breakdown(parts))
            }
        }

        deserializer.deserialize_map(BreakdownVisitor)
    }
}

/// Collapses alternate spellings of one field onto `keys[0]`, keeping the first
/// value that is `usable`. Unusable spellings are removed. Returns whether a usable
/// value was found.
fn fold_aliases(
    object: &mut Map<String, Value>,
    keys: &[&str],
    usable: impl Fn(&Value) -> bool,
) -> bool {
    let chosen = keys
        .iter()
        .find(|key| object.get(**key).is_some_and(&usable))
        .and_then(|key| object.remove(*key));
    for key in keys {
        object.remove(*key);
    }
    match chosen {
        Some(value) => {
            object.insert(keys[0].to_string(), value);
            true
        }
        None => false,
    }
}

/// Optional scalar or map section: wrong shapes fall back to the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Optional list section: a non-list becomes empty, unreadable entries are skipped.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| T::deserialize(item).ok())
        .collect())
}

fn examples_list<'de, D>(deserializer: D) -> Result<Vec<Example>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Err(de::Error::custom("examples must be a list"));
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match Example::deserialize(item) {
            Ok(example) => Some(example),
            Err(e) => {
                log::warn!("Dropping unreadable lesson example: {}", e);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn minimal() -> Value {
        json!({
            "pattern_template": "I usually ___ on ___.",
            "examples": ["I usually swim on Mondays."]
        })
    }

    #[test]
    fn test_minimal_document_has_no_optional_sections() {
        let content = LessonContent::from_value(minimal()).unwrap();
        assert_eq!(content.pattern_template, "I usually ___ on ___.");
        assert_eq!(content.examples.len(), 1);
        assert!(content.title.is_none());
        assert!(content.vocabulary.is_empty());
        assert!(content.practice_activities.is_empty());
        assert!(content.pattern_breakdown.is_empty());
    }

    #[test]
    fn test_template_accepted_under_alternate_key() {
        let content = LessonContent::from_value(json!({
            "pattern": "Can you ___, please?",
            "examples": []
        }))
        .unwrap();
        assert_eq!(content.pattern_template, "Can you ___, please?");
    }

    #[test]
    fn test_both_template_keys_prefers_canonical() {
        let content = LessonContent::from_value(json!({
            "pattern_template": "canonical ___",
            "pattern": "alternate ___",
            "examples": []
        }))
        .unwrap();
        assert_eq!(content.pattern_template, "canonical ___");
    }

    #[test]
    fn test_unusable_canonical_template_falls_back_to_alternate() {
        for canonical in [json!(""), json!("   "), json!(null), json!(7)] {
            let content = LessonContent::from_value(json!({
                "pattern_template": canonical,
                "pattern": "X ___",
                "examples": []
            }))
            .unwrap();
            assert_eq!(content.pattern_template, "X ___");
        }
    }

    #[test]
    fn test_blank_template_under_both_keys_is_missing() {
        let err = LessonContent::from_value(json!({
            "pattern_template": "",
            "pattern": " ",
            "examples": []
        }))
        .unwrap_err();
        assert!(matches!(err, ContentError::MissingTemplate));
    }

    #[test]
    fn test_example_with_both_breakdown_keys() {
        let content = LessonContent::from_value(json!({
            "pattern": "I ___ it.",
            "examples": [
                {
                    "sentence": "I like it.",
                    "breakdown": { "like": "verb" },
                    "components": { "I": "subject" }
                },
                {
                    "text": "I want it.",
                    "breakdown": "n/a",
                    "components": { "want": "verb" }
                },
                {
                    "sentence": "I need it.",
                    "text": "ignored",
                    "breakdown": []
                }
            ]
        }))
        .unwrap();

        assert_eq!(content.examples.len(), 3);
        assert_eq!(
            content.examples[0].breakdown(),
            &[("like".to_string(), "verb".to_string())]
        );
        assert_eq!(content.examples[1].sentence(), "I want it.");
        assert_eq!(
            content.examples[1].breakdown(),
            &[("want".to_string(), "verb".to_string())]
        );
        assert_eq!(content.examples[2].sentence(), "I need it.");
        assert!(content.examples[2].breakdown().is_empty());
    }

    #[test]
    fn test_both_objective_keys_keep_the_list() {
        let content = LessonContent::from_value(json!({
            "pattern": "___",
            "examples": [],
            "learning_objectives": "none",
            "objectives": ["Order politely"]
        }))
        .unwrap();
        assert_eq!(content.learning_objectives, vec!["Order politely"]);
    }

    #[test]
    fn test_missing_required_parts() {
        let err = LessonContent::from_value(json!({ "examples": [] })).unwrap_err();
        assert!(matches!(err, ContentError::MissingTemplate));

        let err = LessonContent::from_value(json!({ "pattern": "  " , "examples": []})).unwrap_err();
        assert!(matches!(err, ContentError::MissingTemplate));

        let err = LessonContent::from_value(json!({ "pattern": "x ___" })).unwrap_err();
        assert!(matches!(err, ContentError::MissingExamples));

        let err = LessonContent::from_value(json!({ "pattern": "x", "examples": "nope" }))
            .unwrap_err();
        assert!(matches!(err, ContentError::MissingExamples));

        let err = LessonContent::from_value(json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, ContentError::NotAnObject));
    }

    #[test]
    fn test_string_and_structured_examples() {
        let content = LessonContent::from_value(json!({
            "pattern_template": "I have ___ for ___.",
            "examples": [
                "I have lived here for two years.",
                {
                    "sentence": "She has worked there for a month.",
                    "breakdown": { "She": "subject", "has worked": "present perfect", "for a month": "duration" }
                },
                {
                    "text": "We have known him for ages.",
                    "components": { "We": "subject", "have known": "present perfect" },
                    "note": "stative verb"
                }
            ]
        }))
        .unwrap();

        let plain = &content.examples[0];
        assert_eq!(plain.sentence(), "I have lived here for two years.");
        assert!(plain.breakdown().is_empty());
        assert_eq!(plain.note(), None);

        let structured = &content.examples[1];
        assert_eq!(structured.sentence(), "She has worked there for a month.");
        let parts: Vec<&str> = structured.breakdown().iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(parts, vec!["She", "has worked", "for a month"]);

        let aliased = &content.examples[2];
        assert_eq!(aliased.sentence(), "We have known him for ages.");
        assert_eq!(
            aliased.breakdown(),
            &[
                ("We".to_string(), "subject".to_string()),
                ("have known".to_string(), "present perfect".to_string())
            ]
        );
        assert_eq!(aliased.note(), Some("stative verb"));
    }

    #[test]
    fn test_unreadable_examples_are_dropped() {
        let content = LessonContent::from_value(json!({
            "pattern": "___ is ___.",
            "examples": ["Rome is old.", 42, { "breakdown": {} }]
        }))
        .unwrap();
        assert_eq!(content.examples.len(), 1);
    }

    #[test]
    fn test_malformed_optional_sections_degrade() {
        let content = LessonContent::from_value(json!({
            "pattern": "___ is ___.",
            "examples": ["Rome is old."],
            "title": 12,
            "vocabulary": "not a list",
            "objectives": ["Use the frame", 7, "Ask questions"],
            "common_mistakes": [
                { "mistake": "He go", "correction": "He goes" },
                { "incorrect": "missing correct" }
            ],
            "pattern_breakdown": ["not", "a", "map"]
        }))
        .unwrap();
        assert!(content.title.is_none());
        assert!(content.vocabulary.is_empty());
        assert_eq!(content.learning_objectives, vec!["Use the frame", "Ask questions"]);
        assert_eq!(content.common_mistakes.len(), 1);
        assert_eq!(content.common_mistakes[0].correct, "He goes");
        assert!(content.pattern_breakdown.is_empty());
    }

    #[test]
    fn test_breakdown_keeps_provider_order_and_stringifies() {
        let content = LessonContent::from_value(json!({
            "pattern": "___ ___ ___",
            "examples": [],
            "pattern_breakdown": { "zeta": "first", "alpha": 2, "mid": null }
        }))
        .unwrap();
        assert_eq!(
            content.pattern_breakdown.parts(),
            &[
                ("zeta".to_string(), "first".to_string()),
                ("alpha".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_attach_images_is_positional() {
        let mut content = LessonContent::from_value(json!({
            "pattern": "___",
            "examples": [],
            "illustrations": [
                { "prompt": "a cat" },
                { "image_prompt": "a dog", "caption": "Dog" },
                { "prompt": "a bird" }
            ]
        }))
        .unwrap();
        assert_eq!(content.image_prompts(), vec!["a cat", "a dog", "a bird"]);

        content.attach_images(vec![
            Some("data:image/png;base64,AAA".to_string()),
            None,
            Some("data:image/png;base64,CCC".to_string()),
        ]);
        assert_eq!(
            content.illustrations[0].image.as_deref(),
            Some("data:image/png;base64,AAA")
        );
        assert!(content.illustrations[1].image.is_none());
        assert_eq!(
            content.illustrations[2].image.as_deref(),
            Some("data:image/png;base64,CCC")
        );
    }

    #[test]
    fn test_serialized_form_uses_canonical_keys() {
        let content = LessonContent::from_value(json!({
            "pattern": "___ please.",
            "examples": [{ "text": "Water please.", "components": { "Water": "noun" } }]
        }))
        .unwrap();
        let value = content.to_value().unwrap();
        assert_eq!(value["pattern_template"], "___ please.");
        assert_eq!(value["examples"][0]["sentence"], "Water please.");
        assert_eq!(value["examples"][0]["breakdown"]["Water"], "noun");
        assert!(value.get("vocabulary").is_none());

        let reparsed = LessonContent::from_value(value).unwrap();
        assert_eq!(reparsed, content);
    }
}
