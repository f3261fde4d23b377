//! Static tool table and the argument validation shared with the adapters.
//!
//! The limits in [`bounds`] are the only copy of each constraint: the listed
//! JSON schemas, the request defaults and every adapter's own validation all
//! read from them.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value, json};

use crate::core::error::ToolError;

pub mod bounds {
    pub const PROMPT_MAX_CHARS: usize = 10_000;

    pub const IMAGE_ASPECT_RATIOS: &[&str] = &["1:1", "16:9", "9:16", "4:3", "3:4"];
    pub const VIDEO_ASPECT_RATIOS: &[&str] = &["16:9", "9:16", "1:1"];
    pub const PERSON_GENERATION: &[&str] = &["allow", "disallow"];
    pub const MUSICAL_STRUCTURES: &[&str] = &["verse-chorus", "free-form", "instrumental"];
    pub const TEMPOS: &[&str] = &["slow", "medium", "fast"];
    pub const TEXT_MODELS: &[&str] = &["gemini-1.5-pro", "gemini-1.5-flash", "gemini-2.0-flash-exp"];

    pub const IMAGE_MIN_SAMPLES: u32 = 1;
    pub const IMAGE_MAX_SAMPLES: u32 = 8;
    pub const VIDEO_MIN_SAMPLES: u32 = 1;
    pub const VIDEO_MAX_SAMPLES: u32 = 4;
    pub const VIDEO_MIN_DURATION: u32 = 5;
    pub const VIDEO_MAX_DURATION: u32 = 8;
    pub const MUSIC_MIN_DURATION: u32 = 1;
    pub const MUSIC_MAX_DURATION: u32 = 60;
    pub const TEXT_MIN_TEMPERATURE: f64 = 0.0;
    pub const TEXT_MAX_TEMPERATURE: f64 = 2.0;
    pub const TEXT_MIN_MAX_TOKENS: u32 = 1;
    pub const TEXT_MAX_MAX_TOKENS: u32 = 8192;

    pub const IMAGE_DEFAULT_ASPECT_RATIO: &str = "1:1";
    pub const VIDEO_DEFAULT_ASPECT_RATIO: &str = "16:9";
    pub const DEFAULT_SAMPLE_COUNT: u32 = 1;
    pub const DEFAULT_PERSON_GENERATION: &str = "allow";
    pub const IMAGE_DEFAULT_LANGUAGE: &str = "en";
    pub const VIDEO_DEFAULT_DURATION: u32 = 5;
    pub const MUSIC_DEFAULT_DURATION: u32 = 30;
    pub const MUSIC_DEFAULT_STRUCTURE: &str = "free-form";
    pub const TEXT_DEFAULT_MODEL: &str = "gemini-1.5-flash";
    pub const TEXT_DEFAULT_TEMPERATURE: f64 = 0.7;
    pub const TEXT_DEFAULT_MAX_TOKENS: u32 = 2048;
}

pub const IMAGE_TOOL: &str = "imagen_generate_image";
pub const VIDEO_TOOL: &str = "veo_generate_video";
pub const TEXT_TOOL: &str = "gemini_generate_text";
pub const MUSIC_TOOL: &str = "lyria_generate_music";
pub const STATUS_TOOL: &str = "check_operation_status";

/// Extra check applied to a string field after type coercion.
pub type StringCheck = fn(field: &str, value: &str) -> Result<(), ToolError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Enum,
    Bool,
}

impl FieldKind {
    fn json_type(self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Number => Some("number"),
            Self::Integer => Some("integer"),
            Self::Bool => Some("boolean"),
            // Enums list their values instead of a type.
            Self::Enum => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: &'static str,
    pub default: Option<Value>,
    pub allowed_values: &'static [&'static str],
    pub pattern: Option<&'static str>,
    pub check: Option<StringCheck>,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            min: None,
            max: None,
            unit: "",
            default: None,
            allowed_values: &[],
            pattern: None,
            check: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::String, description)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Number, description)
    }

    pub fn integer(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Integer, description)
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Bool, description)
    }

    pub fn one_of(
        name: &'static str,
        description: &'static str,
        allowed_values: &'static [&'static str],
    ) -> Self {
        Self {
            allowed_values,
            ..Self::new(name, FieldKind::Enum, description)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Suffix appended to range errors, e.g. `" seconds"`.
    pub fn unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn pattern(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn check(mut self, check: StringCheck) -> Self {
        self.check = Some(check);
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut property = Map::new();
        if let Some(json_type) = self.kind.json_type() {
            property.insert("type".to_string(), json!(json_type));
        }
        if !self.allowed_values.is_empty() {
            property.insert("enum".to_string(), json!(self.allowed_values));
        }
        if let Some(min) = self.min {
            property.insert("minimum".to_string(), self.bound_value(min));
        }
        if let Some(max) = self.max {
            property.insert("maximum".to_string(), self.bound_value(max));
        }
        if let Some(pattern) = self.pattern {
            property.insert("pattern".to_string(), json!(pattern));
        }
        if let Some(default) = &self.default {
            property.insert("default".to_string(), default.clone());
        }
        property.insert("description".to_string(), json!(self.description));
        Value::Object(property)
    }

    fn bound_value(&self, bound: f64) -> Value {
        if self.kind == FieldKind::Integer {
            json!(bound as i64)
        } else {
            Number::from_f64(bound).map(Value::Number).unwrap_or(Value::Null)
        }
    }

    fn coerce(&self, raw: &Value) -> Result<Value, ToolError> {
        let value = match self.kind {
            FieldKind::String => Value::String(self.expect_string(raw)?),
            FieldKind::Enum => {
                let value = self.expect_string(raw)?;
                check_one_of(self.name, &value, self.allowed_values)?;
                Value::String(value)
            }
            FieldKind::Number => {
                let value = self.expect_number(raw)?;
                self.check_bounds(value)?;
                Number::from_f64(value)
                    .map(Value::Number)
                    .ok_or_else(|| ToolError::invalid_argument(format!("{} must be finite", self.name)))?
            }
            FieldKind::Integer => {
                let value = self.expect_number(raw)?;
                if value.fract() != 0.0 {
                    return Err(ToolError::invalid_argument(format!(
                        "{} must be an integer",
                        self.name
                    )));
                }
                self.check_bounds(value)?;
                json!(value as i64)
            }
            FieldKind::Bool => match raw {
                Value::Bool(flag) => Value::Bool(*flag),
                Value::String(text) if text.eq_ignore_ascii_case("true") => Value::Bool(true),
                Value::String(text) if text.eq_ignore_ascii_case("false") => Value::Bool(false),
                _ => {
                    return Err(ToolError::invalid_argument(format!(
                        "{} must be a boolean",
                        self.name
                    )));
                }
            },
        };

        if let (Some(check), Value::String(text)) = (self.check, &value) {
            check(self.name, text)?;
        }
        Ok(value)
    }

    fn expect_string(&self, raw: &Value) -> Result<String, ToolError> {
        match raw {
            Value::String(text) => Ok(text.clone()),
            _ => Err(ToolError::invalid_argument(format!(
                "{} must be a string",
                self.name
            ))),
        }
    }

    /// Accepts JSON numbers and numeric strings.
    fn expect_number(&self, raw: &Value) -> Result<f64, ToolError> {
        let parsed = match raw {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|value| value.is_finite())
            .ok_or_else(|| ToolError::invalid_argument(format!("{} must be a number", self.name)))
    }

    fn check_bounds(&self, value: f64) -> Result<(), ToolError> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => check_range(self.name, value, min, max, self.unit),
            (Some(min), None) if value < min => Err(ToolError::invalid_argument(format!(
                "{} must be at least {min}{}",
                self.name, self.unit
            ))),
            (None, Some(max)) if value > max => Err(ToolError::invalid_argument(format!(
                "{} must be at most {max}{}",
                self.name, self.unit
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    pub fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Checks and coerces an argument bag. Missing optional fields take their
    /// default, numeric and boolean strings are converted, and fields the
    /// schema does not know are dropped.
    pub fn validate(&self, args: &Map<String, Value>) -> Result<Map<String, Value>, ToolError> {
        let mut normalized = Map::new();

        for field in &self.fields {
            match args.get(field.name).filter(|value| !value.is_null()) {
                Some(raw) => {
                    normalized.insert(field.name.to_string(), field.coerce(raw)?);
                }
                None if field.required => {
                    return Err(ToolError::invalid_argument(format!(
                        "{} is required",
                        field.name
                    )));
                }
                None => {
                    if let Some(default) = &field.default {
                        normalized.insert(field.name.to_string(), default.clone());
                    }
                }
            }
        }

        Ok(normalized)
    }

    pub fn to_json_schema(&self) -> Value {
        let properties = self
            .fields
            .iter()
            .map(|field| (field.name.to_string(), field.to_json_schema()))
            .collect::<Map<_, _>>();
        let required = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
            .collect::<Vec<_>>();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl Serialize for InputSchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json_schema().serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: InputSchema,
}

#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<&'static str, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five tools served by the dispatcher, in listing order.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(image_tool());
        registry.register(video_tool());
        registry.register(text_tool());
        registry.register(music_tool());
        registry.register(status_tool());
        registry
    }

    pub fn register(&mut self, definition: ToolDefinition) {
        self.tools.insert(definition.name, definition);
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn list(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Non-empty after trimming and no longer than [`bounds::PROMPT_MAX_CHARS`].
pub fn check_prompt(field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid_argument(format!("{field} cannot be empty")));
    }
    if value.chars().count() > bounds::PROMPT_MAX_CHARS {
        return Err(ToolError::invalid_argument(format!(
            "{field} exceeds maximum length of {} characters",
            bounds::PROMPT_MAX_CHARS
        )));
    }
    Ok(())
}

pub fn check_language_code(field: &str, value: &str) -> Result<(), ToolError> {
    if value.len() == 2 && value.chars().all(|c| c.is_ascii_lowercase()) {
        return Ok(());
    }
    Err(ToolError::invalid_argument(format!(
        "Invalid {field} '{value}'. Must be a 2-letter lowercase language code"
    )))
}

pub fn check_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ToolError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(ToolError::invalid_argument(format!(
        "Invalid {field} '{value}'. Must be one of: {}",
        allowed.join(", ")
    )))
}

/// Inclusive range check; the message names both ends of the range.
pub fn check_range<T>(field: &str, value: T, min: T, max: T, unit: &str) -> Result<(), ToolError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ToolError::invalid_argument(format!(
            "{field} must be between {min} and {max}{unit}"
        )));
    }
    Ok(())
}

fn prompt_field(name: &'static str, description: &'static str) -> FieldSpec {
    FieldSpec::string(name, description)
        .required()
        .check(check_prompt)
}

fn storage_uri_field() -> FieldSpec {
    FieldSpec::string("outputStorageUri", "GCS bucket URI for output")
}

fn person_generation_field() -> FieldSpec {
    FieldSpec::one_of(
        "personGeneration",
        "Whether to allow person generation",
        bounds::PERSON_GENERATION,
    )
    .default_value(bounds::DEFAULT_PERSON_GENERATION)
}

fn image_tool() -> ToolDefinition {
    ToolDefinition {
        name: IMAGE_TOOL,
        description: "Generate photorealistic images using Google Imagen",
        input_schema: InputSchema::new(vec![
            prompt_field("prompt", "Text prompt for image generation"),
            FieldSpec::integer("sampleCount", "Number of images to generate")
                .range(
                    f64::from(bounds::IMAGE_MIN_SAMPLES),
                    f64::from(bounds::IMAGE_MAX_SAMPLES),
                )
                .default_value(bounds::DEFAULT_SAMPLE_COUNT),
            FieldSpec::one_of(
                "aspectRatio",
                "Image aspect ratio",
                bounds::IMAGE_ASPECT_RATIOS,
            )
            .default_value(bounds::IMAGE_DEFAULT_ASPECT_RATIO),
            FieldSpec::string("negativePrompt", "What to avoid in the generation"),
            person_generation_field(),
            FieldSpec::string("language", "Language for the prompt")
                .pattern("^[a-z]{2}$")
                .check(check_language_code)
                .default_value(bounds::IMAGE_DEFAULT_LANGUAGE),
            storage_uri_field(),
        ]),
    }
}

fn video_tool() -> ToolDefinition {
    ToolDefinition {
        name: VIDEO_TOOL,
        description: "Generate videos using Google Veo (5-8 seconds with audio)",
        input_schema: InputSchema::new(vec![
            prompt_field("prompt", "Text prompt for video generation"),
            FieldSpec::string(
                "imageBase64",
                "Base64-encoded image for image-to-video generation",
            ),
            FieldSpec::integer("duration", "Video duration in seconds")
                .range(
                    f64::from(bounds::VIDEO_MIN_DURATION),
                    f64::from(bounds::VIDEO_MAX_DURATION),
                )
                .unit(" seconds")
                .default_value(bounds::VIDEO_DEFAULT_DURATION),
            FieldSpec::one_of(
                "aspectRatio",
                "Video aspect ratio",
                bounds::VIDEO_ASPECT_RATIOS,
            )
            .default_value(bounds::VIDEO_DEFAULT_ASPECT_RATIO),
            FieldSpec::integer("sampleCount", "Number of videos to generate")
                .range(
                    f64::from(bounds::VIDEO_MIN_SAMPLES),
                    f64::from(bounds::VIDEO_MAX_SAMPLES),
                )
                .default_value(bounds::DEFAULT_SAMPLE_COUNT),
            FieldSpec::string("negativePrompt", "What to avoid in the generation"),
            person_generation_field(),
            storage_uri_field(),
        ]),
    }
}

fn text_tool() -> ToolDefinition {
    ToolDefinition {
        name: TEXT_TOOL,
        description: "Generate text using Google Gemini models",
        input_schema: InputSchema::new(vec![
            prompt_field("prompt", "Text prompt for Gemini"),
            FieldSpec::one_of("model", "Gemini model to use", bounds::TEXT_MODELS)
                .default_value(bounds::TEXT_DEFAULT_MODEL),
            FieldSpec::number("temperature", "Temperature for randomness")
                .range(bounds::TEXT_MIN_TEMPERATURE, bounds::TEXT_MAX_TEMPERATURE)
                .default_value(bounds::TEXT_DEFAULT_TEMPERATURE),
            FieldSpec::integer("maxTokens", "Maximum tokens to generate")
                .range(
                    f64::from(bounds::TEXT_MIN_MAX_TOKENS),
                    f64::from(bounds::TEXT_MAX_MAX_TOKENS),
                )
                .default_value(bounds::TEXT_DEFAULT_MAX_TOKENS),
            FieldSpec::string("systemInstruction", "System instruction for the model"),
        ]),
    }
}

fn music_tool() -> ToolDefinition {
    ToolDefinition {
        name: MUSIC_TOOL,
        description: "Generate music using Google Lyria (up to 60 seconds)",
        input_schema: InputSchema::new(vec![
            prompt_field("textPrompt", "Text description of the music to generate"),
            FieldSpec::one_of(
                "musicalStructure",
                "Musical structure",
                bounds::MUSICAL_STRUCTURES,
            )
            .default_value(bounds::MUSIC_DEFAULT_STRUCTURE),
            FieldSpec::string("genre", "Musical genre"),
            FieldSpec::string("mood", "Mood of the music"),
            FieldSpec::one_of("tempo", "Tempo of the music", bounds::TEMPOS),
            FieldSpec::integer("durationSeconds", "Duration in seconds")
                .range(
                    f64::from(bounds::MUSIC_MIN_DURATION),
                    f64::from(bounds::MUSIC_MAX_DURATION),
                )
                .unit(" seconds")
                .default_value(bounds::MUSIC_DEFAULT_DURATION),
            storage_uri_field(),
        ]),
    }
}

fn status_tool() -> ToolDefinition {
    ToolDefinition {
        name: STATUS_TOOL,
        description: "Check the status of a long-running operation",
        input_schema: InputSchema::new(vec![
            FieldSpec::string("operationName", "Operation name from a previous request")
                .required()
                .check(check_non_empty),
        ]),
    }
}

fn check_non_empty(field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid_argument(format!("{field} cannot be empty")));
    }
    Ok(())
}
