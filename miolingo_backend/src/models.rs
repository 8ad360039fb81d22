use super::schema::*;
use chrono::{DateTime, offset::Utc};
use serde::{Deserializer, Deserialize, Serialize};

/// Distinguishes a missing key (`None`) from an explicit `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
    where T: Deserialize<'de>,
          D: Deserializer<'de>
{
    Deserialize::deserialize(de).map(Some)
}

#[derive(Identifiable, Clone, Queryable, Debug, Serialize, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub source_lang: Option<String>,
    pub date_joined: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name="users"]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub source_lang: Option<&'a str>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NewUserInput {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub source_lang: Option<String>,
}

/// The username is deliberately absent: it can't be changed.
#[derive(AsChangeset, Debug, Deserialize, Default)]
#[table_name="users"]
pub struct UserPatch {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub source_lang: Option<Option<String>>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none() &&
        self.source_lang.is_none()
    }
}


#[derive(Identifiable, Clone, Queryable, Associations, Debug, Serialize, PartialEq)]
#[belongs_to(User, foreign_key = "owner_id")]
#[table_name="translations"]
pub struct Translation {
    pub id: i32,
    pub lang: String,
    pub text: String,
    pub slug: String,
    pub priority: i16,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(skip)]
    pub owner_id: i32,
}

#[derive(Insertable, Debug)]
#[table_name="translations"]
pub struct NewTranslation<'a> {
    pub lang: &'a str,
    pub text: &'a str,
    pub slug: &'a str,
    pub priority: i16,
    pub owner_id: i32,
}

#[derive(AsChangeset, Debug)]
#[table_name="translations"]
pub struct TranslationChanges {
    pub lang: Option<String>,
    pub text: Option<String>,
    pub slug: Option<String>,
    pub priority: Option<i16>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Insertable, Queryable, Debug, Clone, Copy, PartialEq)]
#[table_name="translation_links"]
pub struct TranslationLink {
    pub from_id: i32,
    pub to_id: i32,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TranslationWithLinks {
    #[serde(flatten)]
    pub translation: Translation,
    pub trans: Vec<Translation>,
}

/// A nested translation, identified by its dedup key rather than by id.
#[derive(Debug, Deserialize, Clone)]
pub struct TranslationLeafInput {
    pub lang: String,
    pub text: String,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewTranslationInput {
    pub lang: String,
    pub text: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub trans: Option<Vec<TranslationLeafInput>>,
}

/// `trans: None` leaves the links alone, `Some(vec![])` clears them.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TranslationPatch {
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub trans: Option<Vec<TranslationLeafInput>>,
}


#[derive(Identifiable, Clone, Queryable, Associations, Debug, Serialize, PartialEq)]
#[belongs_to(User, foreign_key = "owner_id")]
#[table_name="lessons"]
pub struct Lesson {
    pub id: i32,
    pub name: String,
    pub priority: i16,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(skip)]
    pub owner_id: i32,
}

#[derive(Insertable, Debug)]
#[table_name="lessons"]
pub struct NewLesson<'a> {
    pub name: &'a str,
    pub priority: i16,
    pub is_active: bool,
    pub owner_id: i32,
}

#[derive(AsChangeset, Debug)]
#[table_name="lessons"]
pub struct LessonChanges {
    pub name: Option<String>,
    pub priority: Option<i16>,
    pub is_active: Option<bool>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Identifiable, Insertable, Queryable, Associations, Debug, Clone, Copy)]
#[primary_key(lesson_id, translation_id)]
#[belongs_to(Lesson, foreign_key = "lesson_id")]
#[belongs_to(Translation, foreign_key = "translation_id")]
#[table_name="lesson_translations"]
pub struct LessonTranslation {
    pub lesson_id: i32,
    pub translation_id: i32,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LessonWithTranslations {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub translations: Vec<TranslationWithLinks>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewLessonInput {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub translations: Vec<i32>,
}

/// `translations: Some(None)` is an explicit `null` and gets rejected.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LessonPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub translations: Option<Option<Vec<i32>>>,
}


#[derive(Identifiable, Clone, Queryable, Associations, Debug, Serialize, PartialEq)]
#[belongs_to(Lesson, foreign_key = "lesson_id")]
#[belongs_to(User, foreign_key = "owner_id")]
#[table_name="trainings"]
pub struct Training {
    pub id: i32,
    pub lesson_id: i32,
    #[serde(skip)]
    pub owner_id: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub score: Option<i16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingState {
    Created,
    Finished,
}

impl Training {
    pub fn state(&self) -> TrainingState {
        match self.finished_at {
            Some(_) => TrainingState::Finished,
            None => TrainingState::Created,
        }
    }
}

#[derive(Insertable, Debug)]
#[table_name="trainings"]
pub struct NewTraining {
    pub lesson_id: i32,
    pub owner_id: i32,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TrainingWithLesson {
    #[serde(flatten)]
    pub training: Training,
    pub lesson: LessonWithTranslations,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct NewTrainingInput {
    pub lesson: i32,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TrainingPatch {
    pub finished_at: DateTime<Utc>,
}


#[derive(Identifiable, Clone, Queryable, Associations, Debug, Serialize, PartialEq)]
#[belongs_to(Training, foreign_key = "training_id")]
#[belongs_to(Translation, foreign_key = "translation_id")]
#[table_name="stats"]
pub struct Stat {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub training_id: i32,
    pub translation_id: i32,
    pub succeed: bool,
}

#[derive(Insertable, Debug)]
#[table_name="stats"]
pub struct NewStat {
    pub training_id: i32,
    pub translation_id: i32,
    pub succeed: bool,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct NewStatInput {
    pub training: i32,
    pub translation: i32,
    #[serde(default)]
    pub succeed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_patch_tells_absent_null_and_empty_apart() {
        let absent: LessonPatch = serde_json::from_str(r#"{"name": "Verbs"}"#).unwrap();
        assert_eq!(absent.translations, None);

        let null: LessonPatch = serde_json::from_str(r#"{"translations": null}"#).unwrap();
        assert_eq!(null.translations, Some(None));

        let empty: LessonPatch = serde_json::from_str(r#"{"translations": []}"#).unwrap();
        assert_eq!(empty.translations, Some(Some(vec![])));
    }

    #[test]
    fn user_patch_can_clear_source_lang() {
        let patch: UserPatch = serde_json::from_str(r#"{"source_lang": null}"#).unwrap();
        assert_eq!(patch.source_lang, Some(None));
        assert!(!patch.is_empty());

        let patch: UserPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn new_lesson_defaults_to_active() {
        let input: NewLessonInput =
            serde_json::from_str(r#"{"name": "Food", "translations": [1, 2]}"#).unwrap();
        assert!(input.is_active);
        assert_eq!(input.priority, 0);
        assert_eq!(input.translations, vec![1, 2]);
    }

    #[test]
    fn translation_serializes_without_owner() {
        let now = Utc::now();
        let t = Translation {
            id: 3,
            lang: "fr".into(),
            text: "Bonjour".into(),
            slug: "bonjour".into(),
            priority: 2,
            created_at: now,
            modified_at: now,
            owner_id: 9,
        };
        let json = serde_json::to_value(&TranslationWithLinks { translation: t, trans: vec![] })
            .unwrap();
        assert_eq!(json["slug"], "bonjour");
        assert_eq!(json["trans"], serde_json::json!([]));
        assert!(json.get("owner_id").is_none());
    }
}
