use anyhow::anyhow;
use chrono::NaiveDateTime;
use conhttpd_proc_macros::FieldNames;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use crate::event::EventId;
use crate::forms::{FieldKind, ModelField};

pub type ProgrammeId = i64;
pub type CategoryId = i64;
pub type TimeSlotId = i64;

#[derive(Serialize, Deserialize, FromRow, Clone, Debug, PartialEq)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub event_id: EventId,
    pub event_slug: String,
    pub slug: String,
    pub title: String,
}

/// Resolves a programme category by event slug and category slug, exactly one row must match.
pub async fn load_category(event_slug: &str, category_slug: &str, pool: &SqlitePool) -> anyhow::Result<CategoryRecord> {
    let mut categories = sqlx::query_as::<_, CategoryRecord>("SELECT c.id, c.event_id, e.slug AS event_slug, c.slug, c.title \
            FROM programme_category AS c INNER JOIN core_event AS e ON c.event_id=e.id \
            WHERE e.slug=? AND c.slug=?")
        .bind(event_slug)
        .bind(category_slug)
        .fetch_all(pool)
        .await?;
    match categories.len() {
        1 => Ok(categories.remove(0)),
        0 => Err(anyhow!("Category {category_slug} of event {event_slug} does not exist")),
        n => Err(anyhow!("Category {category_slug} of event {event_slug} is ambiguous, {n} matches")),
    }
}

#[derive(Serialize, Deserialize, FromRow, Clone, Debug, PartialEq)]
pub struct TimeSlotRecord {
    pub id: TimeSlotId,
    pub name: String,
}

pub async fn list_time_slots(pool: &SqlitePool) -> Result<Vec<TimeSlotRecord>, sqlx::Error> {
    sqlx::query_as("SELECT id, name FROM ropecon2019_timeslot ORDER BY id")
        .fetch_all(pool)
        .await
}

pub const PROGRAMME_FIELDS: &[ModelField] = &[
    ModelField::new("title", "Title", FieldKind::Char { max_length: 1023 }),
    ModelField::new("rpg_system", "RPG system", FieldKind::Char { max_length: 512 }).blank(),
    ModelField::new("approximate_length", "Approximate length (minutes)", FieldKind::PositiveInteger),
    ModelField::new("min_players", "Minimum players", FieldKind::PositiveInteger),
    ModelField::new("max_players", "Maximum players", FieldKind::PositiveInteger),
    ModelField::new("is_revolving_door", "Revolving door game", FieldKind::Boolean)
        .help("Check this box if new players can join during the game and old players can leave."),
    ModelField::new("is_in_english", "In English", FieldKind::Boolean),
    ModelField::new("is_age_restricted", "Restricted to people of age 18 and over", FieldKind::Boolean),
    ModelField::new("is_children_friendly", "Children-friendly", FieldKind::Boolean),
    ModelField::new("is_family_program", "Family program", FieldKind::Boolean),
    ModelField::new("is_beginner_friendly", "Beginner friendly", FieldKind::Boolean)
        .help("Check this box if your game is suitable for players with no prior experience."),
    ModelField::new("is_intended_for_experienced_participants", "Experienced participants preferred", FieldKind::Boolean),
    ModelField::new("ropecon2018_genre_fantasy", "Fantasy", FieldKind::Boolean),
    ModelField::new("ropecon2018_genre_scifi", "Sci-fi", FieldKind::Boolean),
    ModelField::new("ropecon2018_genre_historical", "Historical", FieldKind::Boolean),
    ModelField::new("ropecon2018_genre_modern", "Modern", FieldKind::Boolean),
    ModelField::new("ropecon2018_genre_war", "War", FieldKind::Boolean),
    ModelField::new("ropecon2018_genre_horror", "Horror", FieldKind::Boolean),
    ModelField::new("ropecon2019_genre_adventure", "Adventure", FieldKind::Boolean),
    ModelField::new("ropecon2018_genre_mystery", "Mystery", FieldKind::Boolean),
    ModelField::new("ropecon2018_genre_drama", "Drama", FieldKind::Boolean),
    ModelField::new("ropecon2018_genre_humor", "Humor", FieldKind::Boolean),
    ModelField::new("ropecon2018_style_serious", "Serious", FieldKind::Boolean),
    ModelField::new("ropecon2018_style_light", "Light", FieldKind::Boolean),
    ModelField::new("ropecon2018_style_rules_heavy", "Rules heavy", FieldKind::Boolean),
    ModelField::new("ropecon2018_style_rules_light", "Rules light", FieldKind::Boolean),
    ModelField::new("ropecon2018_style_story_driven", "Story driven", FieldKind::Boolean),
    ModelField::new("ropecon2018_style_character_driven", "Character driven", FieldKind::Boolean),
    ModelField::new("ropecon2018_style_combat_driven", "Combat driven", FieldKind::Boolean),
    ModelField::new("description", "Description", FieldKind::Text)
        .blank()
        .help("This description is published in the web schedule and the programme booklet."),
    ModelField::new("three_word_description", "Three-word description", FieldKind::Char { max_length: 1023 })
        .blank()
        .help("Describe your game in three words: for example, genre, theme and attitude."),
    ModelField::new("ropecon2019_blocked_time_slots", "Time preferences", FieldKind::ManyToMany)
        .blank()
        .help("Tick the time slots when you are NOT available to run your game."),
    ModelField::new("notes_from_host", "Anything else?", FieldKind::Text)
        .blank()
        .help("If there is anything else you wish to say to the programme manager that is not covered by the above questions, please enter it here."),
];

/// The user-editable part of a programme, as submitted through the RPG form.
#[derive(Serialize, Deserialize, FromForm, FromRow, FieldNames, Clone, Debug, PartialEq)]
pub struct ProgrammeValues {
    pub title: String,
    #[field(default = String::new())]
    pub rpg_system: String,
    #[field(validate = range(0..))]
    pub approximate_length: i64,
    #[field(validate = range(0..))]
    pub min_players: i64,
    #[field(validate = range(0..))]
    pub max_players: i64,
    pub is_revolving_door: bool,

    pub is_in_english: bool,
    pub is_age_restricted: bool,
    pub is_children_friendly: bool,
    pub is_family_program: bool,
    pub is_beginner_friendly: bool,
    pub is_intended_for_experienced_participants: bool,

    pub ropecon2018_genre_fantasy: bool,
    pub ropecon2018_genre_scifi: bool,
    pub ropecon2018_genre_historical: bool,
    pub ropecon2018_genre_modern: bool,
    pub ropecon2018_genre_war: bool,
    pub ropecon2018_genre_horror: bool,
    pub ropecon2019_genre_adventure: bool,
    pub ropecon2018_genre_mystery: bool,
    pub ropecon2018_genre_drama: bool,
    pub ropecon2018_genre_humor: bool,

    pub ropecon2018_style_serious: bool,
    pub ropecon2018_style_light: bool,
    pub ropecon2018_style_rules_heavy: bool,
    pub ropecon2018_style_rules_light: bool,
    pub ropecon2018_style_story_driven: bool,
    pub ropecon2018_style_character_driven: bool,
    pub ropecon2018_style_combat_driven: bool,

    #[field(default = String::new())]
    pub description: String,
    #[field(default = String::new())]
    pub three_word_description: String,
    #[sqlx(skip)]
    #[serde(default)]
    #[field(default = Vec::new())]
    pub ropecon2019_blocked_time_slots: Vec<TimeSlotId>,
    #[field(default = String::new())]
    pub notes_from_host: String,
}
impl Default for ProgrammeValues {
    fn default() -> Self {
        Self {
            title: "".to_string(),
            rpg_system: "".to_string(),
            approximate_length: 240,
            min_players: 1,
            max_players: 4,
            is_revolving_door: false,
            is_in_english: false,
            is_age_restricted: false,
            is_children_friendly: false,
            is_family_program: false,
            is_beginner_friendly: false,
            is_intended_for_experienced_participants: false,
            ropecon2018_genre_fantasy: false,
            ropecon2018_genre_scifi: false,
            ropecon2018_genre_historical: false,
            ropecon2018_genre_modern: false,
            ropecon2018_genre_war: false,
            ropecon2018_genre_horror: false,
            ropecon2019_genre_adventure: false,
            ropecon2018_genre_mystery: false,
            ropecon2018_genre_drama: false,
            ropecon2018_genre_humor: false,
            ropecon2018_style_serious: false,
            ropecon2018_style_light: false,
            ropecon2018_style_rules_heavy: false,
            ropecon2018_style_rules_light: false,
            ropecon2018_style_story_driven: false,
            ropecon2018_style_character_driven: false,
            ropecon2018_style_combat_driven: false,
            description: "".to_string(),
            three_word_description: "".to_string(),
            ropecon2019_blocked_time_slots: vec![],
            notes_from_host: "".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, FromRow, Clone, Debug, PartialEq)]
pub struct ProgrammeRecord {
    pub id: ProgrammeId,
    pub category_id: CategoryId,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub values: ProgrammeValues,
    pub created: NaiveDateTime,
}

const PROGRAMME_COLUMNS: &str = "p.id, p.category_id, p.title, p.rpg_system, p.approximate_length, p.min_players, p.max_players, \
    p.is_revolving_door, p.is_in_english, p.is_age_restricted, p.is_children_friendly, p.is_family_program, \
    p.is_beginner_friendly, p.is_intended_for_experienced_participants, \
    p.ropecon2018_genre_fantasy, p.ropecon2018_genre_scifi, p.ropecon2018_genre_historical, p.ropecon2018_genre_modern, \
    p.ropecon2018_genre_war, p.ropecon2018_genre_horror, p.ropecon2019_genre_adventure, p.ropecon2018_genre_mystery, \
    p.ropecon2018_genre_drama, p.ropecon2018_genre_humor, \
    p.ropecon2018_style_serious, p.ropecon2018_style_light, p.ropecon2018_style_rules_heavy, p.ropecon2018_style_rules_light, \
    p.ropecon2018_style_story_driven, p.ropecon2018_style_character_driven, p.ropecon2018_style_combat_driven, \
    p.description, p.three_word_description, p.notes_from_host, p.created";

async fn load_blocked_time_slots(programme_id: ProgrammeId, pool: &SqlitePool) -> Result<Vec<TimeSlotId>, sqlx::Error> {
    Ok(sqlx::query_as::<_, (TimeSlotId,)>("SELECT timeslot_id FROM programme_programme_ropecon2019_blocked_time_slots \
            WHERE programme_id=? ORDER BY timeslot_id")
        .bind(programme_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|s| s.0)
        .collect())
}

/// Loads a programme, it must belong to a category of the event.
pub async fn load_programme(event_id: EventId, programme_id: ProgrammeId, pool: &SqlitePool) -> Result<Option<ProgrammeRecord>, sqlx::Error> {
    let qs = format!("SELECT {PROGRAMME_COLUMNS} FROM programme_programme AS p \
            INNER JOIN programme_category AS c ON p.category_id=c.id \
            WHERE c.event_id=? AND p.id=?");
    let rec = sqlx::query_as::<_, ProgrammeRecord>(&qs)
        .bind(event_id)
        .bind(programme_id)
        .fetch_optional(pool)
        .await?;
    let Some(mut rec) = rec else {
        return Ok(None);
    };
    rec.values.ropecon2019_blocked_time_slots = load_blocked_time_slots(rec.id, pool).await?;
    Ok(Some(rec))
}

pub async fn list_programmes(category_id: CategoryId, pool: &SqlitePool) -> Result<Vec<ProgrammeRecord>, sqlx::Error> {
    let qs = format!("SELECT {PROGRAMME_COLUMNS} FROM programme_programme AS p WHERE p.category_id=? ORDER BY p.id");
    let mut recs = sqlx::query_as::<_, ProgrammeRecord>(&qs)
        .bind(category_id)
        .fetch_all(pool)
        .await?;
    for rec in &mut recs {
        rec.values.ropecon2019_blocked_time_slots = load_blocked_time_slots(rec.id, pool).await?;
    }
    Ok(recs)
}

/// Inserts a programme together with its blocked time slot links.
pub async fn insert_programme(category_id: CategoryId, values: &ProgrammeValues, pool: &SqlitePool) -> anyhow::Result<ProgrammeId> {
    let mut txn = pool.begin().await?;
    let id: (ProgrammeId,) = sqlx::query_as("INSERT INTO programme_programme (\
            category_id, title, rpg_system, approximate_length, min_players, max_players, is_revolving_door, \
            is_in_english, is_age_restricted, is_children_friendly, is_family_program, is_beginner_friendly, \
            is_intended_for_experienced_participants, \
            ropecon2018_genre_fantasy, ropecon2018_genre_scifi, ropecon2018_genre_historical, ropecon2018_genre_modern, \
            ropecon2018_genre_war, ropecon2018_genre_horror, ropecon2019_genre_adventure, ropecon2018_genre_mystery, \
            ropecon2018_genre_drama, ropecon2018_genre_humor, \
            ropecon2018_style_serious, ropecon2018_style_light, ropecon2018_style_rules_heavy, ropecon2018_style_rules_light, \
            ropecon2018_style_story_driven, ropecon2018_style_character_driven, ropecon2018_style_combat_driven, \
            description, three_word_description, notes_from_host) \
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
            RETURNING id")
        .bind(category_id)
        .bind(&values.title)
        .bind(&values.rpg_system)
        .bind(values.approximate_length)
        .bind(values.min_players)
        .bind(values.max_players)
        .bind(values.is_revolving_door)
        .bind(values.is_in_english)
        .bind(values.is_age_restricted)
        .bind(values.is_children_friendly)
        .bind(values.is_family_program)
        .bind(values.is_beginner_friendly)
        .bind(values.is_intended_for_experienced_participants)
        .bind(values.ropecon2018_genre_fantasy)
        .bind(values.ropecon2018_genre_scifi)
        .bind(values.ropecon2018_genre_historical)
        .bind(values.ropecon2018_genre_modern)
        .bind(values.ropecon2018_genre_war)
        .bind(values.ropecon2018_genre_horror)
        .bind(values.ropecon2019_genre_adventure)
        .bind(values.ropecon2018_genre_mystery)
        .bind(values.ropecon2018_genre_drama)
        .bind(values.ropecon2018_genre_humor)
        .bind(values.ropecon2018_style_serious)
        .bind(values.ropecon2018_style_light)
        .bind(values.ropecon2018_style_rules_heavy)
        .bind(values.ropecon2018_style_rules_light)
        .bind(values.ropecon2018_style_story_driven)
        .bind(values.ropecon2018_style_character_driven)
        .bind(values.ropecon2018_style_combat_driven)
        .bind(&values.description)
        .bind(&values.three_word_description)
        .bind(&values.notes_from_host)
        .fetch_one(&mut *txn).await?;
    for slot_id in &values.ropecon2019_blocked_time_slots {
        sqlx::query("INSERT OR IGNORE INTO programme_programme_ropecon2019_blocked_time_slots (programme_id, timeslot_id) VALUES (?, ?)")
            .bind(id.0)
            .bind(slot_id)
            .execute(&mut *txn).await?;
    }
    txn.commit().await?;
    Ok(id.0)
}
