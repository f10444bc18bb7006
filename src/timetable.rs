use anyhow::anyhow;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, State};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use crate::db::DbPool;
use crate::util::sqlx_to_custom_error;

pub mod schema;

pub const DEFAULT_TAG_STYLE: &str = "label-default";

/// Tag styles are CSS class names, limited to the length of the style column in the schema snapshot.
pub fn validate_tag_style(style: &str) -> anyhow::Result<&str> {
    if style.is_empty() {
        return Err(anyhow!("Tag style must not be empty"));
    }
    let max_length = schema::model("Tag")
        .and_then(|tag| tag.field("style"))
        .and_then(|field| field.max_length)
        .ok_or_else(|| anyhow!("Schema snapshot has no Tag.style length"))?;
    if style.chars().count() > max_length {
        return Err(anyhow!("Tag style {style} is longer than {max_length} characters"));
    }
    Ok(style)
}

#[derive(Serialize, Deserialize, FromRow, Clone, Debug, PartialEq)]
pub struct TagRecord {
    pub id: i64,
    pub title: String,
    pub order: i64,
    pub style: String,
}

pub async fn list_tags(pool: &SqlitePool) -> Result<Vec<TagRecord>, sqlx::Error> {
    sqlx::query_as("SELECT id, title, \"order\", style FROM timetable_tag ORDER BY \"order\", id")
        .fetch_all(pool)
        .await
}

#[get("/api/timetable/tags")]
async fn get_tags(db: &State<DbPool>) -> Result<Json<Vec<TagRecord>>, Custom<String>> {
    let tags = list_tags(&db.0).await.map_err(sqlx_to_custom_error)?;
    Ok(Json(tags))
}

pub fn extend(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![
        get_tags,
    ])
}
